use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SorterError {
    #[error("modem command does not fit in {0} bytes")]
    CommandTooLong(usize),
    #[error("color sensor read failed")]
    Sensor,
}
