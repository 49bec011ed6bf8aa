use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;
use smart_leds::{SmartLedsWrite, RGB8};

use crate::color::{classify, ColorLabel};
use crate::comm::{Receiver, RxInterrupt};
use crate::config::Config;
use crate::error::SorterError;
use crate::indicator::StatusLight;
use crate::modem::{Modem, Transport};
use crate::protocol::{contains_token, find_config, parse_assignments, START_TOKEN, STOP_TOKEN};
use crate::sensor::{self, ColorBus};
use crate::servo::{Position, Servo};
use crate::sides::SideAssignment;

/// Raised by the run button on each press.
pub type ButtonSignal = Signal<CriticalSectionRawMutex, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Idle => RunState::Running,
            RunState::Running => RunState::Idle,
        }
    }
}

const SELF_TEST_SWEEP: [Position; 5] = [
    Position::Center,
    Position::Right,
    Position::Center,
    Position::Left,
    Position::Center,
];

/// The sorter: owns every collaborator plus the run state and side table,
/// which nothing outside the loop can touch.
pub struct Sorter<'a, B, S, W, L, T, I: RxInterrupt, D, const N: usize> {
    config: Config,
    state: RunState,
    sides: SideAssignment,
    sensor: B,
    servo: Servo<S>,
    light: StatusLight<W, L>,
    modem: Modem<T>,
    rx: Receiver<'a, I, N>,
    delay: D,
    button: &'a ButtonSignal,
}

impl<'a, B, S, W, L, T, I, D, const N: usize> Sorter<'a, B, S, W, L, T, I, D, N>
where
    B: ColorBus,
    S: SetDutyCycle,
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
    L: OutputPin,
    T: Transport,
    I: RxInterrupt,
    D: DelayNs,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        sensor: B,
        servo: S,
        light: StatusLight<W, L>,
        transport: T,
        rx: Receiver<'a, I, N>,
        delay: D,
        button: &'a ButtonSignal,
    ) -> Self {
        Self {
            servo: Servo::new(servo, config.servo),
            config,
            state: RunState::default(),
            sides: SideAssignment::new(),
            sensor,
            light,
            modem: Modem::new(transport),
            rx,
            delay,
            button,
        }
    }

    /// Boot: center the arm, optionally sweep it, then bring the modem up.
    /// The receive interrupt must already be enabled.
    pub async fn start(&mut self) -> Result<(), SorterError> {
        self.delay.delay_ms(self.config.timing.boot_settle_ms).await;
        self.servo.move_to(Position::Center);
        self.light.off();
        if self.config.self_test {
            self.self_test().await;
        }
        self.modem
            .bring_up(
                &self.config.network,
                &self.config.timing,
                &mut self.rx,
                &mut self.delay,
            )
            .await
    }

    pub async fn self_test(&mut self) {
        log::info!("Servo self-test");
        for position in SELF_TEST_SWEEP {
            self.servo.move_to(position);
            self.delay.delay_ms(self.config.timing.move_settle_ms).await;
        }
    }

    pub async fn run(&mut self) -> ! {
        log::info!("Starting sorter loop");
        loop {
            self.tick().await;
        }
    }

    /// One loop iteration. Returns the label sorted this time, if running.
    pub async fn tick(&mut self) -> Option<ColorLabel> {
        if self.button.try_take().is_some() {
            self.set_state(self.state.toggled());
        }

        self.poll_messages().await;

        let timing = self.config.timing;
        match self.state {
            RunState::Running => {
                self.light.active();
                self.delay.delay_us(timing.indicator_us).await;
                let label = self.sort_one().await;
                self.delay.delay_ms(timing.cycle_ms).await;
                Some(label)
            }
            RunState::Idle => {
                self.light.off();
                self.delay.delay_us(timing.indicator_us).await;
                None
            }
        }
    }

    async fn poll_messages(&mut self) {
        if !self.rx.has_data() {
            return;
        }
        self.delay.delay_us(self.config.timing.rx_settle_us).await;

        let mut batch: heapless::Vec<u8, N> = heapless::Vec::new();
        self.rx.lock().drain(&mut batch);
        self.handle_message(&batch).await;

        // Anything that came in while handling the batch is dropped too.
        self.rx.reset();
    }

    async fn handle_message(&mut self, text: &[u8]) {
        let mut config_seen = false;
        for line in text.split(|&b| b == b'\n') {
            if let Some(cfg) = find_config(line) {
                let applied = self.sides.apply_config(parse_assignments(cfg));
                log::info!("Config applied: {} entries", applied);
                config_seen = true;
            }
        }
        if config_seen {
            self.delay.delay_ms(self.config.timing.config_applied_ms).await;
        }

        if contains_token(text, START_TOKEN) {
            self.set_state(RunState::Running);
        }
        if contains_token(text, STOP_TOKEN) {
            self.set_state(RunState::Idle);
        }
    }

    fn set_state(&mut self, state: RunState) {
        if state != self.state {
            log::info!("{:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    /// Sample, classify and, if a tile is present, swing it to its side and
    /// report it. The arm is back at center when this returns.
    async fn sort_one(&mut self) -> ColorLabel {
        let timing = self.config.timing;
        let label = match sensor::collect(
            &mut self.sensor,
            &mut self.delay,
            self.config.samples,
            timing.sample_interval_us,
        )
        .await
        {
            Ok(sample) => classify(sample),
            Err(_) => ColorLabel::Absent,
        };
        log::debug!("Classified: {:?}", label);

        if label.is_tile() {
            let side = self.sides.get(label);
            log::info!("{:?} -> {:?}", label, side);
            self.servo.move_to(side.into());
            self.delay.delay_ms(timing.move_settle_ms).await;
            if let Err(e) = self
                .modem
                .report(side, label, &timing, &mut self.rx, &mut self.delay)
                .await
            {
                log::warn!("Report dropped: {}", e);
            }
        } else {
            self.delay.delay_ms(timing.move_settle_ms).await;
        }

        self.servo.move_to(Position::Center);
        self.delay.delay_ms(timing.move_settle_ms).await;
        label
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn sides(&self) -> &SideAssignment {
        &self.sides
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
