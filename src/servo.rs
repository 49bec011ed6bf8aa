use embedded_hal::pwm::SetDutyCycle;

use crate::sides::Side;

/// 50 Hz servo frame.
const PERIOD_US: u16 = 20_000;
const RIGHT_US: u16 = 700;
const CENTER_US: u16 = 1_500;
const LEFT_US: u16 = 2_400;
/// Pulse at 0 degrees; 180 degrees lands at `ANGLE_ZERO_US + 180 * US_PER_DEGREE`.
const ANGLE_ZERO_US: u16 = RIGHT_US;
const US_PER_DEGREE: u16 = 10;
const MAX_ANGLE: i32 = 180;

/// Pulse widths, in microseconds, for the arm servo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoConfig {
    pub period_us: u16,
    pub right_us: u16,
    pub center_us: u16,
    pub left_us: u16,
    pub angle_zero_us: u16,
    pub us_per_degree: u16,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            period_us: PERIOD_US,
            right_us: RIGHT_US,
            center_us: CENTER_US,
            left_us: LEFT_US,
            angle_zero_us: ANGLE_ZERO_US,
            us_per_degree: US_PER_DEGREE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Left,
    Center,
    Right,
    /// Degrees; clipped to 0..=180.
    Angle(i32),
}

impl From<Side> for Position {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => Position::Left,
            Side::Right => Position::Right,
        }
    }
}

impl ServoConfig {
    /// Pulse width commanded for `position`.
    pub fn pulse_us(&self, position: Position) -> u16 {
        match position {
            Position::Left => self.left_us,
            Position::Center => self.center_us,
            Position::Right => self.right_us,
            Position::Angle(angle) => {
                let angle = angle.clamp(0, MAX_ANGLE) as u16;
                self.angle_zero_us
                    .saturating_add(angle.saturating_mul(self.us_per_degree))
            }
        }
    }
}

/// Open-loop arm servo on a PWM channel.
pub struct Servo<P> {
    pwm: P,
    config: ServoConfig,
    position: Option<Position>,
}

impl<P: SetDutyCycle> Servo<P> {
    pub fn new(pwm: P, config: ServoConfig) -> Self {
        Self {
            pwm,
            config,
            position: None,
        }
    }

    pub fn move_to(&mut self, position: Position) {
        let pulse = self.config.pulse_us(position).min(self.config.period_us);
        log::debug!("Servo {:?}: {} us", position, pulse);
        if let Err(e) = self.pwm.set_duty_cycle_fraction(pulse, self.config.period_us) {
            log::warn!("Servo PWM write failed: {:?}", e);
        }
        self.position = Some(position);
    }

    /// Last commanded position. There is no feedback from the servo.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }
}
