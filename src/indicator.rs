use embedded_hal::digital::OutputPin;
use smart_leds::{SmartLedsWrite, RGB8};

/// Indicator color while sorting.
pub const ACTIVE: RGB8 = RGB8 {
    r: 128,
    g: 128,
    b: 128,
};
pub const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// WS2812 status LED plus the sensor illumination lamp.
pub struct StatusLight<W, P> {
    led: W,
    lamp: P,
}

impl<W, P> StatusLight<W, P>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
    P: OutputPin,
{
    pub fn new(led: W, lamp: P) -> Self {
        Self { led, lamp }
    }

    pub fn set_color(&mut self, r: u8, g: u8, b: u8) {
        if let Err(e) = self.led.write([RGB8::new(r, g, b)]) {
            log::warn!("Status LED write failed: {:?}", e);
        }
    }

    pub fn set_lamp(&mut self, on: bool) {
        let res = if on {
            self.lamp.set_high()
        } else {
            self.lamp.set_low()
        };
        if let Err(e) = res {
            log::warn!("Lamp write failed: {:?}", e);
        }
    }

    pub fn active(&mut self) {
        self.set_color(ACTIVE.r, ACTIVE.g, ACTIVE.b);
        self.set_lamp(true);
    }

    pub fn off(&mut self) {
        self.set_lamp(false);
        self.set_color(OFF.r, OFF.g, OFF.b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockLed, MockPin};

    #[test]
    fn active_then_off() {
        let led = MockLed::default();
        let lamp = MockPin::default();
        let mut light = StatusLight::new(led.clone(), lamp.clone());

        light.active();
        assert_eq!(led.last(), Some(ACTIVE));
        assert!(lamp.is_high());

        light.off();
        assert_eq!(led.last(), Some(OFF));
        assert!(!lamp.is_high());
    }
}
