use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

use crate::error::SorterError;

const VEML3328_ADDR: u8 = 0x10;
const REG_CONF: u8 = 0x00;
const REG_R_DATA: u8 = 0x05;
const REG_G_DATA: u8 = 0x06;
const REG_B_DATA: u8 = 0x07;

/// Shut down so the configuration can be changed safely.
const CONF_SHUTDOWN: u16 = 0x8011;
/// Enabled, gain 4x, 400 ms integration.
const CONF_ENABLE: u16 = 0x0430;
const CONF_SETTLE_US: u32 = 6_250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub fn register(self) -> u8 {
        match self {
            Channel::Red => REG_R_DATA,
            Channel::Green => REG_G_DATA,
            Channel::Blue => REG_B_DATA,
        }
    }
}

/// Raw access to the color sensor. Readings come back in sensor byte order.
#[allow(async_fn_in_trait)]
pub trait ColorBus {
    type Error: core::fmt::Debug;

    async fn read_channel(&mut self, channel: Channel) -> Result<u16, Self::Error>;
}

/// One reading per channel, sensor byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// Mean of several byte-order-corrected readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AveragedSample {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

/// Swaps the high and low byte of a sensor word.
#[inline]
pub fn byte_swap(word: u16) -> u16 {
    word.rotate_left(8)
}

async fn read_raw<B: ColorBus>(bus: &mut B) -> Result<RawSample, B::Error> {
    Ok(RawSample {
        red: bus.read_channel(Channel::Red).await?,
        green: bus.read_channel(Channel::Green).await?,
        blue: bus.read_channel(Channel::Blue).await?,
    })
}

/// Takes `num_samples` readings `interval_us` apart and returns their
/// truncated mean. No outlier rejection.
pub async fn collect<B: ColorBus, D: DelayNs>(
    bus: &mut B,
    delay: &mut D,
    num_samples: u32,
    interval_us: u32,
) -> Result<AveragedSample, SorterError> {
    if num_samples == 0 {
        return Ok(AveragedSample::default());
    }

    // u32::MAX readings of u16::MAX still fit
    let mut sums = [0u64; 3];
    for _ in 0..num_samples {
        let raw = read_raw(bus).await.map_err(|e| {
            log::error!("Color sensor read failed: {:?}", e);
            SorterError::Sensor
        })?;
        sums[0] += u64::from(byte_swap(raw.red));
        sums[1] += u64::from(byte_swap(raw.green));
        sums[2] += u64::from(byte_swap(raw.blue));
        delay.delay_us(interval_us).await;
    }

    // A mean of u16 values always fits in u16
    let n = u64::from(num_samples);
    let avg = AveragedSample {
        red: (sums[0] / n) as u16,
        green: (sums[1] / n) as u16,
        blue: (sums[2] / n) as u16,
    };
    log::debug!("Averaged sample: {:?}", avg);
    Ok(avg)
}

/// VEML3328 RGB sensor (Color 10 click).
pub struct Veml3328<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Veml3328<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub async fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), I2C::Error> {
        self.write_register(REG_CONF, CONF_SHUTDOWN).await?;
        delay.delay_us(CONF_SETTLE_US).await;
        self.write_register(REG_CONF, CONF_ENABLE).await?;
        delay.delay_us(CONF_SETTLE_US).await;
        log::info!("VEML3328 enabled");
        Ok(())
    }

    async fn write_register(&mut self, reg: u8, value: u16) -> Result<(), I2C::Error> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c.write(VEML3328_ADDR, &[reg, lo, hi]).await
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> ColorBus for Veml3328<I2C> {
    type Error = I2C::Error;

    /// The sensor sends the low byte first; the word is assembled first-byte
    /// high, which leaves it byte swapped.
    async fn read_channel(&mut self, channel: Channel) -> Result<u16, Self::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(VEML3328_ADDR, &[channel.register()], &mut buf)
            .await?;
        Ok(u16::from_be_bytes(buf))
    }
}
