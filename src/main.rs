#![no_std]
#![no_main]

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    gpio::{AnyPin, Input, InputConfig, Level, Output, OutputConfig, Pin, Pull},
    handler, i2c,
    ledc::{self, channel::ChannelIFace, timer::TimerIFace},
    spi,
    time::Rate,
    timer::timg::TimerGroup,
    uart::{self, RxConfig, Uart, UartInterrupt},
    Blocking,
};
use ws2812_spi::Ws2812;

use tile_sorter::comm::{ByteChannel, RxInterrupt};
use tile_sorter::config::NetworkConfig;
use tile_sorter::control::ButtonSignal;
use tile_sorter::indicator::StatusLight;
use tile_sorter::modem::Transport;
use tile_sorter::sensor::Veml3328;
use tile_sorter::{Config, Sorter};

const MODEM_BAUD: u32 = 115_200;
const SERVO_FREQ_HZ: u32 = 50;
const DEBOUNCE_MS: u64 = 20;

static RX_CHANNEL: ByteChannel = ByteChannel::new();
static MODEM_UART: Mutex<RefCell<Option<Uart<'static, Blocking>>>> =
    Mutex::new(RefCell::new(None));
static BUTTON: ButtonSignal = ButtonSignal::new();

#[handler]
fn modem_rx_handler() {
    critical_section::with(|cs| {
        let mut uart = MODEM_UART.borrow_ref_mut(cs);
        let Some(uart) = uart.as_mut() else {
            return;
        };
        let mut buf = [0u8; 16];
        while let Ok(n) = uart.read_buffered(&mut buf) {
            if n == 0 {
                break;
            }
            for &b in &buf[..n] {
                RX_CHANNEL.push(b);
            }
        }
        uart.clear_interrupts(UartInterrupt::RxFifoFull.into());
    });
}

/// Masks the modem RX FIFO interrupt.
struct ModemRxIrq;

impl RxInterrupt for ModemRxIrq {
    fn disable(&mut self) {
        critical_section::with(|cs| {
            if let Some(uart) = MODEM_UART.borrow_ref_mut(cs).as_mut() {
                uart.unlisten(UartInterrupt::RxFifoFull);
            }
        });
    }

    fn enable(&mut self) {
        critical_section::with(|cs| {
            if let Some(uart) = MODEM_UART.borrow_ref_mut(cs).as_mut() {
                uart.listen(UartInterrupt::RxFifoFull);
            }
        });
    }
}

/// Modem TX. Spins on a full TX FIFO with no timeout.
struct ModemLink;

impl Transport for ModemLink {
    type Error = uart::TxError;

    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &b in bytes {
            loop {
                let written = critical_section::with(|cs| {
                    match MODEM_UART.borrow_ref_mut(cs).as_mut() {
                        Some(uart) => uart.write(&[b]),
                        None => Ok(0),
                    }
                })?;
                if written == 1 {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[embassy_executor::task]
async fn button_task(pin: AnyPin) {
    log::info!("Starting button task");
    let mut button = Input::new(pin, InputConfig::default().with_pull(Pull::Up));
    loop {
        button.wait_for_falling_edge().await;
        Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
        if button.is_low() {
            BUTTON.signal(());
        }
    }
}

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

fn network_config() -> NetworkConfig {
    let default = NetworkConfig::default();
    NetworkConfig {
        ssid: env_or(option_env!("SORTER_WIFI_SSID"), default.ssid),
        password: env_or(option_env!("SORTER_WIFI_PASSWORD"), default.password),
        host: env_or(option_env!("SORTER_HOST"), default.host),
        port: option_env!("SORTER_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(default.port),
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();

    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_hal_embassy::init(timg0.timer0);

    let config = Config {
        network: network_config(),
        ..Config::default()
    };

    let mosi = peripherals.GPIO10;
    let scl = peripherals.GPIO8;
    let sda = peripherals.GPIO9;

    let spi = spi::master::Spi::new(
        peripherals.SPI2,
        spi::master::Config::default()
            .with_frequency(Rate::from_khz(3800))
            .with_mode(spi::Mode::_0),
    )
    .unwrap()
    .with_mosi(mosi);

    let led = Ws2812::new(spi);
    let lamp = Output::new(peripherals.GPIO5, Level::Low, OutputConfig::default());

    let i2c = i2c::master::I2c::new(
        peripherals.I2C0,
        i2c::master::Config::default().with_frequency(Rate::from_khz(100)),
    )
    .unwrap()
    .with_sda(sda)
    .with_scl(scl)
    .into_async();

    let mut delay = Delay;
    let mut sensor = Veml3328::new(i2c);
    sensor.init(&mut delay).await.unwrap();

    let mut ledc = ledc::Ledc::new(peripherals.LEDC);
    ledc.set_global_slow_clock(ledc::LSGlobalClkSource::APBClk);
    let mut lstimer0 = ledc.timer::<ledc::LowSpeed>(ledc::timer::Number::Timer0);
    lstimer0
        .configure(ledc::timer::config::Config {
            duty: ledc::timer::config::Duty::Duty14Bit,
            clock_source: ledc::timer::LSClockSource::APBClk,
            frequency: Rate::from_hz(SERVO_FREQ_HZ),
        })
        .unwrap();

    let mut servo = ledc.channel(ledc::channel::Number::Channel0, peripherals.GPIO3);
    servo
        .configure(ledc::channel::config::Config {
            timer: &lstimer0,
            duty_pct: 0,
            pin_config: ledc::channel::config::PinConfig::PushPull,
        })
        .unwrap();

    let mut uart = Uart::new(
        peripherals.UART1,
        uart::Config::default()
            .with_baudrate(MODEM_BAUD)
            .with_rx(RxConfig::default().with_fifo_full_threshold(1)),
    )
    .unwrap()
    .with_rx(peripherals.GPIO20)
    .with_tx(peripherals.GPIO21);
    uart.set_interrupt_handler(modem_rx_handler);
    uart.listen(UartInterrupt::RxFifoFull);
    critical_section::with(|cs| MODEM_UART.borrow_ref_mut(cs).replace(uart));

    spawner.spawn(button_task(peripherals.GPIO7.degrade())).unwrap();

    let mut sorter = Sorter::new(
        config,
        sensor,
        servo,
        StatusLight::new(led, lamp),
        ModemLink,
        RX_CHANNEL.receiver(ModemRxIrq),
        delay,
        &BUTTON,
    );

    if let Err(e) = sorter.start().await {
        log::error!("Modem bring-up failed: {}", e);
    }
    sorter.run().await
}
