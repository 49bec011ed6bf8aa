//! Recording fakes for host tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use embedded_hal_async::delay::DelayNs;
use smart_leds::{SmartLedsWrite, RGB8};

use crate::comm::{ByteChannel, RxInterrupt};
use crate::modem::Transport;
use crate::sensor::{byte_swap, Channel, ColorBus};

/// Actuator and transport activity in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pulse(u16),
    Tx(Vec<u8>),
}

#[derive(Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<Event>>>);

impl Journal {
    fn record(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

#[derive(Clone)]
pub struct MockIrq {
    enabled: Rc<Cell<bool>>,
    disables: Rc<Cell<usize>>,
    enables: Rc<Cell<usize>>,
}

impl Default for MockIrq {
    fn default() -> Self {
        Self {
            enabled: Rc::new(Cell::new(true)),
            disables: Rc::default(),
            enables: Rc::default(),
        }
    }
}

impl MockIrq {
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn disable_count(&self) -> usize {
        self.disables.get()
    }

    pub fn enable_count(&self) -> usize {
        self.enables.get()
    }
}

impl RxInterrupt for MockIrq {
    fn disable(&mut self) {
        self.enabled.set(false);
        self.disables.set(self.disables.get() + 1);
    }

    fn enable(&mut self) {
        self.enabled.set(true);
        self.enables.set(self.enables.get() + 1);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Wait {
    Ns(u32),
    Us(u32),
    Ms(u32),
}

/// Returns immediately and remembers every wait.
#[derive(Default)]
pub struct MockDelay {
    waits: Vec<Wait>,
}

impl MockDelay {
    pub fn total_us(&self) -> u64 {
        self.waits
            .iter()
            .map(|w| match *w {
                Wait::Ns(ns) => u64::from(ns) / 1_000,
                Wait::Us(us) => u64::from(us),
                Wait::Ms(ms) => u64::from(ms) * 1_000,
            })
            .sum()
    }

    pub fn delays_ms(&self) -> Vec<u32> {
        self.waits
            .iter()
            .filter_map(|w| match *w {
                Wait::Ms(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits.push(Wait::Ns(ns));
    }

    async fn delay_us(&mut self, us: u32) {
        self.waits.push(Wait::Us(us));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits.push(Wait::Ms(ms));
    }
}

#[derive(Debug)]
pub struct BusError;

#[derive(Default)]
struct BusState {
    queued: VecDeque<(u16, u16, u16)>,
    current: (u16, u16, u16),
    reads: usize,
    failing: bool,
}

/// Color sensor serving host-order samples, byte swapped on the way out.
/// A queued sample becomes current on the next red read and stays current
/// until another is queued.
#[derive(Clone, Default)]
pub struct MockBus(Rc<RefCell<BusState>>);

impl MockBus {
    pub fn constant(red: u16, green: u16, blue: u16) -> Self {
        let bus = Self::default();
        bus.push(red, green, blue);
        bus
    }

    pub fn from_samples(samples: &[(u16, u16, u16)]) -> Self {
        let bus = Self::default();
        for &(r, g, b) in samples {
            bus.push(r, g, b);
        }
        bus
    }

    pub fn failing() -> Self {
        let bus = Self::default();
        bus.set_failing(true);
        bus
    }

    pub fn push(&self, red: u16, green: u16, blue: u16) {
        self.0.borrow_mut().queued.push_back((red, green, blue));
    }

    pub fn set_failing(&self, failing: bool) {
        self.0.borrow_mut().failing = failing;
    }

    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }
}

impl ColorBus for MockBus {
    type Error = BusError;

    async fn read_channel(&mut self, channel: Channel) -> Result<u16, Self::Error> {
        let mut state = self.0.borrow_mut();
        if state.failing {
            return Err(BusError);
        }
        state.reads += 1;
        if channel == Channel::Red {
            if let Some(next) = state.queued.pop_front() {
                state.current = next;
            }
        }
        let (r, g, b) = state.current;
        let value = match channel {
            Channel::Red => r,
            Channel::Green => g,
            Channel::Blue => b,
        };
        Ok(byte_swap(value))
    }
}

#[derive(Clone)]
pub struct MockPwm {
    max: u16,
    history: Rc<RefCell<Vec<u16>>>,
    journal: Option<Journal>,
}

impl MockPwm {
    pub fn new(max: u16) -> Self {
        Self {
            max,
            history: Rc::default(),
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn history(&self) -> Vec<u16> {
        self.history.borrow().clone()
    }
}

impl PwmErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.history.borrow_mut().push(duty);
        if let Some(journal) = &self.journal {
            journal.record(Event::Pulse(duty));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct LinkDown;

/// Channel a [`MockTransport`] answers into.
pub type EchoChannel = ByteChannel<32>;

/// Reply the fake modem pushes after every transmit.
const ECHO_REPLY: &[u8] = b"OK\r\n";

#[derive(Clone, Default)]
pub struct MockTransport {
    writes: Rc<RefCell<Vec<Vec<u8>>>>,
    journal: Option<Journal>,
    failing: bool,
    echo: Option<Rc<EchoChannel>>,
    pending: Rc<RefCell<Vec<bool>>>,
}

impl MockTransport {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Answers every transmit with `OK\r\n` on `channel`, the way the modem
    /// would, after noting whether unread bytes were still buffered.
    pub fn with_echo(mut self, channel: Rc<EchoChannel>) -> Self {
        self.echo = Some(channel);
        self
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.borrow().clone()
    }

    /// For each transmit, whether the echo channel still held data.
    pub fn pending_at_transmit(&self) -> Vec<bool> {
        self.pending.borrow().clone()
    }
}

impl Transport for MockTransport {
    type Error = LinkDown;

    async fn transmit(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.failing {
            return Err(LinkDown);
        }
        self.writes.borrow_mut().push(bytes.to_vec());
        if let Some(journal) = &self.journal {
            journal.record(Event::Tx(bytes.to_vec()));
        }
        if let Some(channel) = &self.echo {
            let pending = channel.receiver(MockIrq::default()).has_data();
            self.pending.borrow_mut().push(pending);
            for &b in ECHO_REPLY {
                channel.push(b);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockLed(Rc<RefCell<Vec<RGB8>>>);

impl MockLed {
    pub fn last(&self) -> Option<RGB8> {
        self.0.borrow().last().copied()
    }
}

impl SmartLedsWrite for MockLed {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.0
            .borrow_mut()
            .extend(iterator.into_iter().map(Into::into));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockPin(Rc<Cell<bool>>);

impl MockPin {
    pub fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl PinErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}
