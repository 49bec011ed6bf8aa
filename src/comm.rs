use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Receive buffer size used by the firmware.
pub const RX_BUFFER_SIZE: usize = 128;

/// Fixed-capacity byte ring.
///
/// One slot is always left empty so `head == tail` means empty and
/// `head + 1 == tail` means full; a full ring holds `N - 1` bytes.
pub struct RingBuffer<const N: usize> {
    storage: [u8; N],
    head: usize,
    tail: usize,
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            storage: [0; N],
            head: 0,
            tail: 0,
        }
    }

    /// Stores `byte` at the head. Returns `false` and drops the byte if the
    /// ring is full; unread data is never overwritten.
    pub fn push(&mut self, byte: u8) -> bool {
        let next = (self.head + 1) % N;
        if next == self.tail {
            return false;
        }
        self.storage[self.head] = byte;
        self.head = next;
        true
    }

    /// Copies bytes from the tail into `dest` until the ring is empty, a
    /// `\n` has been copied, or `dest.len() - 1` bytes have been copied. The
    /// byte after the content is set to 0. Returns the content length.
    pub fn pop_line(&mut self, dest: &mut [u8]) -> usize {
        if dest.is_empty() {
            return 0;
        }

        let mut count = 0;
        while count < dest.len() - 1 && self.head != self.tail {
            let c = self.storage[self.tail];
            self.tail = (self.tail + 1) % N;
            dest[count] = c;
            count += 1;
            if c == b'\n' {
                break;
            }
        }
        dest[count] = 0;
        count
    }

    pub fn has_data(&self) -> bool {
        self.head != self.tail
    }

    pub fn len(&self) -> usize {
        (self.head + N - self.tail) % N
    }

    pub fn is_empty(&self) -> bool {
        !self.has_data()
    }

    /// Rewinds both indices and zeroes the storage.
    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.storage.fill(0);
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Mask for the interrupt that feeds a [`ByteChannel`].
///
/// The consumer masks the source for as long as it holds an [`RxGuard`].
pub trait RxInterrupt {
    fn disable(&mut self);
    fn enable(&mut self);
}

/// Receive channel shared between the UART interrupt (producer) and the
/// control loop (consumer). Can live in a `static`.
pub struct ByteChannel<const N: usize = RX_BUFFER_SIZE> {
    ring: Mutex<CriticalSectionRawMutex, RefCell<RingBuffer<N>>>,
}

impl<const N: usize> ByteChannel<N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Producer side, called from interrupt context. A byte arriving while
    /// the ring is full is dropped silently.
    pub fn push(&self, byte: u8) {
        self.ring.lock(|ring| {
            ring.borrow_mut().push(byte);
        });
    }

    /// Consumer endpoint. `irq` masks the interrupt that calls [`Self::push`].
    pub fn receiver<I: RxInterrupt>(&self, irq: I) -> Receiver<'_, I, N> {
        Receiver { channel: self, irq }
    }
}

impl<const N: usize> Default for ByteChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer end of a [`ByteChannel`]. Every access goes through [`RxGuard`].
pub struct Receiver<'a, I: RxInterrupt, const N: usize = RX_BUFFER_SIZE> {
    channel: &'a ByteChannel<N>,
    irq: I,
}

impl<'a, I: RxInterrupt, const N: usize> Receiver<'a, I, N> {
    /// Masks the receive interrupt until the returned guard is dropped.
    pub fn lock(&mut self) -> RxGuard<'_, I, N> {
        self.irq.disable();
        RxGuard {
            ring: &self.channel.ring,
            irq: &mut self.irq,
        }
    }

    pub fn has_data(&mut self) -> bool {
        self.lock().has_data()
    }

    /// Discards everything buffered so far.
    pub fn reset(&mut self) {
        self.lock().reset();
    }
}

/// Exclusive consumer access. The receive interrupt is unmasked again when
/// the guard goes out of scope, on every path.
pub struct RxGuard<'g, I: RxInterrupt, const N: usize> {
    ring: &'g Mutex<CriticalSectionRawMutex, RefCell<RingBuffer<N>>>,
    irq: &'g mut I,
}

impl<I: RxInterrupt, const N: usize> RxGuard<'_, I, N> {
    fn with<R>(&self, f: impl FnOnce(&mut RingBuffer<N>) -> R) -> R {
        self.ring.lock(|ring| f(&mut ring.borrow_mut()))
    }

    pub fn has_data(&self) -> bool {
        self.with(|ring| ring.has_data())
    }

    /// See [`RingBuffer::pop_line`].
    pub fn pop_line(&mut self, dest: &mut [u8]) -> usize {
        self.with(|ring| ring.pop_line(dest))
    }

    /// Pops lines into `out` until the ring is empty or `out` is full.
    pub fn drain<const M: usize>(&mut self, out: &mut heapless::Vec<u8, M>) {
        let mut line = [0u8; N];
        loop {
            let room = (M - out.len()).min(N - 1);
            if room == 0 {
                break;
            }
            let n = self.pop_line(&mut line[..=room]);
            if n == 0 {
                break;
            }
            // `room` bounds `n`, so this cannot overflow
            let _ = out.extend_from_slice(&line[..n]);
        }
    }

    pub fn reset(&mut self) {
        self.with(|ring| ring.reset());
    }
}

impl<I: RxInterrupt, const N: usize> Drop for RxGuard<'_, I, N> {
    fn drop(&mut self) {
        self.irq.enable();
    }
}
