//! Recording fake bus and virtual-clock delay shared by the unit tests.

use crate::frame::crc8;
use crate::hw_def::ECHO_BIT;

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::i2c::{ErrorKind, ErrorType, Operation};

pub(crate) fn temp_frame(msb: u8, lsb: u8) -> [u8; 3] {
    let lsb = lsb & !ECHO_BIT;
    [msb, lsb, crc8(&[msb, lsb])]
}

pub(crate) fn humid_frame(msb: u8, lsb: u8) -> [u8; 3] {
    let lsb = lsb | ECHO_BIT;
    [msb, lsb, crc8(&[msb, lsb])]
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum BusEvent {
    Write(Vec<u8>),
    Read(usize),
}

#[derive(Default)]
struct BusState {
    events: Vec<BusEvent>,
    responses: VecDeque<Vec<u8>>,
    stall_reads: bool,
    released: bool,
    fail_writes: bool,
    yield_after_write: bool,
    stretch: Option<(FakeDelay, u32)>,
}

/// Clones share one state, so a test keeps a handle while the driver owns another.
#[derive(Clone, Default)]
pub(crate) struct FakeBus {
    state: Arc<Mutex<BusState>>,
}

impl FakeBus {
    /// Reads never complete until [`FakeBus::release`]
    pub(crate) fn stalled() -> Self {
        let bus = Self::default();
        bus.state.lock().unwrap().stall_reads = true;
        bus
    }

    /// Writes yield to the executor once before returning
    pub(crate) fn yielding() -> Self {
        let bus = Self::default();
        bus.state.lock().unwrap().yield_after_write = true;
        bus
    }

    /// Reads complete `ms` after they start, measured on `delay`'s clock (clock stretching)
    pub(crate) fn stretching(delay: &FakeDelay, ms: u32) -> Self {
        let bus = Self::default();
        bus.state.lock().unwrap().stretch = Some((delay.clone(), ms));
        bus
    }

    pub(crate) fn respond(&self, bytes: impl AsRef<[u8]>) {
        self.state.lock().unwrap().responses.push_back(bytes.as_ref().to_vec());
    }

    pub(crate) fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    /// Unblock stalled reads; they fail instead of returning data
    pub(crate) fn release(&self) {
        self.state.lock().unwrap().released = true;
    }

    pub(crate) fn events(&self) -> Vec<BusEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub(crate) fn written(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BusEvent::Write(bytes) => Some(bytes),
                BusEvent::Read(_) => None,
            })
            .collect()
    }

    fn record_write(&self, bytes: &[u8]) -> Result<bool, ErrorKind> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(ErrorKind::Other);
        }
        state.events.push(BusEvent::Write(bytes.to_vec()));
        Ok(state.yield_after_write)
    }

    fn stalled_now(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.stall_reads && !state.released
    }

    fn stretch(&self) -> Option<(FakeDelay, u32)> {
        self.state.lock().unwrap().stretch.clone()
    }

    fn fill(&self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let mut state = self.state.lock().unwrap();
        if state.stall_reads {
            return Err(ErrorKind::Other);
        }
        let response = state.responses.pop_front().ok_or(ErrorKind::Other)?;
        buf.fill(0);
        let len = response.len().min(buf.len());
        buf[..len].copy_from_slice(&response[..len]);
        state.events.push(BusEvent::Read(buf.len()));
        Ok(())
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for FakeBus {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.record_write(bytes)?;
                }
                Operation::Read(buf) => {
                    while self.stalled_now() {
                        std::thread::sleep(Duration::from_millis(5));
                    }
                    self.fill(buf)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::i2c::I2c for FakeBus {
    async fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if self.record_write(bytes)? {
                        YieldOnce::default().await;
                    }
                }
                Operation::Read(buf) => {
                    if self.stalled_now() {
                        core::future::pending::<()>().await;
                    }
                    if let Some((delay, ms)) = self.stretch() {
                        delay.sleep_ns(ms as u64 * 1_000_000).await;
                    }
                    self.fill(buf)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Default)]
struct Clock {
    now_ns: u64,
    next_id: u64,
    /// (id, deadline) of every sleep that has been polled and not finished
    sleeping: Vec<(u64, u64)>,
}

/// Delay on a shared virtual clock.
///
/// The blocking delay adds its time at once. An async sleep registers its deadline on the first
/// poll and stays pending; on later polls the clock jumps to the earliest registered deadline.
/// Concurrent sleeps therefore finish in deadline order, and a future that is never woken by a
/// sleep (a stalled bus) just lets the clock run to the next deadline.
#[derive(Clone, Default)]
pub(crate) struct FakeDelay {
    clock: Arc<Mutex<Clock>>,
}

impl FakeDelay {
    pub(crate) fn elapsed_ms(&self) -> u64 {
        self.clock.lock().unwrap().now_ns / 1_000_000
    }

    pub(crate) fn sleep_ns(&self, ns: u64) -> Sleep {
        Sleep { clock: Arc::clone(&self.clock), ns, slot: None }
    }
}

pub(crate) struct Sleep {
    clock: Arc<Mutex<Clock>>,
    ns: u64,
    slot: Option<(u64, u64)>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = &mut *self;
        let mut clock = this.clock.lock().unwrap();
        match this.slot {
            None if this.ns == 0 => return Poll::Ready(()),
            None => {
                let id = clock.next_id;
                clock.next_id += 1;
                let deadline = clock.now_ns + this.ns;
                clock.sleeping.push((id, deadline));
                this.slot = Some((id, deadline));
            }
            Some((id, deadline)) => {
                if let Some(next) = clock.sleeping.iter().map(|&(_, d)| d).min() {
                    clock.now_ns = clock.now_ns.max(next);
                }
                if clock.now_ns >= deadline {
                    clock.sleeping.retain(|&(other, _)| other != id);
                    this.slot = None;
                    return Poll::Ready(());
                }
            }
        }
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some((id, _)) = self.slot.take() {
            if let Ok(mut clock) = self.clock.lock() {
                clock.sleeping.retain(|&(other, _)| other != id);
            }
        }
    }
}

impl embedded_hal::delay::DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.lock().unwrap().now_ns += ns as u64;
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.sleep_ns(ns as u64).await;
    }
}

#[cfg(all(test, feature = "async"))]
mod tests {
    use super::*;

    use embassy_futures::{block_on, join::join, select::{Either, select}};

    #[test]
    fn sleeps_finish_in_deadline_order() {
        let delay = FakeDelay::default();
        let short = async {
            delay.sleep_ns(100_000_000).await;
            delay.elapsed_ms()
        };
        let long = async {
            delay.sleep_ns(300_000_000).await;
            delay.elapsed_ms()
        };
        assert_eq!(block_on(join(long, short)), (300, 100));
        assert_eq!(delay.elapsed_ms(), 300);
    }

    #[test]
    fn sleep_is_pending_until_the_clock_reaches_it() {
        let delay = FakeDelay::default();
        let race = select(YieldOnce::default(), delay.sleep_ns(1_000_000));
        assert!(matches!(block_on(race), Either::First(())));
        assert_eq!(delay.elapsed_ms(), 0);
    }

    #[test]
    fn dropped_sleep_does_not_move_the_clock() {
        let delay = FakeDelay::default();
        block_on(select(delay.sleep_ns(50_000_000), delay.sleep_ns(2_000_000_000)));
        assert_eq!(delay.elapsed_ms(), 50);
        block_on(delay.sleep_ns(10_000_000));
        assert_eq!(delay.elapsed_ms(), 60);
    }
}
