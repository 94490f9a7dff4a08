//! Hand-rolled doubles for the host-supplied peripherals.

use core::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::Microseconds;
use embedded_time::fraction::Fraction;
use embedded_time::Instant;

use crate::schedule::Schedule;

#[derive(Default)]
pub(crate) struct SpiLog {
    pub(crate) sent: Vec<u8>,
    pub(crate) reply: u8,
    pub(crate) fail_next: bool,
}

pub(crate) struct MockSpi(pub(crate) Rc<RefCell<SpiLog>>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpiFault;

impl Transfer<u8> for MockSpi {
    type Error = SpiFault;

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], SpiFault> {
        let mut log = self.0.borrow_mut();
        if log.fail_next {
            log.fail_next = false;
            return Err(SpiFault);
        }
        for word in words.iter_mut() {
            log.sent.push(*word);
            *word = log.reply;
        }
        Ok(words)
    }
}

#[derive(Default)]
pub(crate) struct MockPin {
    pub(crate) levels: Rc<RefCell<Vec<bool>>>,
}

impl OutputPin for MockPin {
    type Error = core::convert::Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

pub(crate) struct NoopDelay;

impl DelayMs<u32> for NoopDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

/// Microsecond-tick test clock advanced by hand.
#[derive(Debug)]
pub(crate) struct MockClock(Cell<u64>);

impl MockClock {
    pub(crate) fn new() -> Self {
        MockClock(Cell::new(0))
    }

    pub(crate) fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }

    pub(crate) fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1_000);
    }
}

impl embedded_time::Clock for MockClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
        Ok(Instant::new(self.0.get()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScheduleFault;

#[derive(Default)]
pub(crate) struct MockSchedule {
    pub(crate) registered: Vec<u32>,
    pub(crate) cleared: u32,
    pub(crate) fail: bool,
}

impl Schedule for MockSchedule {
    type Error = ScheduleFault;

    fn schedule_on_interval(&mut self, period: Microseconds<u32>) -> Result<(), ScheduleFault> {
        if self.fail {
            return Err(ScheduleFault);
        }
        self.registered.push(period.0);
        Ok(())
    }

    fn schedule_clear(&mut self) {
        self.registered.clear();
        self.cleared += 1;
    }
}
