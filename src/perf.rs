use core::convert::TryFrom;

use embedded_time::duration::{Generic, Microseconds};
use embedded_time::{Clock, Instant};

/// Microseconds elapsed on `clock` since `since`, if the clock is
/// readable and has not gone backwards.
pub(crate) fn elapsed_micros<C>(clock: &C, since: &Instant<C>) -> Option<u64>
where
    C: Clock,
    Microseconds<u64>: TryFrom<Generic<C::T>>,
{
    let now = clock.try_now().ok()?;
    let gap = now.checked_duration_since(since)?;
    Microseconds::<u64>::try_from(gap).ok().map(|us| us.0)
}

/// Accumulates the busy time of a bracketed unit of work.
pub struct LoopPerf<'clock, C: Clock> {
    name: &'static str,
    clock: &'clock C,
    begun: Option<Instant<C>>,
    events: u32,
    total_us: u64,
    min_us: u64,
    max_us: u64,
}

impl<'clock, C> LoopPerf<'clock, C>
where
    C: Clock,
    Microseconds<u64>: TryFrom<Generic<C::T>>,
{
    pub fn new(name: &'static str, clock: &'clock C) -> Self {
        Self {
            name,
            clock,
            begun: None,
            events: 0,
            total_us: 0,
            min_us: u64::MAX,
            max_us: 0,
        }
    }

    pub fn begin(&mut self) {
        self.begun = self.clock.try_now().ok();
    }

    pub fn end(&mut self) {
        if let Some(begun) = self.begun.take() {
            if let Some(us) = elapsed_micros(self.clock, &begun) {
                self.events += 1;
                self.total_us += us;
                self.min_us = self.min_us.min(us);
                self.max_us = self.max_us.max(us);
            }
        }
    }

    pub fn events(&self) -> u32 {
        self.events
    }

    pub fn total_us(&self) -> u64 {
        self.total_us
    }

    pub fn max_us(&self) -> u64 {
        self.max_us
    }

    pub fn log(&self) {
        if self.events == 0 {
            log::info!("{}: 0 events", self.name);
            return;
        }
        log::info!(
            "{}: {} events, {}us elapsed, {}us avg, min {}us max {}us",
            self.name,
            self.events,
            self.total_us,
            self.total_us / u64::from(self.events),
            self.min_us,
            self.max_us,
        );
    }
}

/// Counts invocations and the measured gap between them.
pub struct IntervalPerf<'clock, C: Clock> {
    name: &'static str,
    clock: &'clock C,
    last: Option<Instant<C>>,
    events: u32,
    total_gap_us: u64,
    max_gap_us: u64,
}

impl<'clock, C> IntervalPerf<'clock, C>
where
    C: Clock,
    Microseconds<u64>: TryFrom<Generic<C::T>>,
{
    pub fn new(name: &'static str, clock: &'clock C) -> Self {
        Self {
            name,
            clock,
            last: None,
            events: 0,
            total_gap_us: 0,
            max_gap_us: 0,
        }
    }

    /// Record one invocation. The event count advances even when the
    /// clock cannot be read; only the gap statistics are best-effort.
    pub fn count(&mut self) {
        self.events = self.events.saturating_add(1);
        match self.clock.try_now() {
            Ok(now) => {
                if let Some(last) = self.last.replace(now) {
                    if let Some(gap) = now.checked_duration_since(&last) {
                        if let Ok(us) = Microseconds::<u64>::try_from(gap) {
                            self.total_gap_us += us.0;
                            self.max_gap_us = self.max_gap_us.max(us.0);
                        }
                    }
                }
            }
            Err(_) => {
                self.last = None;
            }
        }
    }

    pub fn events(&self) -> u32 {
        self.events
    }

    pub fn log(&self) {
        if self.events < 2 {
            log::info!("{}: {} events", self.name, self.events);
            return;
        }
        log::info!(
            "{}: {} events, {}us avg interval, max {}us",
            self.name,
            self.events,
            self.total_gap_us / u64::from(self.events - 1),
            self.max_gap_us,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockClock;

    #[test]
    fn loop_perf_tracks_min_and_max() {
        let clock = MockClock::new();
        let mut perf = LoopPerf::new("loop", &clock);

        perf.begin();
        clock.advance_us(250);
        perf.end();

        perf.begin();
        clock.advance_us(100);
        perf.end();

        assert_eq!(perf.events(), 2);
        assert_eq!(perf.total_us(), 350);
        assert_eq!(perf.max_us(), 250);
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let clock = MockClock::new();
        let mut perf = LoopPerf::new("loop", &clock);

        perf.end();
        assert_eq!(perf.events(), 0);
    }

    #[test]
    fn interval_perf_accumulates_gaps() {
        let clock = MockClock::new();
        let mut perf = IntervalPerf::new("interval", &clock);

        perf.count();
        clock.advance_us(10_000);
        perf.count();
        clock.advance_us(20_000);
        perf.count();

        assert_eq!(perf.events(), 3);
    }
}
