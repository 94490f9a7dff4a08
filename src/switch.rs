use core::convert::TryFrom;
use core::fmt::Write;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;
use embedded_time::duration::{Generic, Microseconds, Milliseconds};
use embedded_time::{Clock, Instant};
use heapless::consts::U128;
use heapless::String;

use crate::bus::{Bus, BusError};
use crate::perf::{IntervalPerf, LoopPerf};
use crate::protocol::{Opcode, StatusByte};
use crate::pulse::{wait_over, Cadence, ClockFault, PulseState, Step};
use crate::schedule::Schedule;
use crate::signal::StopFlag;

/// Driver-level knobs. The SPI peripheral itself (bus, device
/// address, clock frequency, mode) is configured by the host HAL
/// before it is handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchConfig {
    /// Work-queue invocation period.
    pub period: Microseconds<u32>,
    /// Spacing between the status query and the activate pulse.
    pub settle: Milliseconds<u32>,
    /// How long the switch is held on before deactivation.
    pub on_hold: Milliseconds<u32>,
    pub cadence: Cadence,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            period: Microseconds(10_000u32),
            settle: Milliseconds(500u32),
            on_hold: Milliseconds(100u32),
            cadence: Cadence::Repeat,
        }
    }
}

/// Startup failure. Nothing is left scheduled when init fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError<SchedE, SpiE, PinE> {
    /// The probe exchange against the status register failed.
    Bus(BusError<SpiE, PinE>),
    /// The host scheduler refused the periodic registration.
    Schedule(SchedE),
}

/// Failure inside a periodic tick. The pulse cycle is aborted back to
/// idle; whether to keep ticking is the caller's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunError<SpiE, PinE> {
    Bus(BusError<SpiE, PinE>),
    /// The clock could not time a spacing window.
    Clock,
}

/// Snapshot of the driver's diagnostic state. Producing one never
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub state: &'static str,
    /// Periodic invocations observed so far.
    pub ticks: u32,
    /// Completed pulse cycles.
    pub cycles: u32,
    pub busy_total_us: u64,
    pub busy_max_us: u64,
    /// Last byte read back from the output-control register.
    pub last_status: Option<u8>,
}

impl Status {
    /// One-line rendering for hosts without a logger.
    pub fn summary(&self) -> String<U128> {
        let mut line = String::new();
        write!(
            line,
            "state={} ticks={} cycles={}",
            self.state, self.ticks, self.cycles
        )
        .ok();
        if let Some(ocr) = self.last_status {
            write!(line, " ocr={:#04x}", ocr).ok();
        }
        line
    }
}

/// Driver for the SPI-attached high-side switch.
///
/// The host work queue calls [`Switch::run`] every
/// [`SwitchConfig::period`]; each call advances the pulse sequence by
/// at most one step and returns without blocking on the spacing
/// windows.
pub struct Switch<'host, Spi, Pin, D, C>
    where Spi: Transfer<u8>,
          Pin: OutputPin,
          D: DelayMs<u32>,
          C: Clock,
{
    bus: Bus<Spi, Pin, D>,
    clock: &'host C,
    stop: &'host StopFlag,
    config: SwitchConfig,
    state: PulseState<C>,
    loop_perf: LoopPerf<'host, C>,
    interval_perf: IntervalPerf<'host, C>,
    cycles: u32,
    last_status: Option<StatusByte>,
}

impl<'host, Spi, Pin, D, C> Switch<'host, Spi, Pin, D, C>
    where Spi: Transfer<u8>,
          Pin: OutputPin,
          D: DelayMs<u32>,
          C: Clock,
          Microseconds<u64>: TryFrom<Generic<C::T>>,
{
    /// Wire the driver up. Nothing touches the bus until [`init`].
    ///
    /// [`init`]: Switch::init
    pub fn new(
        spi: Spi,
        cs: Pin,
        delay: D,
        clock: &'host C,
        stop: &'host StopFlag,
        config: SwitchConfig,
    ) -> Self {
        Self {
            bus: Bus::new(spi, cs, delay),
            clock,
            stop,
            config,
            state: PulseState::Idle,
            loop_perf: LoopPerf::new("switch loop", clock),
            interval_perf: IntervalPerf::new("switch interval", clock),
            cycles: 0,
            last_status: None,
        }
    }

    /// Construct and initialize in one go. On failure the instance is
    /// dropped, leaving no live driver and nothing scheduled.
    pub fn start<S: Schedule>(
        spi: Spi,
        cs: Pin,
        delay: D,
        clock: &'host C,
        stop: &'host StopFlag,
        config: SwitchConfig,
        schedule: &mut S,
    ) -> Result<Self, InitError<S::Error, Spi::Error, Pin::Error>> {
        let mut switch = Self::new(spi, cs, delay, clock, stop, config);
        switch.init(schedule)?;
        Ok(switch)
    }

    /// Probe the switch and register the periodic callback.
    pub fn init<S: Schedule>(
        &mut self,
        schedule: &mut S,
    ) -> Result<(), InitError<S::Error, Spi::Error, Pin::Error>> {
        let ocr = match self.bus.exchange(Opcode::Query) {
            Ok(ocr) => ocr,
            Err(e) => {
                log::error!("switch probe failed");
                return Err(InitError::Bus(e));
            }
        };
        self.last_status = Some(StatusByte(ocr));

        schedule
            .schedule_on_interval(self.config.period)
            .map_err(InitError::Schedule)?;
        log::info!("extreme switch ready, period {}us", self.config.period.0);
        Ok(())
    }

    /// The periodic callback. Observes the stop flag first; otherwise
    /// advances the pulse sequence by at most one step.
    pub fn run<S: Schedule>(
        &mut self,
        schedule: &mut S,
    ) -> Result<Step, RunError<Spi::Error, Pin::Error>> {
        if self.state.is_stopped() {
            return Ok(Step::Stopped);
        }
        if self.stop.is_requested() {
            schedule.schedule_clear();
            self.state = PulseState::Stopped;
            log::info!("stop requested, periodic schedule cleared");
            return Ok(Step::Stopped);
        }

        self.interval_perf.count();
        self.loop_perf.begin();
        let step = self.advance();
        self.loop_perf.end();
        step
    }

    fn advance(&mut self) -> Result<Step, RunError<Spi::Error, Pin::Error>> {
        match self.state {
            PulseState::Idle => {
                self.state = PulseState::Query;
                Ok(Step::Advanced)
            }
            PulseState::Query => {
                let ocr = self.exchange(Opcode::Query)?;
                self.last_status = Some(StatusByte(ocr));
                log::debug!("ocr {:#04x}", ocr);
                let since = self.now()?;
                self.state = PulseState::SettleWait { since };
                Ok(Step::Queried(StatusByte(ocr)))
            }
            PulseState::SettleWait { since } => {
                self.poll_wait(since, self.config.settle, PulseState::Activate)
            }
            PulseState::Activate => {
                let ack = self.exchange(Opcode::Activate)?;
                log::debug!("activate ack {:#04x}", ack);
                let since = self.now()?;
                self.state = PulseState::HoldWait { since };
                Ok(Step::Activated)
            }
            PulseState::HoldWait { since } => {
                self.poll_wait(since, self.config.on_hold, PulseState::Deactivate)
            }
            PulseState::Deactivate => {
                let ack = self.exchange(Opcode::Deactivate)?;
                log::debug!("deactivate ack {:#04x}", ack);
                self.cycles = self.cycles.saturating_add(1);
                self.state = match self.config.cadence {
                    Cadence::Repeat => PulseState::Idle,
                    Cadence::OneShot => PulseState::Done,
                };
                Ok(Step::Deactivated)
            }
            PulseState::Done => Ok(Step::Quiescent),
            PulseState::Stopped => Ok(Step::Stopped),
        }
    }

    fn exchange(&mut self, opcode: Opcode) -> Result<u8, RunError<Spi::Error, Pin::Error>> {
        match self.bus.exchange(opcode) {
            Ok(byte) => Ok(byte),
            Err(e) => {
                log::warn!("transfer failed, pulse cycle aborted");
                self.state = PulseState::Idle;
                Err(RunError::Bus(e))
            }
        }
    }

    fn now(&mut self) -> Result<Instant<C>, RunError<Spi::Error, Pin::Error>> {
        match self.clock.try_now() {
            Ok(now) => Ok(now),
            Err(_) => {
                self.state = PulseState::Idle;
                Err(RunError::Clock)
            }
        }
    }

    fn poll_wait(
        &mut self,
        since: Instant<C>,
        window: Milliseconds<u32>,
        next: PulseState<C>,
    ) -> Result<Step, RunError<Spi::Error, Pin::Error>> {
        match wait_over(self.clock, &since, window) {
            Ok(()) => {
                self.state = next;
                Ok(Step::Advanced)
            }
            Err(nb::Error::WouldBlock) => Ok(Step::Waiting),
            Err(nb::Error::Other(ClockFault)) => {
                self.state = PulseState::Idle;
                Err(RunError::Clock)
            }
        }
    }

    pub fn status(&self) -> Status {
        Status {
            state: self.state.label(),
            ticks: self.interval_perf.events(),
            cycles: self.cycles,
            busy_total_us: self.loop_perf.total_us(),
            busy_max_us: self.loop_perf.max_us(),
            last_status: self.last_status.map(|s| s.0),
        }
    }

    /// Emit both perf counters and the machine state through `log`.
    pub fn log_status(&self) {
        self.loop_perf.log();
        self.interval_perf.log();
        log::info!("{}", self.status().summary().as_str());
    }

    /// Tear the driver down, handing the SPI handle and chip-select
    /// pin back to the host.
    pub fn release(self) -> (Spi, Pin) {
        self.bus.release()
    }
}
