use core::convert::TryFrom;

use embedded_time::duration::{Generic, Microseconds, Milliseconds};
use embedded_time::{Clock, Instant};

use crate::perf::elapsed_micros;
use crate::protocol::StatusByte;

/// How the pulse sequence recycles after the deactivate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Start the next cycle on the tick after deactivation.
    Repeat,
    /// Run a single cycle, then stay quiescent until stopped.
    OneShot,
}

/// What a single periodic tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine moved between steps without touching the bus.
    Advanced,
    /// A spacing window is still open; nothing was issued.
    Waiting,
    /// The output-control register was queried.
    Queried(StatusByte),
    /// The activate command was clocked out.
    Activated,
    /// The deactivate command was clocked out, completing the cycle.
    Deactivated,
    /// A one-shot cycle already finished; there is nothing to do.
    Quiescent,
    /// The stop request was honored; the machine is terminal.
    Stopped,
}

/// The clock failed while timing a spacing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockFault;

pub(crate) enum PulseState<C: Clock> {
    Idle,
    Query,
    SettleWait { since: Instant<C> },
    Activate,
    HoldWait { since: Instant<C> },
    Deactivate,
    Done,
    Stopped,
}

impl<C: Clock> PulseState<C> {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            PulseState::Idle => "idle",
            PulseState::Query => "query",
            PulseState::SettleWait { .. } => "settle-wait",
            PulseState::Activate => "activate",
            PulseState::HoldWait { .. } => "hold-wait",
            PulseState::Deactivate => "deactivate",
            PulseState::Done => "done",
            PulseState::Stopped => "stopped",
        }
    }

    pub(crate) fn is_stopped(&self) -> bool {
        matches!(self, PulseState::Stopped)
    }
}

/// `WouldBlock` until `window` has elapsed since `since`.
pub(crate) fn wait_over<C>(
    clock: &C,
    since: &Instant<C>,
    window: Milliseconds<u32>,
) -> nb::Result<(), ClockFault>
where
    C: Clock,
    Microseconds<u64>: TryFrom<Generic<C::T>>,
{
    let elapsed = elapsed_micros(clock, since).ok_or(nb::Error::Other(ClockFault))?;
    if elapsed >= u64::from(window.0) * 1_000 {
        Ok(())
    } else {
        Err(nb::Error::WouldBlock)
    }
}
