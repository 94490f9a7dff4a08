use core::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop request cell, allocated by the host.
///
/// The driver borrows the flag and polls it at the top of every tick;
/// any other context stops the driver through a [`StopHandle`].
pub struct StopFlag {
    requested: AtomicBool,
}

impl StopFlag {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> StopHandle<'_> {
        StopHandle { flag: self }
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests a stop, honored at the next periodic tick.
#[derive(Clone, Copy)]
pub struct StopHandle<'flag> {
    flag: &'flag StopFlag,
}

impl StopHandle<'_> {
    pub fn request_stop(&self) {
        self.flag.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.is_requested()
    }
}
