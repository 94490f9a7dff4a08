use embedded_time::duration::Microseconds;

/// Work-queue registration surface supplied by the host.
///
/// The driver registers its periodic callback here during init and
/// clears the registration when a stop request is observed.
pub trait Schedule {
    type Error;

    /// Arrange for the driver's `run` to be invoked every `period`.
    fn schedule_on_interval(&mut self, period: Microseconds<u32>) -> Result<(), Self::Error>;

    /// Drop the periodic registration.
    fn schedule_clear(&mut self);
}
