use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;

// Settle time between asserting CS and clocking the first bit.
const SETTLE_MS: u32 = 1;

/// Chip-select line for the switch. The pin is expected deasserted
/// (high) when handed over.
pub(crate) struct ChipSelect<Pin, D>
    where Pin: OutputPin,
          D: DelayMs<u32>,
{
    pin: Pin,
    delay: D,
}

impl<Pin, D> ChipSelect<Pin, D>
    where Pin: OutputPin,
          D: DelayMs<u32>,
{
    pub(crate) fn new(pin: Pin, delay: D) -> Self {
        Self { pin, delay }
    }

    /// Assert the line and let it settle. The guard deasserts on drop.
    pub(crate) fn assert(&mut self) -> Result<Asserted<'_, Pin, D>, Pin::Error> {
        self.pin.set_low()?;
        self.delay.delay_ms(SETTLE_MS);
        Ok(Asserted { cs: self })
    }

    pub(crate) fn release(self) -> Pin {
        self.pin
    }
}

pub(crate) struct Asserted<'cs, Pin, D>
    where Pin: OutputPin,
          D: DelayMs<u32>,
{
    cs: &'cs mut ChipSelect<Pin, D>,
}

impl<Pin, D> Drop for Asserted<'_, Pin, D>
    where Pin: OutputPin,
          D: DelayMs<u32>,
{
    fn drop(&mut self) {
        self.cs.pin.set_high().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockPin, NoopDelay};

    #[test]
    fn guard_frames_the_assertion() {
        let pin = MockPin::default();
        let levels = pin.levels.clone();

        let mut cs = ChipSelect::new(pin, NoopDelay);
        {
            let _asserted = cs.assert().unwrap();
            assert_eq!(*levels.borrow(), [false]);
        }
        assert_eq!(*levels.borrow(), [false, true]);
    }
}
