use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::spi::Transfer;
use embedded_hal::digital::v2::OutputPin;

use crate::chip_select::ChipSelect;
use crate::protocol::Opcode;

/// Failure while exchanging a command byte with the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError<SpiE, PinE> {
    /// The SPI exchange failed.
    Transfer(SpiE),
    /// The chip-select line could not be driven.
    ChipSelect(PinE),
}

pub(crate) struct Bus<Spi, Pin, D>
    where Spi: Transfer<u8>,
          Pin: OutputPin,
          D: DelayMs<u32>,
{
    spi: Spi,
    cs: ChipSelect<Pin, D>,
}

impl<Spi, Pin, D> Bus<Spi, Pin, D>
    where Spi: Transfer<u8>,
          Pin: OutputPin,
          D: DelayMs<u32>,
{
    pub(crate) fn new(spi: Spi, cs: Pin, delay: D) -> Self {
        Self {
            spi,
            cs: ChipSelect::new(cs, delay),
        }
    }

    /// Clock one command byte out and return the byte clocked back.
    pub(crate) fn exchange(
        &mut self,
        opcode: Opcode,
    ) -> Result<u8, BusError<Spi::Error, Pin::Error>> {
        let asserted = self.cs.assert().map_err(BusError::ChipSelect)?;
        let mut word = [opcode.byte()];
        self.spi.transfer(&mut word).map_err(BusError::Transfer)?;
        drop(asserted);
        Ok(word[0])
    }

    pub(crate) fn release(self) -> (Spi, Pin) {
        (self.spi, self.cs.release())
    }
}
