use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::timer::CountDown;
use embedded_time::duration::{Duration, Milliseconds};

use nb::block;

/// Bridges a HAL countdown timer into the blocking delay consumed by
/// the chip-select settle logic.
pub struct TickDelay<CD>
    where
        CD: CountDown,
        CD::Time: Duration + From<Milliseconds>,
{
    timer: CD,
}

impl<CD> TickDelay<CD>
    where
        CD: CountDown,
        CD::Time: Duration + From<Milliseconds>,
{
    pub fn new(timer: CD) -> Self {
        Self { timer }
    }
}

impl<CD> DelayMs<u32> for TickDelay<CD>
    where
        CD: CountDown,
        CD::Time: Duration + From<Milliseconds>,
{
    fn delay_ms(&mut self, ms: u32) {
        self.timer.start(Milliseconds(ms));
        let _ = block!(self.timer.wait());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void::Void;

    struct CountdownSpy {
        started: Option<Milliseconds<u32>>,
        pending: u32,
        polls: u32,
    }

    impl CountDown for CountdownSpy {
        type Time = Milliseconds<u32>;

        fn start<T>(&mut self, count: T)
        where
            T: Into<Self::Time>,
        {
            self.started = Some(count.into());
            self.pending = 2;
        }

        fn wait(&mut self) -> nb::Result<(), Void> {
            self.polls += 1;
            if self.pending == 0 {
                Ok(())
            } else {
                self.pending -= 1;
                Err(nb::Error::WouldBlock)
            }
        }
    }

    #[test]
    fn blocks_until_the_timer_fires() {
        let mut delay = TickDelay::new(CountdownSpy {
            started: None,
            pending: 0,
            polls: 0,
        });

        delay.delay_ms(3);

        assert_eq!(delay.timer.started, Some(Milliseconds(3u32)));
        assert_eq!(delay.timer.polls, 3);
    }
}
