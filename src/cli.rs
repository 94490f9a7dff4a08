use core::fmt::Write;

use heapless::consts::U512;
use heapless::String;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Sub-commands understood by the host dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Status,
}

/// A word the dispatcher does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand<'a>(pub &'a str);

impl Command {
    pub fn parse(word: &str) -> Result<Command, UnknownCommand<'_>> {
        match word {
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "status" => Ok(Command::Status),
            other => Err(UnknownCommand(other)),
        }
    }
}

/// Usage text for the host shell, with an optional leading complaint.
pub fn usage(reason: Option<&str>) -> String<U512> {
    let mut text = String::new();
    if let Some(reason) = reason {
        writeln!(text, "{}", reason).ok();
        writeln!(text).ok();
    }
    writeln!(text, "Pulse driver for an SPI-attached high-side switch.").ok();
    writeln!(text).ok();
    writeln!(text, "extreme_switch <command>").ok();
    writeln!(text, "  start   probe the switch and begin the periodic pulse schedule").ok();
    writeln!(text, "  stop    request a cooperative stop at the next tick").ok();
    writeln!(text, "  status  print perf counters and pulse machine state").ok();
    text
}

/// Exit code for the host dispatcher.
pub fn exit_code<T, E>(result: &Result<T, E>) -> i32 {
    if result.is_ok() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
