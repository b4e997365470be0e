//! Console control of a running watch.
//!
//! The operator ends a watch by entering `q` or an empty line. Anything
//! else is logged as a divider so related events can be visually grouped.

use std::io::BufRead;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::sink::EventSink;

/// Line logged for any input other than a quit command.
pub const DIVIDER: &str = "===============================================================";

/// Meaning of one line of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Stop watching.
    Quit,

    /// Log a divider and keep watching.
    Divider,
}

impl ControlCommand {
    /// Parse one line (without its line terminator). Case-sensitive.
    pub fn parse(line: &str) -> Self {
        match line {
            "" | "q" => Self::Quit,
            _ => Self::Divider,
        }
    }
}

/// Why the control loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlExit {
    /// The operator asked to quit.
    Quit,

    /// Input ended.
    EndOfInput,

    /// Reading input failed.
    ReadError,

    /// The watch was cancelled elsewhere.
    AlreadyCancelled,
}

/// Reads operator input and fires the cancellation token when asked to.
pub struct ControlLoop {
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl ControlLoop {
    pub fn new(sink: Arc<dyn EventSink>, cancel: CancellationToken) -> Self {
        Self { sink, cancel }
    }

    /// Run until a quit command, end of input or a read error. Blocks the
    /// calling thread; the token is cancelled before returning.
    pub fn run<R: BufRead>(&self, input: R) -> ControlExit {
        self.sink.info("Press 'q' to quit.");

        let exit = self.read_commands(input);
        if exit != ControlExit::AlreadyCancelled {
            self.sink.info("Exiting...");
        }
        self.cancel.cancel();
        exit
    }

    fn read_commands<R: BufRead>(&self, input: R) -> ControlExit {
        for line in input.lines() {
            if self.cancel.is_cancelled() {
                return ControlExit::AlreadyCancelled;
            }

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.sink.error(&format!("(err) failed to read input: {e}"));
                    return ControlExit::ReadError;
                }
            };

            match ControlCommand::parse(&line) {
                ControlCommand::Quit => return ControlExit::Quit,
                ControlCommand::Divider => self.sink.info(DIVIDER),
            }
        }

        if self.cancel.is_cancelled() {
            ControlExit::AlreadyCancelled
        } else {
            ControlExit::EndOfInput
        }
    }
}
