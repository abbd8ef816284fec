//! The guest `console` object.
//!
//! Arguments are formatted here and the finished line is handed to the host:
//! `log`/`info` through `console.print`, `warn`/`error` through
//! `console.printError`.

use crate::bindings::{JSError, JSValue};
use crate::bridge::HostBridge;
use crate::format::format_args;

/// Output stream selected by a console method.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

#[derive(Clone, Debug)]
pub struct Console {
    bridge: HostBridge,
}

impl Console {
    pub fn new(bridge: HostBridge) -> Self {
        Self { bridge }
    }

    /// # Errors
    /// Returns a host error if the sink rejects the line.
    pub fn log(&self, args: &[JSValue]) -> Result<(), JSError> {
        self.emit(ConsoleStream::Stdout, args)
    }

    /// # Errors
    /// Returns a host error if the sink rejects the line.
    pub fn info(&self, args: &[JSValue]) -> Result<(), JSError> {
        self.emit(ConsoleStream::Stdout, args)
    }

    /// # Errors
    /// Returns a host error if the sink rejects the line.
    pub fn warn(&self, args: &[JSValue]) -> Result<(), JSError> {
        self.emit(ConsoleStream::Stderr, args)
    }

    /// # Errors
    /// Returns a host error if the sink rejects the line.
    pub fn error(&self, args: &[JSValue]) -> Result<(), JSError> {
        self.emit(ConsoleStream::Stderr, args)
    }

    /// Format `args` and write the line to `stream`.
    ///
    /// # Errors
    /// Returns a host error if the sink rejects the line.
    pub fn emit(&self, stream: ConsoleStream, args: &[JSValue]) -> Result<(), JSError> {
        let function = match stream {
            ConsoleStream::Stdout => "print",
            ConsoleStream::Stderr => "printError",
        };
        self.bridge
            .call_unit("console", function, vec![JSValue::String(format_args(args))])
            .map_err(|failure| failure.into_error(JSError::Host))
    }
}
