//! Sinks for guest console output.

use std::io::{self, Write as _};

use log::{debug, error, info, warn};

/// Log severity levels understood by the host logger.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Cross-runtime logger used by the `console` namespace.
pub trait HostLogger: Send + Sync {
    /// Emit one already formatted console line.
    fn log(&self, level: LogLevel, message: &str);
}

/// Writes `Debug`/`Info` lines to stdout and `Warn`/`Error` lines to stderr.
pub struct StdoutLogger;

impl HostLogger for StdoutLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let written = match level {
            LogLevel::Debug | LogLevel::Info => writeln!(io::stdout().lock(), "{message}"),
            LogLevel::Warn | LogLevel::Error => writeln!(io::stderr().lock(), "{message}"),
        };
        if let Err(write_error) = written {
            warn!("console sink write failed: {write_error}");
        }
    }
}

/// Routes console lines through the `log` facade.
pub struct ConsoleLogger;

impl HostLogger for ConsoleLogger {
    #[inline]
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!("[JS]: {message}"),
            LogLevel::Info => info!("[JS]: {message}"),
            LogLevel::Warn => warn!("[JS]: {message}"),
            LogLevel::Error => error!("[JS]: {message}"),
        }
    }
}
