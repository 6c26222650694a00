//! Internal logging system for the Galaxy3D culling crate
//!
//! This module provides:
//! - Customizable logger via the Logger trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output by default
//! - File and line information for ERROR logs
//!
//! The per-frame culling path only emits TRACE entries; they are dropped
//! by the minimum severity filter held by `Engine` unless explicitly enabled.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_culling::galaxy3d::log::{Logger, LogEntry};
///
/// struct FrameStatsLogger;
///
/// impl Logger for FrameStatsLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Forward to an in-game overlay...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level (Trace, Debug, Info, Warn, Error)
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source module (e.g., "galaxy3d::Bvh", "galaxy3d::CullingSystem")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-frame culling statistics
    Trace,

    /// Diagnostics (tree balance, pyramid rebuilds)
    Debug,

    /// Important informational messages
    Info,

    /// Warning messages (potential issues)
    Warn,

    /// Rejected operations and corrupt structures (with file:line details)
    Error,
}

/// Default logger: one colored console line per entry
///
/// `[timestamp] [SEVERITY] [source] message`, with ` (file:line)`
/// appended when the entry carries a location.
pub struct DefaultLogger;

impl DefaultLogger {
    fn timestamp(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }

    fn label(severity: LogSeverity) -> &'static str {
        match severity {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    fn location(entry: &LogEntry) -> String {
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(" ({}:{})", file, line),
            _ => String::new(),
        }
    }

    /// Format an entry as a single line (without colors).
    pub fn format_plain(entry: &LogEntry) -> String {
        format!(
            "[{}] [{}] [{}] {}{}",
            Self::timestamp(entry),
            Self::label(entry.severity),
            entry.source,
            entry.message,
            Self::location(entry)
        )
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let label = Self::label(entry.severity);
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        println!(
            "[{}] [{}] [{}] {}{}",
            Self::timestamp(entry),
            severity,
            entry.source.bright_blue(),
            entry.message,
            Self::location(entry)
        );
    }
}

// ===== LOGGING MACROS =====

/// Log a message at the given severity (used by the per-level macros)
#[doc(hidden)]
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log(
            $crate::galaxy3d::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a TRACE message (per-frame statistics)
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

/// Log a DEBUG message (diagnostics)
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::galaxy3d::Engine::log_detailed(
            $crate::galaxy3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR and build the matching `Error` variant
///
/// ```ignore
/// return Err(engine_err!("galaxy3d::Bvh", InvalidOperation, "node {:?} is internal", key));
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $variant:ident, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::$variant(message)
    }};
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
