//! Log entries, severities and the default console sink
//!
//! Every entry records the thread it was emitted from: the simulation and
//! the render thread share one sink, and the thread name is usually the
//! first thing needed to read an interleaved log. Loggers must therefore be
//! `Send + Sync`.
//!
//! The `engine_*!` macros are the intended way to log; they go through
//! `Engine::log` and its severity threshold.

use colored::*;
use std::thread;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for log entries.
///
/// # Example
///
/// ```no_run
/// use hpengine::hpengine::log::{Logger, LogEntry};
///
/// struct FrameLog(std::sync::Mutex<Vec<String>>);
///
/// impl Logger for FrameLog {
///     fn log(&self, entry: &LogEntry) {
///         if let Ok(mut lines) = self.0.lock() {
///             lines.push(entry.message.clone());
///         }
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One log record.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Subsystem tag, e.g. "hpengine::Octree"
    pub source: String,
    pub message: String,
    /// Name of the emitting thread, if it has one
    pub thread: Option<String>,
    /// Call site (engine_error! only)
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

impl LogEntry {
    /// Entry stamped now, on the current thread, without a call site.
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            thread: thread::current().name().map(str::to_string),
            file: None,
            line: None,
        }
    }

    /// Attach the call site.
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// `file:line` if the entry has a call site.
    pub fn location(&self) -> Option<String> {
        match (self.file, self.line) {
            (Some(file), Some(line)) => Some(format!("{}:{}", file, line)),
            _ => None,
        }
    }
}

/// Log severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-swap / per-command chatter (filtered out by default)
    Trace,
    Debug,
    Info,
    Warn,
    /// Logged with the call site
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console sink.
    pub fn label(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }

    /// Numeric rank, used to store the global threshold in an atomic.
    pub(crate) fn rank(self) -> u8 {
        self as u8
    }

    /// Inverse of [`rank`](Self::rank). Out-of-range values clamp to `Error`.
    pub(crate) fn from_rank(rank: u8) -> Self {
        match rank {
            0 => LogSeverity::Trace,
            1 => LogSeverity::Debug,
            2 => LogSeverity::Info,
            3 => LogSeverity::Warn,
            _ => LogSeverity::Error,
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        }
    }
}

/// Console sink.
///
/// Line layout: `[timestamp] [SEVERITY] [thread] [source] message (file:line)`.
/// The thread and location parts are omitted when unknown. Warn and Error go
/// to stderr, the rest to stdout.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Uncolored rendering of an entry.
    pub fn format_line(entry: &LogEntry) -> String {
        Self::render(entry, entry.severity.label().normal(), entry.source.normal())
    }

    fn render(entry: &LogEntry, severity: ColoredString, source: ColoredString) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!("[{}] [{}] ", datetime.format("%Y-%m-%d %H:%M:%S%.3f"), severity);
        if let Some(thread) = &entry.thread {
            line.push_str(&format!("[{}] ", thread));
        }
        line.push_str(&format!("[{}] {}", source, entry.message));
        if let Some(location) = entry.location() {
            line.push_str(&format!(" ({})", location));
        }
        line
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let line = Self::render(entry, entry.severity.colored_label(), entry.source.bright_blue());
        if entry.severity >= LogSeverity::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

// ===== LOGGING MACROS =====

/// Shared body of the severity macros.
#[doc(hidden)]
#[macro_export]
macro_rules! engine_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::hpengine::Engine::log(
            $crate::hpengine::log::LogSeverity::$severity,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log at TRACE.
///
/// ```ignore
/// engine_trace!("hpengine::TripleBuffer", "swap refused (staging {} < read {})", a, b);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Trace, $source, $($arg)*) };
}

/// Log at DEBUG.
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Debug, $source, $($arg)*) };
}

/// Log at INFO.
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Info, $source, $($arg)*) };
}

/// Log at WARN.
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => { $crate::engine_log!(Warn, $source, $($arg)*) };
}

/// Log at ERROR, recording the call site.
///
/// ```ignore
/// engine_error!("hpengine::Behavior", "init failed: {}", error);
/// ```
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::hpengine::Engine::log_detailed(
            $crate::hpengine::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
