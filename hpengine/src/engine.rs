/// HPEngine logging facade
///
/// The engine keeps no global state except the log sink: configuration,
/// behavior registry, world and buffers all live in an explicit
/// `EngineContext` / `Simulation` passed by reference. The simulation and
/// render threads share this one sink.

use std::sync::{OnceLock, RwLock};
use std::sync::atomic::{AtomicU8, Ordering};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger (Debug by default)
static MIN_SEVERITY: AtomicU8 = AtomicU8::new(1);

fn global_logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Process-wide logging entry point used by the `engine_*!` macros.
///
/// # Example
///
/// ```no_run
/// use hpengine::hpengine::{Engine, log::{Logger, LogEntry, LogSeverity}};
///
/// struct FileLogger;
/// impl Logger for FileLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Write to file...
///     }
/// }
///
/// Engine::set_logger(FileLogger);
/// Engine::set_min_severity(LogSeverity::Info);
/// ```
pub struct Engine;

impl Engine {
    /// Replace the default logger with a custom implementation
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = global_logger().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = global_logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop every entry below `severity` before it reaches the logger
    pub fn set_min_severity(severity: LogSeverity) {
        MIN_SEVERITY.store(severity.rank(), Ordering::Relaxed);
    }

    /// Current minimum severity
    pub fn min_severity() -> LogSeverity {
        LogSeverity::from_rank(MIN_SEVERITY.load(Ordering::Relaxed))
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    ///
    /// # Arguments
    ///
    /// * `severity` - Log severity level
    /// * `source` - Source module (e.g., "hpengine::Octree")
    /// * `message` - Log message
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(severity, source, message, None, None);
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error! macro to include source location.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(severity, source, message, Some(file), Some(line));
    }

    fn dispatch(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: Option<&'static str>,
        line: Option<u32>,
    ) {
        if severity < Self::min_severity() {
            return;
        }
        let entry = LogEntry::new(severity, source, message);
        let entry = match (file, line) {
            (Some(file), Some(line)) => entry.at(file, line),
            _ => entry,
        };
        if let Ok(lock) = global_logger().read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
