//! Error types for the HPEngine core
//!
//! This module defines the error types used throughout the engine,
//! including buffer construction, configuration, deferred commands and
//! entity behaviors.

use std::fmt;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// HPEngine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Invalid argument passed to a constructor or an operation
    InvalidArgument(String),

    /// Initialization failed (engine context, configuration)
    InitializationFailed(String),

    /// A deferred command failed while a command queue was flushed
    CommandFailed(String),

    /// An entity behavior failed during init or update
    BehaviorFailed(String),

    /// Render backend error (reported by a Drawer)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CommandFailed(msg) => write!(f, "Command failed: {}", msg),
            Error::BehaviorFailed(msg) => write!(f, "Behavior failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR and build an `Error::InvalidArgument` from the same message.
///
/// # Example
///
/// ```ignore
/// let slot = slots.get(i).ok_or_else(|| engine_err!("hpengine::Buffer", "no slot {}", i))?;
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::hpengine::Error::InvalidArgument(message)
    }};
}

/// Log an ERROR and return early with an `Error::InvalidArgument`.
///
/// # Example
///
/// ```ignore
/// if size <= 0.0 {
///     engine_bail!("hpengine::Octree", "size must be positive, got {}", size);
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
