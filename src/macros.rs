//! Logging macros that skip argument evaluation for disabled levels.
//!
//! Each macro checks the logger's level flag first. Only when the level is
//! enabled are the argument expressions evaluated and converted into
//! [`FormatArg`](crate::core::FormatArg)s. Every macro evaluates to
//! `logcore::Result<()>`.
//!
//! # Examples
//!
//! ```
//! use logcore::prelude::*;
//! use logcore::info;
//! use std::sync::Arc;
//!
//! let logger = Logger::builder("Server")
//!     .sink(Arc::new(NullSink))
//!     .configuration(StaticConfiguration::from_min_level(LogLevel::Info, TargetChain::new(["console"])))
//!     .build();
//!
//! // Plain message
//! info!(logger, "Server started")?;
//!
//! // Positional placeholders
//! let port = 8080;
//! info!(logger, "Server listening on port {0}", port)?;
//!
//! let user_id = 42;
//! let action = "login";
//! info!(logger, "User {0} performed action: {1}", user_id, action)?;
//! # Ok::<(), logcore::LoggerError>(())
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use logcore::prelude::*;
/// # let logger = Logger::new("App", std::sync::Arc::new(NullSink));
/// use logcore::log;
/// log!(logger, LogLevel::Info, "Simple message")?;
/// log!(logger, LogLevel::Error, "Error code: {0}", 500)?;
/// # Ok::<(), logcore::LoggerError>(())
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.log_args(level, $template, ::std::vec![$($crate::core::FormatArg::from($arg)),*])
        } else {
            ::std::result::Result::<(), $crate::LoggerError>::Ok(())
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use logcore::prelude::*;
/// # let logger = Logger::new("App", std::sync::Arc::new(NullSink));
/// use logcore::trace;
/// trace!(logger, "Entering function: calculate()")?;
/// trace!(logger, "Variable value: {0}", 42)?;
/// # Ok::<(), logcore::LoggerError>(())
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use logcore::prelude::*;
/// # let logger = Logger::new("App", std::sync::Arc::new(NullSink));
/// use logcore::warn;
/// warn!(logger, "Low disk space")?;
/// warn!(logger, "Retry attempt {0} of {1}", 3, 5)?;
/// # Ok::<(), logcore::LoggerError>(())
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
