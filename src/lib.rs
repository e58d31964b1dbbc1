//! # logcore
//!
//! Event construction and dispatch core for a structured logging framework.
//!
//! ## Features
//!
//! - **Cheap disabled calls**: one atomic load decides whether a level is on;
//!   nothing else runs when it is not
//! - **Deferred formatting**: messages whose arguments cannot change are only
//!   rendered when a target asks for the text
//! - **Atomic reconfiguration**: configuration snapshots are swapped in
//!   without blocking logging threads
//! - **Total ordering**: every record carries a process-wide sequence id
//!
//! ## Example
//!
//! ```
//! use logcore::prelude::*;
//! use logcore::appenders::{AppenderSink, MemoryAppender};
//! use std::sync::Arc;
//!
//! let memory = MemoryAppender::new("memory");
//! let factory = LogFactory::new(Arc::new(AppenderSink::new().with_appender(memory.clone())));
//! factory.configure(
//!     LoggingConfiguration::new().with_rule(LoggingRule::new("*", LogLevel::Info).write_to("memory")),
//! )?;
//!
//! let logger = factory.get_logger("App.Billing");
//! logger.info("charged {0} cents", &[1250.into()])?;
//! logger.debug("suppressed", &[])?;
//!
//! assert_eq!(memory.len(), 1);
//! # Ok::<(), logcore::LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod macros;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    pub use crate::appenders::{AppenderSink, FileAppender, Layout, MemoryAppender};
    pub use crate::core::{
        Appender, CapturingSink, Clock, ConfigurationSnapshot, DispatchSink, FieldValue,
        FormatArg, FormatProvider, LogContext, LogFactory, LogLevel, LogRecord, Logger,
        LoggerBuilder, LoggerError, LoggerMetrics, LoggingConfiguration, LoggingRule, NullSink,
        Result, SequenceSource, StaticConfiguration, TargetChain,
    };
}

#[cfg(feature = "console")]
pub use appenders::ConsoleAppender;
pub use appenders::{AppenderSink, FileAppender, Layout, MemoryAppender};
pub use core::{
    Appender, CapturingSink, ChainHandle, Clock, ConfigurationSnapshot, DispatchSink, FieldValue,
    FormatArg, FormatError, FormatProvider, LevelGate, LogContext, LogFactory, LogLevel,
    LogRecord, Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggingConfiguration,
    LoggingRule, NullSink, RecordSource, Result, SequenceSource, StaticConfiguration, TargetChain,
};
