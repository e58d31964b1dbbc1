//! Core logger types and traits

pub mod appender;
pub mod clock;
pub mod configuration;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod format;
pub mod level_gate;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod rules;
pub mod sequence;

pub use appender::Appender;
pub use clock::{Clock, ManualClock, SystemClock};
pub use configuration::{
    ChainHandle, ConfigurationSnapshot, StaticConfiguration, StaticConfigurationBuilder,
    TargetChain,
};
pub use dispatch::{CapturingSink, DispatchSink, Dispatched, NullSink};
pub use error::{FormatError, LoggerError, Result};
pub use factory::{LogFactory, SuspendGuard};
pub use format::{
    format_message, needs_eager_format, FormatArg, FormatProvider, MAX_ALIGNMENT, MAX_DEFERRED_ARGS,
};
pub use level_gate::{LevelGate, Resolution};
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use log_record::{LayoutId, LogRecord, RecordSource, SharedError};
pub use logger::{ListenerId, ListenerResult, Logger, LoggerBuilder, ReconfigurationListener};
pub use metrics::LoggerMetrics;
pub use rules::{LoggingConfiguration, LoggingRule};
pub use sequence::SequenceSource;
