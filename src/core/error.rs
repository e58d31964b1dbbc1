//! Error types for the logging core

pub type Result<T> = std::result::Result<T, LoggerError>;

/// Failure while rendering a message template against its arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Malformed template (unbalanced braces, bad index or alignment)
    #[error("Invalid message template at position {position}: {message}")]
    InvalidTemplate { position: usize, message: String },

    /// Placeholder refers to an argument that was not supplied
    #[error("Placeholder {{{index}}} is out of range: {count} argument(s) supplied")]
    ArgumentIndex { index: usize, count: usize },

    /// Argument string conversion failed
    #[error("Argument {index} could not be converted to a string")]
    Conversion { index: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Message formatting failed
    #[error("Formatting error: {0}")]
    Format(#[from] FormatError),

    /// Caller passed an invalid argument
    #[error("Invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// Chain resolution attempted before any configuration was applied
    #[error("Logger '{logger}' has no configuration applied")]
    NotConfigured { logger: String },

    /// Configuration was installed but some reconfiguration listeners failed
    #[error("{failed} of {total} reconfiguration listener(s) failed: {}", .messages.join("; "))]
    ListenerFailed {
        failed: usize,
        total: usize,
        messages: Vec<String>,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Dispatch sink failed to write a record
    #[error("Dispatch to target '{target}' failed: {message}")]
    Dispatch { target: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }

    pub fn not_configured(logger: impl Into<String>) -> Self {
        LoggerError::NotConfigured {
            logger: logger.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a dispatch error for a named target
    pub fn dispatch(target: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Dispatch {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error originated in message formatting
    pub fn is_format_error(&self) -> bool {
        matches!(self, LoggerError::Format(_))
    }
}

impl FormatError {
    pub(crate) fn template(position: usize, message: impl Into<String>) -> Self {
        FormatError::InvalidTemplate {
            position,
            message: message.into(),
        }
    }
}

/// Text of a panic payload caught with `catch_unwind`
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
