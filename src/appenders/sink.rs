//! Dispatch sink that fans records out to named appenders

use crate::core::{
    error::panic_message, Appender, ChainHandle, DispatchSink, LogRecord, LoggerError, Result,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

/// Routes each record to the appenders named by its target chain.
///
/// Targets are visited in chain order. A failing or panicking appender does
/// not stop the remaining targets from receiving the record; the first
/// failure is returned once every target has been tried. Formatting errors
/// keep their kind, other appender failures become
/// [`LoggerError::Dispatch`]. Chain entries with no registered appender are
/// skipped.
///
/// # Example
///
/// ```
/// use logcore::appenders::{AppenderSink, MemoryAppender};
/// use logcore::prelude::*;
/// use std::sync::Arc;
///
/// let memory = MemoryAppender::new("memory");
/// let sink = AppenderSink::new().with_appender(memory.clone());
///
/// let logger = Logger::builder("App")
///     .sink(Arc::new(sink))
///     .configuration(StaticConfiguration::from_min_level(LogLevel::Info, TargetChain::new(["memory"])))
///     .build();
///
/// logger.info("ready in {0} ms", &[12.into()])?;
/// assert!(memory.lines()[0].ends_with("App - ready in 12 ms"));
/// # Ok::<(), logcore::LoggerError>(())
/// ```
#[derive(Default)]
pub struct AppenderSink {
    appenders: HashMap<String, Mutex<Box<dyn Appender>>>,
}

impl AppenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `appender` under its own name
    #[must_use = "builder methods return a new value"]
    pub fn with_appender<A>(self, appender: A) -> Self
    where
        A: Appender + 'static,
    {
        let name = appender.name().to_string();
        self.with_target(name, appender)
    }

    /// Register `appender` under `target`, replacing any previous one
    #[must_use = "builder methods return a new value"]
    pub fn with_target<A>(mut self, target: impl Into<String>, appender: A) -> Self
    where
        A: Appender + 'static,
    {
        self.appenders
            .insert(target.into(), Mutex::new(Box::new(appender)));
        self
    }

    pub fn targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = self.appenders.keys().map(String::as_str).collect();
        targets.sort_unstable();
        targets
    }

    /// Flush every appender, returning the first failure
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for (target, appender) in &self.appenders {
            let flush_result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| appender.lock().flush()));
            if let Err(e) = Self::check(target, "flush", flush_result) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn check(
        target: &str,
        operation: &str,
        outcome: std::thread::Result<Result<()>>,
    ) -> Result<()> {
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e @ LoggerError::Format(_))) => {
                tracing::warn!(target_name = target, operation, error = %e, "message could not be rendered");
                Err(e)
            }
            Ok(Err(e)) => {
                tracing::error!(target_name = target, operation, error = %e, "appender failed");
                Err(LoggerError::dispatch(target, e.to_string()))
            }
            Err(panic_info) => {
                let panic_msg = panic_message(panic_info.as_ref());
                tracing::error!(
                    target_name = target,
                    operation,
                    panic = %panic_msg,
                    "appender panicked; other targets continue"
                );
                Err(LoggerError::dispatch(target, format!("panicked: {}", panic_msg)))
            }
        }
    }
}

impl DispatchSink for AppenderSink {
    fn write(&self, logger_name: &str, chain: ChainHandle, mut record: LogRecord) -> Result<()> {
        let mut first_error = None;

        for target in chain.targets() {
            let Some(appender) = self.appenders.get(target) else {
                tracing::warn!(logger = logger_name, target_name = %target, "no appender registered for target");
                continue;
            };

            let append_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.lock().append(&mut record)
            }));
            if let Err(e) = Self::check(target, "append", append_result) {
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for AppenderSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppenderSink")
            .field("targets", &self.targets())
            .finish()
    }
}
