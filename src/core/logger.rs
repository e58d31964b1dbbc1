//! Main logger implementation

use super::{
    configuration::{ChainHandle, ConfigurationSnapshot},
    dispatch::{DispatchSink, NullSink},
    error::{panic_message, LoggerError, Result},
    format::{FormatArg, FormatProvider},
    level_gate::{LevelGate, Resolution},
    log_level::LogLevel,
    log_record::{LogRecord, RecordSource, SharedError},
    metrics::LoggerMetrics,
    sequence::SequenceSource,
    clock::{Clock, SystemClock},
};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Result returned by a reconfiguration listener
pub type ListenerResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Callback invoked synchronously after each applied configuration
///
/// Listeners run on the reconfiguring thread and must return quickly. They
/// may log through the logger they are notified for, but must not
/// reconfigure it.
pub type ReconfigurationListener = Arc<dyn Fn(&Logger) -> ListenerResult + Send + Sync>;

/// Handle returned by [`Logger::add_reconfiguration_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Named entry point applications log through.
///
/// A disabled call costs one atomic load: no record is built, no argument is
/// converted and no message callback runs. An enabled call resolves the
/// target chain, builds a [`LogRecord`] and hands it to the [`DispatchSink`].
///
/// # Example
///
/// ```
/// use logcore::prelude::*;
/// use std::sync::Arc;
///
/// let sink = Arc::new(CapturingSink::new());
/// let logger = Logger::builder("App")
///     .sink(sink.clone())
///     .configuration(StaticConfiguration::from_min_level(
///         LogLevel::Info,
///         TargetChain::new(["console"]),
///     ))
///     .build();
///
/// logger.info("user {0} did {1}", &["alice".into(), "login".into()])?;
/// logger.debug("not routed", &[])?;
///
/// let written = sink.take();
/// assert_eq!(written.len(), 1);
/// assert_eq!(written[0].record.formatted_message()?, "user alice did login");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Logger {
    name: String,
    gate: LevelGate,
    sink: Arc<dyn DispatchSink>,
    source: RecordSource,
    /// Serializes writers; readers never take it
    reconfigure: Mutex<()>,
    listeners: RwLock<Vec<(ListenerId, ReconfigurationListener)>>,
    next_listener_id: AtomicU64,
    metrics: LoggerMetrics,
}

impl Logger {
    /// Unconfigured logger using the system clock and the global sequence
    #[must_use]
    pub fn new(name: impl Into<String>, sink: Arc<dyn DispatchSink>) -> Self {
        Self::with_source(name, sink, RecordSource::default())
    }

    #[must_use]
    pub fn with_source(
        name: impl Into<String>,
        sink: Arc<dyn DispatchSink>,
        source: RecordSource,
    ) -> Self {
        Self {
            name: name.into(),
            gate: LevelGate::new(),
            sink,
            source,
            reconfigure: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            metrics: LoggerMetrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.gate.is_enabled(level)
    }

    #[inline]
    pub fn is_trace_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Trace)
    }

    #[inline]
    pub fn is_debug_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Debug)
    }

    #[inline]
    pub fn is_info_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Info)
    }

    #[inline]
    pub fn is_warn_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Warn)
    }

    #[inline]
    pub fn is_error_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Error)
    }

    #[inline]
    pub fn is_fatal_enabled(&self) -> bool {
        self.gate.is_enabled(LogLevel::Fatal)
    }

    pub fn is_configured(&self) -> bool {
        self.gate.is_configured()
    }

    /// Generation of the active configuration, 0 while unconfigured
    pub fn configuration_generation(&self) -> u64 {
        self.gate.generation()
    }

    pub fn configuration(&self) -> Option<Arc<dyn ConfigurationSnapshot>> {
        self.gate.snapshot()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Install `snapshot` and notify listeners.
    ///
    /// The new configuration is fully in effect before the first listener
    /// runs. Every listener is invoked even if an earlier one fails or
    /// panics; if any did, [`LoggerError::ListenerFailed`] is returned but
    /// the configuration stays installed.
    pub fn apply_configuration(&self, snapshot: Arc<dyn ConfigurationSnapshot>) -> Result<()> {
        let generation = {
            let _writer = self.reconfigure.lock();
            self.gate.apply(snapshot)
        };
        self.metrics.record_reconfiguration();
        tracing::debug!(
            logger = %self.name,
            generation,
            enabled = ?self.gate.enabled_levels(),
            "configuration applied"
        );

        self.notify_listeners()
    }

    fn notify_listeners(&self) -> Result<()> {
        // Clone out so listeners may (un)register without deadlocking
        let listeners: Vec<ReconfigurationListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let total = listeners.len();
        let mut messages = Vec::new();

        for (idx, listener) in listeners.iter().enumerate() {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(self)));

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(panic_info) => Some(format!("panicked: {}", panic_message(panic_info.as_ref()))),
            };

            if let Some(message) = failure {
                tracing::warn!(
                    logger = %self.name,
                    listener = idx,
                    error = %message,
                    "reconfiguration listener failed"
                );
                messages.push(format!("listener #{}: {}", idx, message));
            }
        }

        if messages.is_empty() {
            return Ok(());
        }

        self.metrics.record_listener_failures(messages.len() as u64);
        Err(LoggerError::ListenerFailed {
            failed: messages.len(),
            total,
            messages,
        })
    }

    pub fn add_reconfiguration_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Logger) -> ListenerResult + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not registered
    pub fn remove_reconfiguration_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Log `template` formatted with `args`
    pub fn log(&self, level: LogLevel, template: &str, args: &[FormatArg]) -> Result<()> {
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.write_to_targets(level, None, template, args.to_vec(), None)
    }

    /// Owned-argument form of [`log`](Logger::log), used by the logging macros
    pub fn log_args(&self, level: LogLevel, template: &str, args: Vec<FormatArg>) -> Result<()> {
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.write_to_targets(level, None, template, args, None)
    }

    /// Log a single value as the whole message
    pub fn log_value<V>(&self, level: LogLevel, value: V) -> Result<()>
    where
        V: Into<FormatArg>,
    {
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.write_to_targets(level, None, "{0}", vec![value.into()], None)
    }

    /// Log with an attached error
    pub fn log_exception(
        &self,
        level: LogLevel,
        exception: SharedError,
        template: &str,
        args: &[FormatArg],
    ) -> Result<()> {
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.write_to_targets(level, None, template, args.to_vec(), Some(exception))
    }

    /// Log using a caller-supplied formatting context
    pub fn log_with_provider(
        &self,
        level: LogLevel,
        provider: Arc<dyn FormatProvider>,
        template: &str,
        args: &[FormatArg],
    ) -> Result<()> {
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.write_to_targets(level, Some(provider), template, args.to_vec(), None)
    }

    /// Log a message produced by `message_fn`, which only runs if `level` is enabled.
    ///
    /// A missing callback is rejected with [`LoggerError::InvalidArgument`]
    /// whether or not the level is enabled.
    pub fn log_lazy<F>(&self, level: LogLevel, message_fn: Option<F>) -> Result<()>
    where
        F: FnOnce() -> String,
    {
        let message_fn = message_fn
            .ok_or_else(|| LoggerError::invalid_argument("message_fn", "message callback is required"))?;
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.dispatch(level, || {
            Ok(LogRecord::with_message(&self.source, level, self.name.as_str(), message_fn()))
        })
    }

    /// Route a record built elsewhere, if its level is enabled here
    pub fn log_record(&self, record: LogRecord) -> Result<()> {
        let level = record.level();
        if !self.gate.is_enabled(level) {
            return Ok(());
        }
        self.dispatch(level, || Ok(record))
    }

    fn write_to_targets(
        &self,
        level: LogLevel,
        provider: Option<Arc<dyn FormatProvider>>,
        template: &str,
        args: Vec<FormatArg>,
        exception: Option<SharedError>,
    ) -> Result<()> {
        self.dispatch(level, || {
            let mut record = LogRecord::create_with(
                &self.source,
                level,
                self.name.as_str(),
                provider,
                template,
                args,
            )?;
            record.set_exception(exception);
            Ok(record)
        })
    }

    /// Resolve the chain, build the record and hand both to the sink
    fn dispatch<F>(&self, level: LogLevel, build: F) -> Result<()>
    where
        F: FnOnce() -> Result<LogRecord>,
    {
        let chain = match self.resolve(level)? {
            Some(chain) => chain,
            None => {
                self.metrics.record_race_skipped();
                return Ok(());
            }
        };

        let record = build().inspect_err(|_| {
            self.metrics.record_format_error();
        })?;

        match self.sink.write(&self.name, chain, record) {
            Ok(()) => {
                self.metrics.record_dispatched();
                Ok(())
            }
            Err(e) => {
                if e.is_format_error() {
                    self.metrics.record_format_error();
                } else {
                    self.metrics.record_dispatch_error();
                }
                tracing::warn!(logger = %self.name, error = %e, "dispatch sink failed");
                Err(e)
            }
        }
    }

    fn resolve(&self, level: LogLevel) -> Result<Option<ChainHandle>> {
        match self.gate.resolve_chain(level) {
            Resolution::Chain(chain) => Ok(Some(chain)),
            Resolution::Disabled => Ok(None),
            Resolution::Unconfigured => Err(LoggerError::not_configured(&self.name)),
        }
    }

    #[inline]
    pub fn trace(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Trace, template, args)
    }

    #[inline]
    pub fn debug(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Debug, template, args)
    }

    #[inline]
    pub fn info(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Info, template, args)
    }

    #[inline]
    pub fn warn(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Warn, template, args)
    }

    #[inline]
    pub fn error(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Error, template, args)
    }

    #[inline]
    pub fn fatal(&self, template: &str, args: &[FormatArg]) -> Result<()> {
        self.log(LogLevel::Fatal, template, args)
    }

    #[inline]
    pub fn trace_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Trace, Some(message_fn))
    }

    #[inline]
    pub fn debug_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Debug, Some(message_fn))
    }

    #[inline]
    pub fn info_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Info, Some(message_fn))
    }

    #[inline]
    pub fn warn_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Warn, Some(message_fn))
    }

    #[inline]
    pub fn error_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Error, Some(message_fn))
    }

    #[inline]
    pub fn fatal_lazy<F: FnOnce() -> String>(&self, message_fn: F) -> Result<()> {
        self.log_lazy(LogLevel::Fatal, Some(message_fn))
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("gate", &self.gate)
            .field("listeners", &self.listeners.read().len())
            .finish_non_exhaustive()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use logcore::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder("App.Db")
///     .sink(Arc::new(NullSink))
///     .sequence(Arc::new(SequenceSource::new()))
///     .configuration(StaticConfiguration::builder().route(LogLevel::Warn, ["file"]).build())
///     .build();
///
/// assert!(logger.is_warn_enabled());
/// assert!(!logger.is_info_enabled());
/// ```
pub struct LoggerBuilder {
    name: String,
    sink: Arc<dyn DispatchSink>,
    clock: Option<Arc<dyn Clock>>,
    sequence: Option<Arc<SequenceSource>>,
    configuration: Option<Arc<dyn ConfigurationSnapshot>>,
    listeners: Vec<ReconfigurationListener>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink: Arc::new(NullSink),
            clock: None,
            sequence: None,
            configuration: None,
            listeners: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Override the timestamp source (defaults to the system clock)
    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Override the sequence source (defaults to [`SequenceSource::global`])
    #[must_use = "builder methods return a new value"]
    pub fn sequence(mut self, sequence: Arc<SequenceSource>) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Configuration applied before `build` returns
    #[must_use = "builder methods return a new value"]
    pub fn configuration<C>(mut self, snapshot: C) -> Self
    where
        C: ConfigurationSnapshot + 'static,
    {
        self.configuration = Some(Arc::new(snapshot));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_configuration(mut self, snapshot: Arc<dyn ConfigurationSnapshot>) -> Self {
        self.configuration = Some(snapshot);
        self
    }

    /// Listener registered after the initial configuration is applied
    #[must_use = "builder methods return a new value"]
    pub fn listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Logger) -> ListenerResult + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let source = RecordSource::new(
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.sequence.unwrap_or_else(SequenceSource::global),
        );
        let logger = Logger::with_source(self.name, self.sink, source);

        if let Some(snapshot) = self.configuration {
            let _writer = logger.reconfigure.lock();
            logger.gate.apply(snapshot);
            logger.metrics.record_reconfiguration();
        }

        {
            let mut listeners = logger.listeners.write();
            for listener in self.listeners {
                let id = ListenerId(logger.next_listener_id.fetch_add(1, Ordering::Relaxed));
                listeners.push((id, listener));
            }
        }

        logger
    }
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }
}
