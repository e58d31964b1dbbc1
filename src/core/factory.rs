//! Logger registry that keeps every logger in step with one rule set

use super::{
    configuration::{ConfigurationSnapshot, StaticConfiguration},
    dispatch::DispatchSink,
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::RecordSource,
    logger::Logger,
    rules::LoggingConfiguration,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct FactoryState {
    configuration: LoggingConfiguration,
    loggers: HashMap<String, Arc<Logger>>,
    suspend_depth: usize,
    global_threshold: LogLevel,
}

impl FactoryState {
    fn snapshot_for(&self, name: &str) -> Arc<dyn ConfigurationSnapshot> {
        if self.suspend_depth > 0 {
            Arc::new(StaticConfiguration::disabled())
        } else {
            Arc::new(
                self.configuration
                    .snapshot_with_threshold(name, self.global_threshold),
            )
        }
    }
}

/// Creates and caches named loggers sharing a sink, clock and sequence.
///
/// # Example
///
/// ```
/// use logcore::prelude::*;
/// use std::sync::Arc;
///
/// let sink = Arc::new(CapturingSink::new());
/// let factory = LogFactory::new(sink.clone());
/// factory.configure(
///     LoggingConfiguration::new().with_rule(LoggingRule::new("App.*", LogLevel::Info).write_to("memory")),
/// )?;
///
/// let db = factory.get_logger("App.Db");
/// assert!(db.is_info_enabled());
/// assert!(Arc::ptr_eq(&db, &factory.get_logger("App.Db")));
///
/// factory.suspend_logging();
/// assert!(!db.is_info_enabled());
/// factory.resume_logging()?;
/// assert!(db.is_info_enabled());
/// # Ok::<(), logcore::LoggerError>(())
/// ```
pub struct LogFactory {
    sink: Arc<dyn DispatchSink>,
    source: RecordSource,
    /// Held only long enough to read or swap state, never across listeners
    state: Mutex<FactoryState>,
    /// Serializes configure/suspend/resume so snapshots land in order
    reconfigure: Mutex<()>,
}

impl LogFactory {
    /// Factory with an empty rule set, so every logger starts disabled
    pub fn new(sink: Arc<dyn DispatchSink>) -> Self {
        Self {
            sink,
            source: RecordSource::default(),
            state: Mutex::new(FactoryState {
                configuration: LoggingConfiguration::new(),
                loggers: HashMap::new(),
                suspend_depth: 0,
                global_threshold: LogLevel::Trace,
            }),
            reconfigure: Mutex::new(()),
        }
    }

    /// Use `source` for loggers created from now on
    #[must_use = "builder methods return a new value"]
    pub fn with_record_source(mut self, source: RecordSource) -> Self {
        self.source = source;
        self
    }

    /// Return the logger named `name`, creating and configuring it on first use
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        let mut state = self.state.lock();
        if let Some(logger) = state.loggers.get(name) {
            return Arc::clone(logger);
        }

        let logger = Arc::new(
            Logger::builder(name)
                .sink(Arc::clone(&self.sink))
                .clock(Arc::clone(self.source.clock()))
                .sequence(Arc::clone(self.source.sequence()))
                .shared_configuration(state.snapshot_for(name))
                .build(),
        );
        state.loggers.insert(name.to_string(), Arc::clone(&logger));
        tracing::trace!(logger = name, "logger created");
        logger
    }

    /// Names of every logger created so far, sorted
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().loggers.keys().cloned().collect();
        names.sort();
        names
    }

    /// The rule set loggers are configured from
    pub fn configuration(&self) -> LoggingConfiguration {
        self.state.lock().configuration.clone()
    }

    /// Validate `configuration`, make it current and reconfigure every logger.
    ///
    /// An invalid configuration is rejected and nothing changes. While
    /// logging is suspended the rules are stored but loggers stay disabled
    /// until [`resume_logging`](LogFactory::resume_logging).
    pub fn configure(&self, configuration: LoggingConfiguration) -> Result<()> {
        configuration.validate()?;

        let _writer = self.reconfigure.lock();
        let suspended = {
            let mut state = self.state.lock();
            state.configuration = configuration;
            state.suspend_depth > 0
        };

        tracing::debug!(suspended, "logging configuration replaced");
        if suspended {
            return Ok(());
        }
        self.reconfigure_existing_loggers()
    }

    /// Disable every logger until a matching [`resume_logging`] call.
    ///
    /// Calls nest; returns the new suspension depth.
    ///
    /// [`resume_logging`]: LogFactory::resume_logging
    pub fn suspend_logging(&self) -> usize {
        let _writer = self.reconfigure.lock();
        let depth = {
            let mut state = self.state.lock();
            state.suspend_depth += 1;
            state.suspend_depth
        };

        if depth == 1 {
            tracing::debug!("logging suspended");
            if let Err(e) = self.reconfigure_existing_loggers() {
                // loggers are disabled regardless; only listeners complained
                tracing::warn!(error = %e, "listeners failed while suspending logging");
            }
        }
        depth
    }

    /// Undo one [`suspend_logging`](LogFactory::suspend_logging) call.
    ///
    /// When the depth returns to zero every logger is reconfigured from the
    /// current rules. Fails with [`LoggerError::InvalidArgument`] if logging
    /// was not suspended.
    pub fn resume_logging(&self) -> Result<()> {
        let _writer = self.reconfigure.lock();
        let depth = {
            let mut state = self.state.lock();
            if state.suspend_depth == 0 {
                return Err(LoggerError::invalid_argument(
                    "resume_logging",
                    "logging is not suspended",
                ));
            }
            state.suspend_depth -= 1;
            state.suspend_depth
        };

        if depth > 0 {
            return Ok(());
        }
        tracing::debug!("logging resumed");
        self.reconfigure_existing_loggers()
    }

    /// Lowest level any logger of this factory may enable
    pub fn global_threshold(&self) -> LogLevel {
        self.state.lock().global_threshold
    }

    /// Disable every level below `threshold` for all loggers, whatever the
    /// rules enable. `LogLevel::Off` disables everything.
    pub fn set_global_threshold(&self, threshold: LogLevel) -> Result<()> {
        let _writer = self.reconfigure.lock();
        let (changed, suspended) = {
            let mut state = self.state.lock();
            let changed = state.global_threshold != threshold;
            state.global_threshold = threshold;
            (changed, state.suspend_depth > 0)
        };

        if !changed || suspended {
            return Ok(());
        }
        tracing::debug!(%threshold, "global threshold changed");
        self.reconfigure_existing_loggers()
    }

    /// Suspend logging until the returned guard is dropped
    pub fn suspended(&self) -> SuspendGuard<'_> {
        self.suspend_logging();
        SuspendGuard { factory: self }
    }

    pub fn is_logging_enabled(&self) -> bool {
        self.state.lock().suspend_depth == 0
    }

    /// Push the current snapshot to every cached logger.
    ///
    /// Must be called with `reconfigure` held. Listener failures from all
    /// loggers are merged into one [`LoggerError::ListenerFailed`].
    fn reconfigure_existing_loggers(&self) -> Result<()> {
        let targets: Vec<(Arc<Logger>, Arc<dyn ConfigurationSnapshot>)> = {
            let state = self.state.lock();
            state
                .loggers
                .values()
                .map(|logger| (Arc::clone(logger), state.snapshot_for(logger.name())))
                .collect()
        };

        let mut failed = 0;
        let mut total = 0;
        let mut messages = Vec::new();

        for (logger, snapshot) in targets {
            match logger.apply_configuration(snapshot) {
                Ok(()) => {}
                Err(LoggerError::ListenerFailed {
                    failed: f,
                    total: t,
                    messages: m,
                }) => {
                    failed += f;
                    total += t;
                    messages.extend(m.into_iter().map(|msg| format!("{}: {}", logger.name(), msg)));
                }
                Err(e) => return Err(e),
            }
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::ListenerFailed {
                failed,
                total,
                messages,
            })
        }
    }
}

impl fmt::Debug for LogFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LogFactory")
            .field("loggers", &state.loggers.len())
            .field("rules", &state.configuration.rules.len())
            .field("suspend_depth", &state.suspend_depth)
            .field("global_threshold", &state.global_threshold)
            .finish_non_exhaustive()
    }
}

/// Resumes logging on drop
#[must_use = "logging resumes as soon as the guard is dropped"]
pub struct SuspendGuard<'a> {
    factory: &'a LogFactory,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.factory.resume_logging() {
            tracing::warn!(error = %e, "failed to resume logging");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatch::{CapturingSink, NullSink};
    use crate::core::log_level::LogLevel;
    use crate::core::rules::LoggingRule;
    use crate::core::sequence::SequenceSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn rules() -> LoggingConfiguration {
        LoggingConfiguration::new()
            .with_rule(LoggingRule::new("App.*", LogLevel::Debug).write_to("app"))
            .with_rule(LoggingRule::new("*", LogLevel::Warn).write_to("console"))
    }

    #[test]
    fn test_get_logger_caches() {
        let factory = LogFactory::new(Arc::new(NullSink));
        let a = factory.get_logger("App.Db");
        let b = factory.get_logger("App.Db");
        let c = factory.get_logger("Other");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(factory.logger_names(), vec!["App.Db", "Other"]);
    }

    #[test]
    fn test_new_loggers_start_disabled_but_configured() {
        let factory = LogFactory::new(Arc::new(NullSink));
        let logger = factory.get_logger("App");
        assert!(logger.is_configured());
        assert!(LogLevel::ENABLEABLE.iter().all(|l| !logger.is_enabled(*l)));
    }

    #[test]
    fn test_configure_reaches_existing_and_new_loggers() {
        let sink = Arc::new(CapturingSink::new());
        let factory = LogFactory::new(sink.clone());
        let early = factory.get_logger("App.Db");

        factory.configure(rules()).unwrap();
        let late = factory.get_logger("Other.Web");

        assert!(early.is_debug_enabled());
        assert!(!late.is_info_enabled());
        assert!(late.is_warn_enabled());

        early.warn("slow query", &[]).unwrap();
        let written = sink.take();
        assert_eq!(written[0].chain.targets(), ["app", "console"]);
    }

    #[test]
    fn test_invalid_configuration_leaves_state_untouched() {
        let factory = LogFactory::new(Arc::new(NullSink));
        factory.configure(rules()).unwrap();
        let logger = factory.get_logger("App.Db");
        let generation = logger.configuration_generation();

        let bad = LoggingConfiguration::new().with_rule(LoggingRule::new("A*B", LogLevel::Info));
        assert!(factory.configure(bad).is_err());

        assert_eq!(factory.configuration(), rules());
        assert_eq!(logger.configuration_generation(), generation);
    }

    #[test]
    fn test_suspend_nests() {
        let factory = LogFactory::new(Arc::new(NullSink));
        factory.configure(rules()).unwrap();
        let logger = factory.get_logger("App.Db");

        assert_eq!(factory.suspend_logging(), 1);
        assert_eq!(factory.suspend_logging(), 2);
        assert!(!factory.is_logging_enabled());
        assert!(!logger.is_fatal_enabled());

        factory.resume_logging().unwrap();
        assert!(!logger.is_fatal_enabled());
        factory.resume_logging().unwrap();
        assert!(factory.is_logging_enabled());
        assert!(logger.is_debug_enabled());

        assert!(matches!(
            factory.resume_logging(),
            Err(LoggerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_configure_while_suspended_applies_on_resume() {
        let factory = LogFactory::new(Arc::new(NullSink));
        let logger = factory.get_logger("App.Db");
        {
            let _guard = factory.suspended();
            factory.configure(rules()).unwrap();
            assert!(!logger.is_debug_enabled());
            assert!(!factory.get_logger("Fresh").is_warn_enabled());
        }
        assert!(logger.is_debug_enabled());
        assert!(factory.get_logger("Fresh").is_warn_enabled());
    }

    #[test]
    fn test_global_threshold_limits_rules() {
        let sink = Arc::new(CapturingSink::new());
        let factory = LogFactory::new(sink.clone());
        factory.configure(rules()).unwrap();
        let existing = factory.get_logger("App.Db");
        assert_eq!(factory.global_threshold(), LogLevel::Trace);

        factory.set_global_threshold(LogLevel::Error).unwrap();
        assert_eq!(factory.global_threshold(), LogLevel::Error);
        assert!(!existing.is_warn_enabled());
        assert!(existing.is_error_enabled());
        assert!(!factory.get_logger("App.New").is_debug_enabled());

        existing.warn("dropped", &[]).unwrap();
        existing.error("kept", &[]).unwrap();
        assert_eq!(sink.len(), 1);

        factory.set_global_threshold(LogLevel::Off).unwrap();
        assert!(!existing.is_fatal_enabled());

        factory.set_global_threshold(LogLevel::Trace).unwrap();
        assert!(existing.is_debug_enabled());
    }

    #[test]
    fn test_global_threshold_while_suspended_applies_on_resume() {
        let factory = LogFactory::new(Arc::new(NullSink));
        factory.configure(rules()).unwrap();
        let logger = factory.get_logger("App.Db");

        let guard = factory.suspended();
        factory.set_global_threshold(LogLevel::Warn).unwrap();
        assert!(!logger.is_error_enabled());
        drop(guard);

        assert!(!logger.is_info_enabled());
        assert!(logger.is_warn_enabled());
    }

    #[test]
    fn test_listener_failures_are_merged() {
        let factory = LogFactory::new(Arc::new(NullSink));
        let calls = Arc::new(AtomicUsize::new(0));
        for name in ["A", "B"] {
            factory
                .get_logger(name)
                .add_reconfiguration_listener(|_| Err("nope".into()));
            let calls = Arc::clone(&calls);
            factory.get_logger(name).add_reconfiguration_listener(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        match factory.configure(rules()) {
            Err(LoggerError::ListenerFailed { failed, total, messages }) => {
                assert_eq!((failed, total), (2, 4));
                assert!(messages.iter().any(|m| m.starts_with("A: ")));
                assert!(messages.iter().any(|m| m.starts_with("B: ")));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(factory.get_logger("A").is_warn_enabled());
    }

    #[test]
    fn test_loggers_share_sequence() {
        let sink = Arc::new(CapturingSink::new());
        let sequence = Arc::new(SequenceSource::starting_at(100));
        let factory = LogFactory::new(sink.clone()).with_record_source(RecordSource::new(
            Arc::new(crate::core::clock::SystemClock),
            sequence,
        ));
        factory.configure(rules()).unwrap();

        factory.get_logger("X").error("a", &[]).unwrap();
        factory.get_logger("Y").error("b", &[]).unwrap();

        let ids: Vec<u64> = sink.take().iter().map(|d| d.record.sequence_id()).collect();
        assert_eq!(ids, [101, 102]);
    }
}
