//! Integration tests for the logging core
//!
//! These tests verify:
//! - End-to-end dispatch through the factory and appender sink
//! - Deferred versus eager message rendering
//! - Reconfiguration from rules and listener notification
//! - File output with text and JSON layouts

use chrono::{TimeZone, Utc};
use logcore::appenders::{AppenderSink, FileAppender, Layout, MemoryAppender};
use logcore::core::{ManualClock, RecordSource};
use logcore::prelude::*;
use std::fmt;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn rules() -> LoggingConfiguration {
    LoggingConfiguration::new()
        .with_rule(LoggingRule::new("App.Db", LogLevel::Debug).write_to("memory").final_rule())
        .with_rule(LoggingRule::new("App.*", LogLevel::Info).write_to("memory"))
}

#[test]
fn test_end_to_end_through_factory() {
    init_tracing();
    let memory = MemoryAppender::new("memory");
    let sink = AppenderSink::new().with_appender(memory.clone());
    let factory = LogFactory::new(Arc::new(sink));
    factory.configure(rules()).expect("valid rules");

    let db = factory.get_logger("App.Db");
    let web = factory.get_logger("App.Web");
    let other = factory.get_logger("Other");

    db.debug("query took {0} ms", &[12.into()]).unwrap();
    web.debug("dropped", &[]).unwrap();
    web.info("user {0} did {1}", &["alice".into(), "login".into()]).unwrap();
    other.fatal("unrouted", &[]).unwrap();

    let lines = memory.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("[DEBUG] App.Db - query took 12 ms"));
    assert!(lines[1].ends_with("[INFO ] App.Web - user alice did login"));
}

/// Display whose output changes after the call returns
struct Counter(Arc<AtomicUsize>);

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.load(Ordering::SeqCst))
    }
}

#[test]
fn test_mutable_argument_rendered_at_call_time() {
    let sink = Arc::new(CapturingSink::new());
    let logger = Logger::builder("App")
        .sink(sink.clone())
        .configuration(StaticConfiguration::from_min_level(
            LogLevel::Trace,
            TargetChain::new(["memory"]),
        ))
        .build();

    let value = Arc::new(AtomicUsize::new(1));
    logger
        .info("value is {0}", &[FormatArg::object(Counter(Arc::clone(&value)))])
        .unwrap();
    value.store(99, Ordering::SeqCst);

    let written = sink.take();
    assert!(written[0].record.is_message_formatted());
    assert_eq!(written[0].record.formatted_message().unwrap(), "value is 1");
}

#[test]
fn test_primitive_arguments_are_deferred() {
    let sink = Arc::new(CapturingSink::new());
    let logger = Logger::builder("App")
        .sink(sink.clone())
        .configuration(StaticConfiguration::from_min_level(
            LogLevel::Trace,
            TargetChain::new(["memory"]),
        ))
        .build();

    logger.info("{0} + {1} = {2}", &[1.into(), 2.into(), 3.into()]).unwrap();
    logger.info("{0}{1}{2}{3}", &[1.into(), 2.into(), 3.into(), 4.into()]).unwrap();

    let written = sink.take();
    assert!(!written[0].record.is_message_formatted());
    assert_eq!(written[0].record.formatted_message().unwrap(), "1 + 2 = 3");
    // more than three arguments are always rendered up front
    assert!(written[1].record.is_message_formatted());
}

#[test]
fn test_reconfigure_rules_at_runtime() {
    init_tracing();
    let memory = MemoryAppender::new("memory");
    let factory = LogFactory::new(Arc::new(AppenderSink::new().with_appender(memory.clone())));
    factory.configure(rules()).unwrap();

    let web = factory.get_logger("App.Web");
    let notified = Arc::new(AtomicUsize::new(0));
    let notified_clone = Arc::clone(&notified);
    web.add_reconfiguration_listener(move |logger| {
        assert!(logger.is_trace_enabled());
        notified_clone.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert!(!web.is_trace_enabled());
    factory
        .configure(
            LoggingConfiguration::new()
                .with_rule(LoggingRule::new("*", LogLevel::Trace).write_to("memory")),
        )
        .unwrap();

    assert_eq!(notified.load(Ordering::SeqCst), 1);
    web.trace("now visible", &[]).unwrap();
    assert_eq!(memory.len(), 1);
}

#[test]
fn test_rules_from_json() {
    let json = r#"{
        "rules": [
            { "name_pattern": "*", "min_level": "Warn", "targets": ["memory"] }
        ]
    }"#;
    let config: LoggingConfiguration = serde_json::from_str(json).unwrap();
    let factory = LogFactory::new(Arc::new(NullSink));
    factory.configure(config).unwrap();

    let logger = factory.get_logger("Anything");
    assert!(!logger.is_info_enabled());
    assert!(logger.is_warn_enabled());
}

#[test]
fn test_file_output_with_layouts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let text_path = temp_dir.path().join("app.log");
    let json_path = temp_dir.path().join("app.json");

    let sink = Arc::new(
        AppenderSink::new()
            .with_appender(FileAppender::new(&text_path).expect("Failed to create appender"))
            .with_target(
                "json",
                FileAppender::new(&json_path)
                    .expect("Failed to create appender")
                    .with_layout(Layout::json()),
            ),
    );

    let at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).single().expect("valid datetime");
    let logger = Logger::builder("App.Io")
        .sink(sink.clone())
        .clock(Arc::new(ManualClock::new(at)))
        .configuration(StaticConfiguration::from_min_level(
            LogLevel::Info,
            TargetChain::new(["file", "json"]),
        ))
        .build();

    let cause: logcore::core::SharedError =
        Arc::new(std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing"));
    logger
        .log_exception(LogLevel::Error, cause, "startup failed after {0} attempts", &[3.into()])
        .unwrap();
    sink.flush().expect("Failed to flush");

    let text = fs::read_to_string(&text_path).expect("Failed to read log file");
    assert_eq!(
        text,
        "2025-03-01T08:00:00.000Z [ERROR] App.Io - startup failed after 3 attempts | config.toml missing\n"
    );

    let json = fs::read_to_string(&json_path).expect("Failed to read log file");
    let parsed: serde_json::Value = serde_json::from_str(json.trim()).expect("valid JSON line");
    assert_eq!(parsed["message"], "startup failed after 3 attempts");
    assert_eq!(parsed["exception"], "config.toml missing");
    assert_eq!(parsed["logger"], "App.Io");
}

#[test]
fn test_record_source_shared_by_factory_loggers() {
    let sink = Arc::new(CapturingSink::new());
    let sequence = Arc::new(SequenceSource::new());
    let at = Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).single().expect("valid datetime");
    let factory = LogFactory::new(sink.clone()).with_record_source(RecordSource::new(
        Arc::new(ManualClock::new(at)),
        Arc::clone(&sequence),
    ));
    factory
        .configure(
            LoggingConfiguration::new()
                .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("memory")),
        )
        .unwrap();

    for name in ["A", "B", "C"] {
        factory.get_logger(name).info("hello", &[]).unwrap();
    }

    let written = sink.take();
    assert_eq!(sequence.current(), 3);
    assert!(written.iter().all(|d| d.record.timestamp() == at));
    let ids: Vec<u64> = written.iter().map(|d| d.record.sequence_id()).collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn test_macros_through_factory() {
    let memory = MemoryAppender::new("memory");
    let factory = LogFactory::new(Arc::new(AppenderSink::new().with_appender(memory.clone())));
    factory.configure(rules()).unwrap();
    let logger = factory.get_logger("App.Api");

    logcore::info!(logger, "served {0} requests", 10u32).unwrap();
    logcore::debug!(logger, "hidden {0}", 1).unwrap();

    assert_eq!(memory.len(), 1);
    assert!(memory.lines()[0].ends_with("served 10 requests"));
}
