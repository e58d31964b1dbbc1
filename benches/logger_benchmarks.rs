//! Criterion benchmarks for logcore

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use logcore::appenders::{AppenderSink, Layout, MemoryAppender};
use logcore::core::{format_message, ConfigurationSnapshot};
use logcore::prelude::*;
use std::sync::Arc;

fn configured(min_level: LogLevel, sink: Arc<dyn DispatchSink>) -> Logger {
    Logger::builder("Bench")
        .sink(sink)
        .sequence(Arc::new(SequenceSource::new()))
        .configuration(StaticConfiguration::from_min_level(
            min_level,
            TargetChain::new(["memory"]),
        ))
        .build()
}

// ============================================================================
// Disabled Path Benchmarks
// ============================================================================

fn bench_disabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("disabled");
    group.throughput(Throughput::Elements(1));

    let logger = configured(LogLevel::Fatal, Arc::new(NullSink));

    group.bench_function("is_enabled", |b| {
        b.iter(|| black_box(logger.is_debug_enabled()));
    });

    group.bench_function("log_with_args", |b| {
        b.iter(|| {
            logger
                .debug(black_box("user {0} did {1}"), &[42.into(), "login".into()])
                .unwrap()
        });
    });

    group.bench_function("lazy", |b| {
        b.iter(|| logger.debug_lazy(|| format!("expensive {}", black_box(1))).unwrap());
    });

    group.bench_function("macro", |b| {
        b.iter(|| logcore::debug!(logger, "user {0} did {1}", 42, "login").unwrap());
    });

    group.finish();
}

// ============================================================================
// Enabled Path Benchmarks
// ============================================================================

fn bench_enabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("enabled");
    group.throughput(Throughput::Elements(1));

    let logger = configured(LogLevel::Trace, Arc::new(NullSink));

    group.bench_function("no_args", |b| {
        b.iter(|| logger.info(black_box("Server started"), &[]).unwrap());
    });

    group.bench_function("deferred_args", |b| {
        b.iter(|| {
            logger
                .info(black_box("user {0} did {1}"), &[42.into(), "login".into()])
                .unwrap()
        });
    });

    group.bench_function("eager_args", |b| {
        b.iter(|| {
            logger
                .info(
                    black_box("{0} {1} {2} {3}"),
                    &[1.into(), 2.into(), 3.into(), 4.into()],
                )
                .unwrap()
        });
    });

    let memory = MemoryAppender::new("memory")
        .with_layout(Layout::text())
        .with_max_lines(1024);
    let rendering = configured(
        LogLevel::Trace,
        Arc::new(AppenderSink::new().with_appender(memory)),
    );

    group.bench_function("rendered_to_memory", |b| {
        b.iter(|| {
            rendering
                .info(black_box("user {0} did {1}"), &[42.into(), "login".into()])
                .unwrap()
        });
    });

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");

    let args = [FormatArg::from(255), FormatArg::from(1.25), FormatArg::from("name")];

    group.bench_function("placeholders", |b| {
        b.iter(|| format_message(black_box("{0} {1} {2}"), black_box(&args), None).unwrap());
    });

    group.bench_function("alignment_and_format", |b| {
        b.iter(|| {
            format_message(black_box("[{0,8:X4}] [{1,-10:F2}] {2}"), black_box(&args), None)
                .unwrap()
        });
    });

    group.finish();
}

// ============================================================================
// Reconfiguration Benchmarks
// ============================================================================

fn bench_reconfigure(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconfigure");

    let logger = configured(LogLevel::Info, Arc::new(NullSink));
    let snapshot: Arc<dyn ConfigurationSnapshot> = Arc::new(StaticConfiguration::from_min_level(
        LogLevel::Warn,
        TargetChain::new(["a", "b"]),
    ));

    group.bench_function("apply_configuration", |b| {
        b.iter(|| logger.apply_configuration(Arc::clone(&snapshot)).unwrap());
    });

    let rules = LoggingConfiguration::new()
        .with_rule(LoggingRule::new("App.*", LogLevel::Debug).write_to("file"))
        .with_rule(LoggingRule::new("*", LogLevel::Warn).write_to("console"));

    group.bench_function("snapshot_for", |b| {
        b.iter(|| black_box(rules.snapshot_for(black_box("App.Db"))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_disabled,
    bench_enabled,
    bench_formatting,
    bench_reconfigure
);
criterion_main!(benches);
