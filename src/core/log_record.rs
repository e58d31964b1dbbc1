//! Log record structure
//!
//! A [`LogRecord`] describes one enabled logging call. Its level, logger name,
//! timestamp and sequence id are fixed at construction. The rendered message
//! is either produced right away or on first read, depending on
//! [`needs_eager_format`]; either way it is computed at most once.

use super::clock::{Clock, SystemClock};
use super::error::{FormatError, Result};
use super::format::{format_message, needs_eager_format, FormatArg, FormatProvider};
use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use super::sequence::SequenceSource;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Error attached to a record
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Identity of a layout in a record's render cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(u64);

static NEXT_LAYOUT_ID: AtomicU64 = AtomicU64::new(1);

impl LayoutId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// A process-unique id not returned by any previous call
    pub fn next() -> Self {
        Self(NEXT_LAYOUT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Where records get their timestamp and sequence id from
#[derive(Clone)]
pub struct RecordSource {
    clock: Arc<dyn Clock>,
    sequence: Arc<SequenceSource>,
}

impl RecordSource {
    pub fn new(clock: Arc<dyn Clock>, sequence: Arc<SequenceSource>) -> Self {
        Self { clock, sequence }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn sequence(&self) -> &Arc<SequenceSource> {
        &self.sequence
    }

    /// Capture a timestamp and draw the next sequence id
    #[inline]
    fn stamp(&self) -> (DateTime<Utc>, u64) {
        let timestamp = self.clock.now();
        (timestamp, self.sequence.next())
    }
}

impl Default for RecordSource {
    /// System clock and the process-wide sequence
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), SequenceSource::global())
    }
}

impl fmt::Debug for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSource")
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

pub struct LogRecord {
    level: LogLevel,
    logger_name: String,
    timestamp: DateTime<Utc>,
    sequence_id: u64,
    message: String,
    parameters: Vec<FormatArg>,
    format_provider: Option<Arc<dyn FormatProvider>>,
    formatted: OnceLock<std::result::Result<String, FormatError>>,
    exception: Option<SharedError>,
    properties: Option<LogContext>,
    layout_cache: Option<HashMap<LayoutId, String>>,
}

impl LogRecord {
    /// Build a record stamped by `source`.
    ///
    /// Arguments that could render differently later (any
    /// [`FormatArg::Object`]) or more than three arguments cause the message
    /// to be rendered here, and a rendering failure is returned immediately.
    /// Otherwise rendering waits for the first [`formatted_message`] call.
    ///
    /// [`formatted_message`]: LogRecord::formatted_message
    pub fn create_with(
        source: &RecordSource,
        level: LogLevel,
        logger_name: impl Into<String>,
        format_provider: Option<Arc<dyn FormatProvider>>,
        template: impl Into<String>,
        parameters: Vec<FormatArg>,
    ) -> Result<Self> {
        let (timestamp, sequence_id) = source.stamp();
        let record = Self {
            level,
            logger_name: logger_name.into(),
            timestamp,
            sequence_id,
            message: template.into(),
            parameters,
            format_provider,
            formatted: OnceLock::new(),
            exception: None,
            properties: None,
            layout_cache: None,
        };

        if needs_eager_format(&record.parameters) {
            let rendered = format_message(
                &record.message,
                &record.parameters,
                record.format_provider.as_deref(),
            )?;
            let _ = record.formatted.set(Ok(rendered));
        }

        Ok(record)
    }

    /// Build a record using the system clock and the process-wide sequence
    pub fn create(
        level: LogLevel,
        logger_name: impl Into<String>,
        format_provider: Option<Arc<dyn FormatProvider>>,
        template: impl Into<String>,
        parameters: Vec<FormatArg>,
    ) -> Result<Self> {
        Self::create_with(
            &RecordSource::default(),
            level,
            logger_name,
            format_provider,
            template,
            parameters,
        )
    }

    /// Record with a plain message and no parameters
    pub fn new(level: LogLevel, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_message(&RecordSource::default(), level, logger_name, message)
    }

    pub(crate) fn with_message(
        source: &RecordSource,
        level: LogLevel,
        logger_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let (timestamp, sequence_id) = source.stamp();
        Self {
            level,
            logger_name: logger_name.into(),
            timestamp,
            sequence_id,
            message: message.into(),
            parameters: Vec::new(),
            format_provider: None,
            formatted: OnceLock::new(),
            exception: None,
            properties: None,
            layout_cache: None,
        }
    }

    /// `Off`-level record with empty logger name and message
    pub fn null_event() -> Self {
        Self::new(LogLevel::Off, "", "")
    }

    #[must_use]
    pub fn with_exception(mut self, exception: SharedError) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub fn with_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.properties_mut().add_field(key, value);
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    /// Logger name after its last `.`
    pub fn logger_short_name(&self) -> &str {
        match self.logger_name.rfind('.') {
            Some(dot) => &self.logger_name[dot + 1..],
            None => &self.logger_name,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Raw template, placeholders included
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn parameters(&self) -> &[FormatArg] {
        &self.parameters
    }

    pub fn format_provider(&self) -> Option<&Arc<dyn FormatProvider>> {
        self.format_provider.as_ref()
    }

    /// Rendered message, computed on first call and cached.
    ///
    /// Records without parameters return the template itself. A template
    /// that does not match its arguments yields the same error on every call.
    pub fn formatted_message(&self) -> std::result::Result<&str, FormatError> {
        if self.parameters.is_empty() {
            return Ok(&self.message);
        }
        self.formatted
            .get_or_init(|| {
                format_message(
                    &self.message,
                    &self.parameters,
                    self.format_provider.as_deref(),
                )
            })
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Whether the message text exists without further rendering work
    pub fn is_message_formatted(&self) -> bool {
        self.parameters.is_empty() || self.formatted.get().is_some()
    }

    pub fn exception(&self) -> Option<&SharedError> {
        self.exception.as_ref()
    }

    pub fn set_exception(&mut self, exception: Option<SharedError>) {
        self.exception = exception;
    }

    /// Context properties, if any were ever written
    pub fn properties(&self) -> Option<&LogContext> {
        self.properties.as_ref()
    }

    /// Context properties, allocated on first use
    pub fn properties_mut(&mut self) -> &mut LogContext {
        self.properties.get_or_insert_with(LogContext::new)
    }

    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn cached_layout_value(&self, layout: LayoutId) -> Option<&str> {
        self.layout_cache.as_ref()?.get(&layout).map(String::as_str)
    }

    pub fn add_cached_layout_value(&mut self, layout: LayoutId, value: impl Into<String>) {
        self.layout_cache
            .get_or_insert_with(HashMap::new)
            .insert(layout, value.into());
    }

    /// Return the cached rendering for `layout`, producing and caching it first if absent
    pub fn cached_layout_or_render<F>(&mut self, layout: LayoutId, render: F) -> Result<String>
    where
        F: FnOnce(&LogRecord) -> Result<String>,
    {
        if let Some(cached) = self.cached_layout_value(layout) {
            return Ok(cached.to_string());
        }
        let rendered = render(self)?;
        self.add_cached_layout_value(layout, rendered.clone());
        Ok(rendered)
    }
}

impl fmt::Debug for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogRecord")
            .field("level", &self.level)
            .field("logger_name", &self.logger_name)
            .field("timestamp", &self.timestamp)
            .field("sequence_id", &self.sequence_id)
            .field("message", &self.message)
            .field("parameters", &self.parameters)
            .field("formatted", &self.formatted.get())
            .field("exception", &self.exception.as_ref().map(|e| e.to_string()))
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
