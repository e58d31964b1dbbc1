//! Record layouts shared by the reference appenders
//!
//! A [`Layout`] turns a [`LogRecord`] into one line of text. Each layout
//! instance owns a [`LayoutId`]; rendering goes through the record's layout
//! cache, so several appenders sharing a layout render each record once.

use crate::core::{LayoutId, LogRecord, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the record timestamp is written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,
    /// `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,
    /// `2025-01-08T10:30:45+00:00`
    Rfc3339,
    /// Milliseconds since the Unix epoch
    UnixMillis,
    /// strftime format string
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    fn to_json(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::UnixMillis => datetime.timestamp_millis().into(),
            _ => serde_json::Value::String(self.format(datetime)),
        }
    }
}

/// Output shape of a layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutFormat {
    /// `timestamp [LEVEL] logger - message key=value | exception`
    #[default]
    Text,
    /// One JSON object per record
    Json,
}

/// Renders records to a single line.
///
/// Clones share the original's [`LayoutId`] and therefore its cache slot.
///
/// # Example
///
/// ```
/// use logcore::appenders::Layout;
/// use logcore::{LogLevel, LogRecord};
///
/// let layout = Layout::text();
/// let mut record = LogRecord::new(LogLevel::Warn, "App.Db", "slow query");
/// let line = layout.render(&mut record)?;
/// assert!(line.ends_with("[WARN ] App.Db - slow query"));
/// # Ok::<(), logcore::LoggerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Layout {
    id: LayoutId,
    format: LayoutFormat,
    timestamp_format: TimestampFormat,
}

impl Layout {
    pub fn new(format: LayoutFormat) -> Self {
        Self {
            id: LayoutId::next(),
            format,
            timestamp_format: TimestampFormat::default(),
        }
    }

    pub fn text() -> Self {
        Self::new(LayoutFormat::Text)
    }

    pub fn json() -> Self {
        Self::new(LayoutFormat::Json)
    }

    /// Changing the timestamp format produces a distinct layout with its own cache slot
    #[must_use = "builder methods return a new value"]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self.id = LayoutId::next();
        self
    }

    pub fn id(&self) -> LayoutId {
        self.id
    }

    pub fn format(&self) -> LayoutFormat {
        self.format
    }

    /// Render `record`, reusing a cached rendering from an identical layout
    pub fn render(&self, record: &mut LogRecord) -> Result<String> {
        record.cached_layout_or_render(self.id, |record| self.render_uncached(record))
    }

    fn render_uncached(&self, record: &LogRecord) -> Result<String> {
        match self.format {
            LayoutFormat::Text => self.render_text(record),
            LayoutFormat::Json => self.render_json(record),
        }
    }

    fn render_text(&self, record: &LogRecord) -> Result<String> {
        let mut output = format!(
            "{} [{:5}] {} - {}",
            self.timestamp_format.format(&record.timestamp()),
            record.level().to_str(),
            record.logger_name(),
            record.formatted_message()?
        );

        if let Some(properties) = record.properties().filter(|p| !p.is_empty()) {
            output.push(' ');
            output.push_str(&properties.format_fields());
        }
        if let Some(exception) = record.exception() {
            output.push_str(" | ");
            output.push_str(&exception.to_string());
        }
        Ok(output)
    }

    fn render_json(&self, record: &LogRecord) -> Result<String> {
        let mut json_obj = serde_json::Map::new();

        json_obj.insert(
            "timestamp".to_string(),
            self.timestamp_format.to_json(&record.timestamp()),
        );
        json_obj.insert("level".to_string(), record.level().to_str().into());
        json_obj.insert("logger".to_string(), record.logger_name().into());
        json_obj.insert("sequence_id".to_string(), record.sequence_id().into());
        json_obj.insert("message".to_string(), record.formatted_message()?.into());

        if let Some(properties) = record.properties().filter(|p| !p.is_empty()) {
            json_obj.insert("properties".to_string(), properties.to_json());
        }
        if let Some(exception) = record.exception() {
            json_obj.insert("exception".to_string(), exception.to_string().into());
        }

        Ok(serde_json::to_string(&serde_json::Value::Object(json_obj))?)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::text()
    }
}
