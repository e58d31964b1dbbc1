//! In-memory appender for tests and diagnostics

use super::layout::Layout;
use crate::core::{Appender, LogRecord, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Keeps rendered lines in memory.
///
/// Clones share the same buffer, so a clone kept by the caller observes
/// everything written through the one handed to an [`AppenderSink`].
///
/// [`AppenderSink`]: super::AppenderSink
#[derive(Clone)]
pub struct MemoryAppender {
    name: String,
    layout: Layout,
    lines: Arc<Mutex<Vec<String>>>,
    max_lines: Option<usize>,
}

impl MemoryAppender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layout: Layout::text(),
            lines: Arc::new(Mutex::new(Vec::new())),
            max_lines: None,
        }
    }

    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Keep only the most recent `max_lines` lines
    #[must_use]
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = Some(max_lines);
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, record: &mut LogRecord) -> Result<()> {
        let line = self.layout.render(record)?;
        let mut lines = self.lines.lock();
        lines.push(line);
        if let Some(max) = self.max_lines {
            let excess = lines.len().saturating_sub(max);
            lines.drain(..excess);
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_clones_share_buffer() {
        let observer = MemoryAppender::new("memory");
        let mut writer = observer.clone();

        writer
            .append(&mut LogRecord::new(LogLevel::Info, "App", "hello"))
            .unwrap();
        assert_eq!(observer.len(), 1);
        assert!(observer.lines()[0].ends_with("App - hello"));

        observer.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn test_max_lines_keeps_newest() {
        let mut appender = MemoryAppender::new("ring").with_max_lines(2);
        for msg in ["a", "b", "c"] {
            appender
                .append(&mut LogRecord::new(LogLevel::Info, "App", msg))
                .unwrap();
        }
        let lines = appender.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - b"));
        assert!(lines[1].ends_with(" - c"));
    }
}
