//! File appender implementation

use super::layout::Layout;
use crate::core::{Appender, LogRecord, LoggerError, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one line per record to a file through a buffered writer
pub struct FileAppender {
    name: String,
    path: PathBuf,
    writer: BufWriter<File>,
    layout: Layout,
}

impl FileAppender {
    /// Open `path` for appending, creating it if needed
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::io_operation("opening log file", path.display().to_string(), e))?;

        Ok(Self {
            name: "file".to_string(),
            path,
            writer: BufWriter::new(file),
            layout: Layout::text(),
        })
    }

    /// Target name this appender is registered under (default `file`)
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the layout for this appender
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use logcore::appenders::{FileAppender, Layout};
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_layout(Layout::json());
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&mut self, record: &mut LogRecord) -> Result<()> {
        let mut output = self.layout.render(record)?;
        output.push('\n');
        self.writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}
