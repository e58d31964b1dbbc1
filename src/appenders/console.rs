//! Console appender implementation

use super::layout::{Layout, LayoutFormat};
use crate::core::{Appender, LogLevel, LogRecord, Result};
use colored::Colorize;

/// Writes records to stdout, Error and Fatal to stderr
pub struct ConsoleAppender {
    name: String,
    use_colors: bool,
    layout: Layout,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            name: "console".to_string(),
            use_colors,
            layout: Layout::text(),
        }
    }

    /// Target name this appender is registered under (default `console`)
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the layout for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use logcore::appenders::{ConsoleAppender, Layout};
    ///
    /// let appender = ConsoleAppender::new().with_layout(Layout::json());
    /// ```
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Color the level tag of text output; the cached line itself stays plain
    fn decorate(&self, level: LogLevel, line: String) -> String {
        if !self.use_colors || self.layout.format() != LayoutFormat::Text {
            return line;
        }
        let tag = format!("[{:5}]", level.to_str());
        match line.split_once(&tag) {
            Some((head, tail)) => format!("{}{}{}", head, tag.color(level.color_code()), tail),
            None => line,
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, record: &mut LogRecord) -> Result<()> {
        let line = self.layout.render(record)?;
        let output = self.decorate(record.level(), line);

        // Route Error and Fatal levels to stderr, others to stdout
        match record.level() {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
