//! Reference appenders and the dispatch sink that drives them

#[cfg(feature = "console")]
pub mod console;
pub mod file;
pub mod layout;
pub mod memory;
pub mod sink;

#[cfg(feature = "console")]
pub use console::ConsoleAppender;
pub use file::FileAppender;
pub use layout::{Layout, LayoutFormat, TimestampFormat};
pub use memory::MemoryAppender;
pub use sink::AppenderSink;

pub use crate::core::Appender;
