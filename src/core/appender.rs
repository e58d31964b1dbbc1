//! Appender trait for log output destinations

use super::{error::Result, log_record::LogRecord};

/// One named output destination behind a dispatch target.
///
/// The record is passed mutably so layouts can memoize their rendering in
/// the record's layout cache; appenders must not otherwise alter it.
pub trait Appender: Send + Sync {
    fn append(&mut self, record: &mut LogRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
