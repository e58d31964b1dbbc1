//! Dispatch sink trait: hands finished records to the output pipeline

use super::configuration::ChainHandle;
use super::error::Result;
use super::log_record::LogRecord;
use parking_lot::Mutex;

/// Receives every record produced by an enabled logging call.
///
/// `write` is invoked exactly once per enabled call, on the logging thread,
/// and never for disabled levels. Ownership of the record moves into the
/// sink. A sink may block; nothing in the core does.
pub trait DispatchSink: Send + Sync {
    fn write(&self, logger_name: &str, chain: ChainHandle, record: LogRecord) -> Result<()>;
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DispatchSink for NullSink {
    #[inline]
    fn write(&self, _logger_name: &str, _chain: ChainHandle, _record: LogRecord) -> Result<()> {
        Ok(())
    }
}

/// One captured dispatch
#[derive(Debug)]
pub struct Dispatched {
    pub logger_name: String,
    pub chain: ChainHandle,
    pub record: LogRecord,
}

/// Sink that keeps every record it receives, in arrival order
#[derive(Debug, Default)]
pub struct CapturingSink {
    records: Mutex<Vec<Dispatched>>,
}

impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Remove and return everything captured so far
    pub fn take(&self) -> Vec<Dispatched> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl DispatchSink for CapturingSink {
    fn write(&self, logger_name: &str, chain: ChainHandle, record: LogRecord) -> Result<()> {
        self.records.lock().push(Dispatched {
            logger_name: logger_name.to_string(),
            chain,
            record,
        });
        Ok(())
    }
}
