//! Process-wide record sequence numbers
//!
//! Every [`LogRecord`](super::LogRecord) draws an id from a [`SequenceSource`]
//! at construction. All loggers built without an explicit source share
//! [`SequenceSource::global`], so ids are unique and totally ordered across
//! the process regardless of thread or logger.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Monotonic id generator backed by a single atomic counter.
///
/// `next()` is a single `fetch_add`: it never blocks and never takes a lock.
/// The counter is 64 bits wide, which at a billion records per second lasts
/// for centuries. Should it ever reach `u64::MAX`, `next()` panics rather
/// than wrapping around and handing out duplicate ids.
#[derive(Debug, Default)]
pub struct SequenceSource {
    counter: AtomicU64,
}

static GLOBAL: OnceLock<Arc<SequenceSource>> = OnceLock::new();

impl SequenceSource {
    /// Create a source whose first id is 1
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a source whose first id is `start + 1`
    pub const fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }

    /// The source shared by every logger that does not bring its own
    pub fn global() -> Arc<SequenceSource> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SequenceSource::new())))
    }

    /// Atomically increment and return the new value
    #[inline]
    pub fn next(&self) -> u64 {
        let previous = self.counter.fetch_add(1, Ordering::Relaxed);
        if previous == u64::MAX {
            panic!("sequence source exhausted: no ids remain after u64::MAX");
        }
        previous + 1
    }

    /// Last id handed out (0 if none yet)
    #[inline]
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}
