//! Lock-free level gate
//!
//! The gate answers "is level L enabled" with one atomic load and lets a
//! reconfiguring thread swap the active snapshot without ever blocking a
//! reader.
//!
//! The six per-level flags live in a single `AtomicU8`, so a reader always
//! sees a mask computed from exactly one snapshot. Publication order on
//! [`LevelGate::apply`] is: store the new snapshot, then store the new mask
//! with `Release`. A reader that loads the mask with `Acquire` and then loads
//! the snapshot therefore sees a snapshot at least as new as the mask it
//! acted on. The reverse is not guaranteed: a reader holding an old mask may
//! already see the new snapshot, and a level it believed enabled may resolve
//! to [`Resolution::Disabled`]. Callers treat that as "not enabled".

use super::configuration::{ChainHandle, ConfigurationSnapshot};
use super::log_level::LogLevel;
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Outcome of asking the gate where a level's records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No configuration has ever been applied
    Unconfigured,
    /// The current snapshot routes this level nowhere
    Disabled,
    Chain(ChainHandle),
}

struct Installed {
    snapshot: Arc<dyn ConfigurationSnapshot>,
    generation: u64,
}

/// Per-logger enabled flags plus the active snapshot.
///
/// Starts unconfigured with every level disabled. Exactly one thread at a
/// time may call [`apply`](LevelGate::apply); readers are unrestricted.
pub struct LevelGate {
    enabled: AtomicU8,
    current: ArcSwapOption<Installed>,
    generation: AtomicU64,
}

impl LevelGate {
    pub fn new() -> Self {
        Self {
            enabled: AtomicU8::new(0),
            current: ArcSwapOption::const_empty(),
            generation: AtomicU64::new(0),
        }
    }

    /// Single atomic load, no locks, independent of chain size
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.enabled.load(Ordering::Acquire) & level.mask_bit() != 0
    }

    /// Resolve the chain for `level` against the current snapshot.
    ///
    /// Intended for the enabled path only, after [`is_enabled`] said yes.
    ///
    /// [`is_enabled`]: LevelGate::is_enabled
    pub fn resolve_chain(&self, level: LogLevel) -> Resolution {
        let current = self.current.load();
        match current.as_ref() {
            None => Resolution::Unconfigured,
            Some(installed) => match installed.snapshot.resolve(level) {
                Some(chain) => Resolution::Chain(chain),
                None => Resolution::Disabled,
            },
        }
    }

    /// Install `snapshot`, recompute all flags from it, and return the new
    /// configuration generation (1 for the first application).
    pub fn apply(&self, snapshot: Arc<dyn ConfigurationSnapshot>) -> u64 {
        let mask = Self::compute_mask(snapshot.as_ref());
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        self.current.store(Some(Arc::new(Installed {
            snapshot,
            generation,
        })));
        self.enabled.store(mask, Ordering::Release);
        generation
    }

    fn compute_mask(snapshot: &dyn ConfigurationSnapshot) -> u8 {
        LogLevel::ENABLEABLE
            .into_iter()
            .filter(|level| snapshot.is_enabled(*level))
            .fold(0, |mask, level| mask | level.mask_bit())
    }

    pub fn is_configured(&self) -> bool {
        self.current.load().is_some()
    }

    /// Generation of the installed snapshot, 0 while unconfigured
    pub fn generation(&self) -> u64 {
        self.current
            .load()
            .as_ref()
            .map_or(0, |installed| installed.generation)
    }

    /// The installed snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<dyn ConfigurationSnapshot>> {
        self.current
            .load()
            .as_ref()
            .map(|installed| Arc::clone(&installed.snapshot))
    }

    /// Levels currently enabled, ascending
    pub fn enabled_levels(&self) -> Vec<LogLevel> {
        let mask = self.enabled.load(Ordering::Acquire);
        LogLevel::ENABLEABLE
            .into_iter()
            .filter(|level| mask & level.mask_bit() != 0)
            .collect()
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LevelGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelGate")
            .field("enabled", &self.enabled_levels())
            .field("generation", &self.generation())
            .finish()
    }
}
