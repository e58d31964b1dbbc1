//! Configuration snapshots consumed by the level gate
//!
//! A [`ConfigurationSnapshot`] is an immutable answer to "where do records of
//! level L go". The core only ever asks it to [`resolve`] a level; how the
//! snapshot was produced is up to the configuration subsystem.
//!
//! [`resolve`]: ConfigurationSnapshot::resolve

use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Ordered list of targets a record is written to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetChain {
    targets: Vec<String>,
}

/// Shared handle to a resolved chain
pub type ChainHandle = Arc<TargetChain>;

impl TargetChain {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }
}

impl fmt::Display for TargetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.targets.join(" -> "))
    }
}

/// Immutable level-to-chain mapping supplied by the configuration subsystem.
///
/// Implementations must be pure: the same level always resolves to the same
/// answer for the lifetime of the snapshot. A level is enabled exactly when
/// `resolve` returns a chain.
pub trait ConfigurationSnapshot: Send + Sync {
    fn resolve(&self, level: LogLevel) -> Option<ChainHandle>;

    fn is_enabled(&self, level: LogLevel) -> bool {
        self.resolve(level).is_some()
    }
}

/// Snapshot backed by a fixed table, one optional chain per level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticConfiguration {
    chains: [Option<ChainHandle>; 6],
}

impl StaticConfiguration {
    pub fn builder() -> StaticConfigurationBuilder {
        StaticConfigurationBuilder::default()
    }

    /// Every level disabled
    pub fn disabled() -> Self {
        Self::default()
    }

    /// `min_level` and everything above it routed to `chain`
    pub fn from_min_level(min_level: LogLevel, chain: TargetChain) -> Self {
        Self::builder()
            .route_range(min_level, LogLevel::Fatal, chain.targets().iter().cloned())
            .build()
    }

    /// Levels that resolve to a chain, ascending
    pub fn enabled_levels(&self) -> Vec<LogLevel> {
        LogLevel::ENABLEABLE
            .into_iter()
            .filter(|level| self.chains[level.ordinal() as usize].is_some())
            .collect()
    }
}

impl ConfigurationSnapshot for StaticConfiguration {
    #[inline]
    fn resolve(&self, level: LogLevel) -> Option<ChainHandle> {
        self.chains.get(level.ordinal() as usize)?.clone()
    }
}

/// Accumulates targets per level; later routes append to earlier ones
#[derive(Debug, Default)]
pub struct StaticConfigurationBuilder {
    targets: [Vec<String>; 6],
}

impl StaticConfigurationBuilder {
    /// Append targets to the chain for `level`. Routing `Off` has no effect.
    #[must_use = "builder methods return a new value"]
    pub fn route<I, S>(mut self, level: LogLevel, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.append(level, targets);
        self
    }

    /// Append targets to every level in `min..=max`
    #[must_use = "builder methods return a new value"]
    pub fn route_range<I, S>(mut self, min: LogLevel, max: LogLevel, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        for level in LogLevel::ENABLEABLE {
            if level >= min && level <= max {
                self.append(level, targets.iter().cloned());
            }
        }
        self
    }

    pub(crate) fn append<I, S>(&mut self, level: LogLevel, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(slot) = self.targets.get_mut(level.ordinal() as usize) {
            slot.extend(targets.into_iter().map(Into::into));
        }
    }

    /// Levels with no targets stay disabled
    pub fn build(self) -> StaticConfiguration {
        let mut chains: [Option<ChainHandle>; 6] = Default::default();
        for (slot, targets) in chains.iter_mut().zip(self.targets) {
            if !targets.is_empty() {
                *slot = Some(Arc::new(TargetChain { targets }));
            }
        }
        StaticConfiguration { chains }
    }
}
