//! Rule-based configuration
//!
//! A [`LoggingConfiguration`] is an ordered list of [`LoggingRule`]s. Each rule
//! matches logger names by pattern and a set of levels, and names the targets
//! matching records go to. [`LoggingConfiguration::snapshot_for`] folds the
//! rules into the per-logger [`StaticConfiguration`] a logger's gate consumes.
//!
//! Rules are plain serde values; reading them from a file is left to the
//! caller.

use super::configuration::{StaticConfiguration, StaticConfigurationBuilder};
use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};

/// Logger name pattern with `*` wildcards at either end
#[derive(Debug, Clone, PartialEq, Eq)]
enum NamePattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl NamePattern {
    fn parse(pattern: &str) -> Result<Self> {
        let starts = pattern.starts_with('*');
        let ends = pattern.len() > 1 && pattern.ends_with('*');
        let core = pattern
            .strip_prefix('*')
            .unwrap_or(pattern);
        let core = if ends { core.strip_suffix('*').unwrap_or(core) } else { core };

        if core.contains('*') {
            return Err(LoggerError::config(
                "LoggingRule",
                format!("wildcard only allowed at start or end of pattern '{}'", pattern),
            ));
        }

        Ok(match (starts, ends) {
            _ if pattern == "*" => NamePattern::Any,
            (true, true) => NamePattern::Contains(core.to_string()),
            (true, false) => NamePattern::Suffix(core.to_string()),
            (false, true) => NamePattern::Prefix(core.to_string()),
            (false, false) => NamePattern::Exact(core.to_string()),
        })
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(s) => name == s,
            NamePattern::Prefix(s) => name.starts_with(s.as_str()),
            NamePattern::Suffix(s) => name.ends_with(s.as_str()),
            NamePattern::Contains(s) => name.contains(s.as_str()),
        }
    }
}

/// One routing rule
///
/// When `levels` is set it lists the enabled levels exactly; otherwise the
/// rule covers `min_level..=max_level`, defaulting to every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingRule {
    pub name_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<LogLevel>>,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Once this rule matches a logger name, no later sibling rule is
    /// evaluated for that logger, whatever levels this rule covers
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// Rules evaluated right after this one, only when it matches
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LoggingRule>,
}

impl LoggingRule {
    /// Rule for `name_pattern` at `min_level` and above
    pub fn new(name_pattern: impl Into<String>, min_level: LogLevel) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            min_level: Some(min_level),
            max_level: None,
            levels: None,
            targets: Vec::new(),
            is_final: false,
            children: Vec::new(),
        }
    }

    /// Rule for an explicit set of levels
    pub fn for_levels<I>(name_pattern: impl Into<String>, levels: I) -> Self
    where
        I: IntoIterator<Item = LogLevel>,
    {
        Self {
            name_pattern: name_pattern.into(),
            min_level: None,
            max_level: None,
            levels: Some(levels.into_iter().collect()),
            targets: Vec::new(),
            is_final: false,
            children: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_level(mut self, level: LogLevel) -> Self {
        self.max_level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn write_to(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn final_rule(mut self) -> Self {
        self.is_final = true;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_child_rule(mut self, rule: LoggingRule) -> Self {
        self.children.push(rule);
        self
    }

    fn name_matches(&self, logger_name: &str) -> bool {
        NamePattern::parse(&self.name_pattern)
            .map(|p| p.matches(logger_name))
            .unwrap_or(false)
    }

    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        if level == LogLevel::Off {
            return false;
        }
        match &self.levels {
            Some(levels) => levels.contains(&level),
            None => {
                let min = self.min_level.unwrap_or(LogLevel::Trace);
                let max = self.max_level.unwrap_or(LogLevel::Fatal);
                level >= min && level <= max
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name_pattern.is_empty() {
            return Err(LoggerError::config("LoggingRule", "name pattern must not be empty"));
        }
        NamePattern::parse(&self.name_pattern)?;
        self.children.iter().try_for_each(LoggingRule::validate)
    }
}

/// Ordered set of rules; earlier rules contribute their targets first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfiguration {
    #[serde(default)]
    pub rules: Vec<LoggingRule>,
}

impl LoggingConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn with_rule(mut self, rule: LoggingRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.iter().try_for_each(LoggingRule::validate)
    }

    /// Resolve the rules for one logger.
    ///
    /// Rules with invalid patterns never match; call [`validate`] first to
    /// reject them.
    ///
    /// [`validate`]: LoggingConfiguration::validate
    pub fn snapshot_for(&self, logger_name: &str) -> StaticConfiguration {
        self.snapshot_with_threshold(logger_name, LogLevel::Trace)
    }

    /// Like [`snapshot_for`](LoggingConfiguration::snapshot_for), but levels
    /// below `threshold` stay disabled whatever the rules say
    pub fn snapshot_with_threshold(
        &self,
        logger_name: &str,
        threshold: LogLevel,
    ) -> StaticConfiguration {
        let mut builder = StaticConfiguration::builder();
        collect_targets(&self.rules, logger_name, threshold, &mut builder);
        builder.build()
    }
}

fn collect_targets(
    rules: &[LoggingRule],
    logger_name: &str,
    threshold: LogLevel,
    builder: &mut StaticConfigurationBuilder,
) {
    for rule in rules.iter().filter(|rule| rule.name_matches(logger_name)) {
        for level in LogLevel::ENABLEABLE {
            if level >= threshold && rule.is_level_enabled(level) {
                builder.append(level, rule.targets.iter().cloned());
            }
        }

        collect_targets(&rule.children, logger_name, threshold, builder);

        if rule.is_final {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::configuration::ConfigurationSnapshot;

    #[test]
    fn test_name_patterns() {
        let cases = [
            ("*", "anything", true),
            ("App", "App", true),
            ("App", "App.Db", false),
            ("App.*", "App.Db", true),
            ("App.*", "Other.Db", false),
            ("*.Db", "App.Db", true),
            ("*Service*", "App.UserService.Cache", true),
            ("*Service*", "App.Db", false),
        ];
        for (pattern, name, expected) in cases {
            let parsed = NamePattern::parse(pattern).unwrap();
            assert_eq!(parsed.matches(name), expected, "{} vs {}", pattern, name);
        }
        assert!(NamePattern::parse("App*Db").is_err());
    }

    #[test]
    fn test_rule_levels() {
        let rule = LoggingRule::new("*", LogLevel::Info).max_level(LogLevel::Error);
        assert!(!rule.is_level_enabled(LogLevel::Debug));
        assert!(rule.is_level_enabled(LogLevel::Info));
        assert!(rule.is_level_enabled(LogLevel::Error));
        assert!(!rule.is_level_enabled(LogLevel::Fatal));
        assert!(!rule.is_level_enabled(LogLevel::Off));

        let rule = LoggingRule::for_levels("*", [LogLevel::Trace, LogLevel::Fatal]);
        assert!(rule.is_level_enabled(LogLevel::Trace));
        assert!(!rule.is_level_enabled(LogLevel::Info));
    }

    #[test]
    fn test_snapshot_combines_rules_in_order() {
        let config = LoggingConfiguration::new()
            .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("console"))
            .with_rule(LoggingRule::new("App.Db", LogLevel::Debug).write_to("db-file"));

        let db = config.snapshot_for("App.Db");
        assert_eq!(db.resolve(LogLevel::Debug).unwrap().targets(), ["db-file"]);
        assert_eq!(db.resolve(LogLevel::Warn).unwrap().targets(), ["console", "db-file"]);

        let web = config.snapshot_for("App.Web");
        assert!(web.resolve(LogLevel::Debug).is_none());
        assert_eq!(web.resolve(LogLevel::Info).unwrap().targets(), ["console"]);
    }

    #[test]
    fn test_final_rule_stops_later_rules() {
        let config = LoggingConfiguration::new()
            .with_rule(LoggingRule::new("Noisy.*", LogLevel::Trace).final_rule())
            .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("console"));

        let noisy = config.snapshot_for("Noisy.Poller");
        assert!(noisy.enabled_levels().is_empty());

        let quiet = config.snapshot_for("App");
        assert!(quiet.is_enabled(LogLevel::Info));
    }

    #[test]
    fn test_final_rule_stops_later_rules_for_uncovered_levels() {
        let config = LoggingConfiguration::new()
            .with_rule(LoggingRule::for_levels("App.*", [LogLevel::Error]).write_to("a").final_rule())
            .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("b"));

        let db = config.snapshot_for("App.Db");
        assert!(db.resolve(LogLevel::Info).is_none());
        assert!(db.resolve(LogLevel::Fatal).is_none());
        assert_eq!(db.resolve(LogLevel::Error).unwrap().targets(), ["a"]);

        let web = config.snapshot_for("Web");
        assert_eq!(web.resolve(LogLevel::Error).unwrap().targets(), ["b"]);
    }

    #[test]
    fn test_child_rules_follow_matching_parent() {
        let config = LoggingConfiguration::new()
            .with_rule(
                LoggingRule::new("App.*", LogLevel::Warn)
                    .write_to("app")
                    .with_child_rule(LoggingRule::new("*.Db", LogLevel::Debug).write_to("db"))
                    .with_child_rule(LoggingRule::new("*", LogLevel::Error).write_to("alerts")),
            )
            .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("console"));

        let db = config.snapshot_for("App.Db");
        assert_eq!(db.resolve(LogLevel::Debug).unwrap().targets(), ["db"]);
        assert_eq!(
            db.resolve(LogLevel::Error).unwrap().targets(),
            ["app", "db", "alerts", "console"]
        );

        let other = config.snapshot_for("Other.Db");
        assert!(other.resolve(LogLevel::Debug).is_none());
        assert_eq!(other.resolve(LogLevel::Error).unwrap().targets(), ["console"]);
    }

    #[test]
    fn test_final_child_rule_only_stops_its_siblings() {
        let config = LoggingConfiguration::new()
            .with_rule(
                LoggingRule::new("App.*", LogLevel::Info)
                    .write_to("app")
                    .with_child_rule(LoggingRule::new("*", LogLevel::Info).write_to("first").final_rule())
                    .with_child_rule(LoggingRule::new("*", LogLevel::Info).write_to("skipped")),
            )
            .with_rule(LoggingRule::new("*", LogLevel::Info).write_to("console"));

        let app = config.snapshot_for("App.Api");
        assert_eq!(
            app.resolve(LogLevel::Info).unwrap().targets(),
            ["app", "first", "console"]
        );
    }

    #[test]
    fn test_threshold_drops_lower_levels() {
        let config = LoggingConfiguration::new()
            .with_rule(LoggingRule::new("*", LogLevel::Trace).write_to("console"));

        let snapshot = config.snapshot_with_threshold("App", LogLevel::Warn);
        assert_eq!(snapshot.enabled_levels(), vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]);

        let off = config.snapshot_with_threshold("App", LogLevel::Off);
        assert!(off.enabled_levels().is_empty());
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "rules": [
                { "name_pattern": "App.*", "min_level": "Warn", "targets": ["file"], "final": true },
                { "name_pattern": "*", "levels": ["Info"], "targets": ["console"] }
            ]
        }"#;
        let config: LoggingConfiguration = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert!(config.rules[0].is_final);

        let app = config.snapshot_for("App.Api");
        assert_eq!(app.enabled_levels(), vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]);
        assert_eq!(app.resolve(LogLevel::Error).unwrap().targets(), ["file"]);
        assert!(app.resolve(LogLevel::Info).is_none());

        let other = config.snapshot_for("Worker");
        assert_eq!(other.resolve(LogLevel::Info).unwrap().targets(), ["console"]);
    }

    #[test]
    fn test_validate_rejects_bad_patterns() {
        let config = LoggingConfiguration::new().with_rule(LoggingRule::new("", LogLevel::Info));
        assert!(config.validate().is_err());

        let config = LoggingConfiguration::new().with_rule(LoggingRule::new("a*b", LogLevel::Info));
        assert!(matches!(
            config.validate(),
            Err(LoggerError::InvalidConfiguration { .. })
        ));

        let nested = LoggingConfiguration::new().with_rule(
            LoggingRule::new("*", LogLevel::Info).with_child_rule(LoggingRule::new("x*y", LogLevel::Info)),
        );
        assert!(nested.validate().is_err());
    }
}
