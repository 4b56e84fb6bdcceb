//! Configuration for Paws.

use crate::actions::default_lock_command;
use crate::core::{KeyboardLayout, LayoutError, LayoutSource};
use crate::rules::{
    AdjacencyRule, LatestCountRule, Rule, RuleChain, RuleError, SelfAdjacency, TimeWindowRule,
    UnreleasedCountRule,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rules evaluated in order on every key event
    pub rules: Vec<RuleSpec>,

    /// Keyboard layout used for adjacency
    pub layout: LayoutSource,

    /// What to do when a paw is detected
    pub action: ActionConfig,

    pub logging: LoggingConfig,

    /// Path for storing transparency stats
    pub data_path: PathBuf,

    /// Whether detection is currently paused
    pub paused: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paws");

        Self {
            rules: RuleSpec::defaults(),
            layout: LayoutSource::default(),
            action: ActionConfig::default(),
            logging: LoggingConfig::default(),
            data_path: data_dir,
            paused: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("paws")
            .join("config.json")
    }

    /// Where cumulative transparency stats are kept.
    pub fn transparency_path(&self) -> PathBuf {
        self.data_path.join("transparency.json")
    }

    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    pub fn build_layout(&self) -> Result<KeyboardLayout, ConfigError> {
        Ok(self.layout.build()?)
    }

    /// Validate every rule and assemble the chain.
    ///
    /// An empty chain would report a paw on every key press, so it is
    /// rejected.
    pub fn build_chain(&self) -> Result<RuleChain, ConfigError> {
        if self.rules.is_empty() {
            return Err(ConfigError::NoRules);
        }

        let layout = self.build_layout()?;
        let rules = self
            .rules
            .iter()
            .map(|spec| spec.build(&layout))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RuleChain::new(rules))
    }
}

/// One entry of the rule list, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleSpec {
    TimeWindow {
        num_seconds: f64,
    },
    UnreleasedCount {
        num_events: usize,
    },
    Adjacency {
        distance: usize,
        #[serde(default)]
        self_adjacency: SelfAdjacency,
    },
    LatestCount {
        num_events: usize,
    },
}

impl RuleSpec {
    /// The stock chain: 50 ms window, three held keys, 3x3 neighborhood.
    pub fn defaults() -> Vec<RuleSpec> {
        vec![
            RuleSpec::TimeWindow { num_seconds: 0.05 },
            RuleSpec::UnreleasedCount { num_events: 3 },
            RuleSpec::Adjacency {
                distance: 3,
                self_adjacency: SelfAdjacency::default(),
            },
        ]
    }

    pub fn build(&self, layout: &KeyboardLayout) -> Result<Rule, RuleError> {
        let rule = match self {
            RuleSpec::TimeWindow { num_seconds } => TimeWindowRule::new(*num_seconds)?.into(),
            RuleSpec::UnreleasedCount { num_events } => {
                UnreleasedCountRule::new(*num_events)?.into()
            }
            RuleSpec::Adjacency {
                distance,
                self_adjacency,
            } => AdjacencyRule::new(layout, *distance, *self_adjacency)?.into(),
            RuleSpec::LatestCount { num_events } => LatestCountRule::new(*num_events)?.into(),
        };
        Ok(rule)
    }
}

/// Command run when a paw is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Program followed by its arguments. Empty disables the action.
    pub command: Vec<String>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            command: default_lock_command(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "paws=debug"
    pub level: String,
    pub json: bool,
    /// Log to daily files in this directory instead of stderr
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            log_dir: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),
    #[error("At least one rule must be configured")]
    NoRules,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{EligibilityRule, RuleKind};

    #[test]
    fn test_default_chain() {
        let chain = Config::default().build_chain().unwrap();
        let kinds: Vec<RuleKind> = chain.rules().iter().map(|r| r.kind()).collect();
        assert_eq!(
            kinds,
            vec![RuleKind::TimeWindow, RuleKind::UnreleasedCount, RuleKind::Adjacency]
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.paused = true;
        config.layout = LayoutSource::CapsAsCtrl;
        config.rules.push(RuleSpec::LatestCount { num_events: 5 });
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"paused": true}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.paused);
        assert_eq!(config.rules, RuleSpec::defaults());
    }

    #[test]
    fn test_rule_list_format() {
        let json = r#"{
            "rules": [
                {"kind": "time_window", "num_seconds": 0.1},
                {"kind": "adjacency", "distance": 5, "self_adjacency": "excluded"},
                {"kind": "latest_count", "num_events": 4}
            ],
            "layout": {"custom": [["q", "w", null], ["a", "s", 54]]}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(
            config.rules[1],
            RuleSpec::Adjacency {
                distance: 5,
                self_adjacency: SelfAdjacency::Excluded
            }
        );
        let chain = config.build_chain().unwrap();
        assert_eq!(chain.len(), 3);
    }

    #[test]
    fn test_self_adjacency_defaults_to_counted() {
        let spec: RuleSpec = serde_json::from_str(r#"{"kind": "adjacency", "distance": 3}"#).unwrap();
        assert_eq!(
            spec,
            RuleSpec::Adjacency {
                distance: 3,
                self_adjacency: SelfAdjacency::Counted
            }
        );
    }

    #[test]
    fn test_invalid_thresholds_fail_fast() {
        let mut config = Config::default();
        config.rules = vec![RuleSpec::TimeWindow { num_seconds: -1.0 }];
        assert!(matches!(
            config.build_chain(),
            Err(ConfigError::Rule(RuleError::InvalidWindow(_)))
        ));

        config.rules = vec![RuleSpec::UnreleasedCount { num_events: 0 }];
        assert!(matches!(
            config.build_chain(),
            Err(ConfigError::Rule(RuleError::ZeroEventCount))
        ));
    }

    #[test]
    fn test_empty_rule_list_rejected() {
        let mut config = Config::default();
        config.rules.clear();
        assert!(matches!(config.build_chain(), Err(ConfigError::NoRules)));
    }

    #[test]
    fn test_ragged_custom_layout_rejected() {
        let mut config = Config::default();
        config.layout = LayoutSource::Custom(vec![
            vec![Some("a".into()), Some("b".into())],
            vec![Some("c".into())],
        ]);
        assert!(matches!(config.build_chain(), Err(ConfigError::Layout(_))));
    }
}
