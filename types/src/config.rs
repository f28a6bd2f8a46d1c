//! Configuration types shared between the engine and its hosts.
//!
//! Loading and saving lives in `giveaway-core`; these are plain serde structs
//! so a host can embed them in its own config file if it prefers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_MAX_WINNERS: u32 = 50;
const DEFAULT_MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// How a reroll chooses its candidate pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerollPolicy {
    /// Fresh sample over every current participant; previous winners may win again.
    #[default]
    AllowRepeats,
    /// Previous winners are removed from the pool before sampling.
    ExcludePreviousWinners,
}

/// Limits and policies applied by the lifecycle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on the requested winner count.
    pub max_winners: u32,
    /// Longest accepted giveaway duration.
    pub max_duration_secs: u64,
    pub reroll_policy: RerollPolicy,
    /// Retention for ended/cancelled giveaways. `None` keeps them forever.
    pub evict_resolved_after_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_winners: DEFAULT_MAX_WINNERS,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            reroll_policy: RerollPolicy::default(),
            evict_resolved_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for daily rolling log files. Logs go to stderr when unset.
    pub directory: Option<PathBuf>,
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            level: "info".to_string(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    /// Users allowed to end or cancel giveaways they did not host.
    pub moderators: Vec<u64>,
    pub log: LogConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.engine.max_winners, 50);
        assert_eq!(config.engine.reroll_policy, RerollPolicy::AllowRepeats);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn partial_engine_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            moderators = [7, 8]

            [engine]
            reroll_policy = "exclude_previous_winners"
            evict_resolved_after_secs = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.moderators, vec![7, 8]);
        assert_eq!(config.engine.reroll_policy, RerollPolicy::ExcludePreviousWinners);
        assert_eq!(config.engine.evict_resolved_after_secs, Some(3600));
        assert_eq!(config.engine.max_duration_secs, DEFAULT_MAX_DURATION_SECS);
    }

    #[test]
    fn serializes_back_to_toml() {
        let mut config = AppConfig::default();
        config.log.directory = Some(PathBuf::from("/tmp/giveaway-logs"));
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
