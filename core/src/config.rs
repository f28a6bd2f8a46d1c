//! Loading and saving [`AppConfig`] through confy.
//!
//! Without an explicit path the file lives in the platform config directory
//! under the `giveaway` application name. A missing file is created with
//! defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use giveaway_types::{AppConfig, EngineConfig};
use thiserror::Error;

pub const APP_NAME: &str = "giveaway";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[source] confy::ConfyError),
    #[error("failed to save config: {0}")]
    Save(#[source] confy::ConfyError),
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let loaded = match path {
        Some(path) => confy::load_path(path),
        None => confy::load(APP_NAME, None),
    };
    loaded.map_err(ConfigError::Load)
}

pub fn save_config(config: &AppConfig, path: Option<&Path>) -> Result<(), ConfigError> {
    let stored = match path {
        Some(path) => confy::store_path(path, config),
        None => confy::store(APP_NAME, None, config),
    };
    stored.map_err(ConfigError::Save)
}

/// Location of the default config file, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, None).ok()
}

/// Engine settings as `Duration`s.
pub trait EngineLimits {
    fn max_duration(&self) -> Duration;
    fn eviction_retention(&self) -> Option<Duration>;
}

impl EngineLimits for EngineConfig {
    fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    fn eviction_retention(&self) -> Option<Duration> {
        self.evict_resolved_after_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giveaway_types::RerollPolicy;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("giveaway-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = temp_path("defaults");
        let _ = std::fs::remove_file(&path);

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn saved_config_loads_back() {
        let path = temp_path("roundtrip");
        let mut config = AppConfig::default();
        config.moderators = vec![1, 2];
        config.engine.reroll_policy = RerollPolicy::ExcludePreviousWinners;

        save_config(&config, Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), config);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn engine_limits_as_durations() {
        let mut engine = EngineConfig::default();
        assert_eq!(engine.eviction_retention(), None);
        engine.evict_resolved_after_secs = Some(90);
        assert_eq!(engine.eviction_retention(), Some(Duration::from_secs(90)));
        assert_eq!(engine.max_duration(), Duration::from_secs(365 * 24 * 60 * 60));
    }
}
