//! Server Configuration
//!
//! Loaded from `quest-scripts.toml` (or the path in `QUEST_SCRIPTS_CONFIG`).
//! Every field has a default so a missing file is not an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{QuestError, Result};

pub const CONFIG_ENV_VAR: &str = "QUEST_SCRIPTS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "quest-scripts.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root of the data tree; quest files live under `<data_dir>/quests`
    pub data_dir: PathBuf,
    /// Watch quest files and reload on change
    pub hot_reload: bool,
    pub rates: RateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            hot_reload: true,
            rates: RateConfig::default(),
        }
    }
}

/// Multipliers applied to quest rewards
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Scales currency handed out on quest completion
    pub quest_reward_currency: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            quest_reward_currency: 1.0,
        }
    }
}

impl RateConfig {
    /// Apply the currency rate to a base amount, rounding down
    pub fn scale_currency(&self, amount: i64) -> i64 {
        (amount as f64 * self.quest_reward_currency).floor() as i64
    }
}

impl ServerConfig {
    /// Load from the env-configured path, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| QuestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| QuestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn validate(&self) -> Result<()> {
        let rate = self.rates.quest_reward_currency;
        if !rate.is_finite() || rate < 0.0 {
            return Err(QuestError::Config(format!(
                "rates.quest_reward_currency must be a non-negative number, got {}",
                rate
            )));
        }
        Ok(())
    }

    pub fn quests_dir(&self) -> PathBuf {
        self.data_dir.join("quests")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load_from(&temp_dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.hot_reload);
        assert_eq!(config.rates.quest_reward_currency, 1.0);
    }

    #[test]
    fn test_partial_file() {
        let config = ServerConfig::from_toml_str(
            r#"
hot_reload = false

[rates]
quest_reward_currency = 2.5
"#,
        )
        .unwrap();
        assert!(!config.hot_reload);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.rates.scale_currency(210_000), 525_000);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quest-scripts.toml");
        std::fs::write(&path, "[rates]\nquest_reward_currency = -1.0\n").unwrap();

        let err = ServerConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, QuestError::Config(_)));
    }
}
