use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Local, Offset};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::selection::policy::PolicyConfig;

/// Upper bound for `[selection] lookahead_days`.
pub const MAX_LOOKAHEAD_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub selection: SelectionConfig,
    pub storage: StorageConfig,
    pub access: AccessConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub sport_id: u32,
    pub request_timeout_secs: u64,
    pub logo_base_url: String,
    pub headshot_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://statsapi.mlb.com/api".to_string(),
            sport_id: 1,
            request_timeout_secs: 10,
            logo_base_url: "https://www.mlbstatic.com/team-logos".to_string(),
            headshot_base_url:
                "https://img.mlbstatic.com/mlb-photos/image/upload/w_100,q_auto:best/v1/people"
                    .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub schedule_interval_secs: u64,
    pub detail_interval_secs: u64,
    /// How long a fetched future day stays cached while probing for the next game.
    pub lookahead_cache_ttl_secs: u64,
    pub detail_cache_ttl_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            schedule_interval_secs: 15,
            detail_interval_secs: 10,
            lookahead_cache_ttl_secs: 3600,
            detail_cache_ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub lookahead_days: u32,
    pub recent_limit: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let policy = PolicyConfig::default();
        Self {
            lookahead_days: policy.lookahead_days,
            recent_limit: policy.recent_limit,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "diamondwatch.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Host this viewer is deployed on.
    pub host: String,
    pub key: Option<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub tooltip_dismiss_secs: u64,
    /// Fixed offset for start times. Unset uses the machine's local offset.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            tooltip_dismiss_secs: 5,
            utc_offset_minutes: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub stats_api_url: Option<String>,
    pub access_key: Option<String>,
    pub host: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// A missing file means defaults. A file that exists but does not parse is an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::debug!(path, "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.polling.schedule_interval_secs == 0 {
            bail!("polling.schedule_interval_secs must be at least 1");
        }
        if self.polling.detail_interval_secs == 0 {
            bail!("polling.detail_interval_secs must be at least 1");
        }
        if self.api.request_timeout_secs == 0 {
            bail!("api.request_timeout_secs must be at least 1");
        }
        if self.selection.lookahead_days > MAX_LOOKAHEAD_DAYS {
            bail!(
                "selection.lookahead_days is {}, at most {} is allowed",
                self.selection.lookahead_days,
                MAX_LOOKAHEAD_DAYS
            );
        }
        Ok(())
    }

    /// Environment values win over the file.
    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = &env.stats_api_url {
            self.api.base_url = url.clone();
        }
        if let Some(key) = &env.access_key {
            self.access.key = Some(key.clone());
        }
        if let Some(host) = &env.host {
            self.access.host = host.clone();
        }
    }

    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig {
            lookahead_days: self.selection.lookahead_days,
            recent_limit: self.selection.recent_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.polling.schedule_interval_secs)
    }

    pub fn detail_interval(&self) -> Duration {
        Duration::from_secs(self.polling.detail_interval_secs)
    }

    pub fn tooltip_dismiss(&self) -> Duration {
        Duration::from_secs(self.display.tooltip_dismiss_secs)
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.display
            .utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .unwrap_or_else(|| Local::now().offset().fix())
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            stats_api_url: non_empty_var("STATS_API_URL"),
            access_key: non_empty_var("DIAMONDWATCH_ACCESS_KEY"),
            host: non_empty_var("DIAMONDWATCH_HOST"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.polling.schedule_interval_secs, 15);
        assert_eq!(config.polling.detail_interval_secs, 10);
        assert_eq!(config.selection.lookahead_days, 7);
        assert_eq!(config.selection.recent_limit, 5);
        assert_eq!(config.display.tooltip_dismiss_secs, 5);
        assert_eq!(config.api.sport_id, 1);
        assert_eq!(config.access.host, "localhost");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [polling]
            schedule_interval_secs = 30

            [selection]
            lookahead_days = 10

            [display]
            utc_offset_minutes = -240

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule_interval(), Duration::from_secs(30));
        assert_eq!(config.detail_interval(), Duration::from_secs(10));
        assert_eq!(config.policy().lookahead_days, 10);
        assert_eq!(config.policy().recent_limit, 5);
        assert_eq!(config.utc_offset(), FixedOffset::west_opt(4 * 3600).unwrap());
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_bad_value_is_error() {
        assert!(Config::parse("[polling]\nschedule_interval_secs = \"soon\"").is_err());
    }

    #[test]
    fn test_zero_intervals_rejected() {
        for contents in [
            "[polling]\nschedule_interval_secs = 0",
            "[polling]\ndetail_interval_secs = 0",
            "[api]\nrequest_timeout_secs = 0",
        ] {
            let err = Config::parse(contents).unwrap_err();
            assert!(format!("{:#}", err).contains("must be at least 1"), "{}", contents);
        }
    }

    #[test]
    fn test_lookahead_days_capped() {
        let config = Config::parse("[selection]\nlookahead_days = 366").unwrap();
        assert_eq!(config.policy().lookahead_days, MAX_LOOKAHEAD_DAYS);

        let err = Config::parse("[selection]\nlookahead_days = 4000000000").unwrap_err();
        assert!(format!("{:#}", err).contains("lookahead_days is 4000000000"));
        assert!(Config::parse("[selection]\nlookahead_days = 0").is_ok());
    }

    #[test]
    fn test_invalid_file_names_path() {
        let path = std::env::temp_dir().join(format!("diamondwatch-config-{}.toml", std::process::id()));
        fs::write(&path, "[polling]\nschedule_interval_secs = 0\n").unwrap();

        let err = Config::load(path.to_str().unwrap()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to parse config file"));
        assert!(message.contains("schedule_interval_secs"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::default();
        config.apply_env(&EnvConfig {
            stats_api_url: Some("http://127.0.0.1:9000/api".to_string()),
            access_key: Some("c2NvcmVz".to_string()),
            host: None,
        });

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.access.key.as_deref(), Some("c2NvcmVz"));
        assert_eq!(config.access.host, "localhost");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_or_default("/nonexistent/diamondwatch.toml").unwrap();
        assert_eq!(config.storage.database_path, "diamondwatch.db");
        assert!(Config::load("/nonexistent/diamondwatch.toml").is_err());
    }
}
