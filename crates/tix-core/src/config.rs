use crate::error::{Result, TixError};
use crate::paths;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ProvidersConfig
// ---------------------------------------------------------------------------

/// Backend selection strings, resolved through `provider::registry` at
/// workspace construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_ticketing")]
    pub ticketing: String,
    #[serde(default = "default_none")]
    pub building: String,
    #[serde(default = "default_none")]
    pub reviewing: String,
    #[serde(default = "default_none")]
    pub releasing: String,
}

fn default_ticketing() -> String {
    "manual".to_string()
}

fn default_none() -> String {
    "none".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            ticketing: default_ticketing(),
            building: default_none(),
            reviewing: default_none(),
            releasing: default_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Branch new tickets are based on unless the ticket overrides it.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// Branch name pattern: %c ticket code, %u user, %t title slug.
    #[serde(default = "default_branch_naming")]
    pub branch_naming: String,

    /// User name substituted for %u in branch names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// How long build and review statuses are cached until refetched.
    #[serde(default = "default_caching_time_min")]
    pub caching_time_min: i64,

    /// When set, external status lookups are skipped entirely.
    #[serde(default)]
    pub offline_mode: bool,

    /// Start-of-day used when resuming timing on a new day (`HH:MM`).
    #[serde(default = "default_day_start")]
    pub day_start: String,

    /// End-of-day used to close stale open entries from earlier days.
    #[serde(default = "default_day_end")]
    pub day_end: String,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_version() -> u32 {
    1
}

fn default_base_branch() -> String {
    "master".to_string()
}

fn default_branch_naming() -> String {
    "%c_%u_%t".to_string()
}

fn default_caching_time_min() -> i64 {
    5
}

fn default_day_start() -> String {
    "09:00".to_string()
}

fn default_day_end() -> String {
    "17:00".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            base_branch: default_base_branch(),
            branch_naming: default_branch_naming(),
            user: None,
            caching_time_min: default_caching_time_min(),
            offline_mode: false,
            day_start: default_day_start(),
            day_end: default_day_end(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(TixError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn day_start(&self) -> Result<NaiveTime> {
        parse_day_bound(&self.day_start)
    }

    pub fn day_end(&self) -> Result<NaiveTime> {
        parse_day_bound(&self.day_end)
    }
}

fn parse_day_bound(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| TixError::InvalidTime(s.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::default();
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.base_branch, "master");
        assert_eq!(loaded.caching_time_min, 5);
        assert_eq!(loaded.providers.building, "none");
        assert!(!loaded.offline_mode);
    }

    #[test]
    fn load_without_config_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(TixError::NotInitialized)
        ));
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(cfg.branch_naming, "%c_%u_%t");
        assert_eq!(cfg.day_start, "09:00");
        assert_eq!(cfg.providers.ticketing, "manual");
    }

    #[test]
    fn day_bounds_parse() {
        let cfg = Config::default();
        assert_eq!(
            cfg.day_start().unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(
            cfg.day_end().unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap()
        );
    }

    #[test]
    fn bad_day_bound_rejected() {
        let cfg = Config {
            day_start: "later".to_string(),
            ..Config::default()
        };
        assert!(matches!(cfg.day_start(), Err(TixError::InvalidTime(_))));
    }
}
