//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use crate::classify::ClassifierRules;
use crate::dedup::DEFAULT_BUCKET_WIDTH;
use crate::error::{HemcalError, HemcalResult};
use crate::fetch::DEFAULT_FETCH_TIMEOUT;
use crate::source::CalendarSource;
use crate::sync::DEFAULT_PACE;

/// Durations are written human-readable in the config file ("5m", "250ms").
mod duration_format {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(d)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    #[serde(with = "duration_format", default = "default_bucket_width")]
    pub bucket_width: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        DedupConfig {
            bucket_width: DEFAULT_BUCKET_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(with = "duration_format", default = "default_fetch_timeout")]
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Remote calendar service connection.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub base_url: String,
    pub calendar_id: String,
    #[serde(with = "duration_format", default = "default_pace")]
    pub pace: Duration,
}

fn default_bucket_width() -> Duration {
    DEFAULT_BUCKET_WIDTH
}

fn default_fetch_timeout() -> Duration {
    DEFAULT_FETCH_TIMEOUT
}

fn default_pace() -> Duration {
    DEFAULT_PACE
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hemcal")
}

#[derive(Debug, Clone, Deserialize)]
pub struct HemcalConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
    #[serde(default)]
    pub rules: ClassifierRules,
    #[serde(default)]
    pub sources: Vec<CalendarSource>,
}

impl HemcalConfig {
    pub fn config_path() -> HemcalResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| HemcalError::Config("no config directory on this platform".into()))?;
        Ok(dir.join("hemcal").join("hemcal.toml"))
    }

    /// Load the config file, creating a commented default on first run.
    pub fn load() -> HemcalResult<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            Self::create_default_config(&path)?;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> HemcalResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| HemcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| HemcalError::Config(e.to_string()))
    }

    /// The data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(expanded)
    }

    fn create_default_config(path: &Path) -> HemcalResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let template = r#"# hemcal configuration

# Where the event set and sync mappings are stored.
# data_dir = "~/.local/share/hemcal"

[dedup]
# Events with the same normalized title whose starts fall in the same bucket
# are treated as one occurrence.
bucket_width = "5m"

[fetch]
# Per-source fetch timeout.
timeout = "30s"

# Remote calendar service to push the shared calendar to.
# [sync]
# base_url = "https://calendar.example.com/api"
# calendar_id = "family"
# pace = "250ms"

[rules]
# Recurring training/lesson events auto-approve even from inbox-only sources.
training_keywords = ["träning", "traning", "lesson", "simskola"]
# Notable events always wait for a manual decision.
notable_keywords = ["cup", "turnering", "match", "final", "läger"]

# [[sources]]
# id = "laget"
# name = "Lagets kalender"
# kind = "ics-feed"
# url = "https://lagsidan.example.com/feed.ics"
# inbox_only = true

# [[sources]]
# id = "skolan"
# name = "Skolans kalender"
# kind = "remote-api"
# url = "https://skolportal.example.com/api/events"
"#;

        std::fs::write(path, template)?;
        Ok(())
    }
}
