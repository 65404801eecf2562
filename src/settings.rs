use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Mapping table used when `--mapping` is not given.
    #[serde(default = "default_mapping")]
    pub mapping: String,
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_mapping() -> String {
    "./mapping.xlsx".to_string()
}

fn default_write_attempts() -> u32 {
    60
}

fn default_retry_delay_secs() -> u64 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mapping: default_mapping(),
            write_attempts: default_write_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Settings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ynabify")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Ignoring invalid settings file {}: {e}", path.display());
        Settings::default()
    })
}

/// Expand a leading `~` and canonicalize when the path exists.
pub fn shellexpand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches(['/', '\\']));
        }
    }
    std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path))
}
