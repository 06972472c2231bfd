use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::extract::{DEFAULT_CHUNK_MAX_CHARS, DEFAULT_DESCRIPTION_COLUMN};
use crate::oracle::ProviderConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory (~/.local/share/skutab)
    pub data_dir: PathBuf,
    /// Persisted user settings
    pub settings_file: PathBuf,
}

impl Config {
    /// Load configuration or use defaults
    pub fn load_or_default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skutab");

        Self {
            settings_file: data_dir.join("settings.json"),
            data_dir,
        }
    }
}

/// User settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Oracle backend
    pub provider: ProviderConfig,
    /// Deadline for one oracle call
    pub oracle_timeout_secs: u64,
    /// Largest document chunk sent as one unit
    pub chunk_max_chars: usize,
    /// Description column of row-oriented inputs
    pub description_column: String,
    /// How long finished jobs stay pollable
    pub job_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            oracle_timeout_secs: 120,
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            job_ttl_secs: 3600,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("Failed to read settings {:?}: {}", path, e);
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Invalid settings file {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn job_ttl(&self) -> Duration {
        Duration::from_secs(self.job_ttl_secs)
    }
}
