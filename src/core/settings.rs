//! Application settings management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::kind::MANAGED_LAUNCH_KIND;
use super::launch::LaunchConfig;

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "launch-eliminator";

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Known launch configurations
    pub launch_configurations: Vec<LaunchConfig>,
    /// How often the process watcher checks for exited processes (ms)
    pub poll_interval_ms: u32,
    /// Custom data directory
    pub data_directory: Option<PathBuf>,
    /// Enable debug logging
    pub debug_logging: bool,
    /// Identifier recorded with every diagnostic
    pub plugin_id: String,
    /// Keep diagnostics for N days (0 = forever)
    pub history_retention_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            launch_configurations: Vec::new(),
            poll_interval_ms: 100,
            data_directory: None,
            debug_logging: false,
            plugin_id: "com.eclipsesource.launch.osgi.eliminator".to_string(),
            history_retention_days: 30,
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
            .join("settings.json")
    }

    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        let mut settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {:?}", path))?;
        settings.validate();
        Ok(settings)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    /// Get the data directory, using default if not set
    pub fn get_data_directory(&self) -> PathBuf {
        self.data_directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
    }

    /// Path of the diagnostics database
    pub fn get_database_path(&self) -> PathBuf {
        self.get_data_directory().join("diagnostics.db")
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms as u64)
    }

    /// Look up a launch configuration by exact name
    pub fn find_configuration(&self, name: &str) -> Option<&LaunchConfig> {
        self.launch_configurations.iter().find(|c| c.name == name)
    }

    /// Whether launches of `config` are checked for duplicates
    pub fn is_managed(config: &LaunchConfig) -> bool {
        config.kind.as_deref() == Some(MANAGED_LAUNCH_KIND)
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.poll_interval_ms = self.poll_interval_ms.clamp(10, 60_000);
        if self.plugin_id.trim().is_empty() {
            self.plugin_id = Self::default().plugin_id;
        }
    }
}
