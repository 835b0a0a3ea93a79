//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Prefix of every ProgId written, `<prefix>.<format>`
    pub prog_id_prefix: String,
    /// Directory holding `<format>.ico` files
    pub icon_dir: Option<PathBuf>,
    /// JSON catalog replacing the built-in document types
    pub catalog_path: Option<PathBuf>,
    /// Force packaged/unpackaged instead of detecting it
    pub packaged: Option<bool>,
    /// Extensions to associate when none are given (empty = all)
    pub extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prog_id_prefix: "Docassoc".to_string(),
            icon_dir: None,
            catalog_path: None,
            packaged: None,
            extensions: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "docassoc", "Docassoc")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, defaulting when it is absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Get the icon directory, next to the executable unless configured
    pub fn get_icon_dir(&self, executable: &Path) -> PathBuf {
        self.icon_dir.clone().unwrap_or_else(|| {
            executable
                .parent()
                .map(|dir| dir.join("resources").join("icons"))
                .unwrap_or_else(|| PathBuf::from("resources").join("icons"))
        })
    }
}
