//! Configuration loading for Dockscreen.
//! Reads dockscreen.toml from the current directory or path in DOCKSCREEN_CONFIG env var.

use anyhow::Context;
use dockscreen_molecules::admet::AdmetSettings;
use dockscreen_molecules::docking::DockingSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DOCKSCREEN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "dockscreen.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub docking: DockingSettings,
    #[serde(default)]
    pub admet: AdmetSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// JSON snapshot file; created on first write
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf { PathBuf::from("./data/dockscreen.json") }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

mod tests;

impl Config {
    /// Path named by DOCKSCREEN_CONFIG, else ./dockscreen.toml.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from dockscreen.toml.
    /// Checks DOCKSCREEN_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file not found: {}, using defaults. \
                 Copy dockscreen.example.toml to dockscreen.toml and edit it.",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
