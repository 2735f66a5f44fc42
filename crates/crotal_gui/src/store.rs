//! Where the desktop app keeps its settings.

use anyhow::{Context, Result};
use crotal_core::Config;
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::i18n::LanguagePreference;

const CONFIG_FILE: &str = "config.toml";
const UI_FILE: &str = "ui.toml";

/// Preferences that only matter to the desktop app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    pub language: LanguagePreference,
    /// Scan subfolders when a folder is picked.
    pub recursive_folders: bool,
}

pub struct SettingsStore {
    dir: PathBuf,
}

impl SettingsStore {
    /// Platform config directory, or the working directory when none is known.
    pub fn platform() -> Self {
        let dir = ProjectDirs::from("org", "crotalpath", "Crotalpath")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(dir)
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Config file plus `CROTALPATH_SERVER`, validated together.
    pub fn load_config(&self) -> Result<Config> {
        let server = std::env::var(crotal_core::config::SERVER_ENV).ok();
        self.load_config_with(server.as_deref())
    }

    fn load_config_with(&self, server: Option<&str>) -> Result<Config> {
        let config = Config::load(self.config_path())?.with_server_override(server);
        config
            .validate()
            .with_context(|| format!("server override {server:?}"))?;
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        config.save(self.config_path())
    }

    pub fn load_prefs(&self) -> UiPrefs {
        match read_prefs(&self.dir.join(UI_FILE)) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!("ignoring ui preferences: {e:#}");
                UiPrefs::default()
            }
        }
    }

    pub fn save_prefs(&self, prefs: &UiPrefs) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create {}", self.dir.display()))?;
        let path = self.dir.join(UI_FILE);
        fs::write(&path, toml::to_string_pretty(prefs)?)
            .with_context(|| format!("cannot write {}", path.display()))
    }
}

fn read_prefs(path: &Path) -> Result<UiPrefs> {
    if !path.exists() {
        return Ok(UiPrefs::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}
