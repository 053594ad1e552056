use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::theme::ThemePreset;
use crate::types::Session;

const APP_DIR: &str = "projects-board";
const DEFAULT_THEME: &str = "default";
const DEFAULT_DATABASE_FILE: &str = "projects.sqlite";
const MIN_TICK_INTERVAL_MS: u64 = 100;
const MAX_TICK_INTERVAL_MS: u64 = 5_000;
const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            database_path: None,
            user: None,
            email: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push(APP_DIR);
        path.push("settings.toml");
        Some(path)
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        Self::load_from_path(&path)
    }

    fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) => {
                warn!(
                    "failed to read settings config '{}': {}",
                    path.display(),
                    error
                );
                return Self::default();
            }
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut settings) => {
                settings.validate();
                settings
            }
            Err(error) => {
                warn!(
                    "failed to parse settings config '{}': {}",
                    path.display(),
                    error
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path().ok_or_else(|| anyhow!("unable to determine config path"))?;
        self.save_to_path(&path)
    }

    fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("invalid settings config path"))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory '{}'", parent.display()))?;

        let mut validated = self.clone();
        validated.validate();
        let contents =
            toml::to_string_pretty(&validated).context("failed to serialize settings to TOML")?;

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, contents).with_context(|| {
            format!(
                "failed to write temporary settings file '{}'",
                tmp_path.display()
            )
        })?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "failed to move settings file '{}' into place",
                tmp_path.display()
            )
        })?;

        Ok(())
    }

    pub fn theme_preset(&self) -> ThemePreset {
        ThemePreset::from_str(&self.theme).unwrap_or_default()
    }

    /// The session to sign in with, if a user is configured.
    pub fn session(&self) -> Option<Session> {
        let uid = self.user.as_deref().map(str::trim).filter(|uid| !uid.is_empty())?;
        let session = Session::new(uid);
        Some(match self.email.as_deref() {
            Some(email) if !email.trim().is_empty() => session.with_email(email.trim()),
            _ => session,
        })
    }

    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    fn validate(&mut self) {
        self.tick_interval_ms = self
            .tick_interval_ms
            .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS);

        self.theme = match ThemePreset::from_str(&self.theme) {
            Ok(preset) => preset.as_str().to_string(),
            Err(()) => {
                warn!(
                    "invalid theme '{}' in settings config; falling back to default",
                    self.theme
                );
                DEFAULT_THEME.to_string()
            }
        };

        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            warn!("empty database_path in settings config; using the default location");
            self.database_path = None;
        }
    }
}

pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_database_path() -> PathBuf {
    data_dir().join(DEFAULT_DATABASE_FILE)
}
