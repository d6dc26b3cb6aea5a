//! Shared configuration for twinboard tools.
//!
//! A TOML config file merged with `TWINBOARD_*` environment variables,
//! translated into `twinboard_core::DashboardConfig`, plus the persisted
//! light/dark theme preference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use url::Url;

use twinboard_core::{DEFAULT_API_URL, DEFAULT_BUILDING_ID, DashboardConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL including the `/api/v1` prefix.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Building selected until the building list arrives.
    #[serde(default = "default_building")]
    pub default_building: String,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            default_building: default_building(),
            timeout: None,
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_building() -> String {
    DEFAULT_BUILDING_ID.into()
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Validate and translate into the core runtime config.
    pub fn to_dashboard_config(&self) -> Result<DashboardConfig, ConfigError> {
        let base_url = Url::parse(&self.api_url).map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: e.to_string(),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api_url".into(),
                reason: format!("unsupported scheme '{}'", base_url.scheme()),
            });
        }
        if self.default_building.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "default_building".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(DashboardConfig {
            base_url,
            timeout: self.timeout.map(Duration::from_secs),
            default_building_id: self.default_building.clone(),
        })
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    ProjectDirs::from("io", "twinboard", "twinboard").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("twinboard");
            p
        },
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where the theme preference is persisted.
pub fn preferences_path() -> PathBuf {
    config_dir().join("preferences.toml")
}

// ── Loading ────────────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("TWINBOARD_"));

    Ok(figment.extract()?)
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(value)?)?;
    Ok(())
}

// ── Preferences ─────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Local UI state persisted across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

pub fn load_preferences() -> Result<Preferences, ConfigError> {
    load_preferences_from(&preferences_path())
}

/// Read preferences from `path`; a missing file yields the defaults.
pub fn load_preferences_from(path: &Path) -> Result<Preferences, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Preferences::default()),
        Err(e) => return Err(e.into()),
    };
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn save_preferences(prefs: &Preferences) -> Result<(), ConfigError> {
    save_preferences_to(&preferences_path(), prefs)
}

pub fn save_preferences_to(path: &Path, prefs: &Preferences) -> Result<(), ConfigError> {
    write_toml(path, prefs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let dashboard = Config::default().to_dashboard_config().unwrap();
        assert_eq!(dashboard.base_url.as_str(), "http://localhost:8000/api/v1");
        assert_eq!(dashboard.default_building_id, "pleiades-a");
        assert!(dashboard.timeout.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_building = \"annex\"\ntimeout = 15\noutput = \"json\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.default_building, "annex");
        assert_eq!(cfg.timeout, Some(15));
        assert_eq!(cfg.output, "json");
        let dashboard = cfg.to_dashboard_config().unwrap();
        assert_eq!(dashboard.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_building, DEFAULT_BUILDING_ID);
    }

    #[test]
    fn rejects_non_http_urls() {
        let cfg = Config {
            api_url: "ftp://example.com/api/v1".into(),
            ..Config::default()
        };
        let err = cfg.to_dashboard_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn theme_defaults_to_light_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        assert_eq!(load_preferences_from(&path).unwrap().theme, Theme::Light);

        let prefs = Preferences { theme: Theme::Dark };
        save_preferences_to(&path, &prefs).unwrap();
        assert_eq!(load_preferences_from(&path).unwrap(), prefs);
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "theme = \"dark\"");
    }

    #[test]
    fn corrupt_preferences_report_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "theme = \"sepia\"").unwrap();
        let err = load_preferences_from(&path).unwrap_err();
        assert!(err.to_string().contains("preferences.toml"));
    }

    #[test]
    fn theme_parses_and_toggles() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
