//! File-backed settings, the lowest configuration layer.
//!
//! Settings come from an optional TOML file. Environment variables are applied
//! on top of them by [`crate::config::PortalConfig::resolve`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub prefix: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            prefix: "/api/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    /// Completion endpoint. Falls back to the backend's assistant route.
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub enabled: bool,
    pub path: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub assistant: AssistantSettings,
    pub storage: StorageSettings,
    pub login_route: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            assistant: AssistantSettings::default(),
            storage: StorageSettings::default(),
            login_route: "/login".to_string(),
        }
    }
}

impl Settings {
    /// Default settings file location: `<config_dir>/lexportal/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lexportal").join("config.toml"))
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::ParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        Self::from_toml(&raw).map_err(|message| ConfigError::ParseError {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, String> {
        toml::from_str(raw).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;

    #[test]
    fn partial_toml_keeps_defaults_for_missing_sections() {
        let settings = Settings::from_toml(
            r#"
            login_route = "/signin"

            [api]
            base_url = "https://portal.example.com"
            "#,
        )
        .expect("valid toml");

        assert_eq!(settings.login_route, "/signin");
        assert_eq!(settings.api.base_url, "https://portal.example.com");
        assert_eq!(settings.api.prefix, "/api/v1");
        assert!(settings.storage.enabled);
        assert!(settings.assistant.endpoint.is_none());
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(settings.login_route, "/login");
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api = [").expect("write");
        let err = Settings::load(&path).expect_err("must fail");
        assert!(err.to_string().contains("config.toml"), "unexpected: {err}");
    }
}
