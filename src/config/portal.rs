use std::path::{Component, PathBuf};

use secrecy::SecretString;

use crate::config::helpers::{
    EnvSource, ProcessEnv, optional_env, parse_bool_env, parse_string_env,
};
use crate::error::ConfigError;
use crate::settings::Settings;

/// Backend location.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Absolute http(s) URL without a trailing slash.
    pub base_url: String,
    /// Versioned path prefix, e.g. `/api/v1`.
    pub prefix: String,
}

impl ApiConfig {
    /// Full URL for an API path relative to the versioned prefix.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}{}/{}", self.base_url, self.prefix, path)
    }
}

/// Text-completion endpoint used by the assistant chat.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub model: Option<String>,
}

/// Local record cache.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

/// Resolved portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub api: ApiConfig,
    pub assistant: AssistantConfig,
    pub storage: StorageConfig,
    pub login_route: String,
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexportal")
        .join("storage.json")
}

pub(crate) fn validate_base_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("not a valid URL: {e}"),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "URL must include a host".to_string(),
        });
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn validate_prefix(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            key: "LEXPORTAL_API_PREFIX".to_string(),
            message: "prefix must start with '/'".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_login_route(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('/') {
        return Err(ConfigError::InvalidValue {
            key: "LEXPORTAL_LOGIN_ROUTE".to_string(),
            message: "login route must be an absolute route such as '/login'".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn validate_storage_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "LEXPORTAL_STORAGE_PATH".to_string(),
            message: "storage path must not be empty".to_string(),
        });
    }

    let path = PathBuf::from(trimmed);
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ConfigError::InvalidValue {
            key: "LEXPORTAL_STORAGE_PATH".to_string(),
            message: "storage path must not contain '..' components".to_string(),
        });
    }
    if path.file_name().is_none() {
        return Err(ConfigError::InvalidValue {
            key: "LEXPORTAL_STORAGE_PATH".to_string(),
            message: "storage path must include a filename".to_string(),
        });
    }

    Ok(path)
}

impl PortalConfig {
    /// Resolve from settings with `LEXPORTAL_*` environment overrides.
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Self::resolve_with(settings, &ProcessEnv)
    }

    pub(crate) fn resolve_with(
        settings: &Settings,
        env: &dyn EnvSource,
    ) -> Result<Self, ConfigError> {
        let base_url = validate_base_url(
            "LEXPORTAL_API_BASE_URL",
            &parse_string_env(env, "LEXPORTAL_API_BASE_URL", settings.api.base_url.clone())?,
        )?;
        let prefix = validate_prefix(&parse_string_env(
            env,
            "LEXPORTAL_API_PREFIX",
            settings.api.prefix.clone(),
        )?)?;
        let api = ApiConfig { base_url, prefix };

        let endpoint = match optional_env(env, "LEXPORTAL_ASSISTANT_URL")?
            .or_else(|| settings.assistant.endpoint.clone())
        {
            Some(raw) => validate_base_url("LEXPORTAL_ASSISTANT_URL", &raw)?,
            None => api.endpoint("assistant/complete"),
        };
        let assistant = AssistantConfig {
            endpoint,
            api_key: optional_env(env, "LEXPORTAL_ASSISTANT_API_KEY")?.map(SecretString::from),
            model: optional_env(env, "LEXPORTAL_ASSISTANT_MODEL")?
                .or_else(|| settings.assistant.model.clone()),
        };

        let storage = StorageConfig {
            enabled: parse_bool_env(env, "LEXPORTAL_STORAGE_ENABLED", settings.storage.enabled)?,
            path: match optional_env(env, "LEXPORTAL_STORAGE_PATH")?
                .or_else(|| settings.storage.path.clone())
            {
                Some(raw) => validate_storage_path(&raw)?,
                None => default_storage_path(),
            },
        };

        Ok(Self {
            api,
            assistant,
            storage,
            login_route: validate_login_route(&parse_string_env(
                env,
                "LEXPORTAL_LOGIN_ROUTE",
                settings.login_route.clone(),
            )?)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::PortalConfig;
    use crate::error::ConfigError;
    use crate::settings::Settings;

    #[test]
    fn resolve_uses_local_defaults() {
        let env: HashMap<&str, &str> = HashMap::new();
        let config = PortalConfig::resolve_with(&Settings::default(), &env).expect("portal config");

        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(
            config.assistant.endpoint,
            "http://localhost:8080/api/v1/assistant/complete"
        );
        assert!(config.storage.enabled);
        assert!(config.storage.path.ends_with("lexportal/storage.json"));
        assert_eq!(config.login_route, "/login");
    }

    #[test]
    fn env_overrides_win_over_settings() {
        let mut settings = Settings::default();
        settings.assistant.model = Some("settings-model".to_string());
        let env = HashMap::from([
            ("LEXPORTAL_API_BASE_URL", "https://portal.example.com/"),
            ("LEXPORTAL_ASSISTANT_API_KEY", "sk-test"),
            ("LEXPORTAL_ASSISTANT_MODEL", "env-model"),
            ("LEXPORTAL_STORAGE_ENABLED", "off"),
        ]);

        let config = PortalConfig::resolve_with(&settings, &env).expect("portal config");
        assert_eq!(config.api.base_url, "https://portal.example.com");
        assert_eq!(
            config.assistant.endpoint,
            "https://portal.example.com/api/v1/assistant/complete"
        );
        assert_eq!(
            config.assistant.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-test")
        );
        assert_eq!(config.assistant.model.as_deref(), Some("env-model"));
        assert!(!config.storage.enabled);
    }

    #[test]
    fn invalid_env_override_names_its_key() {
        let env = HashMap::from([("LEXPORTAL_LOGIN_ROUTE", "login")]);
        let err = PortalConfig::resolve_with(&Settings::default(), &env).expect_err("relative");
        let ConfigError::InvalidValue { key, .. } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "LEXPORTAL_LOGIN_ROUTE");
    }

    #[test]
    fn endpoint_joins_prefix_and_path() {
        let api = super::ApiConfig {
            base_url: "https://portal.example.com".to_string(),
            prefix: "/api/v1".to_string(),
        };
        assert_eq!(
            api.endpoint("/cases"),
            "https://portal.example.com/api/v1/cases"
        );
        assert_eq!(
            api.endpoint("auth/logout"),
            "https://portal.example.com/api/v1/auth/logout"
        );
    }

    #[test]
    fn validate_base_url_strips_trailing_slash() {
        assert_eq!(
            super::validate_base_url("K", " https://portal.example.com/ ").expect("valid"),
            "https://portal.example.com"
        );
    }

    #[test]
    fn validate_base_url_rejects_non_http_schemes() {
        let err = super::validate_base_url("LEXPORTAL_API_BASE_URL", "ftp://example.com")
            .expect_err("must reject ftp");
        let ConfigError::InvalidValue { key, message } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "LEXPORTAL_API_BASE_URL");
        assert!(message.contains("ftp"), "unexpected message: {message}");
    }

    #[test]
    fn validate_base_url_rejects_relative_urls() {
        assert!(super::validate_base_url("K", "/api").is_err());
    }

    #[test]
    fn validate_prefix_requires_leading_slash() {
        assert_eq!(super::validate_prefix("/api/v2/").expect("valid"), "/api/v2");
        assert!(super::validate_prefix("api/v1").is_err());
    }

    #[test]
    fn validate_storage_path_rejects_parent_dir_traversal() {
        let err = super::validate_storage_path("data/../../etc/storage.json")
            .expect_err("must reject '..'");
        let ConfigError::InvalidValue { key, message } = err else {
            panic!("expected InvalidValue");
        };
        assert_eq!(key, "LEXPORTAL_STORAGE_PATH");
        assert!(message.contains(".."), "unexpected message: {message}");
    }

    #[test]
    fn validate_storage_path_accepts_relative_and_absolute_files() {
        assert_eq!(
            super::validate_storage_path("./cache/storage.json").expect("valid"),
            PathBuf::from("./cache/storage.json")
        );
        assert!(super::validate_storage_path("/var/lib/lexportal/storage.json").is_ok());
    }

    #[test]
    fn validate_storage_path_rejects_empty() {
        assert!(super::validate_storage_path("   ").is_err());
    }

    #[test]
    fn validate_login_route_requires_absolute_route() {
        assert!(super::validate_login_route("login").is_err());
        assert_eq!(super::validate_login_route("/login").expect("valid"), "/login");
    }
}
