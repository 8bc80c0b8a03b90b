//! Environment lookup helpers shared by the config resolvers.

use crate::error::ConfigError;

/// Where configuration overrides are read from.
pub(crate) trait EnvSource {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

/// The real process environment.
pub(crate) struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "value is not valid UTF-8".to_string(),
            }),
        }
    }
}

/// Fixed overrides, so resolver tests never see the developer's shell.
#[cfg(test)]
impl EnvSource for std::collections::HashMap<&str, &str> {
    fn var(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.get(key).map(|v| v.to_string()))
    }
}

/// Read an override, treating empty values as unset.
pub(crate) fn optional_env(env: &dyn EnvSource, key: &str) -> Result<Option<String>, ConfigError> {
    Ok(env.var(key)?.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_string_env(
    env: &dyn EnvSource,
    key: &str,
    default: String,
) -> Result<String, ConfigError> {
    Ok(optional_env(env, key)?.unwrap_or(default))
}

pub(crate) fn parse_bool_env(
    env: &dyn EnvSource,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match optional_env(env, key)? {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
