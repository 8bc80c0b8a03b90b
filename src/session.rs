//! Session guard for role-gated pages.
//!
//! A session is two stored values: the bearer token and the role marker.
//! Pages call [`SessionGuard::check_session`] once on mount; anything other
//! than [`Access::Authorized`] means the page renders nothing and navigates
//! to the login route. There is no retry and no network call.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{LocalStorage, keys};

/// Portal user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Lawyer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Lawyer => "lawyer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "citizen" => Some(Self::Citizen),
            "lawyer" => Some(Self::Lawyer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown role '{s}' (expected 'citizen' or 'lawyer')"))
    }
}

/// An authenticated session read from storage.
#[derive(Clone)]
pub struct Session {
    pub auth_token: SecretString,
    pub role: Role,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_token", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Why a page was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectReason {
    MissingToken,
    MissingRole,
    UnknownRole(String),
    RoleMismatch { required: Role, actual: Role },
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken => write!(f, "no auth token stored"),
            Self::MissingRole => write!(f, "no role stored"),
            Self::UnknownRole(value) => write!(f, "stored role '{}' is not recognized", value),
            Self::RoleMismatch { required, actual } => {
                write!(f, "page requires role '{}', session is '{}'", required, actual)
            }
        }
    }
}

/// Outcome of a page-mount session check.
#[derive(Debug, Clone)]
pub enum Access {
    Authorized(Session),
    Redirect { to: String, reason: RedirectReason },
}

impl Access {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized(_))
    }
}

/// Reads, writes and checks the stored session.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    storage: LocalStorage,
    login_route: String,
}

impl SessionGuard {
    pub fn new(storage: LocalStorage, login_route: impl Into<String>) -> Self {
        Self {
            storage,
            login_route: login_route.into(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Read a session value; read failures count as absent so the guard
    /// fails closed.
    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get_value(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to read session value");
                None
            }
        }
    }

    fn redirect(&self, reason: RedirectReason) -> Access {
        tracing::debug!(to = %self.login_route, reason = %reason, "Session check failed");
        Access::Redirect {
            to: self.login_route.clone(),
            reason,
        }
    }

    /// Check the stored session against the page's required role.
    pub fn check_session(&self, required_role: Role) -> Access {
        let Some(token) = self.read(keys::AUTH_TOKEN) else {
            return self.redirect(RedirectReason::MissingToken);
        };
        let Some(raw_role) = self.read(keys::USER_ROLE) else {
            return self.redirect(RedirectReason::MissingRole);
        };
        let Some(role) = Role::parse(&raw_role) else {
            return self.redirect(RedirectReason::UnknownRole(raw_role));
        };
        if role != required_role {
            return self.redirect(RedirectReason::RoleMismatch {
                required: required_role,
                actual: role,
            });
        }

        Access::Authorized(Session {
            auth_token: SecretString::from(token),
            role,
        })
    }

    /// The stored session regardless of role, if complete and valid.
    pub fn current(&self) -> Option<Session> {
        let token = self.read(keys::AUTH_TOKEN)?;
        let role = Role::parse(&self.read(keys::USER_ROLE)?)?;
        Some(Session {
            auth_token: SecretString::from(token),
            role,
        })
    }

    pub fn login(&self, token: &SecretString, role: Role) -> Result<(), StoreError> {
        self.storage
            .set_value(keys::AUTH_TOKEN, token.expose_secret())?;
        self.storage.set_value(keys::USER_ROLE, role.as_str())?;
        tracing::info!(role = %role, "Session stored");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.storage.remove_value(keys::AUTH_TOKEN)?;
        self.storage.remove_value(keys::USER_ROLE)?;
        tracing::info!("Session cleared");
        Ok(())
    }
}
