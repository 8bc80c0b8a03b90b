//! Typed `/api/v1` endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiClient;
use crate::error::ApiError;
use crate::records::{CaseRecord, NewCase};

/// Response envelope used by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Take `data` out of an envelope; bare bodies are decoded as-is.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let decoded = if value.get("data").is_some() {
        serde_json::from_value::<Envelope<T>>(value).map(|envelope| {
            if let Some(message) = &envelope.message {
                tracing::debug!(message = %message, "Backend message");
            }
            envelope.data
        })
    } else {
        serde_json::from_value(value)
    };
    decoded.map_err(|e| ApiError::UnexpectedShape(e.to_string()))
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Role-specific fields (bar number, address, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Entry in the lawyer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawyerSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ApiClient {
    pub async fn get_profile(&self) -> Result<Profile, ApiError> {
        self.get_data("profile").await
    }

    /// Send only the changed fields; the backend merges them.
    pub async fn update_profile(
        &self,
        changes: &serde_json::Map<String, Value>,
    ) -> Result<Profile, ApiError> {
        let body = Value::Object(changes.clone());
        unwrap_envelope(self.put("profile", &body).await?)
    }

    pub async fn list_cases(&self) -> Result<Vec<CaseRecord>, ApiError> {
        self.get_data("cases").await
    }

    pub async fn create_case(&self, case: &NewCase) -> Result<CaseRecord, ApiError> {
        let body =
            serde_json::to_value(case).map_err(|e| ApiError::UnexpectedShape(e.to_string()))?;
        unwrap_envelope(self.post("cases", &body).await?)
    }

    pub async fn list_lawyers(&self) -> Result<Vec<LawyerSummary>, ApiError> {
        self.get_data("lawyers").await
    }

    /// Invalidate the token server-side.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.post("auth/logout", &Value::Object(serde_json::Map::new()))
            .await
            .map(|_| ())
    }
}
