use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

/// Case lifecycle as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Open,
    InProgress,
    Closed,
    /// A status this client does not know yet; kept so one odd case does
    /// not fail the whole listing.
    #[serde(other)]
    Unknown,
}

/// A case as listed by `/cases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for CaseRecord {
    const KIND: &'static str = "case";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Body for `POST /cases`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCase {
    pub title: String,
    pub description: String,
    pub category: String,
}
