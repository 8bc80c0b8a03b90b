use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, check_transition, next_record_id};
use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    Mediation,
    Resolved,
    Closed,
}

impl DisputeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Mediation => "mediation",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Next stage in the regular progression, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Open => Some(Self::Mediation),
            Self::Mediation => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Closed => None,
        }
    }
}

const DISPUTE_TRANSITIONS: &[(DisputeStatus, DisputeStatus)] = &[
    (DisputeStatus::Open, DisputeStatus::Mediation),
    (DisputeStatus::Mediation, DisputeStatus::Resolved),
    (DisputeStatus::Resolved, DisputeStatus::Closed),
    (DisputeStatus::Open, DisputeStatus::Closed),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub parties: Vec<String>,
    pub description: String,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dispute {
    pub fn open(
        title: impl Into<String>,
        parties: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: next_record_id(),
            title: title.into(),
            parties,
            description: description.into(),
            status: DisputeStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to the next stage (`open -> mediation -> resolved -> closed`).
    pub fn advance(&mut self) -> Result<(), RecordError> {
        let to = self.status.next().unwrap_or(self.status);
        self.move_to(to)
    }

    /// Close directly. Allowed from `open` (withdrawn) and `resolved`.
    pub fn close(&mut self) -> Result<(), RecordError> {
        self.move_to(DisputeStatus::Closed)
    }

    fn move_to(&mut self, to: DisputeStatus) -> Result<(), RecordError> {
        check_transition(
            Self::KIND,
            &self.id,
            self.status,
            to,
            DISPUTE_TRANSITIONS,
            DisputeStatus::as_str,
        )?;
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Record for Dispute {
    const KIND: &'static str = "dispute";

    fn id(&self) -> &str {
        &self.id
    }
}
