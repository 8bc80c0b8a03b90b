use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, check_transition, next_record_id};
use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Draft,
    Finalized,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    pub fn draft(title: impl Into<String>, body: impl Into<String>, case_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_record_id(),
            title: title.into(),
            body: body.into(),
            case_id,
            status: ReportStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lock the report. Only drafts can be finalized.
    pub fn finalize(&mut self) -> Result<(), RecordError> {
        check_transition(
            Self::KIND,
            &self.id,
            self.status,
            ReportStatus::Finalized,
            &[(ReportStatus::Draft, ReportStatus::Finalized)],
            ReportStatus::as_str,
        )?;
        self.status = ReportStatus::Finalized;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Record for Report {
    const KIND: &'static str = "report";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Report, ReportStatus};
    use crate::error::RecordError;

    #[test]
    fn finalize_moves_draft_to_finalized_once() {
        let mut report = Report::draft("Incident", "Water leak on 3rd floor", None);
        report.finalize().expect("draft finalizes");
        assert_eq!(report.status, ReportStatus::Finalized);

        let err = report.finalize().expect_err("second finalize must fail");
        assert!(matches!(
            err,
            RecordError::InvalidTransition {
                from: "finalized",
                to: "finalized",
                ..
            }
        ));
    }
}
