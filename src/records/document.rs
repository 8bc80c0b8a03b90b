use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, check_transition, next_record_id};
use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Signed,
    Archived,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Signed => "signed",
            Self::Archived => "archived",
        }
    }
}

const DOCUMENT_TRANSITIONS: &[(DocumentStatus, DocumentStatus)] = &[
    (DocumentStatus::Draft, DocumentStatus::Signed),
    (DocumentStatus::Signed, DocumentStatus::Archived),
    (DocumentStatus::Draft, DocumentStatus::Archived),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    /// Free-form kind, e.g. `affidavit` or `lease`.
    pub kind: String,
    pub content: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn draft(
        title: impl Into<String>,
        kind: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: next_record_id(),
            title: title.into(),
            kind: kind.into(),
            content: content.into(),
            status: DocumentStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sign(&mut self) -> Result<(), RecordError> {
        self.move_to(DocumentStatus::Signed)
    }

    pub fn archive(&mut self) -> Result<(), RecordError> {
        self.move_to(DocumentStatus::Archived)
    }

    fn move_to(&mut self, to: DocumentStatus) -> Result<(), RecordError> {
        check_transition(
            Self::KIND,
            &self.id,
            self.status,
            to,
            DOCUMENT_TRANSITIONS,
            DocumentStatus::as_str,
        )?;
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Record for Document {
    const KIND: &'static str = "document";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentStatus};

    #[test]
    fn archived_document_cannot_be_signed() {
        let mut doc = Document::draft("Lease", "lease", "Term: 12 months");
        doc.archive().expect("draft archives");
        assert!(doc.sign().is_err());
        assert_eq!(doc.status, DocumentStatus::Archived);
    }

    #[test]
    fn signed_document_serializes_camel_case() {
        let mut doc = Document::draft("Affidavit", "affidavit", "I, the undersigned...");
        doc.sign().expect("draft signs");
        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["status"], "signed");
        assert!(json.get("createdAt").is_some());
    }
}
