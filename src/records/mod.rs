//! Record kinds kept in the local cache.
//!
//! Each kind is a flat serde record with a string id, a status enum specific
//! to that kind and timestamps. Collections of records never reference each
//! other; deleting a case leaves its reports alone.

mod case;
mod chat;
mod dispute;
mod document;
mod reminder;
mod report;

use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use case::{CaseRecord, CaseStatus, NewCase};
pub use chat::{ChatMessage, MessageRole};
pub use dispute::{Dispute, DisputeStatus};
pub use document::{Document, DocumentStatus};
pub use reminder::{Reminder, ReminderStatus};
pub use report::{Report, ReportStatus};

/// A record that can live in a [`crate::store::RecordCollection`].
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

static LAST_ID: Mutex<(i64, u32)> = Mutex::new((0, 0));

/// Time-derived record id: epoch milliseconds, suffixed with a counter when
/// several ids are minted within the same millisecond.
pub fn next_record_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = match LAST_ID.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if now > last.0 {
        *last = (now, 0);
        now.to_string()
    } else {
        last.1 += 1;
        format!("{}-{}", last.0, last.1)
    }
}

/// Reject a transition not allowed by `allowed`.
pub(crate) fn check_transition<S: Copy + PartialEq>(
    kind: &'static str,
    id: &str,
    from: S,
    to: S,
    allowed: &[(S, S)],
    label: fn(S) -> &'static str,
) -> Result<(), crate::error::RecordError> {
    if allowed.iter().any(|&(a, b)| a == from && b == to) {
        Ok(())
    } else {
        Err(crate::error::RecordError::InvalidTransition {
            kind,
            id: id.to_string(),
            from: label(from),
            to: label(to),
        })
    }
}
