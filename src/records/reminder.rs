use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Record, check_transition, next_record_id};
use crate::error::RecordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Done,
    Dismissed,
}

impl ReminderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Dismissed => "dismissed",
        }
    }
}

const REMINDER_TRANSITIONS: &[(ReminderStatus, ReminderStatus)] = &[
    (ReminderStatus::Pending, ReminderStatus::Done),
    (ReminderStatus::Pending, ReminderStatus::Dismissed),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub due_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    pub fn new(title: impl Into<String>, due_at: DateTime<Utc>, notes: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: next_record_id(),
            title: title.into(),
            due_at,
            notes,
            status: ReminderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn complete(&mut self) -> Result<(), RecordError> {
        self.move_to(ReminderStatus::Done)
    }

    pub fn dismiss(&mut self) -> Result<(), RecordError> {
        self.move_to(ReminderStatus::Dismissed)
    }

    /// Pending and due no later than `now + window`. Overdue reminders count.
    /// A window reaching past the representable range covers every reminder.
    pub fn due_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        if self.status != ReminderStatus::Pending {
            return false;
        }
        match now.checked_add_signed(window) {
            Some(horizon) => self.due_at <= horizon,
            None => window > Duration::zero(),
        }
    }

    fn move_to(&mut self, to: ReminderStatus) -> Result<(), RecordError> {
        check_transition(
            Self::KIND,
            &self.id,
            self.status,
            to,
            REMINDER_TRANSITIONS,
            ReminderStatus::as_str,
        )?;
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Record for Reminder {
    const KIND: &'static str = "reminder";

    fn id(&self) -> &str {
        &self.id
    }
}
