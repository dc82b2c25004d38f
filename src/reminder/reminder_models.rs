use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Done,
    Snoozed,
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderStatus::Pending => write!(f, "pending"),
            ReminderStatus::Done => write!(f, "done"),
            ReminderStatus::Snoozed => write!(f, "snoozed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reminder {
    pub id: i64,
    pub title: String,
    pub notes: Option<String>,
    pub due_at: DateTime<Utc>,
    pub priority: String,
    pub repeat: String,
    pub status: ReminderStatus,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Whether the dispatcher should notify for this reminder at `now`.
    ///
    /// Pending, due inside `[now, now + check_window]` (both ends inclusive) and
    /// not notified within the last `suppress_window`. The SQL in
    /// `PgReminderRepository::find_due_for_notification` is the production form;
    /// the in-memory store filters with this.
    #[cfg(test)]
    pub fn is_due_for_notification(
        &self,
        now: DateTime<Utc>,
        check_window: chrono::Duration,
        suppress_window: chrono::Duration,
    ) -> bool {
        if self.status != ReminderStatus::Pending {
            return false;
        }

        if self.due_at < now || self.due_at > now + check_window {
            return false;
        }

        match self.last_notified_at {
            None => true,
            Some(last) => last <= now - suppress_window,
        }
    }
}
