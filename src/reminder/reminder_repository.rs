use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::reminder_models::Reminder;

/// The slice of the reminder store the dispatcher consumes.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Reminders eligible for a notification at `now`, oldest `due_at` first.
    async fn find_due_for_notification(
        &self,
        now: DateTime<Utc>,
        check_window: Duration,
        suppress_window: Duration,
    ) -> Result<Vec<Reminder>>;

    async fn mark_notified(&self, id: i64, notified_at: DateTime<Utc>) -> Result<()>;
}

#[derive(Clone)]
pub struct PgReminderRepository {
    pool: PgPool,
}

impl PgReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStore for PgReminderRepository {
    async fn find_due_for_notification(
        &self,
        now: DateTime<Utc>,
        check_window: Duration,
        suppress_window: Duration,
    ) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            "SELECT * FROM reminders
             WHERE status = 'pending'
             AND due_at >= $1
             AND due_at <= $2
             AND (last_notified_at IS NULL OR last_notified_at <= $3)
             ORDER BY due_at ASC",
        )
        .bind(now)
        .bind(now + check_window)
        .bind(now - suppress_window)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }

    async fn mark_notified(&self, id: i64, notified_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE reminders SET last_notified_at = $1 WHERE id = $2")
            .bind(notified_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
