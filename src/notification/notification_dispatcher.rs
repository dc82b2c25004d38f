//! Due-reminder push dispatcher.
//!
//! One invocation selects every eligible reminder, fans each one out to all
//! push subscriptions, prunes endpoints the push service reports as gone and
//! stamps `last_notified_at`. Delivery is best-effort: a reminder is stamped
//! once a fan-out was attempted, whatever the per-subscriber results.
//!
//! Invocations are not serialized against each other. Two overlapping runs may
//! both select the same reminder and notify it twice.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::notification_dto::{DispatchOutcome, TestPushResponse};
use crate::{
    error::{AppError, Result},
    push::{FailureKind, PushPayload, PushTransport},
    reminder::ReminderStore,
    subscription::{PushSubscription, SubscriptionStore},
};

pub const DEFAULT_CHECK_WINDOW_MINUTES: i64 = 5;
pub const SUPPRESS_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// How far past `now` a due time may lie and still be picked up.
    pub check_window: Duration,
    /// Minimum gap between two notifications for the same reminder.
    pub suppress_window: Duration,
}

impl DispatchSettings {
    pub fn new(check_window_minutes: i64) -> Self {
        Self {
            check_window: Duration::minutes(check_window_minutes),
            suppress_window: Duration::minutes(SUPPRESS_WINDOW_MINUTES),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::new(DEFAULT_CHECK_WINDOW_MINUTES)
    }
}

/// Result of delivering one payload to every subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Endpoints reported gone. They count as failed.
    pub gone: Vec<String>,
    /// Gone endpoints actually deleted from the store.
    pub pruned: usize,
}

impl FanOutReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

enum Delivery {
    Delivered,
    Failed,
    Gone { endpoint: String, pruned: bool },
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    reminders: Arc<dyn ReminderStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    transport: Arc<dyn PushTransport>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        transport: Arc<dyn PushTransport>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            reminders,
            subscriptions,
            transport,
            settings,
        }
    }

    /// Notifies every reminder eligible at `now`.
    ///
    /// Fails only when the due reminders or the subscriptions cannot be read;
    /// nothing has been written at that point.
    pub async fn dispatch_due_notifications(&self, now: DateTime<Utc>) -> Result<DispatchOutcome> {
        let due = self
            .reminders
            .find_due_for_notification(now, self.settings.check_window, self.settings.suppress_window)
            .await?;

        let mut outcome = DispatchOutcome {
            reminders_considered: due.len(),
            ..DispatchOutcome::default()
        };

        if due.is_empty() {
            debug!("No reminders due for notification");
            return Ok(outcome);
        }

        let mut subscriptions = self.subscriptions.list_all().await?;

        // Nothing was attempted, so the reminders stay eligible.
        if subscriptions.is_empty() {
            info!(
                "{} reminder(s) due but no push subscriptions registered",
                due.len()
            );
            return Ok(outcome);
        }

        for reminder in &due {
            let payload = PushPayload::for_reminder(reminder);
            let report = self.fan_out(&subscriptions, &payload).await;

            outcome.notifications_attempted += report.attempted();
            outcome.notifications_succeeded += report.succeeded;
            outcome.notifications_failed += report.failed;
            outcome.subscriptions_pruned += report.pruned;

            if !report.gone.is_empty() {
                subscriptions.retain(|s| !report.gone.contains(&s.endpoint));
            }

            if let Err(e) = self.reminders.mark_notified(reminder.id, now).await {
                error!(
                    reminder_id = reminder.id,
                    "Failed to record notification time: {}", e
                );
            }

            debug!(
                reminder_id = reminder.id,
                succeeded = report.succeeded,
                failed = report.failed,
                "Notified reminder: {}",
                reminder.title
            );

            if subscriptions.is_empty() {
                debug!("Every subscription was pruned");
            }
        }

        info!(
            reminders = outcome.reminders_considered,
            succeeded = outcome.notifications_succeeded,
            failed = outcome.notifications_failed,
            pruned = outcome.subscriptions_pruned,
            "Due reminder notifications sent"
        );

        Ok(outcome)
    }

    /// Sends a fixed test notification to every subscription.
    pub async fn send_test_notification(&self) -> Result<TestPushResponse> {
        let subscriptions = self.subscriptions.list_all().await?;
        if subscriptions.is_empty() {
            return Err(AppError::NotFound("No push subscriptions found".to_string()));
        }

        let report = self
            .fan_out(&subscriptions, &PushPayload::test_notification())
            .await;

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "Test notification sent"
        );

        Ok(TestPushResponse {
            total: report.attempted(),
            successful: report.succeeded,
            failed: report.failed,
        })
    }

    /// Delivers `payload` to all `subscriptions` concurrently and waits for
    /// every attempt. One subscriber's failure never cancels the others.
    pub async fn fan_out(
        &self,
        subscriptions: &[PushSubscription],
        payload: &PushPayload,
    ) -> FanOutReport {
        let deliveries = subscriptions
            .iter()
            .map(|subscription| self.deliver(subscription, payload));

        let mut report = FanOutReport::default();
        for delivery in join_all(deliveries).await {
            match delivery {
                Delivery::Delivered => report.succeeded += 1,
                Delivery::Failed => report.failed += 1,
                Delivery::Gone { endpoint, pruned } => {
                    report.failed += 1;
                    report.gone.push(endpoint);
                    if pruned {
                        report.pruned += 1;
                    }
                }
            }
        }

        report
    }

    async fn deliver(&self, subscription: &PushSubscription, payload: &PushPayload) -> Delivery {
        let err = match self.transport.send(subscription, payload).await {
            Ok(()) => return Delivery::Delivered,
            Err(err) => err,
        };

        match err.kind() {
            FailureKind::Transient => {
                warn!(endpoint = %subscription.endpoint, "Push delivery failed: {}", err);
                Delivery::Failed
            }
            FailureKind::Gone => {
                let pruned = match self
                    .subscriptions
                    .delete_by_endpoint(&subscription.endpoint)
                    .await
                {
                    Ok(_) => {
                        info!(endpoint = %subscription.endpoint, "Removed expired push subscription: {}", err);
                        true
                    }
                    Err(e) => {
                        error!(endpoint = %subscription.endpoint, "Failed to remove expired push subscription: {}", e);
                        false
                    }
                };

                Delivery::Gone {
                    endpoint: subscription.endpoint.clone(),
                    pruned,
                }
            }
        }
    }
}
