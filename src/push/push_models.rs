use serde::Serialize;

use crate::reminder::Reminder;

pub const REMINDER_TITLE: &str = "⏰ Reminder";
pub const NOTIFICATION_ICON: &str = "/icon-192x192.png";
pub const NOTIFICATION_BADGE: &str = "/badge-72x72.png";

/// The JSON document the service worker receives in its `push` event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PushData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    pub reminder_id: i64,
    pub url: String,
}

impl PushPayload {
    pub fn for_reminder(reminder: &Reminder) -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            body: reminder.title.clone(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            data: Some(PushData {
                reminder_id: reminder.id,
                url: "/".to_string(),
            }),
        }
    }

    pub fn test_notification() -> Self {
        Self {
            title: "Test notification".to_string(),
            body: "This is a test notification from your reminders!".to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_BADGE.to_string(),
            data: None,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
