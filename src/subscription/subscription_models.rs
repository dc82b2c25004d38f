use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A browser push subscription, keyed by its endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PushSubscription {
    pub id: i64,
    pub endpoint: String,
    /// Client ECDH public key, base64url.
    pub p256dh: String,
    /// Client auth secret, base64url.
    pub auth: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to register a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}
