use crate::error::Result;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use super::subscription_models::{NewPushSubscription, PushSubscription};

/// Outcome of an idempotent registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Created(PushSubscription),
    Existing(PushSubscription),
}

impl Registration {
    pub fn into_inner(self) -> PushSubscription {
        match self {
            Registration::Created(subscription) | Registration::Existing(subscription) => {
                subscription
            }
        }
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert unless the endpoint is already registered; the existing row wins.
    async fn insert_if_absent(&self, subscription: NewPushSubscription) -> Result<Registration>;

    async fn list_all(&self) -> Result<Vec<PushSubscription>>;

    /// Returns the number of rows removed (0 or 1).
    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<u64>;
}

#[derive(FromRow)]
struct UpsertedSubscription {
    #[sqlx(flatten)]
    subscription: PushSubscription,
    created: bool,
}

#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionRepository {
    async fn insert_if_absent(&self, subscription: NewPushSubscription) -> Result<Registration> {
        // The no-op update locks and returns an existing row in the same
        // statement; its keys are left untouched. `xmax = 0` only on insert.
        let row = sqlx::query_as::<_, UpsertedSubscription>(
            "INSERT INTO push_subscriptions (endpoint, p256dh, auth)
             VALUES ($1, $2, $3)
             ON CONFLICT (endpoint) DO UPDATE SET endpoint = EXCLUDED.endpoint
             RETURNING *, (xmax = 0) AS created",
        )
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .fetch_one(&self.pool)
        .await?;

        Ok(if row.created {
            Registration::Created(row.subscription)
        } else {
            Registration::Existing(row.subscription)
        })
    }

    async fn list_all(&self) -> Result<Vec<PushSubscription>> {
        let subscriptions = sqlx::query_as::<_, PushSubscription>(
            "SELECT * FROM push_subscriptions ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn delete_by_endpoint(&self, endpoint: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
