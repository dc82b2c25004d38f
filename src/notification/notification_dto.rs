use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Summary of one dispatcher invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub reminders_considered: usize,
    pub notifications_attempted: usize,
    pub notifications_succeeded: usize,
    pub notifications_failed: usize,
    pub subscriptions_pruned: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TriggerQuery {
    /// Shared job secret.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TestPushResponse {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: String,
}
