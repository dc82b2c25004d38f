use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::subscription_models::NewPushSubscription;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscriptionKeys {
    #[validate(length(min = 1))]
    pub p256dh: String,
    #[validate(length(min = 1))]
    pub auth: String,
}

/// Body of `PushSubscription.toJSON()` as sent by the browser.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubscribeRequest {
    #[validate(url)]
    pub endpoint: String,
    #[validate(nested)]
    pub keys: SubscriptionKeys,
}

impl From<SubscribeRequest> for NewPushSubscription {
    fn from(request: SubscribeRequest) -> Self {
        Self {
            endpoint: request.endpoint,
            p256dh: request.keys.p256dh,
            auth: request.keys.auth,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnsubscribeRequest {
    #[serde(default)]
    pub endpoint: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnsubscribeResponse {
    pub success: bool,
}
