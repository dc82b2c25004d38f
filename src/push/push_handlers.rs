use axum::{extract::State, Json};

use crate::{
    error::{AppError, Result},
    notification::{TestPushResponse, VapidPublicKeyResponse},
    state::AppState,
};

/// Application server key clients pass to `pushManager.subscribe`
#[utoipa::path(
    get,
    path = "/api/push/vapid-public-key",
    responses(
        (status = 200, description = "VAPID public key", body = VapidPublicKeyResponse),
        (status = 500, description = "VAPID keys not configured")
    ),
    tag = "push"
)]
pub async fn vapid_public_key(
    State(state): State<AppState>,
) -> Result<Json<VapidPublicKeyResponse>> {
    let public_key = state
        .push_transport
        .as_ref()
        .map(|transport| transport.public_key().to_string())
        .ok_or_else(|| AppError::Configuration("VAPID keys are not configured".to_string()))?;

    Ok(Json(VapidPublicKeyResponse { public_key }))
}

/// Send a test notification to every registered subscription
#[utoipa::path(
    post,
    path = "/api/push/test",
    responses(
        (status = 200, description = "Delivery summary", body = TestPushResponse),
        (status = 404, description = "No subscriptions registered"),
        (status = 500, description = "VAPID keys not configured")
    ),
    tag = "push"
)]
pub async fn send_test_notification(
    State(state): State<AppState>,
) -> Result<Json<TestPushResponse>> {
    let dispatcher = state.dispatcher()?;
    let summary = dispatcher.send_test_notification().await?;

    Ok(Json(summary))
}
