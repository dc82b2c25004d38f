use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use super::{
    subscription_dto::{SubscribeRequest, UnsubscribeRequest, UnsubscribeResponse},
    subscription_models::PushSubscription,
    subscription_repository::Registration,
};
use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Register a browser push subscription
#[utoipa::path(
    post,
    path = "/api/push/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription registered", body = PushSubscription),
        (status = 200, description = "Endpoint already registered", body = PushSubscription),
        (status = 400, description = "Invalid subscription")
    ),
    tag = "push"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()?;

    let registration = state
        .subscription_store
        .insert_if_absent(payload.into())
        .await?;

    let status = match registration {
        Registration::Created(ref created) => {
            tracing::info!(endpoint = %created.endpoint, "Push subscription registered");
            StatusCode::CREATED
        }
        Registration::Existing(_) => StatusCode::OK,
    };

    Ok((status, Json(registration.into_inner())))
}

/// Remove a push subscription by endpoint
#[utoipa::path(
    post,
    path = "/api/push/unsubscribe",
    request_body = UnsubscribeRequest,
    responses(
        (status = 200, description = "Subscription removed", body = UnsubscribeResponse),
        (status = 400, description = "Missing endpoint")
    ),
    tag = "push"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(payload): Json<UnsubscribeRequest>,
) -> Result<Json<UnsubscribeResponse>> {
    if payload.endpoint.trim().is_empty() {
        return Err(AppError::BadRequest("Endpoint is required".to_string()));
    }

    state
        .subscription_store
        .delete_by_endpoint(&payload.endpoint)
        .await?;

    Ok(Json(UnsubscribeResponse { success: true }))
}
