use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use super::notification_dto::{DispatchOutcome, TriggerQuery};
use crate::{
    error::{AppError, Result},
    state::AppState,
};

/// Send push notifications for reminders that are about to fall due
#[utoipa::path(
    post,
    path = "/api/jobs/send-due-reminders",
    params(TriggerQuery),
    responses(
        (status = 200, description = "Dispatch summary", body = DispatchOutcome),
        (status = 401, description = "Missing or invalid job token"),
        (status = 500, description = "VAPID keys not configured or store unavailable")
    ),
    tag = "jobs"
)]
pub async fn send_due_reminders(
    State(state): State<AppState>,
    Query(query): Query<TriggerQuery>,
) -> Result<Json<DispatchOutcome>> {
    authorize_job(
        state.config.job_api_secret.as_deref(),
        query.token.as_deref(),
    )?;

    let dispatcher = state.dispatcher()?;
    let outcome = dispatcher.dispatch_due_notifications(Utc::now()).await?;

    Ok(Json(outcome))
}

/// An unset secret locks the endpoint.
fn authorize_job(expected: Option<&str>, provided: Option<&str>) -> Result<()> {
    match (expected, provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        _ => Err(AppError::Unauthorized("Invalid job token".to_string())),
    }
}
