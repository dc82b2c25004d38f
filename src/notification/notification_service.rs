use crate::state::AppState;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Runs the dispatcher in-process on `schedule` (six-field cron, seconds first).
///
/// Equivalent to an external caller hitting the job endpoint on the same cadence.
pub async fn start_notification_service(state: AppState, schedule: &str) -> anyhow::Result<()> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let state = state.clone();

        Box::pin(async move {
            if let Err(e) = check_and_send_notifications(&state).await {
                error!("Error sending due reminder notifications: {:?}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Notification service started with schedule '{}'", schedule);
    Ok(())
}

async fn check_and_send_notifications(state: &AppState) -> crate::error::Result<()> {
    let dispatcher = state.dispatcher()?;
    dispatcher.dispatch_due_notifications(Utc::now()).await?;
    Ok(())
}
