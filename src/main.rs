mod db;
mod error;
mod notification;
mod push;
mod reminder;
mod routes;
mod state;
mod subscription;

#[cfg(test)]
mod test_utils;

use anyhow::Context;
use db::{create_pool, run_migrations};
use notification::start_notification_service;
use push::{PushTransport, WebPushTransport};
use reminder::PgReminderRepository;
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use subscription::PgSubscriptionRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reminder_push=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    tracing::info!("Connecting to database...");
    let db = create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    let push_transport: Option<Arc<dyn PushTransport>> = WebPushTransport::from_config(&config)
        .context("invalid VAPID configuration")?
        .map(|transport| Arc::new(transport) as Arc<dyn PushTransport>);
    if push_transport.is_none() {
        tracing::warn!("VAPID keys not configured; push delivery is disabled");
    }

    let state = AppState {
        config: config.clone(),
        reminder_store: Arc::new(PgReminderRepository::new(db.clone())),
        subscription_store: Arc::new(PgSubscriptionRepository::new(db.clone())),
        push_transport,
    };

    // In-process trigger, optional alongside the HTTP job endpoint
    match (&config.notification_cron, &state.push_transport) {
        (Some(schedule), Some(_)) => start_notification_service(state.clone(), schedule).await?,
        (Some(_), None) => {
            tracing::warn!("NOTIFICATION_CRON is set but push delivery is disabled; scheduler not started")
        }
        _ => {}
    }

    let app = create_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
