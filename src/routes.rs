use crate::{
    notification::{self, DispatchOutcome, TestPushResponse, VapidPublicKeyResponse},
    push,
    reminder::ReminderStatus,
    state::AppState,
    subscription::{
        self,
        subscription_dto::{SubscribeRequest, SubscriptionKeys, UnsubscribeRequest, UnsubscribeResponse},
        PushSubscription,
    },
};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        notification::notification_handlers::send_due_reminders,
        subscription::subscription_handlers::subscribe,
        subscription::subscription_handlers::unsubscribe,
        push::push_handlers::vapid_public_key,
        push::push_handlers::send_test_notification,
    ),
    components(
        schemas(
            DispatchOutcome,
            TestPushResponse,
            VapidPublicKeyResponse,
            SubscribeRequest,
            SubscriptionKeys,
            UnsubscribeRequest,
            UnsubscribeResponse,
            PushSubscription,
            ReminderStatus,
        )
    ),
    tags(
        (name = "jobs", description = "Scheduled job triggers"),
        (name = "push", description = "Push subscription endpoints")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let push_routes = Router::new()
        .route("/subscribe", post(subscription::subscription_handlers::subscribe))
        .route("/unsubscribe", post(subscription::subscription_handlers::unsubscribe))
        .route("/vapid-public-key", get(push::push_handlers::vapid_public_key))
        .route("/test", post(push::push_handlers::send_test_notification));

    // Token-checked inside the handler.
    let job_routes = Router::new().route(
        "/send-due-reminders",
        post(notification::notification_handlers::send_due_reminders),
    );

    let api_routes = Router::new()
        .nest("/push", push_routes)
        .nest("/jobs", job_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
