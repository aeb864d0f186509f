use crate::{
    change::{ChangeKind, RealtimePayload},
    notification::{self, Notification, NotificationId, NotificationState},
    state::AppState,
    subscription,
    ui::{self, UpdateViewRequest},
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        subscription::subscription_handlers::ingest_change,
        notification::notification_handlers::get_notifications,
        notification::notification_handlers::notification_stream,
        notification::notification_handlers::delete_notification,
        ui::ui_handlers::update_view,
    ),
    components(
        schemas(
            RealtimePayload,
            ChangeKind,
            Notification,
            NotificationId,
            NotificationState,
            UpdateViewRequest,
        )
    ),
    tags(
        (name = "changes", description = "Realtime change feed ingest"),
        (name = "notifications", description = "Toast notifications for the current viewer"),
        (name = "view", description = "Current view tracking for refresh decisions")
    )
)]
struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let notification_routes = Router::new()
        .route("/", get(notification::get_notifications))
        .route("/stream", get(notification::notification_stream))
        .route("/:id", delete(notification::delete_notification));

    let api_routes = Router::new()
        .route("/changes", post(subscription::ingest_change))
        .route("/view", put(ui::update_view))
        .nest("/notifications", notification_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .route("/ws/changes", get(subscription::change_feed_ws))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
