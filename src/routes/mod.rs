use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, Config};
use crate::handlers::{auth, dashboard, events, health_check, todos};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/sign-out", post(auth::sign_out))
        .route("/me", get(auth::get_profile).patch(auth::update_profile))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/events/:event_id/todos",
            get(todos::list_event_todos).post(todos::create_todo),
        )
        .route(
            "/todos/:todo_id",
            patch(todos::update_todo).delete(todos::delete_todo),
        )
        .route("/dashboard/summary", get(dashboard::summary))
        .route("/stream", get(dashboard::stream))
        .with_state(state)
        .layer(create_security_headers_layer(config.production))
        .layer(create_cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
