use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::handlers::{events, health};
use crate::state::AppState;

/// Maximum accepted JSON body size for every endpoint.
pub const MAX_JSON_BODY_BYTES: usize = 1 << 20;

/// Builds the application router: health probe plus the v1 event surface.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/v1/events",
            post(events::create_event).get(events::list_events),
        )
        .route("/v1/segment", post(events::segment))
        .route("/v1/retrieve", post(events::retrieve))
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
