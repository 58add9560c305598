use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use postbox_core::health::{healthz, readyz, status};
use postbox_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::message::{create_message, get_message, list_messages};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/status", get(status))
        // Messages
        .route("/messages", post(create_message))
        .route("/messages", get(list_messages))
        .route("/messages/{id}", get(get_message))
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
