// Router construction
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    bulk_action, health_check, login, login_form, logout, show_view, update_cell,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/", get(login_form))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/views/:view", get(show_view))
        .route("/views/:view/bulk", post(bulk_action))
        .route("/views/:view/cells", post(update_cell))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
