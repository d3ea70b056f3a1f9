use std::sync::Arc;

use axum::{routing::get, Router};

use agenda_cell::router::agenda_routes;
use patient_cell::router::patient_routes;
use session_cell::router::session_routes;
use shared_storage::AppContext;

pub fn create_router(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduler API is running!" }))
        .nest("/agenda", agenda_routes(state.clone()))
        .nest("/sessions", session_routes(state.clone()))
        .nest("/patients", patient_routes(state))
}
