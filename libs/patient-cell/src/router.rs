use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use shared_storage::AppContext;

use crate::handlers;

pub fn patient_routes(state: Arc<AppContext>) -> Router {
    Router::new()
        .route("/clinicians/{clinician_id}/patients", post(handlers::create_patient))
        .route("/clinicians/{clinician_id}/patients", get(handlers::list_patients))
        .route("/patients/{patient_id}", get(handlers::get_patient))
        .route("/patients/{patient_id}", put(handlers::update_patient))
        .route("/patients/{patient_id}/rebind", post(handlers::rebind_patient_slot))
        .route("/patients/{patient_id}/deactivate", patch(handlers::deactivate_patient))
        .route("/patients/{patient_id}/reactivate", patch(handlers::reactivate_patient))
        .with_state(state)
}
