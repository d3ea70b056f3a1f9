use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use shared_storage::AppContext;

use crate::handlers;

pub fn agenda_routes(state: Arc<AppContext>) -> Router {
    Router::new()
        // Weekly configurations
        .route("/clinicians/{clinician_id}/configurations", post(handlers::save_configuration))
        .route("/clinicians/{clinician_id}/configurations", get(handlers::list_configurations))
        .route("/clinicians/{clinician_id}/configurations/{weekday}", get(handlers::get_configuration))
        .route("/configurations/{config_id}", delete(handlers::delete_configuration))
        // Availability index
        .route("/clinicians/{clinician_id}/slots/{weekday}", get(handlers::generate_slots))
        .route("/slots/{slot_id}/deactivate", patch(handlers::deactivate_slot))
        .route("/slots/{slot_id}/reactivate", patch(handlers::reactivate_slot))
        .with_state(state)
}
