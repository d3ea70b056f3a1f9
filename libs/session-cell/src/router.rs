use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_storage::AppContext;

use crate::handlers;

pub fn session_routes(state: Arc<AppContext>) -> Router {
    Router::new()
        // Series planning
        .route("/series", post(handlers::create_series))
        .route("/patients/{patient_id}/series/top-up", post(handlers::top_up_series))
        .route("/patients/{patient_id}/series/resize", post(handlers::resize_series))
        // Booking lifecycle
        .route("/bookings/{booking_id}", get(handlers::get_booking))
        .route("/bookings/{booking_id}/done", patch(handlers::mark_booking_done))
        .route("/bookings/{booking_id}/cancel", patch(handlers::cancel_booking))
        .route("/bookings/{booking_id}/no-show", patch(handlers::mark_booking_no_show))
        .route("/bookings/{booking_id}/reschedule", patch(handlers::reschedule_booking))
        .route("/bookings/{booking_id}/notes", patch(handlers::update_booking_notes))
        // Listings and counters
        .route("/clinicians/{clinician_id}/bookings", get(handlers::list_clinician_bookings))
        .route("/patients/{patient_id}/bookings", get(handlers::list_patient_bookings))
        .route("/patients/{patient_id}/bookings/counts", get(handlers::count_patient_bookings))
        .with_state(state)
}
