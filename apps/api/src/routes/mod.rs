pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::vehicle::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Lookups
        .route("/api/v1/makes", get(handlers::handle_list_makes))
        .route("/api/v1/models", get(handlers::handle_list_models))
        .route("/api/v1/vin/:vin", get(handlers::handle_decode_vin))
        .route("/api/v1/colors", get(handlers::handle_common_colors))
        .route(
            "/api/v1/descriptions",
            post(handlers::handle_generate_description),
        )
        // Form sessions
        .route("/api/v1/forms", post(handlers::handle_create_form))
        .route(
            "/api/v1/forms/:id",
            get(handlers::handle_get_form).delete(handlers::handle_delete_form),
        )
        .route(
            "/api/v1/forms/:id/events",
            post(handlers::handle_form_event),
        )
        .route(
            "/api/v1/forms/:id/submit",
            post(handlers::handle_submit_form),
        )
        .with_state(state)
}
