pub mod health;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::dashboard::handlers;
use crate::session::require_session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let gated = Router::new()
        // Dashboard view and selection
        .route("/api/v1/dashboard", get(handlers::handle_get_dashboard))
        .route("/api/v1/dashboard/reload", post(handlers::handle_reload))
        .route(
            "/api/v1/dashboard/selection/toggle-all",
            post(handlers::handle_toggle_all),
        )
        .route(
            "/api/v1/dashboard/selection/:id/toggle",
            post(handlers::handle_toggle),
        )
        // Record deletion
        .route("/api/v1/resumes", delete(handlers::handle_delete_all))
        .route(
            "/api/v1/resumes/delete-selected",
            post(handlers::handle_delete_selected),
        )
        .route("/api/v1/resumes/:id", delete(handlers::handle_delete_one))
        // Record files
        .route("/api/v1/resumes/:id/image", get(handlers::handle_get_image))
        .route("/api/v1/resumes/:id/resume", get(handlers::handle_get_resume))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(gated)
        .with_state(state)
}
