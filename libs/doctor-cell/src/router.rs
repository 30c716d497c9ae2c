use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use auth_cell::guards::{guard_middleware, RouteGuard, DOCTOR_ONLY};
use auth_cell::PortalContext;

use crate::handlers::{self, DoctorState};

pub fn doctor_routes(ctx: Arc<PortalContext>) -> Router {
    let state = DoctorState::new(ctx.clone());

    Router::new()
        .route("/schedule", get(handlers::schedule_screen))
        .route("/schedule/appointments/{id}/status", patch(handlers::change_status))
        .route("/schedule/days/{day}/toggle", post(handlers::toggle_day))
        .route("/schedule/days/{day}/blocks", post(handlers::add_block))
        .route(
            "/schedule/days/{day}/blocks/{index}",
            put(handlers::update_block).delete(handlers::remove_block),
        )
        .route("/schedule/generate", post(handlers::generate_schedule))
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx, DOCTOR_ONLY),
            guard_middleware,
        ))
        .with_state(state)
}
