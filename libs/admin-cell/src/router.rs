use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use auth_cell::guards::{guard_middleware, RouteGuard, ADMIN_ROLES};
use auth_cell::PortalContext;

use crate::handlers;

pub fn admin_routes(ctx: Arc<PortalContext>) -> Router {
    Router::new()
        .route("/admin", get(handlers::admin_home))
        .route("/admin/dashboard", get(handlers::dashboard))
        .route("/admin/financial", get(handlers::financials))
        .route("/admin/doctors", get(handlers::doctors_screen).post(handlers::add_doctor))
        .route("/admin/doctors/new", get(handlers::new_doctor_form))
        .route("/admin/doctors/{id}", get(handlers::edit_doctor_form).put(handlers::update_doctor))
        .route("/admin/doctors/{id}/status", patch(handlers::set_doctor_status))
        .route("/admin/users", get(handlers::users_screen).post(handlers::create_admin))
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx.clone(), ADMIN_ROLES),
            guard_middleware,
        ))
        .with_state(ctx)
}
