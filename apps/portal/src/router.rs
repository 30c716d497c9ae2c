use std::sync::Arc;

use axum::{middleware, response::Redirect, routing::get, Router};

use admin_cell::router::admin_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::guards::{guard_middleware, RouteGuard, HOME_PATH};
use auth_cell::router::auth_routes;
use auth_cell::PortalContext;
use doctor_cell::router::doctor_routes;
use hospital_cell::router::hospital_routes;
use notification_cell::router::toast_routes;

use crate::shell;

pub fn create_router(ctx: Arc<PortalContext>) -> Router {
    let shell_routes = Router::new()
        .route("/shell", get(shell::shell))
        .layer(middleware::from_fn_with_state(
            RouteGuard::authenticated(ctx.clone()),
            guard_middleware,
        ))
        .with_state(ctx.clone());

    Router::new()
        .merge(auth_routes(ctx.clone()))
        .merge(appointment_routes(ctx.clone()))
        .merge(doctor_routes(ctx.clone()))
        .merge(hospital_routes(ctx.clone()))
        .merge(admin_routes(ctx.clone()))
        .merge(toast_routes(ctx.toasts.clone()))
        .merge(shell_routes)
        .fallback(|| async { Redirect::to(HOME_PATH) })
}
