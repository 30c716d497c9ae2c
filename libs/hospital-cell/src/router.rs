use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use auth_cell::guards::{guard_middleware, RouteGuard, ADMIN_ROLES};
use auth_cell::PortalContext;

use crate::handlers;

pub fn hospital_routes(ctx: Arc<PortalContext>) -> Router {
    let admin_routes = Router::new()
        .route("/admin/hospitals", get(handlers::hospitals_screen).post(handlers::create_hospital))
        .route("/admin/hospitals/new", get(handlers::new_hospital_form))
        .route(
            "/admin/hospitals/{id}",
            get(handlers::edit_hospital_form)
                .put(handlers::update_hospital)
                .delete(handlers::delete_hospital),
        )
        .layer(middleware::from_fn_with_state(
            RouteGuard::roles(ctx.clone(), ADMIN_ROLES),
            guard_middleware,
        ));

    let lookup_routes = Router::new()
        .route("/locations/divisions", get(handlers::list_divisions))
        .route("/locations/divisions/{id}/districts", get(handlers::list_districts))
        .route("/locations/districts/{id}/upazilas", get(handlers::list_upazilas))
        .layer(middleware::from_fn_with_state(
            RouteGuard::authenticated(ctx.clone()),
            guard_middleware,
        ));

    Router::new()
        .merge(admin_routes)
        .merge(lookup_routes)
        .with_state(ctx)
}
