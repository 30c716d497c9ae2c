use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::context::PortalContext;
use crate::guards::{guard_middleware, RouteGuard};
use crate::handlers;

pub fn auth_routes(ctx: Arc<PortalContext>) -> Router {
    let guest_routes = Router::new()
        .route("/login", get(handlers::login_screen).post(handlers::login))
        .route("/register", get(handlers::register_screen).post(handlers::register))
        .layer(middleware::from_fn_with_state(RouteGuard::guest_only(ctx.clone()), guard_middleware));

    let public_routes = Router::new()
        .route("/", get(handlers::landing))
        .route("/logout", post(handlers::logout))
        .route("/forgot-password", get(handlers::forgot_password_screen).post(handlers::forgot_password))
        .route("/verify-otp", get(handlers::verify_otp_screen).post(handlers::verify_otp))
        .route("/verify-otp/resend", post(handlers::resend_otp))
        .route("/reset-password", get(handlers::reset_password_screen).post(handlers::reset_password));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/profile/avatar", put(handlers::update_avatar))
        .route("/profile/password", put(handlers::change_password))
        .layer(middleware::from_fn_with_state(RouteGuard::authenticated(ctx.clone()), guard_middleware));

    Router::new()
        .merge(guest_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(ctx)
}
