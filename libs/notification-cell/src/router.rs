use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::handlers;
use crate::services::toast::ToastService;

pub fn toast_routes(toasts: Arc<ToastService>) -> Router {
    Router::new()
        .route("/toasts", get(handlers::list_toasts))
        .route("/toasts/{id}", delete(handlers::dismiss_toast))
        .with_state(toasts)
}
