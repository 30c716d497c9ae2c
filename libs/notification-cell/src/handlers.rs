use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::services::toast::ToastService;

#[axum::debug_handler]
pub async fn list_toasts(State(toasts): State<Arc<ToastService>>) -> Json<Value> {
    let active = toasts.active();
    Json(json!({
        "toasts": active,
        "total": active.len()
    }))
}

#[axum::debug_handler]
pub async fn dismiss_toast(
    State(toasts): State<Arc<ToastService>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    if toasts.remove(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Toast {} already dismissed", id)))
    }
}
