use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Client-side role check failed; no request reached the API.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A multi-step flow was entered without the state an earlier step records.
    #[error("Stale state: {0}")]
    StaleState(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// The user-facing part of the error, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg)
            | AppError::ValidationError(msg)
            | AppError::StaleState(msg)
            | AppError::ExternalService(msg) => msg,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::StaleState(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
