use serde_json::Value;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {}", .message.as_deref().unwrap_or("token rejected"))]
    Unauthorized { message: Option<String> },

    #[error("Resource not found: {}", .message.as_deref().unwrap_or("no details"))]
    NotFound { message: Option<String> },

    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Builds the error for a non-2xx response, lifting the server's message.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 => ApiError::Unauthorized { message },
            404 => ApiError::NotFound { message },
            _ => ApiError::Status { status, message },
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::NotFound { message }
            | ApiError::Status { message, .. } => message.as_deref(),
            ApiError::Transport(_) | ApiError::Decode(_) => None,
        }
    }

    /// Server message when present, the screen's generic wording otherwise.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or(fallback).to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}

/// Reads `error`, then `message`, from a JSON error body. Short plain-text
/// bodies are taken as the message itself.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => ["error", "message"]
            .iter()
            .filter_map(|key| map.get(*key))
            .filter_map(Value::as_str)
            .find(|msg| !msg.trim().is_empty())
            .map(str::to_string),
        Ok(Value::String(msg)) if !msg.trim().is_empty() => Some(msg),
        Ok(_) => None,
        Err(_) if trimmed.len() <= 200 && !trimmed.starts_with('<') => Some(trimmed.to_string()),
        Err(_) => None,
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Unauthorized { .. } => AppError::Auth(err.message_or("Session expired, please log in again")),
            ApiError::NotFound { .. } => AppError::NotFound(err.message_or("Resource not found")),
            ApiError::Status { status, .. } if (400..500).contains(status) => {
                AppError::BadRequest(err.message_or("Request rejected by the server"))
            }
            ApiError::Status { .. } => AppError::ExternalService(err.message_or("Server error, please try again")),
            ApiError::Transport(e) => AppError::ExternalService(format!("Could not reach the clinic API: {}", e)),
            ApiError::Decode(e) => AppError::Internal(format!("Unexpected response from the clinic API: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_message() {
        let body = r#"{"error":"Slot already booked","message":"Conflict"}"#;
        assert_eq!(extract_message(body).as_deref(), Some("Slot already booked"));
    }

    #[test]
    fn message_field_is_used_when_error_missing() {
        let body = r#"{"message":"Invalid credentials"}"#;
        assert_eq!(extract_message(body).as_deref(), Some("Invalid credentials"));
    }

    #[test]
    fn plain_text_body_is_the_message() {
        assert_eq!(extract_message("Email not registered").as_deref(), Some("Email not registered"));
        assert_eq!(extract_message("<html>oops</html>"), None);
        assert_eq!(extract_message("  "), None);
    }

    #[test]
    fn fallback_when_body_has_no_message() {
        let err = ApiError::from_response(500, "{}");
        assert_eq!(err.message_or("Delete failed"), "Delete failed");
    }

    #[test]
    fn client_errors_become_bad_requests() {
        let err = ApiError::from_response(409, r#"{"error":"Duplicate code"}"#);
        match AppError::from(err) {
            AppError::BadRequest(msg) => assert_eq!(msg, "Duplicate code"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
