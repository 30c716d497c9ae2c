use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use notification_cell::Notifier;
use shared_gateway::ApiClient;
use shared_models::error::AppError;
use shared_utils::storage::{keys, KeyValueStore};
use shared_utils::validation::{is_valid_email, is_valid_otp};

use crate::context::PortalContext;
use crate::models::validate_new_password;

/// Forgot-password, OTP verification and reset. The email entered on the
/// first screen is kept in client storage until the reset succeeds.
pub struct PasswordResetService {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl PasswordResetService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self {
            api: ctx.api.clone(),
            store: ctx.store().clone(),
            notifier: ctx.notifier(),
        }
    }

    pub fn pending_email(&self) -> Option<String> {
        self.store.get(keys::RESET_EMAIL).filter(|e| !e.trim().is_empty())
    }

    /// The pending email, or `StaleState` when the flow was entered mid-way.
    pub fn require_pending_email(&self, notice: &str) -> Result<String, AppError> {
        self.pending_email().ok_or_else(|| {
            warn!("Password reset step opened without a pending email");
            self.notifier.fail(AppError::StaleState(notice.to_string()))
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(self.notifier.fail(AppError::ValidationError("Enter a valid email address".to_string())));
        }

        self.store
            .set(keys::RESET_EMAIL, email)
            .map_err(|e| AppError::Internal(format!("Could not store reset email: {}", e)))?;

        debug!("Requesting password reset OTP for {}", email);
        self.api
            .request_text(Method::POST, "/api/auth/forgot-password", Some(json!({ "email": email })))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Email not found or server error."))))?;

        self.notifier.success("OTP sent successfully! Please check your email.");
        Ok(())
    }

    pub async fn verify_otp(&self, otp: &str) -> Result<(), AppError> {
        let email = self.require_pending_email("Session expired! Please request OTP again.")?;
        let otp = otp.trim();
        if !is_valid_otp(otp) {
            return Err(self.notifier.fail(AppError::ValidationError("Enter the 6-digit code".to_string())));
        }

        self.api
            .request_text(Method::POST, "/api/auth/verify-otp", Some(json!({ "email": email, "otp": otp })))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Invalid or expired OTP. Please try again."))))?;

        Ok(())
    }

    pub async fn resend_otp(&self) -> Result<(), AppError> {
        let email = self.require_pending_email("Session expired! Please request OTP again.")?;

        self.api
            .request_text(Method::POST, "/api/auth/forgot-password", Some(json!({ "email": email })))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Failed to resend OTP. Please try again later."))))?;

        self.notifier.success("OTP resent successfully!");
        Ok(())
    }

    pub async fn reset_password(&self, new_password: &str, confirm: &str) -> Result<(), AppError> {
        let email = self.require_pending_email("Invalid access! Please start again.")?;
        validate_new_password(new_password, confirm)
            .into_result()
            .map_err(|e| self.notifier.fail(e))?;

        self.api
            .request_text(
                Method::POST,
                "/api/auth/reset-password",
                Some(json!({ "email": email, "newPassword": new_password })),
            )
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Failed to reset password. Please try again."))))?;

        if let Err(e) = self.store.remove(keys::RESET_EMAIL) {
            warn!("Could not clear reset email: {}", e);
        }
        info!("Password reset completed for {}", email);
        self.notifier.success("Password changed successfully! You can now login.");
        Ok(())
    }
}
