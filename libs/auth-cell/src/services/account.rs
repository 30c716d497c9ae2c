use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use notification_cell::Notifier;
use shared_gateway::ApiClient;
use shared_models::auth::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest, UserProfile};
use shared_models::error::AppError;

use crate::context::PortalContext;
use crate::models::{normalize_login, normalize_registration, validate_new_password, validate_profile_update, ChangePasswordForm};
use crate::session::SessionStore;

/// Login, registration and the account screen.
pub struct AuthService {
    api: ApiClient,
    session: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self {
            api: ctx.api.clone(),
            session: ctx.session.clone(),
            notifier: ctx.notifier(),
        }
    }

    pub async fn login(&self, credentials: LoginRequest) -> Result<UserProfile, AppError> {
        let credentials = normalize_login(credentials).map_err(|errors| {
            self.notifier.error("Please fill in all fields correctly");
            AppError::from(errors)
        })?;

        debug!("Logging in {}", credentials.email);

        let res: AuthResponse = self
            .api
            .request(Method::POST, "/api/auth/login", Some(json!(credentials)))
            .await
            .map_err(|e| self.notifier.fail(AppError::Auth(e.message_or("Invalid email or password"))))?;

        let session = self.session.establish(res).map_err(|e| self.notifier.fail(e))?;
        self.notifier.success("Welcome back!");
        Ok(session.user)
    }

    pub async fn register(&self, form: RegisterRequest) -> Result<UserProfile, AppError> {
        let form = normalize_registration(form).map_err(|errors| {
            self.notifier.error("Please fill in all required fields correctly");
            AppError::from(errors)
        })?;

        debug!("Registering {} as {}", form.email, form.role);

        let res: AuthResponse = self
            .api
            .request(Method::POST, "/api/auth/register", Some(json!(form)))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Registration failed. Try again."))))?;

        let session = self.session.establish(res).map_err(|e| self.notifier.fail(e))?;
        self.notifier.success("Account created successfully!");
        Ok(session.user)
    }

    pub fn logout(&self) {
        self.session.clear();
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, AppError> {
        validate_profile_update(&update)
            .into_result()
            .map_err(|e| self.notifier.fail(e))?;

        let res: AuthResponse = self
            .api
            .request(Method::PUT, "/api/auth/profile", Some(json!(update)))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Update failed"))))?;

        let user = self.session.refresh(res)?;
        info!("Profile updated for {}", user.email);
        self.notifier.success("Profile updated successfully!");
        Ok(user)
    }

    pub async fn update_avatar(&self, avatar: String) -> Result<UserProfile, AppError> {
        if avatar.trim().is_empty() {
            return Err(self.notifier.fail(AppError::ValidationError("Choose an image first".to_string())));
        }

        self.api
            .request_text(Method::PUT, "/api/auth/avatar", Some(json!({ "avatar": avatar })))
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Failed to update picture"))))?;

        let user = self
            .session
            .update_local_user(json!({ "avatar": avatar }))?
            .ok_or_else(|| AppError::Auth("Please log in to continue".to_string()))?;

        self.notifier.success("Profile picture updated successfully!");
        Ok(user)
    }

    pub async fn change_password(&self, form: ChangePasswordForm) -> Result<(), AppError> {
        let new_password = form.new_password.trim().to_string();
        validate_new_password(&new_password, form.confirm_password.trim())
            .into_result()
            .map_err(|e| self.notifier.fail(e))?;

        self.api
            .request_text(
                Method::PUT,
                "/api/auth/change-password",
                Some(json!({
                    "currentPassword": form.current_password.trim(),
                    "newPassword": new_password,
                })),
            )
            .await
            .map_err(|e| self.notifier.fail(AppError::BadRequest(e.message_or("Current password is wrong"))))?;

        self.notifier.success("Password changed successfully!");
        Ok(())
    }
}
