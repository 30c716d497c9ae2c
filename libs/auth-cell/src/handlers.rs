use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::{LoginRequest, ProfileUpdate, RegisterRequest, Role, UserProfile};
use shared_models::error::AppError;

use crate::context::PortalContext;
use crate::guards::{landing_path, HOME_PATH, LOGIN_PATH};
use crate::models::{AvatarUpdate, ChangePasswordForm, ForgotPasswordForm, PendingReset, ResetPasswordForm, VerifyOtpForm};
use crate::services::{AuthService, PasswordResetService};

pub const FORGOT_PASSWORD_PATH: &str = "/forgot-password";
pub const VERIFY_OTP_PATH: &str = "/verify-otp";
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// A reset step reached without its earlier step goes back to the start.
fn restart_reset_flow(err: AppError) -> Response {
    match err {
        AppError::StaleState(_) => Redirect::to(FORGOT_PASSWORD_PATH).into_response(),
        other => other.into_response(),
    }
}

#[axum::debug_handler]
pub async fn landing(State(ctx): State<Arc<PortalContext>>) -> Redirect {
    Redirect::to(landing_path(ctx.session.role()))
}

// ==============================================================================
// LOGIN / REGISTRATION
// ==============================================================================

#[axum::debug_handler]
pub async fn login_screen() -> Json<Value> {
    Json(json!({
        "screen": "login",
        "fields": ["email", "password"]
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(ctx): State<Arc<PortalContext>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Redirect, AppError> {
    AuthService::new(&ctx).login(credentials).await?;
    Ok(Redirect::to(HOME_PATH))
}

#[axum::debug_handler]
pub async fn register_screen() -> Json<Value> {
    Json(json!({
        "screen": "register",
        "roles": [Role::Patient, Role::Doctor, Role::Admin],
        "fields": ["name", "email", "password", "phone", "role", "specialty"]
    }))
}

#[axum::debug_handler]
pub async fn register(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<RegisterRequest>,
) -> Result<Redirect, AppError> {
    AuthService::new(&ctx).register(form).await?;
    Ok(Redirect::to(HOME_PATH))
}

#[axum::debug_handler]
pub async fn logout(State(ctx): State<Arc<PortalContext>>) -> Redirect {
    AuthService::new(&ctx).logout();
    Redirect::to(LOGIN_PATH)
}

// ==============================================================================
// PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(Extension(user): Extension<UserProfile>) -> Json<UserProfile> {
    Json(user)
}

#[axum::debug_handler]
pub async fn update_profile(
    State(ctx): State<Arc<PortalContext>>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let user = AuthService::new(&ctx).update_profile(update).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn update_avatar(
    State(ctx): State<Arc<PortalContext>>,
    Json(update): Json<AvatarUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let user = AuthService::new(&ctx).update_avatar(update.avatar).await?;
    Ok(Json(user))
}

#[axum::debug_handler]
pub async fn change_password(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<ChangePasswordForm>,
) -> Result<StatusCode, AppError> {
    AuthService::new(&ctx).change_password(form).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// PASSWORD RESET
// ==============================================================================

#[axum::debug_handler]
pub async fn forgot_password_screen(State(ctx): State<Arc<PortalContext>>) -> Json<Value> {
    let pending = PasswordResetService::new(&ctx).pending_email();
    Json(json!({
        "screen": "forgot-password",
        "email": pending
    }))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<ForgotPasswordForm>,
) -> Result<Redirect, AppError> {
    PasswordResetService::new(&ctx).forgot_password(&form.email).await?;
    Ok(Redirect::to(VERIFY_OTP_PATH))
}

#[axum::debug_handler]
pub async fn verify_otp_screen(State(ctx): State<Arc<PortalContext>>) -> Response {
    match PasswordResetService::new(&ctx).require_pending_email("Session expired! Please request OTP again.") {
        Ok(email) => Json(PendingReset { email }).into_response(),
        Err(err) => restart_reset_flow(err),
    }
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<VerifyOtpForm>,
) -> Response {
    match PasswordResetService::new(&ctx).verify_otp(&form.otp).await {
        Ok(()) => Redirect::to(RESET_PASSWORD_PATH).into_response(),
        Err(err) => restart_reset_flow(err),
    }
}

#[axum::debug_handler]
pub async fn resend_otp(State(ctx): State<Arc<PortalContext>>) -> Response {
    match PasswordResetService::new(&ctx).resend_otp().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => restart_reset_flow(err),
    }
}

#[axum::debug_handler]
pub async fn reset_password_screen(State(ctx): State<Arc<PortalContext>>) -> Response {
    match PasswordResetService::new(&ctx).require_pending_email("Invalid access! Please start again.") {
        Ok(email) => Json(PendingReset { email }).into_response(),
        Err(err) => restart_reset_flow(err),
    }
}

#[axum::debug_handler]
pub async fn reset_password(
    State(ctx): State<Arc<PortalContext>>,
    Json(form): Json<ResetPasswordForm>,
) -> Response {
    match PasswordResetService::new(&ctx)
        .reset_password(&form.new_password, &form.confirm_password)
        .await
    {
        Ok(()) => Redirect::to(LOGIN_PATH).into_response(),
        Err(err) => restart_reset_flow(err),
    }
}
