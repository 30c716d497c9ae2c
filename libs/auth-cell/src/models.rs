use serde::{Deserialize, Serialize};

use shared_models::auth::{LoginRequest, ProfileUpdate, RegisterRequest, Role};
use shared_utils::validation::{has_min_chars, is_valid_email, is_valid_mobile_phone, ValidationErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvatarUpdate {
    /// Image as a data URL.
    pub avatar: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpForm {
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReset {
    pub email: String,
}

/// Trims both fields and checks them the way the login screen does.
pub fn normalize_login(form: LoginRequest) -> Result<LoginRequest, ValidationErrors> {
    let form = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password.trim().to_string(),
    };

    let mut errors = ValidationErrors::new();
    errors.check(is_valid_email(&form.email), "email", "Enter a valid email address");
    errors.check(
        form.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password must be at least 6 characters",
    );

    if errors.is_empty() {
        Ok(form)
    } else {
        Err(errors)
    }
}

/// Trims every field, drops the specialty for non-doctors and validates.
pub fn normalize_registration(form: RegisterRequest) -> Result<RegisterRequest, ValidationErrors> {
    let specialty = match form.role {
        Role::Doctor => Some(form.specialty.as_deref().unwrap_or_default().trim().to_string()),
        _ => None,
    };
    let form = RegisterRequest {
        name: form.name.trim().to_string(),
        email: form.email.trim().to_string(),
        password: form.password.trim().to_string(),
        role: form.role,
        phone: form.phone.trim().to_string(),
        specialty,
    };

    let mut errors = ValidationErrors::new();
    errors.check(has_min_chars(&form.name, 2), "name", "Name must be at least 2 characters");
    errors.check(is_valid_email(&form.email), "email", "Enter a valid email address");
    errors.check(
        form.password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password must be at least 6 characters",
    );
    errors.check(
        is_valid_mobile_phone(&form.phone),
        "phone",
        "Phone must be 11 digits, optionally starting with +88",
    );
    errors.check(
        form.role != Role::SuperAdmin,
        "role",
        "Choose patient, doctor or admin",
    );
    if let Some(specialty) = &form.specialty {
        errors.check(has_min_chars(specialty, 3), "specialty", "Specialty must be at least 3 characters");
    }

    if errors.is_empty() {
        Ok(form)
    } else {
        Err(errors)
    }
}

pub fn validate_profile_update(update: &ProfileUpdate) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(
        !update.name.trim().is_empty() && !update.email.trim().is_empty(),
        "name",
        "Name and Email are required",
    );
    errors
}

pub fn validate_new_password(new_password: &str, confirm: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.check(new_password == confirm, "confirmPassword", "New passwords do not match");
    errors.check(
        new_password.chars().count() >= MIN_PASSWORD_LEN,
        "newPassword",
        "Password must be at least 6 characters",
    );
    errors
}
