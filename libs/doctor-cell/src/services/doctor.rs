use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use auth_cell::PortalContext;
use shared_gateway::{ApiClient, ApiError};
use shared_models::doctor::DoctorUpdate;

const DOCTORS_PATH: &str = "/api/doctors";

/// Doctor profile writes. Errors stay gateway errors so the admin screens can
/// show the server's own message.
#[derive(Clone)]
pub struct DoctorService {
    api: ApiClient,
}

impl DoctorService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self { api: ctx.api.clone() }
    }

    /// Update doctor profile
    pub async fn update(&self, doctor_id: i64, update: &DoctorUpdate) -> Result<(), ApiError> {
        debug!("Updating doctor profile: {}", doctor_id);

        let path = format!("{}/{}", DOCTORS_PATH, doctor_id);
        self.api.execute(Method::PUT, &path, Some(json!(update))).await?;

        info!("Doctor {} updated", doctor_id);
        Ok(())
    }

    /// Flip the doctor's bookable flag. The flag travels in the query string.
    pub async fn set_active(&self, doctor_id: i64, active: bool) -> Result<(), ApiError> {
        let path = format!("{}/{}/status?active={}", DOCTORS_PATH, doctor_id, active);
        self.api.execute(Method::PATCH, &path, Some(json!({}))).await?;

        info!("Doctor {} is now {}", doctor_id, if active { "active" } else { "inactive" });
        Ok(())
    }
}
