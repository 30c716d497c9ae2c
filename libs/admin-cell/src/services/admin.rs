use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use auth_cell::PortalContext;
use shared_gateway::{ApiClient, ApiError};
use shared_models::error::AppError;

use crate::models::{AdminUser, Analytics};

const ADMIN_PATH: &str = "/api/admin";

/// `/api/admin/*` endpoints. Account creation hands back the gateway error so
/// the screen can prefer the server's wording.
#[derive(Clone)]
pub struct AdminService {
    api: ApiClient,
}

impl AdminService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self { api: ctx.api.clone() }
    }

    /// Answers with plain text on success.
    pub async fn add_doctor(&self, payload: Value) -> Result<String, ApiError> {
        debug!("Adding doctor account");
        let message = self
            .api
            .request_text(Method::POST, &format!("{}/add-doctor", ADMIN_PATH), Some(payload))
            .await?;
        info!("Doctor account created");
        Ok(message)
    }

    /// An absent hospital is sent as an empty `hospitalId`.
    pub async fn create_admin(&self, payload: Value, hospital_id: Option<i64>) -> Result<String, ApiError> {
        let hospital = hospital_id.map(|id| id.to_string()).unwrap_or_default();
        let path = format!("{}/create-admin?hospitalId={}", ADMIN_PATH, hospital);
        let message = self.api.request_text(Method::POST, &path, Some(payload)).await?;
        info!("Admin account created for hospital '{}'", hospital);
        Ok(message)
    }

    /// Free-form counters; shown as the API sends them.
    pub async fn stats(&self) -> Result<Value, AppError> {
        Ok(self.api.request(Method::GET, &format!("{}/stats", ADMIN_PATH), None).await?)
    }

    pub async fn analytics(&self) -> Result<Analytics, AppError> {
        Ok(self.api.request(Method::GET, &format!("{}/analytics", ADMIN_PATH), None).await?)
    }

    pub async fn admins(&self) -> Result<Vec<AdminUser>, AppError> {
        Ok(self.api.request(Method::GET, &format!("{}/users/admins", ADMIN_PATH), None).await?)
    }
}
