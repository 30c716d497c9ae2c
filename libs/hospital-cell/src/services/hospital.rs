use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};

use auth_cell::PortalContext;
use shared_gateway::ApiClient;
use shared_models::error::AppError;

use crate::models::{AreaFilter, Hospital};

const HOSPITALS_PATH: &str = "/api/hospitals";

/// Gateway over `/api/hospitals`.
#[derive(Clone)]
pub struct HospitalService {
    api: ApiClient,
}

impl HospitalService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self { api: ctx.api.clone() }
    }

    pub async fn list(&self) -> Result<Vec<Hospital>, AppError> {
        Ok(self.api.request(Method::GET, HOSPITALS_PATH, None).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Hospital, AppError> {
        let path = format!("{}/{}", HOSPITALS_PATH, id);
        Ok(self.api.request(Method::GET, &path, None).await?)
    }

    pub async fn by_area(&self, area: &AreaFilter) -> Result<Vec<Hospital>, AppError> {
        debug!("Searching hospitals in {:?}", area);
        let path = format!("{}/by-area?{}", HOSPITALS_PATH, area.query_string());
        Ok(self.api.request(Method::GET, &path, None).await?)
    }

    pub async fn create(&self, payload: Value) -> Result<Hospital, AppError> {
        let hospital: Hospital = self.api.request(Method::POST, HOSPITALS_PATH, Some(payload)).await?;
        info!("Created hospital {} ({})", hospital.name, hospital.id);
        Ok(hospital)
    }

    pub async fn update(&self, id: i64, payload: Value) -> Result<Hospital, AppError> {
        let path = format!("{}/{}", HOSPITALS_PATH, id);
        let hospital: Hospital = self.api.request(Method::PUT, &path, Some(payload)).await?;
        info!("Updated hospital {}", id);
        Ok(hospital)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let path = format!("{}/{}", HOSPITALS_PATH, id);
        self.api.execute(Method::DELETE, &path, None).await?;
        info!("Deleted hospital {}", id);
        Ok(())
    }
}
