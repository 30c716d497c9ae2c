use reqwest::Method;

use auth_cell::PortalContext;
use shared_gateway::ApiClient;
use shared_models::error::AppError;

use crate::models::{District, Division, Upazila};

/// Read-only geographic lookups.
#[derive(Clone)]
pub struct LocationService {
    api: ApiClient,
}

impl LocationService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self { api: ctx.api.clone() }
    }

    pub async fn divisions(&self) -> Result<Vec<Division>, AppError> {
        Ok(self.api.request(Method::GET, "/api/locations/divisions", None).await?)
    }

    pub async fn districts(&self, division_id: i64) -> Result<Vec<District>, AppError> {
        let path = format!("/api/locations/divisions/{}/districts", division_id);
        Ok(self.api.request(Method::GET, &path, None).await?)
    }

    pub async fn upazilas(&self, district_id: i64) -> Result<Vec<Upazila>, AppError> {
        let path = format!("/api/locations/districts/{}/upazilas", district_id);
        Ok(self.api.request(Method::GET, &path, None).await?)
    }
}
