use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

use auth_cell::PortalContext;
use shared_gateway::{ApiClient, ApiError};
use shared_models::doctor::{Doctor, DoctorSlot};
use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentStatus};

const APPOINTMENTS_PATH: &str = "/api/appointments";

/// Gateway for appointments plus the doctor and slot lookups the booking
/// screens need.
#[derive(Clone)]
pub struct AppointmentService {
    api: ApiClient,
}

impl AppointmentService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self { api: ctx.api.clone() }
    }

    pub async fn list(&self) -> Result<Vec<Appointment>, AppError> {
        Ok(self.api.request(Method::GET, APPOINTMENTS_PATH, None).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Appointment, AppError> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, id);
        Ok(self.api.request(Method::GET, &path, None).await?)
    }

    /// Save calls hand back the gateway error so each screen can pick its own
    /// fallback wording when the server sends no message.
    pub async fn create(&self, appointment: &Appointment) -> Result<(), ApiError> {
        debug!("Creating appointment for {} with doctor {}", appointment.patient_email, appointment.doctor_id);
        self.api
            .execute(Method::POST, APPOINTMENTS_PATH, Some(json!(appointment)))
            .await?;
        info!("Created appointment for {} on {}", appointment.patient_email, appointment.appointment_date);
        Ok(())
    }

    pub async fn update(&self, id: i64, appointment: &Appointment) -> Result<(), ApiError> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, id);
        self.api.execute(Method::PUT, &path, Some(json!(appointment))).await?;
        info!("Updated appointment {}", id);
        Ok(())
    }

    pub async fn update_status(&self, id: i64, status: AppointmentStatus) -> Result<(), AppError> {
        let path = format!("{}/{}/status", APPOINTMENTS_PATH, id);
        self.api
            .execute(Method::PATCH, &path, Some(json!({ "status": status })))
            .await?;
        info!("Appointment {} is now {}", id, status);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, id);
        self.api.execute(Method::DELETE, &path, None).await?;
        info!("Deleted appointment {}", id);
        Ok(())
    }

    /// Every doctor. The API offers no hospital-scoped variant.
    pub async fn doctors(&self) -> Result<Vec<Doctor>, AppError> {
        Ok(self.api.request(Method::GET, "/api/doctors", None).await?)
    }

    pub async fn doctor_slots(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<DoctorSlot>, AppError> {
        let path = format!("/api/doctor-slots/doctor/{}/date/{}", doctor_id, date.format("%Y-%m-%d"));
        Ok(self.api.request(Method::GET, &path, None).await?)
    }

    /// Creates every slot in one call; the API accepts or rejects the batch as a whole.
    pub async fn create_doctor_slots(&self, slots: &[DoctorSlot]) -> Result<(), AppError> {
        debug!("Submitting {} doctor slots", slots.len());
        self.api
            .execute(Method::POST, "/api/doctor-slots/batch", Some(json!(slots)))
            .await?;
        Ok(())
    }
}
