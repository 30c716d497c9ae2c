use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use appointment_cell::AppointmentService;
use auth_cell::PortalContext;
use doctor_cell::DoctorService;
use notification_cell::Notifier;
use shared_models::doctor::Doctor;
use shared_models::error::AppError;

use crate::models::{DirectoryQuery, DoctorForm, DEFAULT_DOCTOR_PAGE_SIZE, DOCTOR_PAGE_SIZES, SPECIALTIES};
use crate::services::AdminService;

/// Case-insensitive match on name, email or specialty. A blank term keeps everything.
pub fn search_doctors(doctors: &[Doctor], term: &str) -> Vec<Doctor> {
    let term = term.trim().to_lowercase();
    doctors
        .iter()
        .filter(|doctor| {
            term.is_empty()
                || doctor.name.to_lowercase().contains(&term)
                || doctor.email.to_lowercase().contains(&term)
                || doctor.specialty.to_lowercase().contains(&term)
        })
        .cloned()
        .collect()
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1))
}

/// Rows of the 1-based `page`. Empty past the last page.
pub fn paginate<T: Clone>(rows: &[T], page: usize, page_size: usize) -> Vec<T> {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    rows.iter().skip(start).take(page_size).cloned().collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryScreen {
    pub search: String,
    pub doctors: Vec<Doctor>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub page_size_options: [usize; 4],
    pub specialties: [&'static str; 20],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorEditor {
    pub is_edit: bool,
    pub doctor_id: Option<i64>,
    pub form: DoctorForm,
    pub specialties: [&'static str; 20],
}

pub struct DoctorDirectoryService {
    appointments: AppointmentService,
    doctors: DoctorService,
    admin: AdminService,
    notifier: Arc<dyn Notifier>,
}

impl DoctorDirectoryService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            doctors: DoctorService::new(ctx),
            admin: AdminService::new(ctx),
            notifier: ctx.notifier(),
        }
    }

    async fn all(&self) -> Result<Vec<Doctor>, AppError> {
        self.appointments.doctors().await.map_err(|e| {
            warn!("Doctor directory unavailable: {}", e);
            self.notifier.error("Failed to load doctors");
            e
        })
    }

    pub async fn screen(&self, query: DirectoryQuery) -> Result<DirectoryScreen, AppError> {
        let page_size = query.page_size.unwrap_or(DEFAULT_DOCTOR_PAGE_SIZE);
        if !DOCTOR_PAGE_SIZES.contains(&page_size) {
            return Err(AppError::BadRequest(format!(
                "Page size must be one of {:?}",
                DOCTOR_PAGE_SIZES
            )));
        }

        let matching = search_doctors(&self.all().await?, &query.search);
        let pages = total_pages(matching.len(), page_size);
        let page = query.page.unwrap_or(1).clamp(1, pages.max(1));

        Ok(DirectoryScreen {
            doctors: paginate(&matching, page, page_size),
            total: matching.len(),
            search: query.search,
            page,
            page_size,
            total_pages: pages,
            page_size_options: DOCTOR_PAGE_SIZES,
            specialties: SPECIALTIES,
        })
    }

    pub async fn editor(&self, id: Option<i64>) -> Result<DoctorEditor, AppError> {
        let form = match id {
            Some(id) => {
                let doctors = self.all().await?;
                let doctor = doctors
                    .iter()
                    .find(|doctor| doctor.id == id)
                    .ok_or_else(|| self.notifier.fail(AppError::NotFound("Doctor not found".to_string())))?;
                DoctorForm::from_doctor(doctor)
            }
            None => DoctorForm::default(),
        };

        Ok(DoctorEditor {
            is_edit: id.is_some(),
            doctor_id: id,
            form,
            specialties: SPECIALTIES,
        })
    }

    pub async fn add(&self, form: DoctorForm) -> Result<(), AppError> {
        form.validate(false).into_result().map_err(|e| self.notifier.fail(e))?;

        self.admin.add_doctor(form.to_new_doctor()).await.map_err(|e| {
            self.notifier
                .fail(AppError::BadRequest(e.message_or("Failed to add doctor")))
        })?;

        self.notifier.success("Doctor added successfully!");
        Ok(())
    }

    pub async fn update(&self, id: i64, form: DoctorForm) -> Result<(), AppError> {
        form.validate(true).into_result().map_err(|e| self.notifier.fail(e))?;

        self.doctors.update(id, &form.to_update()).await.map_err(|e| {
            self.notifier
                .fail(AppError::BadRequest(e.message_or("Failed to update doctor")))
        })?;

        self.notifier.success("Doctor updated successfully!");
        Ok(())
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<(), AppError> {
        self.doctors.set_active(id, active).await.map_err(|e| {
            warn!("Status change for doctor {} failed: {}", id, e);
            self.notifier.fail(AppError::BadRequest("Failed to update status".to_string()))
        })?;

        info!("Doctor {} marked {}", id, if active { "active" } else { "inactive" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doctor(id: i64, name: &str, email: &str, specialty: &str) -> Doctor {
        serde_json::from_value(json!({ "id": id, "name": name, "email": email, "specialty": specialty })).unwrap()
    }

    #[test]
    fn search_covers_name_email_and_specialty() {
        let doctors = vec![
            doctor(1, "Dr. Karim", "karim@clinic.com", "Cardiologist"),
            doctor(2, "Dr. Sen", "sen@clinic.com", "Dermatologist"),
            doctor(3, "Dr. Huq", "huq@CARDIO.org", "Dentist"),
        ];

        let ids = |term: &str| search_doctors(&doctors, term).iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids("CARDIO"), vec![1, 3]);
        assert_eq!(ids("sen"), vec![2]);
        assert_eq!(ids("  "), vec![1, 2, 3]);
        assert!(ids("nobody").is_empty());
    }

    #[test]
    fn pages_split_evenly_with_a_short_tail() {
        let rows: Vec<u32> = (1..=12).collect();

        assert_eq!(total_pages(rows.len(), 5), 3);
        assert_eq!(paginate(&rows, 3, 5), vec![11, 12]);
        assert!(paginate(&rows, 4, 5).is_empty());
        assert_eq!(total_pages(0, 10), 0);
    }
}
