use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

use auth_cell::PortalContext;
use notification_cell::Notifier;
use shared_models::auth::{Role, UserProfile};
use shared_models::error::AppError;

use crate::cascade::{load_divisions, restore_area, LocationCascade};
use crate::models::{AreaPreference, Division, Hospital, HospitalForm};
use crate::services::{HospitalService, LocationService};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalsScreen {
    pub single_hospital_mode: bool,
    pub hospitals: Vec<Hospital>,
    pub selected_hospital: Option<Hospital>,
    pub divisions: Vec<Division>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalEditor {
    pub is_edit: bool,
    pub form: HospitalForm,
    pub locations: LocationCascade,
}

/// Hospital management for admins. An ADMIN bound to a hospital only ever
/// sees and edits that one hospital.
pub struct HospitalAdminService {
    hospitals: HospitalService,
    locations: LocationService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl HospitalAdminService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            hospitals: HospitalService::new(ctx),
            locations: LocationService::new(ctx),
            notifier: ctx.notifier(),
            user,
        }
    }

    pub fn single_hospital(&self) -> Option<i64> {
        match self.user.role {
            Role::Admin => self.user.hospital_id,
            _ => None,
        }
    }

    pub async fn screen(&self) -> Result<HospitalsScreen, AppError> {
        let (hospitals, selected_hospital) = match self.single_hospital() {
            Some(id) => (Vec::new(), Some(self.hospitals.get(id).await)),
            None => (self.hospitals.list().await.map_err(|e| self.load_failed(e))?, None),
        };
        let selected_hospital = selected_hospital
            .transpose()
            .map_err(|e| self.load_failed(e))?;

        let divisions = self.locations.divisions().await.unwrap_or_else(|e| {
            warn!("Division lookup failed: {}", e);
            Vec::new()
        });

        Ok(HospitalsScreen {
            single_hospital_mode: self.single_hospital().is_some(),
            hospitals,
            selected_hospital,
            divisions,
        })
    }

    fn load_failed(&self, err: AppError) -> AppError {
        self.notifier.error("Failed to load hospitals");
        err
    }

    /// Blank form for a new hospital, or the stored hospital with its
    /// district and upazila options loaded for editing.
    pub async fn editor(&self, id: Option<i64>) -> Result<HospitalEditor, AppError> {
        self.ensure_manageable(id)?;
        let cascade = Mutex::new(LocationCascade::new());
        load_divisions(&cascade, &self.locations).await?;

        let form = match id {
            Some(id) => {
                let hospital = self.hospitals.get(id).await.map_err(|e| self.load_failed(e))?;
                let form = HospitalForm::from_hospital(&hospital);
                let preference = AreaPreference {
                    division_id: form.division_id,
                    district_id: form.district_id,
                    upazila_id: form.upazila_id,
                };
                restore_area(&cascade, &self.locations, preference).await?;
                form
            }
            None => HospitalForm::default(),
        };

        Ok(HospitalEditor {
            is_edit: id.is_some(),
            form,
            locations: cascade.into_inner().unwrap_or_else(PoisonError::into_inner),
        })
    }

    /// Creates when the form has no id, updates otherwise.
    pub async fn save(&self, form: HospitalForm) -> Result<Hospital, AppError> {
        self.ensure_manageable(form.id)?;
        form.validate().into_result().map_err(|e| self.notifier.fail(e))?;

        let payload = form.to_payload();
        let saved = match form.id {
            Some(id) => self.hospitals.update(id, payload).await,
            None => self.hospitals.create(payload).await,
        }
        .map_err(|e| {
            self.notifier.error("Failed to save hospital");
            e
        })?;

        self.notifier.success(if form.id.is_some() { "Hospital updated" } else { "Hospital created" });
        Ok(saved)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.single_hospital().is_some() {
            return Err(self.reject());
        }

        self.hospitals.delete(id).await.map_err(|e| {
            self.notifier.error("Failed to delete hospital");
            e
        })?;
        info!("{} deleted hospital {}", self.user.email, id);
        self.notifier.success("Hospital deleted");
        Ok(())
    }

    fn ensure_manageable(&self, id: Option<i64>) -> Result<(), AppError> {
        match self.single_hospital() {
            Some(own) if id != Some(own) => Err(self.reject()),
            _ => Ok(()),
        }
    }

    fn reject(&self) -> AppError {
        warn!("{} tried to manage a hospital outside their own", self.user.email);
        self.notifier.fail(AppError::Forbidden("You can only manage your own hospital".to_string()))
    }
}
