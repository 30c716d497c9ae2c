use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use auth_cell::PortalContext;
use hospital_cell::{Hospital, HospitalService};
use notification_cell::Notifier;
use shared_models::error::AppError;

use crate::models::{AdminForm, AdminUser};
use crate::services::AdminService;

pub fn search_admins(admins: &[AdminUser], term: &str) -> Vec<AdminUser> {
    let term = term.trim().to_lowercase();
    admins
        .iter()
        .filter(|admin| {
            term.is_empty() || admin.name.to_lowercase().contains(&term) || admin.email.to_lowercase().contains(&term)
        })
        .cloned()
        .collect()
}

/// Admin accounts plus the hospitals a new admin can be bound to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersScreen {
    pub search: String,
    pub admins: Vec<AdminUser>,
    pub hospitals: Vec<Hospital>,
}

pub struct AdminUsersService {
    admin: AdminService,
    hospitals: HospitalService,
    notifier: Arc<dyn Notifier>,
}

impl AdminUsersService {
    pub fn new(ctx: &PortalContext) -> Self {
        Self {
            admin: AdminService::new(ctx),
            hospitals: HospitalService::new(ctx),
            notifier: ctx.notifier(),
        }
    }

    pub async fn screen(&self, search: String) -> Result<UsersScreen, AppError> {
        let (admins, hospitals) = futures::join!(self.admin.admins(), self.hospitals.list());

        let admins = admins.map_err(|e| {
            warn!("Admin list unavailable: {}", e);
            self.notifier.error("Failed to load admins");
            e
        })?;
        let hospitals = hospitals.unwrap_or_else(|e| {
            warn!("Hospital list unavailable: {}", e);
            Vec::new()
        });

        Ok(UsersScreen {
            admins: search_admins(&admins, &search),
            search,
            hospitals,
        })
    }

    pub async fn create_admin(&self, form: AdminForm) -> Result<(), AppError> {
        form.validate().into_result().map_err(|e| self.notifier.fail(e))?;

        self.admin
            .create_admin(form.to_payload(), form.hospital_id)
            .await
            .map_err(|e| {
                self.notifier
                    .fail(AppError::BadRequest(e.message_or("Failed to create admin")))
            })?;

        info!("Admin {} created", form.email.trim());
        self.notifier.success("Admin created successfully");
        Ok(())
    }
}
