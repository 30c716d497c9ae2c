//! Appointment list screen: search, status and location filters over the
//! collection fetched once per load, with 1-indexed pagination.
//!
//! The role checks here only decide what the screen offers; the clinic API
//! remains the authority on who may change an appointment.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use auth_cell::PortalContext;
use hospital_cell::{choose_district, choose_division, load_divisions, CascadeHost, LocationCascade};
use hospital_cell::{AreaPreference, Hospital, HospitalService, LocationService};
use notification_cell::Notifier;
use shared_models::auth::{Role, UserProfile};
use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentStatus, NoteUpdate};
use crate::services::AppointmentService;

pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

pub fn can_delete(role: Role) -> bool {
    role.is_admin()
}

pub fn can_change_status(role: Role) -> bool {
    role.is_admin() || role == Role::Doctor
}

pub fn can_add_notes(role: Role) -> bool {
    role == Role::Doctor
}

// ==============================================================================
// FILTER ENGINE
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub search: String,
    /// `None` shows every status.
    pub status: Option<AppointmentStatus>,
    pub hospital_id: Option<i64>,
    pub area: AreaPreference,
}

impl ListFilter {
    pub fn matches_search(&self, apt: &Appointment) -> bool {
        let query = self.search.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        apt.patient_name.to_lowercase().contains(&query)
            || apt
                .doctor_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&query))
            || apt.patient_email.to_lowercase().contains(&query)
    }

    pub fn matches_status(&self, apt: &Appointment) -> bool {
        self.status.map_or(true, |status| apt.status == status)
    }

    pub fn location_active(&self) -> bool {
        self.hospital_id.is_some() || self.area.division_id.is_some()
    }

    /// Location filters go through the appointment's hospital; an
    /// appointment whose hospital is unknown is hidden while one is active.
    pub fn matches_location(&self, apt: &Appointment, hospitals: &HashMap<i64, Hospital>) -> bool {
        if !self.location_active() {
            return true;
        }
        let Some(hospital) = apt.hospital_id.and_then(|id| hospitals.get(&id)) else {
            return false;
        };

        self.hospital_id.map_or(true, |id| id == hospital.id) && hospital.in_area(&self.area)
    }

    pub fn matches(&self, apt: &Appointment, hospitals: &HashMap<i64, Hospital>) -> bool {
        self.matches_search(apt) && self.matches_status(apt) && self.matches_location(apt, hospitals)
    }
}

#[derive(Debug, Clone)]
pub struct AppointmentList {
    appointments: Vec<Appointment>,
    hospitals: HashMap<i64, Hospital>,
    filter: ListFilter,
    filtered: Vec<Appointment>,
    page: usize,
    page_size: usize,
}

impl Default for AppointmentList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl AppointmentList {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        let mut list = Self {
            appointments,
            hospitals: HashMap::new(),
            filter: ListFilter::default(),
            filtered: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        };
        list.apply_filters();
        list
    }

    /// Swaps in a freshly fetched collection, keeping the current filters.
    pub fn replace(&mut self, appointments: Vec<Appointment>) {
        self.appointments = appointments;
        self.apply_filters();
    }

    pub fn set_hospitals(&mut self, hospitals: Vec<Hospital>) {
        self.hospitals = hospitals.into_iter().map(|h| (h.id, h)).collect();
        self.apply_filters();
    }

    pub fn hospitals(&self) -> Vec<Hospital> {
        let mut hospitals: Vec<Hospital> = self.hospitals.values().cloned().collect();
        hospitals.sort_by(|a, b| a.name.cmp(&b.name));
        hospitals
    }

    /// Recomputes the visible subset and returns to the first page.
    pub fn apply_filters(&mut self) {
        self.filtered = self
            .appointments
            .iter()
            .filter(|apt| self.filter.matches(apt, &self.hospitals))
            .cloned()
            .collect();
        self.page = 1;
    }

    pub fn filter(&self) -> &ListFilter {
        &self.filter
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.apply_filters();
    }

    pub fn set_status(&mut self, status: Option<AppointmentStatus>) {
        self.filter.status = status;
        self.apply_filters();
    }

    pub fn set_hospital(&mut self, hospital_id: Option<i64>) {
        self.filter.hospital_id = hospital_id;
        self.apply_filters();
    }

    pub fn set_area(&mut self, area: AreaPreference) {
        self.filter.area = area;
        self.apply_filters();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), AppError> {
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(AppError::BadRequest(format!(
                "Page size must be one of {:?}",
                PAGE_SIZE_OPTIONS
            )));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filtered(&self) -> &[Appointment] {
        &self.filtered
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// At most `page_size` rows; empty past the last page.
    pub fn paginated(&self) -> &[Appointment] {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= self.filtered.len() {
            return &[];
        }
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }

    pub fn find(&self, id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|apt| apt.id == Some(id))
    }

    pub fn remove(&mut self, id: i64) {
        self.appointments.retain(|apt| apt.id != Some(id));
        self.apply_filters();
    }

    /// Updates a row in place without leaving the current page.
    pub fn set_row_status(&mut self, id: i64, status: AppointmentStatus) {
        for apt in self
            .appointments
            .iter_mut()
            .chain(self.filtered.iter_mut())
            .filter(|apt| apt.id == Some(id))
        {
            apt.status = status;
        }
    }

    pub fn upsert_row(&mut self, updated: Appointment) {
        for apt in self
            .appointments
            .iter_mut()
            .chain(self.filtered.iter_mut())
            .filter(|apt| apt.id.is_some() && apt.id == updated.id)
        {
            *apt = updated.clone();
        }
    }
}

// ==============================================================================
// SCREEN STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPermissions {
    pub can_delete: bool,
    pub can_change_status: bool,
    pub can_add_notes: bool,
    pub can_filter_by_location: bool,
}

impl ListPermissions {
    pub fn for_role(role: Role) -> Self {
        Self {
            can_delete: can_delete(role),
            can_change_status: can_change_status(role),
            can_add_notes: can_add_notes(role),
            can_filter_by_location: role == Role::SuperAdmin,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub appointments: Vec<Appointment>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub page_size_options: [usize; 4],
    pub filter: ListFilter,
    pub permissions: ListPermissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations: Option<LocationCascade>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hospitals: Vec<Hospital>,
}

#[derive(Debug, Default)]
pub struct ListScreen {
    owner: Option<String>,
    pub list: AppointmentList,
    pub cascade: LocationCascade,
}

impl ListScreen {
    pub fn view(&self, role: Role) -> ListView {
        let permissions = ListPermissions::for_role(role);
        ListView {
            appointments: self.list.paginated().to_vec(),
            total: self.list.filtered().len(),
            page: self.list.page(),
            page_size: self.list.page_size(),
            total_pages: self.list.total_pages(),
            page_size_options: PAGE_SIZE_OPTIONS,
            filter: self.list.filter().clone(),
            permissions,
            locations: permissions.can_filter_by_location.then(|| self.cascade.clone()),
            hospitals: if permissions.can_filter_by_location {
                self.list.hospitals()
            } else {
                Vec::new()
            },
        }
    }

    /// Starts over when a different user opens the screen.
    fn claim(&mut self, email: &str) {
        if self.owner.as_deref() != Some(email) {
            *self = ListScreen {
                owner: Some(email.to_string()),
                ..Default::default()
            };
        }
    }
}

/// List screen state shared across requests of the single portal session.
#[derive(Debug, Default)]
pub struct ListState {
    screen: Mutex<ListScreen>,
}

impl ListState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ListScreen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on `owner`'s screen, starting over if someone else held it.
    pub fn with<R>(&self, owner: &str, f: impl FnOnce(&mut ListScreen) -> R) -> R {
        let mut screen = self.lock();
        screen.claim(owner);
        f(&mut screen)
    }
}

impl CascadeHost for ListState {
    fn with_cascade<R>(&self, f: impl FnOnce(&mut LocationCascade) -> R) -> R {
        f(&mut self.lock().cascade)
    }
}

/// Reads `null` as "clear" and a missing field as "leave unchanged".
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUpdate {
    #[serde(default)]
    pub search: Option<String>,
    /// `"all"` or a status name.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default, deserialize_with = "explicit")]
    pub hospital_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub division_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub district_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "explicit")]
    pub upazila_id: Option<Option<i64>>,
}

impl FilterUpdate {
    fn touches_location(&self) -> bool {
        self.hospital_id.is_some() || self.division_id.is_some() || self.district_id.is_some() || self.upazila_id.is_some()
    }
}

pub fn parse_status_filter(value: &str) -> Result<Option<AppointmentStatus>, AppError> {
    match value.trim() {
        "" | "all" => Ok(None),
        other => other.parse().map(Some).map_err(AppError::BadRequest),
    }
}

// ==============================================================================
// SCREEN CONTROLLER
// ==============================================================================

pub struct ListService {
    appointments: AppointmentService,
    hospitals: HospitalService,
    locations: LocationService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl ListService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            hospitals: HospitalService::new(ctx),
            locations: LocationService::new(ctx),
            notifier: ctx.notifier(),
            user,
        }
    }

    fn is_super_admin(&self) -> bool {
        self.user.role == Role::SuperAdmin
    }

    fn screen<R>(&self, state: &ListState, f: impl FnOnce(&mut ListScreen) -> R) -> R {
        state.with(&self.user.email, f)
    }

    pub async fn load(&self, state: &ListState) -> Result<ListView, AppError> {
        // claim before the cascade is inspected below
        self.screen(state, |_| ());
        let appointments = self.appointments.list().await.map_err(|e| {
            self.notifier.error("Failed to load appointments");
            e
        })?;

        if self.is_super_admin() {
            match self.hospitals.list().await {
                Ok(hospitals) => self.screen(state, |s| s.list.set_hospitals(hospitals)),
                Err(e) => warn!("Hospital filter data unavailable: {}", e),
            }
            if state.with_cascade(|c| c.divisions.is_empty()) {
                if let Err(e) = load_divisions(state, &self.locations).await {
                    warn!("Division filter data unavailable: {}", e);
                }
            }
        }

        debug!("Loaded {} appointments for {}", appointments.len(), self.user.email);
        Ok(self.screen(state, |s| {
            s.list.replace(appointments);
            s.view(self.user.role)
        }))
    }

    pub fn view(&self, state: &ListState) -> ListView {
        self.screen(state, |s| s.view(self.user.role))
    }

    pub async fn update_filter(&self, state: &ListState, update: FilterUpdate) -> Result<ListView, AppError> {
        let status = update.status.as_deref().map(parse_status_filter).transpose()?;

        self.screen(state, |s| -> Result<(), AppError> {
            if let Some(page_size) = update.page_size {
                s.list.set_page_size(page_size)?;
            }
            if let Some(search) = &update.search {
                s.list.set_search(search.clone());
            }
            if let Some(status) = status {
                s.list.set_status(status);
            }
            Ok(())
        })?;

        if update.touches_location() {
            if self.is_super_admin() {
                self.update_location(state, &update).await?;
            } else {
                warn!("{} tried to filter appointments by location", self.user.email);
                self.notifier.info("Location filters are only available to super admins");
            }
        }

        Ok(self.view(state))
    }

    async fn update_location(&self, state: &ListState, update: &FilterUpdate) -> Result<(), AppError> {
        if let Some(hospital_id) = update.hospital_id {
            self.screen(state, |s| s.list.set_hospital(hospital_id));
        }
        if let Some(division_id) = update.division_id {
            let pending = choose_division(state, &self.locations, division_id);
            self.screen(state, |s| {
                let area = AreaPreference { division_id, ..Default::default() };
                s.list.set_area(area);
            });
            pending.await?;
        }
        if let Some(district_id) = update.district_id {
            let pending = choose_district(state, &self.locations, district_id);
            self.screen(state, |s| {
                let area = AreaPreference { district_id, upazila_id: None, ..s.list.filter().area };
                s.list.set_area(area);
            });
            pending.await?;
        }
        if let Some(upazila_id) = update.upazila_id {
            self.screen(state, |s| {
                s.cascade.select_upazila(upazila_id);
                let area = AreaPreference { upazila_id, ..s.list.filter().area };
                s.list.set_area(area);
            });
        }
        Ok(())
    }

    pub fn go_to_page(&self, state: &ListState, page: usize) -> ListView {
        self.screen(state, |s| {
            s.list.go_to_page(page);
            s.view(self.user.role)
        })
    }

    fn reject(&self, message: &str) -> AppError {
        warn!("{} ({}) was refused: {}", self.user.email, self.user.role, message);
        self.notifier.fail(AppError::Forbidden(message.to_string()))
    }

    pub async fn delete(&self, state: &ListState, id: i64) -> Result<ListView, AppError> {
        if !can_delete(self.user.role) {
            return Err(self.reject("Only admin can delete appointments"));
        }

        self.appointments.delete(id).await.map_err(|e| {
            self.notifier.error("Delete failed");
            e
        })?;

        self.notifier.success("Appointment deleted successfully");
        Ok(self.screen(state, |s| {
            s.list.remove(id);
            s.view(self.user.role)
        }))
    }

    pub async fn change_status(
        &self,
        state: &ListState,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<ListView, AppError> {
        if !can_change_status(self.user.role) {
            return Err(self.reject("You are not authorized to change status"));
        }

        self.appointments.update_status(id, status).await.map_err(|e| {
            self.notifier.error("Status update failed");
            e
        })?;

        self.notifier.success(&format!("Appointment {}!", status.outcome()));
        Ok(self.screen(state, |s| {
            s.list.set_row_status(id, status);
            s.view(self.user.role)
        }))
    }

    /// Doctor advice is saved by sending the whole appointment back.
    pub async fn save_note(&self, state: &ListState, id: i64, note: NoteUpdate) -> Result<ListView, AppError> {
        if !can_add_notes(self.user.role) {
            return Err(self.reject("Only doctors can add advice/notes"));
        }

        let cached = self.screen(state, |s| s.list.find(id).cloned());
        let mut appointment = match cached {
            Some(apt) => apt,
            None => self.appointments.get(id).await?,
        };
        if let Some(notes) = note.notes {
            appointment.notes = Some(notes);
        }
        if let Some(diagnosis) = note.diagnosis {
            appointment.diagnosis = Some(diagnosis);
        }
        if let Some(prescription) = note.prescription {
            appointment.prescription = Some(prescription);
        }

        self.appointments.update(id, &appointment).await.map_err(|e| {
            self.notifier.error("Failed to save note");
            e
        })?;

        self.notifier.success("Note saved successfully");
        Ok(self.screen(state, |s| {
            s.list.upsert_row(appointment);
            s.view(self.user.role)
        }))
    }
}
