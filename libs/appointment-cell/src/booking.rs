//! Patient booking wizard: area → hospital → doctor → details and slot.
//!
//! Going back only moves the step; selections made further along are kept
//! so advancing again restores them, unless the area they were found in
//! changed. Each action is accepted only on its own step. Slot lookups carry
//! a ticket like the location cascade does, so a late answer for an earlier
//! doctor or date is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use auth_cell::PortalContext;
use hospital_cell::{choose_district, choose_division, load_divisions, restore_area};
use hospital_cell::{AreaPreference, CascadeHost, Hospital, HospitalService, LocationCascade, LocationService};
use notification_cell::Notifier;
use shared_models::auth::UserProfile;
use shared_models::doctor::{Doctor, DoctorSlot};
use shared_models::error::AppError;
use shared_utils::storage::{get_json, keys, set_json, KeyValueStore};
use shared_utils::validation::ValidationErrors;

use crate::form::{check_date_and_time, check_patient_fields};
use crate::models::{wire_time, Appointment, AppointmentStatus};
use crate::services::AppointmentService;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WizardStep {
    #[default]
    AreaSelect,
    HospitalSelect,
    DoctorSelect,
    DetailsAndSlot,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        match self {
            WizardStep::AreaSelect => 1,
            WizardStep::HospitalSelect => 2,
            WizardStep::DoctorSelect => 3,
            WizardStep::DetailsAndSlot => 4,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            WizardStep::AreaSelect | WizardStep::HospitalSelect => WizardStep::AreaSelect,
            WizardStep::DoctorSelect => WizardStep::HospitalSelect,
            WizardStep::DetailsAndSlot => WizardStep::DoctorSelect,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingDetails {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_age: String,
    pub patient_gender: String,
    pub appointment_date: Option<NaiveDate>,
    /// `HH:MM`, usually a slot's start time.
    pub appointment_time: String,
    pub reason: String,
}

impl BookingDetails {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_patient_fields(
            &mut errors,
            &self.patient_name,
            &self.patient_email,
            &self.patient_phone,
            &self.patient_age,
            &self.patient_gender,
        );
        check_date_and_time(&mut errors, self.appointment_date, &self.appointment_time);
        errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTicket {
    serial: u64,
    pub doctor_id: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingWizard {
    pub step: WizardStep,
    pub locations: LocationCascade,
    pub hospitals: Vec<Hospital>,
    pub hospital: Option<Hospital>,
    pub doctors: Vec<Doctor>,
    pub doctor: Option<Doctor>,
    pub slots: Vec<DoctorSlot>,
    pub details: BookingDetails,
    #[serde(skip)]
    slot_serial: u64,
    /// Area the current hospital list was searched in.
    #[serde(skip)]
    searched_area: Option<AreaPreference>,
    #[serde(skip)]
    owner: Option<String>,
}

impl BookingWizard {
    /// Fresh wizard with the patient's identity filled in.
    pub fn for_patient(user: &UserProfile) -> Self {
        Self {
            details: BookingDetails {
                patient_name: user.name.clone(),
                patient_email: user.email.clone(),
                patient_phone: user.phone.clone().unwrap_or_default(),
                ..Default::default()
            },
            owner: Some(user.email.clone()),
            ..Default::default()
        }
    }

    pub fn step_number(&self) -> u8 {
        self.step.number()
    }

    pub fn expect_step(&self, step: WizardStep) -> Result<(), AppError> {
        if self.step == step {
            Ok(())
        } else {
            Err(AppError::StaleState(format!(
                "This action belongs to step {}, the booking is on step {}",
                step.number(),
                self.step.number()
            )))
        }
    }

    fn drop_choices(&mut self) {
        self.hospital = None;
        self.doctor = None;
        self.slots.clear();
        self.slot_serial += 1;
    }

    /// A new search area invalidates the hospitals found in the old one.
    pub fn area_changed(&mut self) {
        let area = self.locations.preference();
        if self.searched_area.is_some_and(|searched| searched != area) {
            self.hospitals.clear();
            self.searched_area = None;
            self.drop_choices();
            self.step = WizardStep::AreaSelect;
        }
    }

    pub fn hospitals_found(&mut self, hospitals: Vec<Hospital>) {
        let area = self.locations.preference();
        if self.searched_area != Some(area) {
            self.drop_choices();
        }
        self.searched_area = Some(area);
        self.hospitals = hospitals;
        self.step = WizardStep::HospitalSelect;
    }

    pub fn select_hospital(&mut self, id: i64) -> Result<(), AppError> {
        self.expect_step(WizardStep::HospitalSelect)?;
        let hospital = self
            .hospitals
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Please choose a hospital from the list".to_string()))?;
        if self.hospital.as_ref().map(|h| h.id) != Some(hospital.id) {
            self.drop_choices();
        }
        self.hospital = Some(hospital);
        Ok(())
    }

    pub fn doctors_loaded(&mut self, doctors: Vec<Doctor>) {
        self.doctors = doctors;
        self.step = WizardStep::DoctorSelect;
    }

    /// Moves to the details step; returns a slot lookup when a date is already set.
    pub fn select_doctor(&mut self, id: i64) -> Result<Option<SlotTicket>, AppError> {
        self.expect_step(WizardStep::DoctorSelect)?;
        let doctor = self
            .doctors
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Please choose a doctor from the list".to_string()))?;
        self.doctor = Some(doctor);
        self.step = WizardStep::DetailsAndSlot;
        Ok(self.request_slots())
    }

    /// Email stays the session's; a date change asks for that date's slots.
    pub fn set_details(&mut self, mut details: BookingDetails) -> Result<Option<SlotTicket>, AppError> {
        self.expect_step(WizardStep::DetailsAndSlot)?;
        details.patient_email = self.details.patient_email.clone();
        let date_changed = details.appointment_date != self.details.appointment_date;
        self.details = details;

        Ok(if date_changed { self.request_slots() } else { None })
    }

    fn request_slots(&mut self) -> Option<SlotTicket> {
        self.slot_serial += 1;
        let doctor_id = self.doctor.as_ref()?.id;
        let date = self.details.appointment_date?;
        Some(SlotTicket {
            serial: self.slot_serial,
            doctor_id,
            date,
        })
    }

    pub fn apply_slots(&mut self, ticket: SlotTicket, slots: Vec<DoctorSlot>) -> bool {
        if ticket.serial != self.slot_serial {
            return false;
        }
        self.slots = slots;
        true
    }

    pub fn slots_failed(&mut self, ticket: SlotTicket) {
        if ticket.serial == self.slot_serial {
            self.slots.clear();
        }
    }

    pub fn go_back(&mut self) {
        self.step = self.step.previous();
    }

    /// Back to the area step, dropping the hospital and doctor choices.
    pub fn change_area(&mut self) {
        self.step = WizardStep::AreaSelect;
        self.hospitals.clear();
        self.searched_area = None;
        self.drop_choices();
    }

    /// The appointment to send. Needs the details step, with a doctor and a
    /// hospital found in the area currently selected.
    pub fn booking(&self) -> Result<Appointment, AppError> {
        let doctor = self
            .doctor
            .as_ref()
            .ok_or_else(|| AppError::ValidationError("Please choose a doctor".to_string()))?;
        if self.step != WizardStep::DetailsAndSlot {
            return Err(AppError::ValidationError(
                "Please finish choosing a hospital and doctor".to_string(),
            ));
        }
        let hospital = self
            .hospital
            .as_ref()
            .filter(|_| self.searched_area == Some(self.locations.preference()))
            .ok_or_else(|| AppError::ValidationError("Please choose a hospital in the selected area".to_string()))?;
        self.details.validate().into_result()?;
        let appointment_date = self
            .details
            .appointment_date
            .ok_or_else(|| AppError::ValidationError("Please select a date".to_string()))?;

        let reason = self.details.reason.trim();
        Ok(Appointment {
            id: None,
            patient_name: self.details.patient_name.trim().to_string(),
            patient_email: self.details.patient_email.clone(),
            patient_phone: self.details.patient_phone.trim().to_string(),
            patient_age: Some(self.details.patient_age.trim().to_string()),
            patient_gender: Some(self.details.patient_gender.clone()),
            emergency_contact: None,
            doctor_id: doctor.id,
            doctor_name: None,
            doctor_specialty: None,
            appointment_date,
            appointment_time: wire_time(&self.details.appointment_time),
            status: AppointmentStatus::Pending,
            notes: None,
            patient_comment: None,
            reason: (!reason.is_empty()).then(|| reason.to_string()),
            previous_prescription: None,
            prescription: None,
            diagnosis: None,
            hospital_id: Some(hospital.id),
        })
    }

    /// Clears everything but the area once a booking went through.
    fn finish(&mut self, user: &UserProfile) {
        let locations = std::mem::take(&mut self.locations);
        *self = BookingWizard {
            locations,
            ..BookingWizard::for_patient(user)
        };
    }
}

/// Wizard state kept between the requests of the single portal session.
#[derive(Debug, Default)]
pub struct WizardState {
    wizard: Mutex<BookingWizard>,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BookingWizard> {
        self.wizard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on `user`'s wizard, starting a fresh one if someone else held
    /// it. Returns whether the wizard was started over.
    pub fn with<R>(&self, user: &UserProfile, f: impl FnOnce(&mut BookingWizard) -> R) -> (bool, R) {
        let mut wizard = self.lock();
        let fresh = wizard.owner.as_deref() != Some(user.email.as_str());
        if fresh {
            *wizard = BookingWizard::for_patient(user);
        }
        (fresh, f(&mut wizard))
    }

    pub fn snapshot(&self) -> BookingWizard {
        self.lock().clone()
    }
}

impl CascadeHost for WizardState {
    fn with_cascade<R>(&self, f: impl FnOnce(&mut LocationCascade) -> R) -> R {
        f(&mut self.lock().locations)
    }
}

pub struct BookingService {
    appointments: AppointmentService,
    hospitals: HospitalService,
    locations: LocationService,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn KeyValueStore>,
    user: UserProfile,
}

impl BookingService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            hospitals: HospitalService::new(ctx),
            locations: LocationService::new(ctx),
            notifier: ctx.notifier(),
            store: ctx.store().clone(),
            user,
        }
    }

    fn wizard<R>(&self, state: &WizardState, f: impl FnOnce(&mut BookingWizard) -> R) -> R {
        state.with(&self.user, f).1
    }

    fn snapshot(&self, state: &WizardState) -> BookingWizard {
        self.wizard(state, |w| w.clone())
    }

    /// Takes the wizard over for this user; true when it was started over.
    fn claim(&self, state: &WizardState) -> bool {
        state.with(&self.user, |_| ()).0
    }

    /// Opens the wizard, restoring the saved area the first time.
    pub async fn open(&self, state: &WizardState) -> Result<BookingWizard, AppError> {
        let fresh = self.claim(state);

        if state.with_cascade(|c| c.divisions.is_empty()) {
            load_divisions(state, &self.locations).await?;
        }
        if fresh {
            if let Some(preference) = get_json::<AreaPreference>(self.store.as_ref(), keys::AREA_PREFERENCE) {
                debug!("Restoring saved area {:?}", preference);
                restore_area(state, &self.locations, preference).await?;
            }
        }
        Ok(self.snapshot(state))
    }

    fn save_preference(&self, state: &WizardState) {
        let preference = state.with_cascade(|c| c.preference());
        if let Err(e) = set_json(self.store.as_ref(), keys::AREA_PREFERENCE, &preference) {
            warn!("Could not save area preference: {}", e);
        }
    }

    /// Area changes are accepted on any step; they send the wizard back to
    /// the area step once the searched area no longer matches.
    pub async fn choose_division(&self, state: &WizardState, id: Option<i64>) -> Result<BookingWizard, AppError> {
        self.claim(state);
        let applied = choose_division(state, &self.locations, id).await;
        self.area_changed(state);
        applied?;
        Ok(self.snapshot(state))
    }

    pub async fn choose_district(&self, state: &WizardState, id: Option<i64>) -> Result<BookingWizard, AppError> {
        self.claim(state);
        let applied = choose_district(state, &self.locations, id).await;
        self.area_changed(state);
        applied?;
        Ok(self.snapshot(state))
    }

    pub fn choose_upazila(&self, state: &WizardState, id: Option<i64>) -> BookingWizard {
        self.wizard(state, |w| w.locations.select_upazila(id));
        self.area_changed(state);
        self.snapshot(state)
    }

    fn area_changed(&self, state: &WizardState) {
        self.wizard(state, |w| w.area_changed());
        self.save_preference(state);
    }

    pub async fn search_hospitals(&self, state: &WizardState) -> Result<BookingWizard, AppError> {
        self.wizard(state, |w| w.expect_step(WizardStep::AreaSelect))
            .map_err(|e| self.notifier.fail(e))?;
        let Some(filter) = state.with_cascade(|c| c.area_filter()) else {
            return Err(self
                .notifier
                .fail(AppError::ValidationError("Please select a division".to_string())));
        };

        let hospitals = self.hospitals.by_area(&filter).await.map_err(|e| self.notifier.fail(e))?;
        debug!("{} hospitals in {}", hospitals.len(), filter.query_string());
        Ok(self.wizard(state, |w| {
            w.hospitals_found(hospitals);
            w.clone()
        }))
    }

    /// The doctor list is not narrowed to the chosen hospital; the API only
    /// offers the full list.
    pub async fn select_hospital(&self, state: &WizardState, id: i64) -> Result<BookingWizard, AppError> {
        self.wizard(state, |w| w.select_hospital(id)).map_err(|e| self.notifier.fail(e))?;

        let doctors = self.appointments.doctors().await.map_err(|e| {
            self.notifier.error("Failed to load doctors list");
            e
        })?;
        self.wizard(state, |w| -> Result<BookingWizard, AppError> {
            w.expect_step(WizardStep::HospitalSelect)?;
            w.doctors_loaded(doctors);
            Ok(w.clone())
        })
        .map_err(|e| self.notifier.fail(e))
    }

    pub async fn select_doctor(&self, state: &WizardState, id: i64) -> Result<BookingWizard, AppError> {
        let ticket = self.wizard(state, |w| w.select_doctor(id)).map_err(|e| self.notifier.fail(e))?;
        self.load_slots(state, ticket).await;
        Ok(self.snapshot(state))
    }

    pub async fn set_details(&self, state: &WizardState, details: BookingDetails) -> Result<BookingWizard, AppError> {
        let ticket = self.wizard(state, |w| w.set_details(details)).map_err(|e| self.notifier.fail(e))?;
        self.load_slots(state, ticket).await;
        Ok(self.snapshot(state))
    }

    async fn load_slots(&self, state: &WizardState, ticket: Option<SlotTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        match self.appointments.doctor_slots(ticket.doctor_id, ticket.date).await {
            Ok(slots) => {
                if !self.wizard(state, |w| w.apply_slots(ticket, slots)) {
                    debug!("Dropped stale slots for doctor {} on {}", ticket.doctor_id, ticket.date);
                }
            }
            Err(e) => {
                warn!("Slots for doctor {} on {} unavailable: {}", ticket.doctor_id, ticket.date, e);
                self.wizard(state, |w| w.slots_failed(ticket));
            }
        }
    }

    pub fn go_back(&self, state: &WizardState) -> BookingWizard {
        self.wizard(state, |w| {
            w.go_back();
            w.clone()
        })
    }

    pub fn change_area(&self, state: &WizardState) -> BookingWizard {
        self.wizard(state, |w| {
            w.change_area();
            w.clone()
        })
    }

    pub async fn submit(&self, state: &WizardState) -> Result<(), AppError> {
        let appointment = self.wizard(state, |w| w.booking()).map_err(|e| self.notifier.fail(e))?;

        self.appointments.create(&appointment).await.map_err(|e| {
            let message = format!("Error booking appointment: {}", e.message_or("Unknown error"));
            self.notifier.fail(AppError::BadRequest(message))
        })?;

        info!(
            "{} booked doctor {} on {} at {}",
            self.user.email, appointment.doctor_id, appointment.appointment_date, appointment.appointment_time
        );
        self.notifier.success("Appointment booked successfully!");
        self.wizard(state, |w| w.finish(&self.user));
        Ok(())
    }
}
