use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use auth_cell::PortalContext;
use notification_cell::Notifier;
use shared_models::auth::{Role, UserProfile};
use shared_models::doctor::Doctor;
use shared_models::error::AppError;
use shared_utils::validation::{has_min_chars, is_numeric, is_valid_contact_phone, is_valid_email, ValidationErrors};

use crate::models::{display_time, wire_time, Appointment, AppointmentStatus};
use crate::services::AppointmentService;

pub mod fields {
    pub const PATIENT_NAME: &str = "patientName";
    pub const PATIENT_EMAIL: &str = "patientEmail";
    pub const PATIENT_PHONE: &str = "patientPhone";
    pub const PATIENT_AGE: &str = "patientAge";
    pub const PATIENT_GENDER: &str = "patientGender";
    pub const EMERGENCY_CONTACT: &str = "emergencyContact";
    pub const DOCTOR_ID: &str = "doctorId";
    pub const APPOINTMENT_DATE: &str = "appointmentDate";
    pub const APPOINTMENT_TIME: &str = "appointmentTime";
    pub const STATUS: &str = "status";
    pub const NOTES: &str = "notes";
}

/// Fields the role may not change. Locked fields keep the stored (or
/// prefilled) value whatever the submitted form says.
pub fn field_locks(role: Role, editing: bool) -> Vec<&'static str> {
    use fields::*;

    match (editing, role) {
        (true, Role::Patient) => vec![PATIENT_EMAIL, STATUS, DOCTOR_ID, APPOINTMENT_DATE, APPOINTMENT_TIME, NOTES],
        (true, Role::Admin) | (true, Role::Doctor) => {
            let mut locked = vec![
                PATIENT_NAME,
                PATIENT_EMAIL,
                PATIENT_PHONE,
                PATIENT_AGE,
                PATIENT_GENDER,
                EMERGENCY_CONTACT,
            ];
            if role == Role::Doctor {
                locked.push(DOCTOR_ID);
            }
            locked
        }
        (false, Role::Patient) => vec![PATIENT_EMAIL, STATUS],
        _ => Vec::new(),
    }
}

pub(crate) fn check_patient_fields(
    errors: &mut ValidationErrors,
    name: &str,
    email: &str,
    phone: &str,
    age: &str,
    gender: &str,
) {
    errors.check(has_min_chars(name, 2), fields::PATIENT_NAME, "Name must be at least 2 characters");
    errors.check(is_valid_email(email.trim()), fields::PATIENT_EMAIL, "Please enter a valid email");
    errors.check(is_valid_contact_phone(phone.trim()), fields::PATIENT_PHONE, "Phone must be 10-15 digits");
    errors.check(is_numeric(age.trim()), fields::PATIENT_AGE, "Age must be a number");
    errors.check(!gender.trim().is_empty(), fields::PATIENT_GENDER, "Please select a gender");
}

pub(crate) fn check_date_and_time(errors: &mut ValidationErrors, date: Option<NaiveDate>, time: &str) {
    errors.check(date.is_some(), fields::APPOINTMENT_DATE, "Please select a date");
    errors.check(parse_form_time(time).is_some(), fields::APPOINTMENT_TIME, "Please select a time");
}

/// Accepts `HH:MM` or a full `HH:MM:SS`.
pub(crate) fn parse_form_time(time: &str) -> Option<NaiveTime> {
    let time = time.trim();
    NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentForm {
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: String,
    pub patient_age: String,
    pub patient_gender: String,
    pub emergency_contact: String,
    pub doctor_id: Option<i64>,
    pub appointment_date: Option<NaiveDate>,
    /// Display format `HH:MM`.
    pub appointment_time: String,
    pub status: AppointmentStatus,
    pub notes: String,
    pub reason: String,
}

impl AppointmentForm {
    pub fn from_appointment(apt: &Appointment) -> Self {
        Self {
            patient_name: apt.patient_name.clone(),
            patient_email: apt.patient_email.clone(),
            patient_phone: apt.patient_phone.clone(),
            patient_age: apt.patient_age.clone().unwrap_or_default(),
            patient_gender: apt.patient_gender.clone().unwrap_or_default(),
            emergency_contact: apt.emergency_contact.clone().unwrap_or_default(),
            doctor_id: Some(apt.doctor_id),
            appointment_date: Some(apt.appointment_date),
            appointment_time: display_time(&apt.appointment_time).to_string(),
            status: apt.status,
            notes: apt.notes.clone().unwrap_or_default(),
            reason: apt.reason.clone().unwrap_or_default(),
        }
    }

    /// Blank form a patient starts from: identity from the profile, pending.
    pub fn for_patient(user: &UserProfile) -> Self {
        Self {
            patient_name: user.name.clone(),
            patient_email: user.email.clone(),
            patient_phone: user.phone.clone().unwrap_or_default(),
            status: AppointmentStatus::Pending,
            ..Default::default()
        }
    }

    /// Copies every field listed in `locked` from `source`.
    pub fn keep_locked(mut self, source: &AppointmentForm, locked: &[&str]) -> Self {
        use fields::*;

        for field in locked {
            match *field {
                PATIENT_NAME => self.patient_name = source.patient_name.clone(),
                PATIENT_EMAIL => self.patient_email = source.patient_email.clone(),
                PATIENT_PHONE => self.patient_phone = source.patient_phone.clone(),
                PATIENT_AGE => self.patient_age = source.patient_age.clone(),
                PATIENT_GENDER => self.patient_gender = source.patient_gender.clone(),
                EMERGENCY_CONTACT => self.emergency_contact = source.emergency_contact.clone(),
                DOCTOR_ID => self.doctor_id = source.doctor_id,
                APPOINTMENT_DATE => self.appointment_date = source.appointment_date,
                APPOINTMENT_TIME => self.appointment_time = source.appointment_time.clone(),
                STATUS => self.status = source.status,
                NOTES => self.notes = source.notes.clone(),
                other => warn!("Unknown locked field {}", other),
            }
        }
        self
    }

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
        errors.check(self.doctor_id.is_some(), fields::DOCTOR_ID, "Please select a doctor");
        check_date_and_time(&mut errors, self.appointment_date, &self.appointment_time);
        errors
    }

    /// Wire appointment for a validated form. Fields the form does not show
    /// are carried over from `stored` when editing.
    pub fn to_appointment(&self, stored: Option<&Appointment>) -> Result<Appointment, AppError> {
        self.validate().into_result()?;
        let (Some(doctor_id), Some(appointment_date)) = (self.doctor_id, self.appointment_date) else {
            return Err(AppError::ValidationError("Doctor and date are required".to_string()));
        };

        let optional = |value: &str| {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        Ok(Appointment {
            id: stored.and_then(|apt| apt.id),
            patient_name: self.patient_name.trim().to_string(),
            patient_email: self.patient_email.trim().to_string(),
            patient_phone: self.patient_phone.trim().to_string(),
            patient_age: optional(&self.patient_age),
            patient_gender: optional(&self.patient_gender),
            emergency_contact: optional(&self.emergency_contact),
            doctor_id,
            doctor_name: None,
            doctor_specialty: None,
            appointment_date,
            appointment_time: wire_time(&self.appointment_time),
            status: self.status,
            notes: optional(&self.notes),
            patient_comment: stored.and_then(|apt| apt.patient_comment.clone()),
            reason: optional(&self.reason),
            previous_prescription: stored.and_then(|apt| apt.previous_prescription.clone()),
            prescription: stored.and_then(|apt| apt.prescription.clone()),
            diagnosis: stored.and_then(|apt| apt.diagnosis.clone()),
            hospital_id: stored.and_then(|apt| apt.hospital_id),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub is_edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub form: AppointmentForm,
    pub locked: Vec<&'static str>,
    pub doctors: Vec<Doctor>,
    pub statuses: [AppointmentStatus; 4],
    pub min_date: NaiveDate,
}

/// Doctors that can take appointments; a missing `active` flag counts as active.
pub fn active_doctors(doctors: Vec<Doctor>) -> Vec<Doctor> {
    doctors.into_iter().filter(Doctor::is_active).collect()
}

pub struct FormService {
    appointments: AppointmentService,
    notifier: Arc<dyn Notifier>,
    user: UserProfile,
}

impl FormService {
    pub fn new(ctx: &PortalContext, user: UserProfile) -> Self {
        Self {
            appointments: AppointmentService::new(ctx),
            notifier: ctx.notifier(),
            user,
        }
    }

    async fn doctors(&self) -> Vec<Doctor> {
        match self.appointments.doctors().await {
            Ok(doctors) => active_doctors(doctors),
            Err(e) => {
                warn!("Doctor list unavailable: {}", e);
                self.notifier.error("Failed to load doctors list");
                Vec::new()
            }
        }
    }

    fn view(&self, id: Option<i64>, form: AppointmentForm, doctors: Vec<Doctor>) -> FormView {
        FormView {
            is_edit: id.is_some(),
            id,
            form,
            locked: field_locks(self.user.role, id.is_some()),
            doctors,
            statuses: AppointmentStatus::ALL,
            min_date: chrono::Local::now().date_naive(),
        }
    }

    fn blank_form(&self) -> AppointmentForm {
        match self.user.role {
            Role::Patient => AppointmentForm::for_patient(&self.user),
            _ => AppointmentForm::default(),
        }
    }

    pub async fn new_form(&self) -> FormView {
        let doctors = self.doctors().await;
        self.view(None, self.blank_form(), doctors)
    }

    async fn stored(&self, id: i64) -> Result<Appointment, AppError> {
        self.appointments.get(id).await.map_err(|e| {
            warn!("Appointment {} could not be loaded: {}", id, e);
            self.notifier.fail(AppError::NotFound("Appointment not found".to_string()))
        })
    }

    pub async fn edit_form(&self, id: i64) -> Result<FormView, AppError> {
        let doctors = self.doctors().await;
        let stored = self.stored(id).await?;
        Ok(self.view(Some(id), AppointmentForm::from_appointment(&stored), doctors))
    }

    /// Creates when `id` is `None`, updates otherwise.
    pub async fn submit(&self, id: Option<i64>, form: AppointmentForm) -> Result<(), AppError> {
        let locked = field_locks(self.user.role, id.is_some());
        let stored = match id {
            Some(id) => Some(self.stored(id).await?),
            None => None,
        };
        let source = match &stored {
            Some(apt) => AppointmentForm::from_appointment(apt),
            None => self.blank_form(),
        };

        let form = form.keep_locked(&source, &locked);
        let appointment = form
            .to_appointment(stored.as_ref())
            .map_err(|e| self.notifier.fail(e))?;

        let saved = match id {
            Some(id) => self.appointments.update(id, &appointment).await,
            None => self.appointments.create(&appointment).await,
        };
        saved.map_err(|e| {
            self.notifier
                .fail(AppError::BadRequest(e.message_or("Failed to save appointment. Please try again.")))
        })?;

        info!("{} saved appointment for {}", self.user.email, appointment.patient_email);
        self.notifier.success(if id.is_some() {
            "Appointment updated successfully!"
        } else {
            "Appointment created successfully!"
        });
        Ok(())
    }
}
