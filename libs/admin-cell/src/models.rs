use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use appointment_cell::ChartSeries;
use shared_models::doctor::{Doctor, DoctorUpdate};
use shared_utils::validation::{has_min_chars, is_valid_email, ValidationErrors};

pub const DOCTOR_PAGE_SIZES: [usize; 4] = [5, 10, 20, 50];
pub const DEFAULT_DOCTOR_PAGE_SIZE: usize = 10;

pub const SPECIALTIES: [&str; 20] = [
    "Cardiologist",
    "Dermatologist",
    "Pediatrician",
    "Neurologist",
    "Orthopedic",
    "Gynecologist",
    "Psychiatrist",
    "General Physician",
    "ENT Specialist",
    "Ophthalmologist",
    "Urologist",
    "Gastroenterologist",
    "Pulmonologist",
    "Endocrinologist",
    "Nephrologist",
    "Oncologist",
    "Radiologist",
    "Anesthesiologist",
    "Pathologist",
    "Dentist",
];

// ==============================================================================
// DOCTORS
// ==============================================================================

/// Add/edit doctor form. Editing never sends the password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DoctorForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub specialty: String,
    pub phone: String,
    pub consultation_fee: Option<f64>,
    pub qualifications: Option<String>,
}

impl DoctorForm {
    pub fn from_doctor(doctor: &Doctor) -> Self {
        Self {
            name: doctor.name.clone(),
            email: doctor.email.clone(),
            password: String::new(),
            specialty: doctor.specialty.clone(),
            phone: doctor.phone.clone().unwrap_or_default(),
            consultation_fee: doctor.consultation_fee,
            qualifications: doctor.qualifications.clone(),
        }
    }

    pub fn validate(&self, editing: bool) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "Name is required");
        errors.check(is_valid_email(self.email.trim()), "email", "Please enter a valid email");
        if !editing {
            errors.check(has_min_chars(&self.password, 6), "password", "Password must be at least 6 characters");
        }
        errors.check(!self.specialty.trim().is_empty(), "specialty", "Specialty is required");
        errors.check(!self.phone.trim().is_empty(), "phone", "Phone is required");
        errors
    }

    /// Body for `POST /api/admin/add-doctor`.
    pub fn to_new_doctor(&self) -> Value {
        json!({
            "name": self.name.trim(),
            "email": self.email.trim(),
            "password": self.password,
            "role": "DOCTOR",
            "phone": self.phone.trim(),
            "specialty": self.specialty.trim(),
        })
    }

    pub fn to_update(&self) -> DoctorUpdate {
        DoctorUpdate {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            specialty: self.specialty.trim().to_string(),
            consultation_fee: self.consultation_fee,
            qualifications: self
                .qualifications
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusToggle {
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DirectoryQuery {
    pub search: String,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

// ==============================================================================
// ADMIN USERS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: String,
    pub hospital_id: Option<i64>,
}

impl AdminForm {
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "Name is required");
        errors.check(is_valid_email(self.email.trim()), "email", "Please enter a valid email");
        errors.check(has_min_chars(&self.password, 6), "password", "Password must be at least 6 characters");
        errors.check(!self.phone.trim().is_empty(), "phone", "Phone is required");
        errors
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "name": self.name.trim(),
            "email": self.email.trim(),
            "password": self.password,
            "phone": self.phone.trim(),
            "hospitalId": self.hospital_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub search: String,
}

// ==============================================================================
// ANALYTICS
// ==============================================================================

/// `GET /api/admin/analytics`. Maps are ordered so chart labels are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Analytics {
    pub hospitals_by_division: BTreeMap<String, u64>,
    pub doctors_by_specialty: BTreeMap<String, u64>,
    pub users_by_role: BTreeMap<String, u64>,
}

fn series(counts: &BTreeMap<String, u64>) -> ChartSeries {
    ChartSeries {
        labels: counts.keys().cloned().collect(),
        data: counts.values().copied().collect(),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsCharts {
    pub hospitals: ChartSeries,
    pub doctors: ChartSeries,
    pub users: ChartSeries,
}

impl From<&Analytics> for AnalyticsCharts {
    fn from(analytics: &Analytics) -> Self {
        Self {
            hospitals: series(&analytics.hospitals_by_division),
            doctors: series(&analytics.doctors_by_specialty),
            users: series(&analytics.users_by_role),
        }
    }
}
