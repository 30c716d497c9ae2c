use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Complete,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Complete => "complete",
        }
    }

    /// Past-tense wording used in toasts.
    pub fn outcome(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Complete => "Completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown appointment status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub patient_name: String,
    pub patient_email: String,
    #[serde(default)]
    pub patient_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    pub doctor_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_specialty: Option<String>,
    pub appointment_date: NaiveDate,
    /// Wire format `HH:MM:SS`.
    pub appointment_time: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prescription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<i64>,
}

impl Appointment {
    pub fn display_time(&self) -> &str {
        display_time(&self.appointment_time)
    }
}

/// `HH:MM:SS` → `HH:MM`. Shorter values pass through.
pub fn display_time(wire: &str) -> &str {
    wire.get(..5).unwrap_or(wire)
}

/// `HH:MM` → `HH:MM:SS`. Values that already carry seconds pass through.
pub fn wire_time(display: &str) -> String {
    let display = display.trim();
    if display.len() == 5 {
        format!("{}:00", display)
    } else {
        display.to_string()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NoteUpdate {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
}

/// Choice in a select control; `null` clears it.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub page: usize,
}
