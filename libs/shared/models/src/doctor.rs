use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Doctor record as listed by `GET /api/doctors`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Doctor {
    /// Doctors without an explicit flag are bookable.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// Fields an admin may change on an existing doctor. No password.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub specialty: String,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub qualifications: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub doctor_id: i64,
    pub available_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub is_booked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_active_flag_means_active() {
        let doctor: Doctor = serde_json::from_value(json!({ "id": 1, "name": "Dr. Rahman" })).unwrap();
        assert!(doctor.is_active());

        let doctor: Doctor = serde_json::from_value(json!({ "id": 2, "name": "Dr. Sen", "active": false })).unwrap();
        assert!(!doctor.is_active());
    }

    #[test]
    fn slot_uses_wire_field_names() {
        let slot = DoctorSlot {
            id: None,
            doctor_id: 12,
            available_date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            start_time: "09:00".to_string(),
            end_time: "09:30".to_string(),
            is_booked: false,
        };

        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!({
                "doctorId": 12,
                "availableDate": "2025-03-03",
                "startTime": "09:00",
                "endTime": "09:30",
                "isBooked": false
            })
        );
    }
}
