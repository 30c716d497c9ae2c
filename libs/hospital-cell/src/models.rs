use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use shared_utils::validation::{is_valid_email, ValidationErrors};

// ==============================================================================
// LOCATIONS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i64,
    pub name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_bn: Option<String>,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct District {
    pub id: i64,
    pub division_id: i64,
    pub name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_bn: Option<String>,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Upazila {
    pub id: i64,
    pub district_id: i64,
    pub name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_bn: Option<String>,
    #[serde(default)]
    pub code: String,
}

/// A location nested inside a hospital record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
}

/// Saved division/district/upazila choice, kept apart from the session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AreaPreference {
    pub division_id: Option<i64>,
    pub district_id: Option<i64>,
    pub upazila_id: Option<i64>,
}

/// Query for `GET /api/hospitals/by-area`. The division is mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaFilter {
    pub division_id: i64,
    pub district_id: Option<i64>,
    pub upazila_id: Option<i64>,
}

impl AreaFilter {
    pub fn query_string(&self) -> String {
        let mut query = format!("divisionId={}", self.division_id);
        if let Some(district_id) = self.district_id {
            query.push_str(&format!("&districtId={}", district_id));
        }
        if let Some(upazila_id) = self.upazila_id {
            query.push_str(&format!("&upazilaId={}", upazila_id));
        }
        query
    }
}

// ==============================================================================
// HOSPITALS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upazila_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<LocationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<LocationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upazila: Option<LocationRef>,
    #[serde(default)]
    pub phone_primary: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Hospital {
    // The API sends either the nested object or the flat id depending on the endpoint.

    pub fn division_key(&self) -> Option<i64> {
        self.division.as_ref().map(|d| d.id).or(self.division_id)
    }

    pub fn district_key(&self) -> Option<i64> {
        self.district.as_ref().map(|d| d.id).or(self.district_id)
    }

    pub fn upazila_key(&self) -> Option<i64> {
        self.upazila.as_ref().map(|u| u.id).or(self.upazila_id)
    }

    /// Whether the hospital lies inside the given (possibly partial) area.
    pub fn in_area(&self, area: &AreaPreference) -> bool {
        fn matches(wanted: Option<i64>, actual: Option<i64>) -> bool {
            wanted.is_none() || wanted == actual
        }

        matches(area.division_id, self.division_key())
            && matches(area.district_id, self.district_key())
            && matches(area.upazila_id, self.upazila_key())
    }
}

fn default_active() -> bool {
    true
}

/// Create/edit form of the hospital management screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HospitalForm {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub division_id: Option<i64>,
    #[serde(default)]
    pub district_id: Option<i64>,
    #[serde(default)]
    pub upazila_id: Option<i64>,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub phone_primary: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Default for HospitalForm {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            code: String::new(),
            division_id: None,
            district_id: None,
            upazila_id: None,
            address_line1: String::new(),
            phone_primary: String::new(),
            email: String::new(),
            is_active: true,
            logo_url: None,
        }
    }
}

impl HospitalForm {
    pub fn from_hospital(hospital: &Hospital) -> Self {
        Self {
            id: Some(hospital.id),
            name: hospital.name.clone(),
            code: hospital.code.clone(),
            division_id: hospital.division_key(),
            district_id: hospital.district_key(),
            upazila_id: hospital.upazila_key(),
            address_line1: hospital.address_line1.clone(),
            phone_primary: hospital.phone_primary.clone(),
            email: hospital.email.clone(),
            is_active: hospital.is_active.unwrap_or(true),
            logo_url: hospital.logo_url.clone(),
        }
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "Hospital name is required");
        errors.check(!self.code.trim().is_empty(), "code", "Hospital code is required");
        errors.check(self.division_id.is_some(), "divisionId", "Select a division");
        errors.check(self.district_id.is_some(), "districtId", "Select a district");
        errors.check(!self.address_line1.trim().is_empty(), "addressLine1", "Address is required");
        errors.check(!self.phone_primary.trim().is_empty(), "phonePrimary", "Primary phone is required");
        errors.check(is_valid_email(self.email.trim()), "email", "Enter a valid email address");
        errors
    }

    /// Body for create/update: the flat form fields plus nested location ids.
    pub fn to_payload(&self) -> Value {
        let nested = |id: Option<i64>| id.map(|id| json!({ "id": id }));

        json!({
            "id": self.id,
            "name": self.name.trim(),
            "code": self.code.trim(),
            "divisionId": self.division_id,
            "districtId": self.district_id,
            "upazilaId": self.upazila_id,
            "addressLine1": self.address_line1.trim(),
            "phonePrimary": self.phone_primary.trim(),
            "email": self.email.trim(),
            "isActive": self.is_active,
            "logoUrl": self.logo_url,
            "division": nested(self.division_id),
            "district": nested(self.district_id),
            "upazila": nested(self.upazila_id),
        })
    }
}
