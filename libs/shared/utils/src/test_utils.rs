use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;

use shared_config::PortalConfig;
use shared_models::auth::{Role, UserProfile};

static NEXT_ID: AtomicI64 = AtomicI64::new(1000);

fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub struct TestConfig {
    pub jwt_secret: String,
    pub api_url: String,
    pub state_path: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-signing-must-be-long-enough".to_string(),
            api_url: "http://localhost:5000".to_string(),
            state_path: std::env::temp_dir().join("clinic-portal-test-state.json"),
        }
    }
}

impl TestConfig {
    /// Points the portal at a mock API, usually `MockServer::uri()`.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn to_portal_config(&self) -> PortalConfig {
        PortalConfig {
            api_url: self.api_url.clone(),
            state_path: self.state_path.clone(),
            bind_addr: "127.0.0.1:0".to_string(),
            toast_ttl_secs: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub profile_id: Option<i64>,
    pub hospital_id: Option<i64>,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::Patient)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: next_id(),
            name: "Test User".to_string(),
            email: email.to_string(),
            role,
            phone: Some("01711000000".to_string()),
            profile_id: None,
            hospital_id: None,
        }
    }

    pub fn doctor(email: &str) -> Self {
        let mut user = Self::new(email, Role::Doctor);
        user.name = "Dr. Test".to_string();
        user.profile_id = Some(next_id());
        user
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::Patient)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn super_admin(email: &str) -> Self {
        Self::new(email, Role::SuperAdmin)
    }

    pub fn with_hospital(mut self, hospital_id: i64) -> Self {
        self.hospital_id = Some(hospital_id);
        self
    }

    pub fn to_profile(&self) -> UserProfile {
        UserProfile {
            id: Some(self.id),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            phone: self.phone.clone(),
            specialty: None,
            hospital_id: self.hospital_id,
            profile_id: self.profile_id,
            avatar: None,
            address: None,
            bio: None,
            gender: None,
            date_of_birth: None,
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// HS256 token shaped like the ones the clinic API issues.
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }
}

/// JSON bodies in the shapes the clinic API returns.
pub struct MockApiResponses;

impl MockApiResponses {
    pub fn auth_response(user: &TestUser, token: &str) -> Value {
        json!({
            "token": token,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "phone": user.phone,
            "userId": user.id,
            "profileId": user.profile_id,
            "hospitalId": user.hospital_id
        })
    }

    pub fn appointment(id: i64, patient_name: &str, patient_email: &str, doctor_id: i64, date: &str, status: &str) -> Value {
        json!({
            "id": id,
            "patientName": patient_name,
            "patientEmail": patient_email,
            "patientPhone": "01711000000",
            "patientAge": "34",
            "patientGender": "Female",
            "doctorId": doctor_id,
            "doctorName": "Dr. Karim",
            "doctorSpecialty": "Cardiology",
            "appointmentDate": date,
            "appointmentTime": "14:30:00",
            "status": status
        })
    }

    pub fn doctor(id: i64, name: &str, specialty: &str, active: Option<bool>) -> Value {
        let mut doctor = json!({
            "id": id,
            "name": name,
            "email": format!("doctor{}@clinic.com", id),
            "specialty": specialty,
            "phone": "01811000000"
        });
        if let Some(active) = active {
            doctor["active"] = json!(active);
        }
        doctor
    }

    pub fn hospital(id: i64, name: &str, division_id: i64, district_id: i64, upazila_id: i64) -> Value {
        json!({
            "id": id,
            "name": name,
            "code": format!("H{}", id),
            "divisionId": division_id,
            "districtId": district_id,
            "upazilaId": upazila_id,
            "division": { "id": division_id, "nameEn": "Dhaka" },
            "district": { "id": district_id, "nameEn": "Gazipur" },
            "upazila": { "id": upazila_id, "nameEn": "Kaliakair" },
            "phonePrimary": "029123456",
            "email": format!("info{}@hospital.com", id),
            "addressLine1": "Main Road",
            "isActive": true
        })
    }

    pub fn division(id: i64, name: &str) -> Value {
        json!({ "id": id, "nameEn": name, "code": format!("DIV{}", id) })
    }

    pub fn district(id: i64, division_id: i64, name: &str) -> Value {
        json!({ "id": id, "divisionId": division_id, "nameEn": name, "code": format!("DIS{}", id) })
    }

    pub fn upazila(id: i64, district_id: i64, name: &str) -> Value {
        json!({ "id": id, "districtId": district_id, "nameEn": name, "code": format!("UPA{}", id) })
    }

    pub fn slot(doctor_id: i64, date: &str, start: &str, end: &str) -> Value {
        json!({
            "doctorId": doctor_id,
            "availableDate": date,
            "startTime": start,
            "endTime": end,
            "isBooked": false
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({ "error": message })
    }
}
