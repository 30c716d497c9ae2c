use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Datelike, Local};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use admin_cell::router::admin_routes;
use admin_cell::{AdminForm, AdminUsersService};
use auth_cell::PortalContext;
use shared_models::auth::AuthResponse;
use shared_models::error::AppError;
use shared_utils::storage::MemoryStore;
use shared_utils::test_utils::{MockApiResponses, TestConfig, TestUser};

fn create_context(server: &MockServer) -> Arc<PortalContext> {
    let config = TestConfig::with_api_url(server.uri()).to_portal_config();
    Arc::new(PortalContext::new(config, Arc::new(MemoryStore::new())))
}

fn sign_in(ctx: &PortalContext, user: &TestUser) {
    let res: AuthResponse = serde_json::from_value(MockApiResponses::auth_response(user, "test-token")).unwrap();
    ctx.session.establish(res).unwrap();
}

async fn send(app: &Router, verb: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(verb).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_doctors(server: &MockServer, count: i64) {
    let specialties = ["Dentist", "Cardiologist", "Dermatologist"];
    let doctors: Vec<Value> = (1..=count)
        .map(|id| MockApiResponses::doctor(id, &format!("Dr. {}", id), specialties[(id % 3) as usize], None))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(doctors)))
        .mount(server)
        .await;
}

fn valid_doctor() -> Value {
    json!({
        "name": "Dr. Karim",
        "email": "karim@clinic.com",
        "password": "secret99",
        "specialty": "Cardiologist",
        "phone": "01811000000"
    })
}

// ==============================================================================
// ACCESS
// ==============================================================================

#[tokio::test]
async fn test_admin_area_rejects_other_roles() {
    let mock_server = MockServer::start().await;
    let ctx = create_context(&mock_server);
    let app = admin_routes(ctx.clone());

    let response = send(&app, "GET", "/admin/doctors", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    sign_in(&ctx, &TestUser::doctor("doc@clinic.com"));
    let response = send(&app, "GET", "/admin/users", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/appointments");
}

#[tokio::test]
async fn test_admin_root_goes_to_dashboard() {
    let mock_server = MockServer::start().await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let response = send(&admin_routes(ctx), "GET", "/admin", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin/dashboard");
}

// ==============================================================================
// DOCTOR DIRECTORY
// ==============================================================================

#[tokio::test]
async fn test_directory_searches_and_pages() {
    let mock_server = MockServer::start().await;
    mount_doctors(&mock_server, 12).await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));
    let app = admin_routes(ctx);

    let view = json_body(send(&app, "GET", "/admin/doctors?pageSize=5&page=3", None).await).await;
    assert_eq!(view["total"], 12);
    assert_eq!(view["totalPages"], 3);
    assert_eq!(view["doctors"].as_array().unwrap().len(), 2);
    assert_eq!(view["doctors"][0]["id"], 11);

    // ids 3, 6, 9 and 12 are dentists
    let view = json_body(send(&app, "GET", "/admin/doctors?search=DENT", None).await).await;
    assert_eq!(view["total"], 4);
    assert_eq!(view["pageSize"], 10);
    assert_eq!(view["page"], 1);
    assert_eq!(view["specialties"].as_array().unwrap().len(), 20);

    let response = send(&app, "GET", "/admin/doctors?pageSize=7", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_doctor_posts_doctor_role() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/add-doctor"))
        .and(body_partial_json(json!({ "role": "DOCTOR", "email": "karim@clinic.com", "password": "secret99" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Doctor registered"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let response = send(&admin_routes(ctx.clone()), "POST", "/admin/doctors", Some(valid_doctor())).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(ctx.toasts.active()[0].message, "Doctor added successfully!");
}

#[tokio::test]
async fn test_invalid_doctor_is_not_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/add-doctor"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));
    let mut form = valid_doctor();
    form["password"] = json!("123");

    let response = send(&admin_routes(ctx.clone()), "POST", "/admin/doctors", Some(form)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.toasts.active()[0].message, "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_add_doctor_failure_prefers_server_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/add-doctor"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockApiResponses::error_response("Email already exists")))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::super_admin("root@clinic.com"));

    let response = send(&admin_routes(ctx.clone()), "POST", "/admin/doctors", Some(valid_doctor())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.toasts.active()[0].message, "Email already exists");
}

#[tokio::test]
async fn test_edit_form_and_update_skip_password() {
    let mock_server = MockServer::start().await;
    mount_doctors(&mock_server, 3).await;
    Mock::given(method("PUT"))
        .and(path("/api/doctors/2"))
        .and(body_partial_json(json!({ "name": "Dr. Sen", "specialty": "Dermatologist" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));
    let app = admin_routes(ctx.clone());

    let editor = json_body(send(&app, "GET", "/admin/doctors/2", None).await).await;
    assert_eq!(editor["isEdit"], true);
    assert_eq!(editor["form"]["email"], "doctor2@clinic.com");
    assert!(editor["form"].get("password").is_none());

    let update = json!({
        "name": "Dr. Sen",
        "email": "doctor2@clinic.com",
        "specialty": "Dermatologist",
        "phone": "01811000000"
    });
    let response = send(&app, "PUT", "/admin/doctors/2", Some(update)).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.toasts.active()[0].message, "Doctor updated successfully!");
}

#[tokio::test]
async fn test_unknown_doctor_edit_is_not_found() {
    let mock_server = MockServer::start().await;
    mount_doctors(&mock_server, 2).await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let response = send(&admin_routes(ctx.clone()), "GET", "/admin/doctors/99", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(ctx.toasts.active()[0].message, "Doctor not found");
}

#[tokio::test]
async fn test_status_toggle_failure_is_toasted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/doctors/4/status"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let response = send(
        &admin_routes(ctx.clone()),
        "PATCH",
        "/admin/doctors/4/status",
        Some(json!({ "active": true })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.toasts.active()[0].message, "Failed to update status");
}

// ==============================================================================
// ADMIN USERS
// ==============================================================================

#[tokio::test]
async fn test_users_screen_filters_admins() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users/admins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Nadia Islam", "email": "nadia@clinic.com", "role": "ADMIN", "hospitalId": 3 },
            { "id": 2, "name": "Rafi", "email": "rafi@clinic.com", "role": "ADMIN" }
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::hospital(3, "Dhaka Medical", 1, 11, 111)
        ])))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::super_admin("root@clinic.com"));

    let view = json_body(send(&admin_routes(ctx), "GET", "/admin/users?search=nadia", None).await).await;

    assert_eq!(view["admins"].as_array().unwrap().len(), 1);
    assert_eq!(view["admins"][0]["hospitalId"], 3);
    assert_eq!(view["hospitals"][0]["name"], "Dhaka Medical");
}

#[tokio::test]
async fn test_create_admin_binds_hospital() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/create-admin"))
        .and(query_param("hospitalId", "3"))
        .and(body_partial_json(json!({ "email": "nadia@clinic.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Admin created"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::super_admin("root@clinic.com"));
    let form = json!({
        "name": "Nadia Islam",
        "email": "nadia@clinic.com",
        "password": "secret99",
        "phone": "01711000000",
        "hospitalId": 3
    });

    let response = send(&admin_routes(ctx.clone()), "POST", "/admin/users", Some(form)).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(ctx.toasts.active()[0].message, "Admin created successfully");
}

#[tokio::test]
async fn test_create_admin_without_hospital_sends_empty_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/create-admin"))
        .and(query_param("hospitalId", ""))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let service = AdminUsersService::new(&ctx);
    let form = AdminForm {
        name: "Rafi".to_string(),
        email: "rafi@clinic.com".to_string(),
        password: "secret99".to_string(),
        phone: "01711000000".to_string(),
        hospital_id: None,
    };

    let result = service.create_admin(form).await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) if msg == "Failed to create admin");
    assert_eq!(ctx.toasts.active()[0].message, "Failed to create admin");
}

// ==============================================================================
// DASHBOARD
// ==============================================================================

#[tokio::test]
async fn test_super_admin_dashboard_includes_analytics() {
    let mock_server = MockServer::start().await;
    let today = Local::now().date_naive().to_string();
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::appointment(1, "Rina", "rina@example.com", 7, &today, "pending"),
            MockApiResponses::appointment(2, "Ali", "ali@example.com", 7, "2020-01-01", "complete")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalDoctors": 12 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analytics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "doctorsBySpecialty": { "Dentist": 4, "Cardiologist": 8 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::super_admin("root@clinic.com"));

    let view = json_body(send(&admin_routes(ctx), "GET", "/admin/dashboard", None).await).await;

    assert_eq!(view["stats"]["totalDoctors"], 12);
    assert_eq!(view["appointments"]["total"], 2);
    assert_eq!(view["appointments"]["todaysCount"], 1);
    assert_eq!(view["appointments"]["pending"], 1);
    assert_eq!(view["analytics"]["doctors"]["labels"], json!(["Cardiologist", "Dentist"]));
    assert!(view["greeting"].as_str().unwrap().starts_with("Good "));
}

#[tokio::test]
async fn test_admin_dashboard_survives_missing_stats() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analytics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let response = send(&admin_routes(ctx), "GET", "/admin/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["stats"], json!({}));
    assert!(view.get("analytics").is_none());
}

#[tokio::test]
async fn test_financials_count_completed_visits() {
    let mock_server = MockServer::start().await;
    let now = Local::now().date_naive();
    let this_month = now.with_day(1).unwrap().to_string();
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::appointment(1, "Rina", "rina@example.com", 7, &this_month, "complete"),
            MockApiResponses::appointment(2, "Ali", "ali@example.com", 7, &this_month, "complete"),
            MockApiResponses::appointment(3, "Mim", "mim@example.com", 7, &this_month, "cancelled")
        ])))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@clinic.com"));

    let view = json_body(send(&admin_routes(ctx), "GET", "/admin/financial", None).await).await;

    assert_eq!(view["consultationFee"], 500);
    assert_eq!(view["completed"], 2);
    assert_eq!(view["totalEarnings"], 1000);
    assert_eq!(view["currentMonth"], 1000);
}
