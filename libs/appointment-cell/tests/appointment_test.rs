use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::listing::{ListService, ListState};
use appointment_cell::models::{AppointmentStatus, NoteUpdate};
use appointment_cell::router::appointment_routes;
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

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn mount_list(server: &MockServer, rows: Value) {
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

fn sample_rows() -> Value {
    json!([
        MockApiResponses::appointment(1, "John Doe", "john@example.com", 7, "2025-05-01", "pending"),
        MockApiResponses::appointment(2, "Jane Doe", "jane@example.com", 7, "2025-05-02", "confirmed"),
        MockApiResponses::appointment(3, "Ali Khan", "ali@example.com", 8, "2025-05-03", "pending")
    ])
}

// ==============================================================================
// GUARDS
// ==============================================================================

#[tokio::test]
async fn test_visitor_without_session_is_sent_to_login() {
    let mock_server = MockServer::start().await;
    let app = appointment_routes(create_context(&mock_server));

    let response = send(&app, "GET", "/appointments", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_roles_are_redirected_from_foreign_screens() {
    let mock_server = MockServer::start().await;
    let ctx = create_context(&mock_server);
    let app = appointment_routes(ctx.clone());

    sign_in(&ctx, &TestUser::patient("p@example.com"));
    let response = send(&app, "GET", "/admin/appointments", None).await;
    assert_eq!(location(&response), "/appointments");

    sign_in(&ctx, &TestUser::doctor("d@example.com"));
    let response = send(&app, "GET", "/new", None).await;
    assert_eq!(location(&response), "/appointments");

    sign_in(&ctx, &TestUser::super_admin("root@example.com"));
    let response = send(&app, "GET", "/edit/1", None).await;
    assert_eq!(location(&response), "/appointments");
}

// ==============================================================================
// LIST
// ==============================================================================

#[tokio::test]
async fn test_filter_route_narrows_and_resets_page() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx);

    let view = json_body(send(&app, "GET", "/appointments", None).await).await;
    assert_eq!(view["total"], 3);
    assert_eq!(view["permissions"]["canDelete"], true);

    let response = send(&app, "PUT", "/appointments/filter", Some(json!({ "search": "DOE", "status": "pending" }))).await;
    let view = json_body(response).await;

    assert_eq!(view["total"], 1);
    assert_eq!(view["page"], 1);
    assert_eq!(view["appointments"][0]["patientName"], "John Doe");
}

#[tokio::test]
async fn test_unsupported_page_size_is_rejected() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx);

    send(&app, "GET", "/appointments", None).await;
    let response = send(&app, "PUT", "/appointments/filter", Some(json!({ "pageSize": 12 }))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_next_user_starts_with_an_empty_list() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    let ctx = create_context(&mock_server);
    let app = appointment_routes(ctx.clone());

    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let view = json_body(send(&app, "GET", "/appointments", None).await).await;
    assert_eq!(view["total"], 3);
    send(&app, "PUT", "/appointments/filter", Some(json!({ "search": "doe" }))).await;

    ctx.session.clear();
    sign_in(&ctx, &TestUser::patient("ali@example.com"));

    let view = json_body(send(&app, "PUT", "/appointments/page", Some(json!({ "page": 1 }))).await).await;
    assert_eq!(view["total"], 0);
    assert!(view["appointments"].as_array().unwrap().is_empty());
    assert_eq!(view["filter"]["search"], "");

    let view = json_body(send(&app, "PUT", "/appointments/filter", Some(json!({ "status": "all" }))).await).await;
    assert_eq!(view["total"], 0);
}

#[tokio::test]
async fn test_location_filter_is_refused_below_super_admin() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    Mock::given(method("GET"))
        .and(path("/api/locations/divisions/1/districts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx.clone());

    send(&app, "GET", "/appointments", None).await;
    let view = json_body(send(&app, "PUT", "/appointments/filter", Some(json!({ "divisionId": 1 }))).await).await;

    assert_eq!(view["total"], 3);
    assert!(view["filter"]["area"]["divisionId"].is_null());
    assert_eq!(
        ctx.toasts.active()[0].message,
        "Location filters are only available to super admins"
    );
}

#[tokio::test]
async fn test_patient_cannot_delete_or_change_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let user = TestUser::patient("john@example.com");
    let service = ListService::new(&ctx, user.to_profile());
    let state = ListState::new();

    assert_matches!(service.delete(&state, 1).await, Err(AppError::Forbidden(_)));
    assert_matches!(
        service.change_status(&state, 1, AppointmentStatus::Confirmed).await,
        Err(AppError::Forbidden(_))
    );

    let toasts = ctx.toasts.active();
    assert_eq!(toasts[0].message, "Only admin can delete appointments");
    assert_eq!(toasts[1].message, "You are not authorized to change status");
}

#[tokio::test]
async fn test_admin_cannot_write_clinical_notes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let service = ListService::new(&ctx, TestUser::admin("admin@example.com").to_profile());
    let note = NoteUpdate { notes: Some("Rest".to_string()), diagnosis: None, prescription: None };

    assert_matches!(service.save_note(&ListState::new(), 1, note).await, Err(AppError::Forbidden(_)));
    assert_eq!(ctx.toasts.active()[0].message, "Only doctors can add advice/notes");
}

#[tokio::test]
async fn test_admin_delete_removes_row() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    Mock::given(method("DELETE"))
        .and(path("/api/appointments/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::super_admin("root@example.com"));
    let app = appointment_routes(ctx.clone());

    send(&app, "GET", "/appointments", None).await;
    let view = json_body(send(&app, "DELETE", "/appointments/2", None).await).await;

    assert_eq!(view["total"], 2);
    assert_eq!(ctx.toasts.active()[0].message, "Appointment deleted successfully");
}

#[tokio::test]
async fn test_doctor_status_change_patches_and_updates_row() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    Mock::given(method("PATCH"))
        .and(path("/api/appointments/3/status"))
        .and(body_partial_json(json!({ "status": "complete" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::doctor("doc@example.com"));
    let app = appointment_routes(ctx.clone());

    send(&app, "GET", "/appointments", None).await;
    let response = send(&app, "PATCH", "/appointments/3/status", Some(json!({ "status": "complete" }))).await;
    let view = json_body(response).await;

    assert_eq!(view["appointments"][2]["status"], "complete");
    assert_eq!(ctx.toasts.active()[0].message, "Appointment Completed!");
}

#[tokio::test]
async fn test_doctor_note_sends_full_appointment() {
    let mock_server = MockServer::start().await;
    mount_list(&mock_server, sample_rows()).await;
    Mock::given(method("PUT"))
        .and(path("/api/appointments/1"))
        .and(body_partial_json(json!({
            "patientName": "John Doe",
            "appointmentTime": "14:30:00",
            "notes": "Drink water",
            "prescription": "Paracetamol"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::doctor("doc@example.com"));
    let app = appointment_routes(ctx.clone());

    send(&app, "GET", "/appointments", None).await;
    let response = send(
        &app,
        "PUT",
        "/appointments/1/notes",
        Some(json!({ "notes": "Drink water", "prescription": "Paracetamol" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ctx.toasts.active()[0].message, "Note saved successfully");
}

// ==============================================================================
// FORM
// ==============================================================================

#[tokio::test]
async fn test_form_submission_adds_seconds_to_time() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .and(body_partial_json(json!({ "appointmentTime": "14:30:00", "doctorId": 7 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx.clone());

    let form = json!({
        "patientName": "Rina Akter",
        "patientEmail": "rina@example.com",
        "patientPhone": "01711000000",
        "patientAge": "31",
        "patientGender": "Female",
        "doctorId": 7,
        "appointmentDate": "2025-06-01",
        "appointmentTime": "14:30"
    });
    let response = send(&app, "POST", "/appointments/form", Some(form)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/appointments");
    assert_eq!(ctx.toasts.active()[0].message, "Appointment created successfully!");
}

#[tokio::test]
async fn test_edit_form_shows_minute_precision_and_locks() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::appointment(
            5, "Rina", "rina@example.com", 7, "2025-06-01", "pending",
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockApiResponses::doctor(7, "Dr. Karim", "Cardiology", None),
            MockApiResponses::doctor(8, "Dr. Sen", "ENT", Some(false))
        ])))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::doctor("doc@example.com"));
    let app = appointment_routes(ctx);

    let view = json_body(send(&app, "GET", "/edit/5", None).await).await;

    assert_eq!(view["form"]["appointmentTime"], "14:30");
    assert_eq!(view["isEdit"], true);
    assert!(view["locked"].as_array().unwrap().contains(&json!("doctorId")));
    assert_eq!(view["doctors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_appointment_on_edit_returns_to_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx.clone());

    let response = send(&app, "GET", "/edit/404", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/appointments");
    assert_eq!(ctx.toasts.active()[0].message, "Appointment not found");
}

#[tokio::test]
async fn test_patient_edit_keeps_locked_fields() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::appointment(
            5, "Rina", "rina@example.com", 7, "2025-06-01", "pending",
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/appointments/5"))
        .and(body_partial_json(json!({
            "patientName": "Rina Akter",
            "patientEmail": "rina@example.com",
            "status": "pending",
            "appointmentTime": "14:30:00"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("rina@example.com"));
    let app = appointment_routes(ctx.clone());

    let form = json!({
        "patientName": "Rina Akter",
        "patientEmail": "someone@else.com",
        "patientPhone": "01711000000",
        "patientAge": "34",
        "patientGender": "Female",
        "doctorId": 9,
        "appointmentDate": "2025-07-01",
        "appointmentTime": "08:00",
        "status": "confirmed"
    });
    let response = send(&app, "PUT", "/edit/5", Some(form)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(ctx.toasts.active()[0].message, "Appointment updated successfully!");
}

#[tokio::test]
async fn test_save_failure_uses_server_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockApiResponses::error_response("Slot already taken")))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("admin@example.com"));
    let app = appointment_routes(ctx.clone());

    let form = json!({
        "patientName": "Rina Akter",
        "patientEmail": "rina@example.com",
        "patientPhone": "01711000000",
        "patientAge": "31",
        "patientGender": "Female",
        "doctorId": 7,
        "appointmentDate": "2025-06-01",
        "appointmentTime": "14:30"
    });
    let response = send(&app, "POST", "/appointments/form", Some(form)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.toasts.active()[0].message, "Slot already taken");
}

// ==============================================================================
// DETAILS, SLIPS, DASHBOARDS
// ==============================================================================

#[tokio::test]
async fn test_slip_is_printable_html() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::appointment(
            1, "John <Doe>", "john@example.com", 7, "2025-05-01", "pending",
        )))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("john@example.com"));
    let app = appointment_routes(ctx);

    let response = send(&app, "GET", "/appointments/1/slip", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("John &lt;Doe&gt;"));
    assert!(html.contains("Dr. Karim (Cardiology)"));
    assert!(html.contains("PENDING"));
}

#[tokio::test]
async fn test_details_for_unknown_id_redirects() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/77"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("john@example.com"));
    let app = appointment_routes(ctx);

    let response = send(&app, "GET", "/view/77", None).await;
    assert_eq!(location(&response), "/appointments");
}

#[tokio::test]
async fn test_doctor_dashboard_counts_only_own_rows() {
    let mock_server = MockServer::start().await;
    let doctor = TestUser::doctor("doc@example.com");
    let own = doctor.profile_id.unwrap();
    mount_list(
        &mock_server,
        json!([
            MockApiResponses::appointment(1, "A", "a@example.com", own, "2024-01-10", "complete"),
            MockApiResponses::appointment(2, "B", "b@example.com", own, "2024-01-11", "pending"),
            MockApiResponses::appointment(3, "C", "c@example.com", own + 1, "2024-01-12", "pending")
        ]),
    )
    .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &doctor);
    let app = appointment_routes(ctx);

    let dashboard = json_body(send(&app, "GET", "/doctor/dashboard", None).await).await;

    assert_eq!(dashboard["total"], 2);
    assert_eq!(dashboard["totalPatients"], 2);
    assert_eq!(dashboard["pending"], 1);
    assert_eq!(dashboard["statusChart"]["labels"][2], "Complete");
}

#[tokio::test]
async fn test_patient_dashboard_failure_toasts() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("john@example.com"));
    let app = appointment_routes(ctx.clone());

    let response = send(&app, "GET", "/patient/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(ctx.toasts.active()[0].message, "Failed to load appointments");
}
