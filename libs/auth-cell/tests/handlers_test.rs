use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use auth_cell::PortalContext;
use shared_models::auth::{AuthResponse, Role};
use shared_utils::storage::{keys, KeyValueStore, MemoryStore};
use shared_utils::test_utils::{JwtTestUtils, MockApiResponses, TestConfig, TestUser};

fn create_context(server: &MockServer) -> Arc<PortalContext> {
    let config = TestConfig::with_api_url(server.uri()).to_portal_config();
    Arc::new(PortalContext::new(config, Arc::new(MemoryStore::new())))
}

fn sign_in(ctx: &PortalContext, user: &TestUser) {
    let token = JwtTestUtils::create_test_token(user, &TestConfig::default().jwt_secret, Some(1));
    let res: AuthResponse = serde_json::from_value(MockApiResponses::auth_response(user, &token)).unwrap();
    ctx.session.establish(res).unwrap();
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_landing_without_session_goes_to_login() {
    let mock_server = MockServer::start().await;
    let app = auth_routes(create_context(&mock_server));

    let response = send(&app, "GET", "/", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_landing_per_role() {
    let mock_server = MockServer::start().await;
    let cases = [
        (TestUser::patient("p@example.com"), "/patient/dashboard"),
        (TestUser::doctor("d@example.com"), "/doctor/dashboard"),
        (TestUser::admin("a@example.com"), "/admin/dashboard"),
        (TestUser::super_admin("s@example.com"), "/admin/dashboard"),
    ];

    for (user, expected) in cases {
        let ctx = create_context(&mock_server);
        sign_in(&ctx, &user);
        let app = auth_routes(ctx);

        let response = send(&app, "GET", "/", None).await;
        assert_eq!(location(&response), expected, "landing for {}", user.role);
    }
}

#[tokio::test]
async fn test_login_success_establishes_session() {
    let mock_server = MockServer::start().await;
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, "secret", Some(1));

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "patient@example.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::auth_response(&user, &token)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let app = auth_routes(ctx.clone());

    let response = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": " patient@example.com ", "password": "secret1 " })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(ctx.session.has_role(Role::Patient));
    assert_eq!(ctx.session.token().as_deref(), Some(token.as_str()));
    assert_eq!(ctx.toasts.active()[0].message, "Welcome back!");

    let response = send(&app, "GET", "/", None).await;
    assert_eq!(location(&response), "/patient/dashboard");
}

#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let app = auth_routes(ctx.clone());

    let response = send(
        &app,
        "POST",
        "/login",
        Some(json!({ "email": "who@example.com", "password": "secret1" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Bad credentials");
    assert!(!ctx.session.is_logged_in());
    assert_eq!(ctx.toasts.active()[0].message, "Bad credentials");
}

#[tokio::test]
async fn test_invalid_login_form_makes_no_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = auth_routes(create_context(&mock_server));
    let response = send(&app, "POST", "/login", Some(json!({ "email": "nope", "password": "1" }))).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_login_screen_redirects_when_logged_in() {
    let mock_server = MockServer::start().await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::doctor("doc@example.com"));
    let app = auth_routes(ctx);

    let response = send(&app, "GET", "/login", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_register_doctor_sends_specialty() {
    let mock_server = MockServer::start().await;
    let user = TestUser::doctor("newdoc@example.com");

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "name": "Dr. New",
            "email": "newdoc@example.com",
            "password": "secret1",
            "role": "DOCTOR",
            "phone": "+8801711000000",
            "specialty": "Neurology"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::auth_response(&user, "tok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let app = auth_routes(ctx.clone());

    let response = send(
        &app,
        "POST",
        "/register",
        Some(json!({
            "name": " Dr. New ",
            "email": "newdoc@example.com",
            "password": "secret1",
            "role": "DOCTOR",
            "phone": "+8801711000000",
            "specialty": " Neurology "
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(ctx.session.has_role(Role::Doctor));
}

#[tokio::test]
async fn test_profile_requires_session() {
    let mock_server = MockServer::start().await;
    let app = auth_routes(create_context(&mock_server));

    let response = send(&app, "GET", "/profile", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_avatar_update_merges_into_local_profile() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/avatar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Avatar updated"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("p@example.com"));
    let app = auth_routes(ctx.clone());

    let response = send(&app, "PUT", "/profile/avatar", Some(json!({ "avatar": "data:image/png;base64,QUJD" }))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["avatar"], "data:image/png;base64,QUJD");
    assert_eq!(ctx.session.user().unwrap().avatar.as_deref(), Some("data:image/png;base64,QUJD"));
}

#[tokio::test]
async fn test_change_password_mismatch_is_local() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/auth/change-password"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::patient("p@example.com"));
    let app = auth_routes(ctx.clone());

    let response = send(
        &app,
        "PUT",
        "/profile/password",
        Some(json!({ "currentPassword": "old-pass", "newPassword": "abcdef", "confirmPassword": "abcdxx" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.toasts.active()[0].message, "New passwords do not match");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mock_server = MockServer::start().await;
    let ctx = create_context(&mock_server);
    sign_in(&ctx, &TestUser::admin("a@example.com"));
    let app = auth_routes(ctx.clone());

    let response = send(&app, "POST", "/logout", None).await;

    assert_eq!(location(&response), "/login");
    assert!(!ctx.session.is_logged_in());
}

#[tokio::test]
async fn test_reset_steps_without_pending_email_restart_flow() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let app = auth_routes(ctx.clone());

    for (verb, uri, body) in [
        ("GET", "/verify-otp", None),
        ("POST", "/verify-otp", Some(json!({ "otp": "123456" }))),
        ("GET", "/reset-password", None),
        ("POST", "/reset-password", Some(json!({ "newPassword": "abcdef", "confirmPassword": "abcdef" }))),
    ] {
        let response = send(&app, verb, uri, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{} {}", verb, uri);
        assert_eq!(location(&response), "/forgot-password");
    }

    assert!(ctx.toasts.active().iter().all(|t| t.kind == notification_cell::ToastKind::Error));
}

#[tokio::test]
async fn test_full_password_reset_flow() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/forgot-password"))
        .and(body_json(json!({ "email": "p@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OTP sent"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .and(body_json(json!({ "email": "p@example.com", "otp": "482913" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OTP verified"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/reset-password"))
        .and(body_json(json!({ "email": "p@example.com", "newPassword": "n3wpass" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Password reset"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    let app = auth_routes(ctx.clone());

    let response = send(&app, "POST", "/forgot-password", Some(json!({ "email": " p@example.com " }))).await;
    assert_eq!(location(&response), "/verify-otp");
    assert_eq!(ctx.store().get(keys::RESET_EMAIL).as_deref(), Some("p@example.com"));

    let response = send(&app, "GET", "/verify-otp", None).await;
    assert_eq!(json_body(response).await["email"], "p@example.com");

    let response = send(&app, "POST", "/verify-otp", Some(json!({ "otp": "482913" }))).await;
    assert_eq!(location(&response), "/reset-password");

    let response = send(
        &app,
        "POST",
        "/reset-password",
        Some(json!({ "newPassword": "n3wpass", "confirmPassword": "n3wpass" })),
    )
    .await;
    assert_eq!(location(&response), "/login");
    assert!(ctx.store().get(keys::RESET_EMAIL).is_none());
}

#[tokio::test]
async fn test_wrong_otp_keeps_pending_email() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-otp"))
        .respond_with(ResponseTemplate::new(400).set_body_string(""))
        .mount(&mock_server)
        .await;

    let ctx = create_context(&mock_server);
    ctx.store().set(keys::RESET_EMAIL, "p@example.com").unwrap();
    let app = auth_routes(ctx.clone());

    let response = send(&app, "POST", "/verify-otp", Some(json!({ "otp": "000000" }))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid or expired OTP. Please try again.");
    assert_eq!(ctx.store().get(keys::RESET_EMAIL).as_deref(), Some("p@example.com"));
}
