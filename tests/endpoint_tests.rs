//! HTTP endpoint integration tests
//!
//! Covers:
//! - public health, version and login routes
//! - bearer-token enforcement on protected routes
//! - permission markers (403 before the handler runs)
//! - tier-scoped company listing and notification endpoints
//! - superadmin-only expiry scan and audit log
//! - security headers on every response
//! - per-client login throttling
//! - caller address and user agent on audit records

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

mod common;
use common::{
    bearer_token, build_test_app_state, create_company, create_test_db, create_test_user,
    TEST_LOGIN_ATTEMPTS, TEST_PASSWORD,
};

use dms_backend::bootstrapper::create_app;
use dms_backend::state::AppState;

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn app_with_state() -> (Router, AppState) {
    let db = create_test_db().await;
    let state = build_test_app_state(db).await;
    (create_app(state.clone()), state)
}

#[tokio::test]
async fn test_health_is_public_and_has_security_headers() {
    let (app, _) = app_with_state().await;

    let response = app.oneshot(get("/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.get("content-security-policy").is_some());
}

#[tokio::test]
async fn test_version_is_public() {
    let (app, _) = app_with_state().await;
    let (status, body) = send(app, get("/api/version", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_login_then_me() {
    let (app, state) = app_with_state().await;
    let a = create_company(&state.db, "A", None).await;
    let user = create_test_user(&state.db, "kim", "manager", Some(a.id)).await;

    let (status, body) = send(
        app.clone(),
        with_json(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "username": "kim", "password": TEST_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["user"]["user_id"], user.id);

    let token = format!("Bearer {}", body["access_token"].as_str().unwrap());
    let (status, me) = send(app, get("/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "kim");
    assert_eq!(me["role_name"], "manager");
    assert_eq!(me["company_id"], a.id);
}

#[tokio::test]
async fn test_login_with_bad_password() {
    let (app, state) = app_with_state().await;
    create_test_user(&state.db, "kim", "staff", None).await;

    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "username": "kim", "password": "nope" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid username or password");
}

fn login_from(ip: &str, password: &str) -> Request<Body> {
    Request::builder()
        .uri("/auth/login")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            serde_json::json!({ "username": "kim", "password": password }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_login_is_throttled_per_client() {
    let (app, state) = app_with_state().await;
    create_test_user(&state.db, "kim", "staff", None).await;

    for _ in 0..TEST_LOGIN_ATTEMPTS {
        let (status, _) = send(app.clone(), login_from("203.0.113.9", "wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // Budget spent: even the right password is refused
    let response = app
        .clone()
        .oneshot(login_from("203.0.113.9", TEST_PASSWORD))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Other clients are unaffected
    let (status, body) = send(app, login_from("198.51.100.4", TEST_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].is_string());
}

#[tokio::test]
async fn test_audit_records_caller_address_and_agent() {
    let (app, state) = app_with_state().await;
    create_test_user(&state.db, "kim", "staff", None).await;
    let sa = create_test_user(&state.db, "sa", "superadmin", None).await;

    let mut failed = login_from("203.0.113.9", "wrong");
    failed
        .headers_mut()
        .insert(header::USER_AGENT, "dms-cli/1.0".parse().unwrap());
    let (status, _) = send(app.clone(), failed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(app.clone(), login_from("198.51.100.4", TEST_PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);

    let token = bearer_token(&state, &sa).await;
    let (_, logs) = send(app.clone(), get("/api/audit?action=login_failed", Some(&token))).await;
    assert_eq!(logs["total"], 1);
    assert_eq!(logs["logs"][0]["ip_address"], "203.0.113.9");
    assert_eq!(logs["logs"][0]["user_agent"], "dms-cli/1.0");

    let (_, logs) = send(app.clone(), get("/api/audit?action=login", Some(&token))).await;
    assert_eq!(logs["total"], 1);
    assert_eq!(logs["logs"][0]["ip_address"], "198.51.100.4");
    assert!(logs["logs"][0]["user_agent"].is_null());

    // Handler-side audit entries carry it too
    let mut create = with_json(
        "POST",
        "/api/companies",
        Some(&token),
        serde_json::json!({ "name": "Acme", "code": "ACME" }),
    );
    create
        .headers_mut()
        .insert("x-real-ip", "192.0.2.44".parse().unwrap());
    let (status, _) = send(app.clone(), create).await;
    assert_eq!(status, StatusCode::OK);

    let (_, logs) = send(app, get("/api/audit?action=company_created", Some(&token))).await;
    assert_eq!(logs["total"], 1);
    assert_eq!(logs["logs"][0]["ip_address"], "192.0.2.44");
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _) = app_with_state().await;

    for uri in ["/auth/me", "/api/companies", "/api/notifications", "/api/reports"] {
        let (status, _) = send(app.clone(), get(uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let (status, body) = send(app, get("/api/companies", Some("Bearer garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid or expired token");
}

#[tokio::test]
async fn test_permission_marker_blocks_handler() {
    let (app, state) = app_with_state().await;
    let a = create_company(&state.db, "A", None).await;
    let staff = create_test_user(&state.db, "staff", "staff", Some(a.id)).await;
    let token = bearer_token(&state, &staff).await;

    let (status, body) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/companies",
            Some(&token),
            serde_json::json!({ "name": "New", "code": "NEW", "parent_id": a.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["detail"].as_str().unwrap().contains("manage_companies"));

    // Staff has no view_reports grant
    let (status, _) = send(app, get("/api/reports", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_manages_own_subtree() {
    let (app, state) = app_with_state().await;
    let root = create_company(&state.db, "ROOT", None).await;
    let a = create_company(&state.db, "A", Some(&root)).await;
    let b = create_company(&state.db, "B", Some(&root)).await;
    let admin = create_test_user(&state.db, "admin", "admin", Some(a.id)).await;
    let token = bearer_token(&state, &admin).await;

    let (status, created) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/companies",
            Some(&token),
            serde_json::json!({ "name": "A Sub", "code": "ASUB", "parent_id": a.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["level"], 2);

    let (status, _) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/companies",
            Some(&token),
            serde_json::json!({ "name": "B Sub", "code": "BSUB", "parent_id": b.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, listed) = send(app.clone(), get("/api/companies", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes.len(), 2);
    assert!(codes.contains(&"A"));
    assert!(codes.contains(&"ASUB"));

    let (status, _) = send(app, get(&format!("/api/companies/{}", b.id), Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_and_foreign_companies_look_the_same() {
    let (app, state) = app_with_state().await;
    let root = create_company(&state.db, "ROOT", None).await;
    let a = create_company(&state.db, "A", Some(&root)).await;
    let b = create_company(&state.db, "B", Some(&root)).await;
    let admin = create_test_user(&state.db, "admin", "admin", Some(a.id)).await;
    let token = bearer_token(&state, &admin).await;

    let missing = b.id + 10_000;
    for suffix in ["", "/children", "/descendants", "/ancestors"] {
        let (foreign, _) = send(
            app.clone(),
            get(&format!("/api/companies/{}{}", b.id, suffix), Some(&token)),
        )
        .await;
        let (unknown, _) = send(
            app.clone(),
            get(&format!("/api/companies/{}{}", missing, suffix), Some(&token)),
        )
        .await;
        assert_eq!(foreign, StatusCode::FORBIDDEN, "foreign {}", suffix);
        assert_eq!(unknown, StatusCode::FORBIDDEN, "unknown {}", suffix);
    }

    let (status, _) = send(
        app.clone(),
        with_json(
            "PUT",
            &format!("/api/companies/{}", missing),
            Some(&token),
            serde_json::json!({ "name": "Renamed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Superadmins see everything, so a missing company is plainly missing
    let sa = create_test_user(&state.db, "sa", "superadmin", None).await;
    let sa_token = bearer_token(&state, &sa).await;
    let (status, _) = send(app, get(&format!("/api/companies/{}", missing), Some(&sa_token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_move_endpoint_rejects_cycles() {
    let (app, state) = app_with_state().await;
    let root = create_company(&state.db, "ROOT", None).await;
    let a = create_company(&state.db, "A", Some(&root)).await;
    let sa = create_test_user(&state.db, "sa", "superadmin", None).await;
    let token = bearer_token(&state, &sa).await;

    let (status, _) = send(
        app.clone(),
        with_json(
            "POST",
            &format!("/api/companies/{}/move", root.id),
            Some(&token),
            serde_json::json!({ "parent_id": a.id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        app,
        with_json(
            "POST",
            &format!("/api/companies/{}/move", a.id),
            Some(&token),
            serde_json::json!({ "parent_id": null }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["company"]["level"], 0);
}

#[tokio::test]
async fn test_notification_endpoints() {
    let (app, state) = app_with_state().await;
    let staff = create_test_user(&state.db, "staff", "staff", None).await;
    let token = bearer_token(&state, &staff).await;

    state
        .notifications
        .create(dms_backend::services::notification::NewNotification {
            user_id: staff.id,
            notification_type: "info".to_string(),
            title: "Hello".to_string(),
            message: "World".to_string(),
            resource_type: "system".to_string(),
            resource_id: None,
            lifecycle: None,
        })
        .await
        .unwrap();

    let (status, body) = send(app.clone(), get("/api/notifications/unread-count", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 1);

    let (status, page) = send(app.clone(), get("/api/notifications?page_size=5", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["page_size"], 5);
    assert_eq!(page["items"][0]["type"], "info");

    let (status, body) = send(
        app.clone(),
        Request::builder()
            .uri("/api/notifications/read-all")
            .method("PUT")
            .header(header::AUTHORIZATION, &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["affected"], 1);

    let (_, body) = send(app.clone(), get("/api/notifications/unread-count", Some(&token))).await;
    assert_eq!(body["unread_count"], 0);

    let (status, settings) = send(
        app,
        with_json(
            "PUT",
            "/api/notifications/settings",
            Some(&token),
            serde_json::json!({ "expiry_threshold_days": 400 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(settings["detail"].is_string());
}

#[tokio::test]
async fn test_check_expiry_is_superadmin_only() {
    let (app, state) = app_with_state().await;
    let a = create_company(&state.db, "A", None).await;
    let admin = create_test_user(&state.db, "admin", "admin", Some(a.id)).await;
    let sa = create_test_user(&state.db, "sa", "superadmin", None).await;

    let admin_token = bearer_token(&state, &admin).await;
    let (status, _) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/notifications/check-expiry",
            Some(&admin_token),
            serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let sa_token = bearer_token(&state, &sa).await;
    let (status, body) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/notifications/check-expiry",
            Some(&sa_token),
            serde_json::json!({ "threshold_days": 30 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threshold_days"], 30);
    assert_eq!(body["documents_found"], 0);

    // The scan itself is audited
    let (status, logs) = send(app.clone(), get("/api/audit?action=expiry_scan", Some(&sa_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["total"], 1);

    let (status, _) = send(app, get("/api/audit", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_check_expiry_rejects_out_of_range_threshold() {
    let (app, state) = app_with_state().await;
    let sa = create_test_user(&state.db, "sa", "superadmin", None).await;
    let token = bearer_token(&state, &sa).await;

    for threshold in [0i64, -3, 366, 400, 200_000_000] {
        let (status, body) = send(
            app.clone(),
            with_json(
                "POST",
                "/api/notifications/check-expiry",
                Some(&token),
                serde_json::json!({ "threshold_days": threshold }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "threshold {}", threshold);
        assert!(body["detail"].is_string());
    }

    // Nothing ran, so nothing was audited
    let (_, logs) = send(app, get("/api/audit?action=expiry_scan", Some(&token))).await;
    assert_eq!(logs["total"], 0);
}

#[tokio::test]
async fn test_two_factor_endpoints() {
    let (app, state) = app_with_state().await;
    let user = create_test_user(&state.db, "lee", "staff", None).await;
    let token = bearer_token(&state, &user).await;

    let (status, body) = send(app.clone(), get("/api/2fa/status", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], false);
    assert_eq!(body["has_secret"], false);

    let (status, generated) = send(
        app.clone(),
        Request::builder()
            .uri("/api/2fa/generate")
            .method("POST")
            .header(header::AUTHORIZATION, &token)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let secret = generated["secret"].as_str().unwrap().to_string();

    let code = dms_backend::services::security::current_totp_code(
        &secret,
        state.two_factor.issuer(),
        "lee",
    )
    .unwrap();
    let (status, enabled) = send(
        app.clone(),
        with_json(
            "POST",
            "/api/2fa/verify",
            Some(&token),
            serde_json::json!({ "code": code }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enabled["backup_codes"].as_array().unwrap().len(), 10);

    // Login without a code is now a 2FA challenge
    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/auth/login",
            None,
            serde_json::json!({ "username": "lee", "password": TEST_PASSWORD }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requires_2fa"], true);
    assert!(body.get("access_token").is_none());
}
