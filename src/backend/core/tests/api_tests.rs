//! End-to-end tests for the HTTP API.
//!
//! Tests cover:
//! - Public endpoints without credentials
//! - Bearer token failures (missing, invalid, expired)
//! - Caller endpoints (me, navigation, dashboard)
//! - Guard evaluation over the wire
//! - Permission-gated and admin-gated routes
//! - Permission, route and hierarchy checks
//! - ApiResponse serialization

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use campus_core::api::{build_router, ApiResponse, AppState};
use campus_core::middleware::{AuthConfig, AuthLayer, Claims};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

fn app() -> Router {
    let auth = AuthLayer::from_config(AuthConfig {
        jwt_secret: SECRET.to_string(),
        ..AuthConfig::default()
    })
    .unwrap();
    build_router(AppState::builtin(), auth, &[])
}

fn mint(claims: &Claims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn token_for(role: &str) -> String {
    mint(
        &Claims::builder(format!("user-{}", role), role)
            .email(format!("{}@uni.edu", role))
            .name("Test", "User")
            .build(),
    )
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn get(path: &str, role: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(path);
    if let Some(role) = role {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(role)));
    }
    send(builder.body(Body::empty()).unwrap()).await
}

async fn post(path: &str, role: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(role)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(request).await
}

// ============================================================================
// Public Endpoints & Authentication
// ============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let (status, body) = get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let (status, body) = get("/api/v1/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let request = Request::builder()
        .uri("/api/v1/me")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let token = encode(
        &Header::default(),
        &Claims::builder("u1", "admin").build(),
        &EncodingKey::from_secret(b"some-other-secret"),
    )
    .unwrap();
    let request = Request::builder()
        .uri("/api/v1/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let mut claims = Claims::builder("u1", "lecturer").build();
    claims.iat -= 7200;
    claims.exp = claims.iat + 60;

    let request = Request::builder()
        .uri("/api/v1/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", mint(&claims)))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
}

// ============================================================================
// Caller Endpoints
// ============================================================================

#[tokio::test]
async fn test_me_reports_role_details() {
    let (status, body) = get("/api/v1/me", Some("hod")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["identity"]["role"], "hod");
    assert_eq!(data["identity"]["email"], "hod@uni.edu");
    assert_eq!(data["fullName"], "Test User");
    assert_eq!(data["displayName"], "Head of Department");
    assert_eq!(data["level"], 70);
    assert!(data["dashboardWidgets"].as_array().unwrap().len() > 0);
}

#[tokio::test]
async fn test_me_with_unknown_role_fails_closed() {
    let (status, body) = get("/api/v1/me", Some("visitor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], 0);
    assert!(body["data"]["displayName"].is_null());
    assert_eq!(body["data"]["dashboardWidgets"], json!([]));
}

#[tokio::test]
async fn test_navigation_for_student() {
    let (status, body) = get("/api/v1/navigation", Some("student")).await;
    assert_eq!(status, StatusCode::OK);

    let routes: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["route"].as_str())
        .collect();
    assert!(routes.contains(&"/my-results"));
    assert!(!routes.contains(&"/finance"));
}

#[tokio::test]
async fn test_dashboard_renders_role_widgets_in_order() {
    let (status, body) = get("/api/v1/dashboard", Some("student")).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|w| w["id"].as_str())
        .collect();
    assert_eq!(
        ids,
        vec!["my_courses", "my_results", "payment_status", "academic_calendar"]
    );
    for widget in body["data"].as_array().unwrap() {
        assert!(widget["title"].is_string());
        assert!(widget["data"].is_null());
    }
}

// ============================================================================
// Guard
// ============================================================================

#[tokio::test]
async fn test_guard_uses_caller_identity() {
    let (status, body) = post("/api/v1/guard", "lecturer", json!({ "path": "/results/upload" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "allow": true }));
}

#[tokio::test]
async fn test_guard_anonymous_redirects_to_login() {
    let (_, body) = post(
        "/api/v1/guard",
        "admin",
        json!({
            "path": "/finance",
            "isAuthenticated": false,
            "allowedRoles": ["finance_officer"],
            "requiredPermission": { "resource": "finance", "action": "manage_fees" }
        }),
    )
    .await;

    assert_eq!(
        body["data"],
        json!({
            "allow": false,
            "redirectTo": "/login",
            "returnTo": "/finance",
            "deniedBy": "authentication"
        })
    );
}

#[tokio::test]
async fn test_guard_permission_denial() {
    let (_, body) = post(
        "/api/v1/guard",
        "admin",
        json!({
            "currentRole": "finance_officer",
            "path": "/finance",
            "requiredPermission": { "resource": "courses", "action": "delete" }
        }),
    )
    .await;

    assert_eq!(body["data"]["allow"], false);
    assert_eq!(body["data"]["redirectTo"], "/unauthorized");
    assert_eq!(body["data"]["deniedBy"], "permission");
}

#[tokio::test]
async fn test_guard_denies_unnormalised_path() {
    for path in ["results", ""] {
        let (status, body) = post(
            "/api/v1/guard",
            "admin",
            json!({ "currentRole": "lecturer", "path": path }),
        )
        .await;

        assert_eq!(status, StatusCode::OK, "path {:?}", path);
        assert_eq!(body["data"]["allow"], false);
        assert_eq!(body["data"]["redirectTo"], "/unauthorized");
        assert_eq!(body["data"]["deniedBy"], "route_access");
    }
}

#[tokio::test]
async fn test_guard_anonymous_empty_path_goes_to_login() {
    let (status, body) = post(
        "/api/v1/guard",
        "admin",
        json!({ "path": "", "isAuthenticated": false }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["allow"], false);
    assert_eq!(body["data"]["redirectTo"], "/login");
    assert_eq!(body["data"]["deniedBy"], "authentication");
}

// ============================================================================
// Gated Routes
// ============================================================================

#[tokio::test]
async fn test_role_detail_requires_manage_roles() {
    let (status, body) = get("/api/v1/rbac/roles/lecturer", Some("lecturer")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_PERMISSIONS");
    assert_eq!(body["error"]["required"], "users:manage_roles");
    assert_eq!(body["error"]["current"], "lecturer");
}

#[tokio::test]
async fn test_role_detail_for_admin() {
    let (status, body) = get("/api/v1/rbac/roles/lecturer", Some("admin")).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["role"]["id"], "lecturer");
    assert_eq!(data["role"]["level"], 50);
    let results = data["effectivePermissions"]["results"].as_array().unwrap();
    assert!(results.contains(&json!("upload")));
    assert!(!results.contains(&json!("approve")));
    assert!(data["manageableRoles"]
        .as_array()
        .unwrap()
        .contains(&json!("student")));
}

#[tokio::test]
async fn test_role_detail_unknown_role() {
    let (status, body) = get("/api/v1/rbac/roles/bursar", Some("admin")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "ROLE_NOT_FOUND");
}

#[tokio::test]
async fn test_catalog_is_admin_only() {
    let (status, body) = get("/api/v1/rbac/catalog", Some("vice_chancellor")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["required"], "admin");
    assert_eq!(body["error"]["current"], "vice_chancellor");

    let (status, body) = get("/api/v1/rbac/catalog", Some("admin")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_list_roles() {
    let (status, body) = get("/api/v1/rbac/roles", Some("student")).await;
    assert_eq!(status, StatusCode::OK);

    let roles = body["data"].as_array().unwrap();
    assert_eq!(roles.len(), 12);
    assert!(roles
        .iter()
        .any(|r| r["id"] == "dean" && r["displayName"] == "Dean of Faculty"));
}

// ============================================================================
// Checks
// ============================================================================

#[tokio::test]
async fn test_permission_check_for_caller() {
    let (status, body) = post(
        "/api/v1/rbac/permissions/check",
        "lecturer",
        json!({ "permission": "results:upload" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "lecturer");
    assert_eq!(body["data"]["allowed"], true);
}

#[tokio::test]
async fn test_permission_check_denial_has_reason() {
    let (_, body) = post(
        "/api/v1/rbac/permissions/check",
        "admin",
        json!({ "role": "finance_officer", "permission": "courses:delete" }),
    )
    .await;
    assert_eq!(body["data"]["allowed"], false);
    assert!(body["data"]["reason"].is_string());
}

#[tokio::test]
async fn test_permission_check_rejects_bad_format() {
    let (status, body) = post(
        "/api/v1/rbac/permissions/check",
        "admin",
        json!({ "permission": "courses" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_route_check_boundary() {
    let (_, allowed) = post(
        "/api/v1/rbac/routes/check",
        "admin",
        json!({ "role": "registrar", "path": "/students/123" }),
    )
    .await;
    assert_eq!(allowed["data"]["allowed"], true);

    let (_, denied) = post(
        "/api/v1/rbac/routes/check",
        "admin",
        json!({ "role": "registrar", "path": "/students-old" }),
    )
    .await;
    assert_eq!(denied["data"]["allowed"], false);
}

#[tokio::test]
async fn test_manage_check() {
    let (status, body) = get("/api/v1/rbac/manage?manager=registrar&target=lecturer", Some("dean")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({ "allowed": true, "managerLevel": 75, "targetLevel": 50 })
    );

    let (_, body) = get("/api/v1/rbac/manage?manager=hod&target=hod", Some("dean")).await;
    assert_eq!(body["data"]["allowed"], false);
}

// ============================================================================
// ApiResponse
// ============================================================================

#[test]
fn test_api_response_skips_empty_fields() {
    let value = serde_json::to_value(ApiResponse::success(json!({ "id": 1 }))).unwrap();
    assert_eq!(value, json!({ "success": true, "data": { "id": 1 } }));

    let value =
        serde_json::to_value(ApiResponse::<()>::error_with_code("nope", "FORBIDDEN")).unwrap();
    assert_eq!(
        value,
        json!({ "success": false, "error": "nope", "error_code": "FORBIDDEN" })
    );
}
