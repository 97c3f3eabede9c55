//! Axum authorization middleware that enforces RBAC decisions on requests.
//!
//! Both layers read the `AuthContext` injected by the auth middleware:
//!
//! - [`RequirePermissionLayer`] asks the [`PolicyEngine`] about one
//!   `resource:action` pair, the same question the client-side guard asks.
//! - [`RequireAdminLayer`] is the coarse check: the role must be exactly
//!   `admin`. Use it only for endpoints that are admin-only by nature.

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use metrics::counter;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

use super::models::{RequiredPermission, ADMIN_ROLE};
use super::policy::{PolicyEngine, PolicyError};
use crate::middleware::auth::AuthContext;

// ═══════════════════════════════════════════════════════════════════════════════
// RBAC Context (extracted in handlers)
// ═══════════════════════════════════════════════════════════════════════════════

/// Inserted into request extensions once a permission check has passed, so
/// handlers can see what was verified without re-evaluating the policy.
#[derive(Debug, Clone)]
pub struct RbacContext {
    pub user_id: String,
    pub role: String,
    pub checked_permission: RequiredPermission,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RbacContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RbacContext>()
            .cloned()
            .ok_or_else(|| {
                let body = serde_json::json!({
                    "success": false,
                    "error": {
                        "code": "MISSING_RBAC_CONTEXT",
                        "message": "Authorization context not available. Ensure RBAC middleware is applied.",
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Require Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer requiring a single `resource:action` permission.
///
/// # Example
///
/// ```rust,ignore
/// use campus_core::rbac::{PolicyEngine, RequirePermissionLayer};
///
/// let app = Router::new()
///     .route("/api/v1/rbac/roles/:id", get(get_role))
///     .layer(RequirePermissionLayer::new(PolicyEngine::builtin(), "users:manage_roles")?);
/// ```
#[derive(Clone)]
pub struct RequirePermissionLayer {
    engine: PolicyEngine,
    permission: RequiredPermission,
}

impl RequirePermissionLayer {
    /// Create a layer from `"resource:action"`; both halves must be non-empty.
    pub fn new(engine: PolicyEngine, permission: &str) -> Result<Self, PolicyError> {
        let permission = RequiredPermission::parse(permission)
            .ok_or_else(|| PolicyError::InvalidPermission(permission.to_string()))?;
        Ok(Self { engine, permission })
    }

    pub fn from_permission(engine: PolicyEngine, permission: RequiredPermission) -> Self {
        Self { engine, permission }
    }

    pub fn permission(&self) -> &RequiredPermission {
        &self.permission
    }
}

impl<S> Layer<S> for RequirePermissionLayer {
    type Service = RequirePermissionService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequirePermissionService {
            inner,
            engine: self.engine.clone(),
            permission: self.permission.clone(),
        }
    }
}

/// Service that enforces a required permission per request.
#[derive(Clone)]
pub struct RequirePermissionService<S> {
    inner: S,
    engine: PolicyEngine,
    permission: RequiredPermission,
}

impl<S> Service<Request<Body>> for RequirePermissionService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let engine = self.engine.clone();
        let permission = self.permission.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(auth_ctx) = request.extensions().get::<AuthContext>().cloned() else {
                record_decision("permission", "unauthenticated");
                return Ok(unauthenticated_response());
            };

            let decision = engine.check(auth_ctx.role(), &permission);
            if decision.is_denied() {
                warn!(
                    user_id = %auth_ctx.user_id(),
                    role = %auth_ctx.role(),
                    permission = %permission,
                    "Permission denied"
                );
                record_decision("permission", "deny");
                return Ok(forbidden_response(&permission.to_string(), auth_ctx.role()));
            }

            record_decision("permission", "allow");
            request.extensions_mut().insert(RbacContext {
                user_id: auth_ctx.user_id().to_string(),
                role: auth_ctx.role().to_string(),
                checked_permission: permission,
            });

            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Require Admin
// ═══════════════════════════════════════════════════════════════════════════════

/// Layer admitting only the `admin` role.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAdminLayer;

impl<S> Layer<S> for RequireAdminLayer {
    type Service = RequireAdminService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireAdminService { inner }
    }
}

#[derive(Clone)]
pub struct RequireAdminService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequireAdminService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let role = match request.extensions().get::<AuthContext>() {
                Some(ctx) => ctx.role().to_string(),
                None => {
                    record_decision("admin", "unauthenticated");
                    return Ok(unauthenticated_response());
                }
            };

            if role != ADMIN_ROLE {
                warn!(role = %role, path = %request.uri().path(), "Admin access denied");
                record_decision("admin", "deny");
                return Ok(forbidden_response(ADMIN_ROLE, &role));
            }

            record_decision("admin", "allow");
            inner.call(request).await
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════════════════════════════════════════

fn record_decision(layer: &'static str, outcome: &'static str) {
    counter!(
        "campus_authz_decisions_total",
        "layer" => layer,
        "outcome" => outcome
    )
    .increment(1);
}

fn unauthenticated_response() -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "NOT_AUTHENTICATED",
            "message": "Authentication required",
        }
    });
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// 403 with what was required and what the caller holds.
fn forbidden_response(required: &str, current: &str) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": {
            "code": "INSUFFICIENT_PERMISSIONS",
            "message": "You do not have permission to perform this action",
            "required": required,
            "current": current,
        }
    });
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    fn ctx(role: &str) -> AuthContext {
        AuthContext {
            identity: Identity::new("u1", "u1@uni.edu", "Test", "User", role),
            request_id: "test-req".to_string(),
            expires_at: None,
        }
    }

    fn request(auth: Option<AuthContext>) -> Request<Body> {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        if let Some(auth) = auth {
            request.extensions_mut().insert(auth);
        }
        request
    }

    async fn checked_role(rbac: RbacContext) -> String {
        rbac.role
    }

    #[test]
    fn test_require_permission_layer_parse() {
        let layer =
            RequirePermissionLayer::new(PolicyEngine::builtin(), "results:approve").unwrap();
        assert_eq!(layer.permission().resource, "results");
        assert_eq!(layer.permission().action, "approve");
    }

    #[test]
    fn test_require_permission_layer_rejects_malformed() {
        for raw in ["users", "users:", ":read", ""] {
            let err = RequirePermissionLayer::new(PolicyEngine::builtin(), raw)
                .err()
                .unwrap();
            assert!(matches!(err, PolicyError::InvalidPermission(ref s) if s == raw));
        }
    }

    #[tokio::test]
    async fn test_permission_layer_statuses() {
        let app = Router::new()
            .route("/", get(checked_role))
            .layer(
                RequirePermissionLayer::new(PolicyEngine::builtin(), "results:approve").unwrap(),
            );

        let res = app.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app.clone().oneshot(request(Some(ctx("lecturer")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = app.clone().oneshot(request(Some(ctx("hod")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app.oneshot(request(Some(ctx("admin")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_layer_statuses() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(RequireAdminLayer);

        let res = app.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .clone()
            .oneshot(request(Some(ctx("vice_chancellor"))))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["required"], "admin");
        assert_eq!(body["error"]["current"], "vice_chancellor");

        let res = app.oneshot(request(Some(ctx("admin")))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
