//! V1 API routes.

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::{handlers, AppState};
use crate::rbac::{PolicyEngine, RequireAdminLayer, RequirePermissionLayer, RequiredPermission};

/// V1 API prefix.
pub const V1_PREFIX: &str = "/api/v1";

/// Permission required to read a role's full definition.
pub fn role_detail_permission() -> RequiredPermission {
    RequiredPermission::new("users", "manage_roles")
}

/// Build the V1 API router.
///
/// Every route requires an authenticated caller (enforced by the auth layer
/// wrapping the whole router).
///
/// # Endpoints
///
/// ## Caller
/// - `GET /api/v1/me` - Identity, role display info, level and widgets
/// - `GET /api/v1/navigation` - Navigation menu for the caller's role
/// - `GET /api/v1/dashboard` - Rendered dashboard widgets
/// - `POST /api/v1/guard` - Route guard decision
///
/// ## RBAC
/// - `GET /api/v1/rbac/roles` - Role summaries
/// - `GET /api/v1/rbac/roles/:id` - Full role (requires `users:manage_roles`)
/// - `POST /api/v1/rbac/permissions/check` - Permission check
/// - `POST /api/v1/rbac/routes/check` - Route access check
/// - `GET /api/v1/rbac/manage` - Role hierarchy check
/// - `GET /api/v1/rbac/catalog` - Permission catalog (admin only)
pub fn v1_router(engine: PolicyEngine) -> Router<AppState> {
    Router::new()
        .route("/me", get(handlers::me))
        .route("/navigation", get(handlers::navigation))
        .route("/dashboard", get(handlers::dashboard))
        .route("/guard", post(handlers::evaluate_guard))
        .route("/rbac/roles", get(handlers::list_roles))
        .route(
            "/rbac/roles/:id",
            get(handlers::get_role).route_layer(RequirePermissionLayer::from_permission(
                engine,
                role_detail_permission(),
            )),
        )
        .route("/rbac/permissions/check", post(handlers::check_permission))
        .route("/rbac/routes/check", post(handlers::check_route))
        .route("/rbac/manage", get(handlers::check_manage))
        .route(
            "/rbac/catalog",
            get(handlers::get_catalog).route_layer(RequireAdminLayer),
        )
}

/// V1 API route constants for use in clients and documentation.
pub mod paths {
    pub const ME: &str = "/api/v1/me";
    pub const NAVIGATION: &str = "/api/v1/navigation";
    pub const DASHBOARD: &str = "/api/v1/dashboard";
    pub const GUARD: &str = "/api/v1/guard";

    pub const ROLES: &str = "/api/v1/rbac/roles";
    pub const ROLE: &str = "/api/v1/rbac/roles/:id";
    pub const PERMISSION_CHECK: &str = "/api/v1/rbac/permissions/check";
    pub const ROUTE_CHECK: &str = "/api/v1/rbac/routes/check";
    pub const MANAGE_CHECK: &str = "/api/v1/rbac/manage";
    pub const CATALOG: &str = "/api/v1/rbac/catalog";
}
