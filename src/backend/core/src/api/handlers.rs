//! API request handlers.
//!
//! Handlers return `Result<impl IntoResponse, CampusError>` so that errors
//! are converted to HTTP responses by `CampusError`'s `IntoResponse`.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{ApiResponse, AppState};
use crate::error::{CampusError, ErrorCode};
use crate::middleware::auth::AuthContext;
use crate::rbac::{
    build_navigation, catalog, GuardRequest, RbacContext, RequiredPermission, Resource, Role,
};
use crate::session::Identity;
use crate::telemetry::record_guard_evaluation;

// ═══════════════════════════════════════════════════════════════════════════════
// Health & Metrics
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.metrics.render(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Caller
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub identity: Identity,
    pub full_name: String,
    /// `None` when the token names a role the table does not know.
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub level: u32,
    pub dashboard_widgets: Vec<String>,
}

pub async fn me(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
    let role = auth.role();
    let info = state.engine.role_display_info(role);

    Json(ApiResponse::success(MeResponse {
        full_name: auth.identity.full_name(),
        display_name: info.as_ref().map(|i| i.display_name.clone()),
        description: info.map(|i| i.description),
        level: state.engine.role_level(role),
        dashboard_widgets: state.engine.dashboard_widgets(role),
        identity: auth.identity,
    }))
}

pub async fn navigation(auth: AuthContext) -> impl IntoResponse {
    Json(ApiResponse::success(build_navigation(auth.role())))
}

/// Widget payloads are supplied by the services that own them; this endpoint
/// renders the caller's widget frames over an empty payload.
pub async fn dashboard(State(state): State<AppState>, auth: AuthContext) -> impl IntoResponse {
    let data = serde_json::json!({});
    let widgets = state
        .widgets
        .render_for_role(&state.engine, auth.role(), &data);
    Json(ApiResponse::success(widgets))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Guard
// ═══════════════════════════════════════════════════════════════════════════════

/// Guard request as sent over the wire. When neither `currentRole` nor
/// `isAuthenticated` is given, the caller's own identity is used.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardCheckRequest {
    #[serde(default)]
    pub current_role: Option<String>,
    #[serde(default)]
    pub is_authenticated: Option<bool>,
    pub path: String,
    #[serde(default)]
    pub required_permission: Option<RequiredPermission>,
    #[serde(default)]
    pub allowed_roles: Option<Vec<String>>,
}

impl GuardCheckRequest {
    fn into_guard_request(self, caller: &AuthContext) -> GuardRequest {
        let (current_role, is_authenticated) = match (self.current_role, self.is_authenticated) {
            (None, None) => (Some(caller.role().to_string()), true),
            (role, authenticated) => {
                let authenticated = authenticated.unwrap_or(role.is_some());
                (role, authenticated)
            }
        };

        GuardRequest {
            current_role,
            is_authenticated,
            path: self.path,
            required_permission: self.required_permission,
            allowed_roles: self.allowed_roles,
        }
    }
}

/// Always answers with a guard outcome; unnormalised paths are denied by the
/// guard itself.
pub async fn evaluate_guard(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<GuardCheckRequest>,
) -> impl IntoResponse {
    let request = req.into_guard_request(&auth);
    let decision = state.guard.evaluate(&request);
    let step = decision.step().map(|s| s.as_str());

    debug!(
        request_id = %auth.request_id,
        path = %request.path,
        role = ?request.current_role,
        allowed = decision.is_allowed(),
        step = ?step,
        "Guard evaluated"
    );
    record_guard_evaluation(decision.is_allowed(), step);

    Json(ApiResponse::success(decision.outcome()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Roles
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub level: u32,
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.clone(),
            display_name: role.display_name.clone(),
            description: role.description.clone(),
            level: role.level,
        }
    }
}

pub async fn list_roles(State(state): State<AppState>) -> impl IntoResponse {
    let policy = state.engine.policy();
    let roles: Vec<RoleSummary> = policy
        .role_ids()
        .iter()
        .filter_map(|id| policy.role(id))
        .map(RoleSummary::from)
        .collect();
    Json(ApiResponse::success(roles))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDetail {
    pub role: Role,
    pub effective_permissions: BTreeMap<Resource, BTreeSet<String>>,
    pub manageable_roles: Vec<String>,
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    rbac: RbacContext,
) -> Result<impl IntoResponse, CampusError> {
    let role = state
        .engine
        .policy()
        .role(&id)
        .cloned()
        .ok_or_else(|| CampusError::role_not_found(&id))?;

    debug!(
        user_id = %rbac.user_id,
        permission = %rbac.checked_permission,
        role_id = %id,
        "Role detail requested"
    );

    Ok(Json(ApiResponse::success(RoleDetail {
        effective_permissions: state.engine.effective_permissions(&id),
        manageable_roles: state.engine.manageable_roles(&id),
        role,
    })))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Checks
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct PermissionCheckRequest {
    /// Defaults to the caller's role.
    #[serde(default)]
    pub role: Option<String>,
    /// `"resource:action"`
    pub permission: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub role: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub async fn check_permission(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<PermissionCheckRequest>,
) -> Result<impl IntoResponse, CampusError> {
    let permission = RequiredPermission::parse(&req.permission).ok_or_else(|| {
        CampusError::new(
            ErrorCode::InvalidInput,
            "permission must look like resource:action",
        )
        .with_context("permission", &req.permission)
    })?;
    let role = req.role.unwrap_or_else(|| auth.role().to_string());

    let response = match state.engine.check(&role, &permission) {
        crate::rbac::PolicyDecision::Allow => CheckResponse {
            role,
            allowed: true,
            reason: None,
        },
        crate::rbac::PolicyDecision::Deny(reason) => CheckResponse {
            role,
            allowed: false,
            reason: Some(reason),
        },
    };

    Ok(Json(ApiResponse::success(response)))
}

#[derive(Debug, Deserialize)]
pub struct RouteCheckRequest {
    #[serde(default)]
    pub role: Option<String>,
    pub path: String,
}

pub async fn check_route(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<RouteCheckRequest>,
) -> impl IntoResponse {
    let role = req.role.unwrap_or_else(|| auth.role().to_string());
    let allowed = state.engine.can_access_route(&role, &req.path);
    Json(ApiResponse::success(CheckResponse {
        role,
        allowed,
        reason: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    pub manager: String,
    pub target: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageResponse {
    pub allowed: bool,
    pub manager_level: u32,
    pub target_level: u32,
}

pub async fn check_manage(
    State(state): State<AppState>,
    Query(query): Query<ManageQuery>,
) -> impl IntoResponse {
    Json(ApiResponse::success(ManageResponse {
        allowed: state.engine.can_manage_role(&query.manager, &query.target),
        manager_level: state.engine.role_level(&query.manager),
        target_level: state.engine.role_level(&query.target),
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Catalog
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogEntryDto {
    pub key: String,
    pub resource: Resource,
    pub actions: Vec<String>,
}

pub async fn get_catalog() -> impl IntoResponse {
    let entries: Vec<CatalogEntryDto> = catalog::all()
        .iter()
        .map(|e| CatalogEntryDto {
            key: e.key.to_string(),
            resource: e.resource,
            actions: e.actions.iter().map(|a| a.to_string()).collect(),
        })
        .collect();
    Json(ApiResponse::success(entries))
}
