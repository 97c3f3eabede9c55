//! Route guard: decides whether a navigation may proceed or where to redirect.
//!
//! Checks run in a fixed order and the first failing one decides:
//!
//! 1. authentication (redirect to the login path, remembering where we were)
//! 2. explicit role allow-list
//! 3. route prefix access
//! 4. explicit `resource:action` permission
//!
//! A check whose input is absent is skipped, never treated as a denial.

use serde::{Deserialize, Serialize};

use super::models::RequiredPermission;
use super::policy::PolicyEngine;
use super::roles::PredefinedRole;

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_fallback_path() -> String {
    "/unauthorized".to_string()
}

/// Redirect targets used by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            fallback_path: default_fallback_path(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request / Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the guard looks at for one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardRequest {
    #[serde(default)]
    pub current_role: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
    pub path: String,
    #[serde(default)]
    pub required_permission: Option<RequiredPermission>,
    #[serde(default)]
    pub allowed_roles: Option<Vec<String>>,
}

impl GuardRequest {
    /// Request for an authenticated caller holding `role`.
    pub fn authenticated(role: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            current_role: Some(role.into()),
            is_authenticated: true,
            path: path.into(),
            required_permission: None,
            allowed_roles: None,
        }
    }

    /// Request for a caller with no session.
    pub fn anonymous(path: impl Into<String>) -> Self {
        Self {
            current_role: None,
            is_authenticated: false,
            path: path.into(),
            required_permission: None,
            allowed_roles: None,
        }
    }

    pub fn with_permission(mut self, permission: RequiredPermission) -> Self {
        self.required_permission = Some(permission);
        self
    }

    pub fn with_allowed_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_roles = Some(roles.into_iter().map(Into::into).collect());
        self
    }
}

/// Which check produced a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardStep {
    Authentication,
    RoleAllowList,
    RouteAccess,
    Permission,
}

impl GuardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::RoleAllowList => "role_allow_list",
            Self::RouteAccess => "route_access",
            Self::Permission => "permission",
        }
    }
}

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect {
        to: String,
        /// Only set for the login redirect.
        return_to: Option<String>,
        step: GuardStep,
    },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Redirect { to, .. } => Some(to),
        }
    }

    pub fn return_to(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Redirect { return_to, .. } => return_to.as_deref(),
        }
    }

    pub fn step(&self) -> Option<GuardStep> {
        match self {
            Self::Allow => None,
            Self::Redirect { step, .. } => Some(*step),
        }
    }

    /// Wire form: `{ "allow": true }` or
    /// `{ "allow": false, "redirectTo": ..., "returnTo": ... }`.
    pub fn outcome(&self) -> GuardOutcome {
        match self {
            Self::Allow => GuardOutcome {
                allow: true,
                redirect_to: None,
                return_to: None,
                denied_by: None,
            },
            Self::Redirect {
                to,
                return_to,
                step,
            } => GuardOutcome {
                allow: false,
                redirect_to: Some(to.clone()),
                return_to: return_to.clone(),
                denied_by: Some(*step),
            },
        }
    }
}

/// Serialised guard decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardOutcome {
    pub allow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_by: Option<GuardStep>,
}

impl Serialize for GuardDecision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.outcome().serialize(serializer)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Route Guard
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless guard over a policy engine.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    engine: PolicyEngine,
    config: GuardConfig,
}

impl RouteGuard {
    pub fn new(engine: PolicyEngine, config: GuardConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    pub fn evaluate(&self, request: &GuardRequest) -> GuardDecision {
        let role = match (&request.current_role, request.is_authenticated) {
            (Some(role), true) => role.as_str(),
            _ => {
                return GuardDecision::Redirect {
                    to: self.config.login_path.clone(),
                    return_to: Some(request.path.clone()),
                    step: GuardStep::Authentication,
                }
            }
        };

        if let Some(allowed) = &request.allowed_roles {
            if !allowed.iter().any(|r| r == role) {
                return self.deny(GuardStep::RoleAllowList);
            }
        }

        if !self.engine.can_access_route(role, &request.path) {
            return self.deny(GuardStep::RouteAccess);
        }

        if let Some(perm) = &request.required_permission {
            if !self
                .engine
                .has_permission(role, &perm.resource, &perm.action)
            {
                return self.deny(GuardStep::Permission);
            }
        }

        GuardDecision::Allow
    }

    fn deny(&self, step: GuardStep) -> GuardDecision {
        GuardDecision::Redirect {
            to: self.config.fallback_path.clone(),
            return_to: None,
            step,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Portal
// ═══════════════════════════════════════════════════════════════════════════════

/// A front-end application and the roles allowed to enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    /// Staff-facing portal: every predefined role except `student`.
    Admin,
    /// Student-facing portal: `student` only.
    Student,
}

impl Portal {
    pub fn entry_roles(&self) -> Vec<String> {
        PredefinedRole::all()
            .into_iter()
            .filter(|r| match self {
                Self::Admin => *r != PredefinedRole::Student,
                Self::Student => *r == PredefinedRole::Student,
            })
            .map(|r| r.id().to_string())
            .collect()
    }

    pub fn admits(&self, role: &str) -> bool {
        match PredefinedRole::from_id(role) {
            Some(PredefinedRole::Student) => *self == Self::Student,
            Some(_) => *self == Self::Admin,
            None => false,
        }
    }

    pub fn home_path(&self) -> &'static str {
        "/dashboard"
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }
}

impl std::fmt::Display for Portal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
