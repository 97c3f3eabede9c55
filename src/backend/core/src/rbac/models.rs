//! RBAC data models: Resource, Permission, RequiredPermission, and Role.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The role id that short-circuits every permission and route check.
pub const ADMIN_ROLE: &str = "admin";

/// Route prefix granting unconditional access to every route.
pub const ROUTE_WILDCARD: &str = "*";

// ═══════════════════════════════════════════════════════════════════════════════
// Resource
// ═══════════════════════════════════════════════════════════════════════════════

/// A controllable domain object category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Users,
    Students,
    Staff,
    Courses,
    Departments,
    AcademicPlanning,
    Results,
    Finance,
    StudentAffairs,
    Mis,
    Examinations,
}

impl Resource {
    /// Canonical string form, as used in role payloads and permission strings.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Students => "students",
            Self::Staff => "staff",
            Self::Courses => "courses",
            Self::Departments => "departments",
            Self::AcademicPlanning => "academic_planning",
            Self::Results => "results",
            Self::Finance => "finance",
            Self::StudentAffairs => "student_affairs",
            Self::Mis => "mis",
            Self::Examinations => "examinations",
        }
    }

    /// Every resource, in catalog order.
    pub const fn all() -> [Resource; 11] {
        [
            Self::Users,
            Self::Students,
            Self::Staff,
            Self::Courses,
            Self::Departments,
            Self::AcademicPlanning,
            Self::Results,
            Self::Finance,
            Self::StudentAffairs,
            Self::Mis,
            Self::Examinations,
        ]
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a catalog resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown resource: {0}")]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// A resource together with the set of actions granted on it.
///
/// Action strings are only meaningful within their resource; `upload` on
/// `results` says nothing about `upload` anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub resource: Resource,
    pub actions: BTreeSet<String>,
}

impl Permission {
    pub fn new<I, S>(resource: Resource, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource,
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this entry grants `action` on `resource`.
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.resource.as_str() == resource && self.actions.contains(action)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Required Permission
// ═══════════════════════════════════════════════════════════════════════════════

/// A single `resource:action` pair that a caller needs.
///
/// Kept stringly so that checks against resources outside the catalog can be
/// expressed; such checks only ever pass for the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequiredPermission {
    pub resource: String,
    pub action: String,
}

impl RequiredPermission {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Parse `"finance:view_payments"`. Both halves must be non-empty.
    pub fn parse(s: &str) -> Option<Self> {
        let (resource, action) = s.split_once(':')?;
        if resource.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self::new(resource, action))
    }
}

impl fmt::Display for RequiredPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the policy table knows about one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Join key against an identity's `role` field.
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Authority level; strictly greater levels may manage lower ones.
    pub level: u32,
    /// May list the same resource more than once; entries are unioned.
    pub permissions: Vec<Permission>,
    pub allowed_route_prefixes: Vec<String>,
    /// Display order is table order.
    pub dashboard_widgets: Vec<String>,
}

impl Role {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        level: u32,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            description: description.into(),
            level,
            permissions: Vec::new(),
            allowed_route_prefixes: Vec::new(),
            dashboard_widgets: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_routes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_route_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_widgets<I, S>(mut self, widgets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dashboard_widgets = widgets.into_iter().map(Into::into).collect();
        self
    }

    /// Union scan over every permission entry.
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        self.permissions.iter().any(|p| p.allows(resource, action))
    }

    /// Existential prefix match. `P` authorizes `P` itself and anything below
    /// `P/`; a bare string prefix (`/students-old` vs `/students`) does not.
    ///
    /// Paths are not normalised: `"/students/"` as a prefix never matches.
    pub fn allows_route(&self, path: &str) -> bool {
        self.allowed_route_prefixes.iter().any(|prefix| {
            if prefix == ROUTE_WILDCARD {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some("") => true,
                Some(rest) => rest.starts_with('/'),
                None => false,
            }
        })
    }

    pub fn display_info(&self) -> RoleDisplayInfo {
        RoleDisplayInfo {
            display_name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Presentation-only subset of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDisplayInfo {
    pub display_name: String,
    pub description: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
