//! Policy engine for evaluating authorization decisions.
//!
//! The policy engine answers four questions about a role id:
//! "may it do action A on resource R?", "may it reach path P?",
//! "which widgets does it see?" and "may it manage role T?".
//!
//! Every predicate is pure and fail-closed: an unknown role, an unknown
//! resource or an unnormalised path yields the deny value (`false`, `0`, an
//! empty list, `None`), never a panic or an error.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::models::{RequiredPermission, Resource, RoleDisplayInfo, ADMIN_ROLE};
use super::roles::{PolicyTable, RolePolicy};

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from the policy engine's enforcing helpers.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid permission {0:?}: expected resource:action")]
    InvalidPermission(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The action is allowed.
    Allow,
    /// The action is denied, with a reason.
    Deny(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policy Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Evaluates authorization questions against a role policy.
///
/// Cheap to clone; the policy itself is shared and never mutated.
#[derive(Clone)]
pub struct PolicyEngine {
    policy: Arc<dyn RolePolicy>,
}

impl std::fmt::Debug for PolicyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyEngine")
            .field("roles", &self.policy.role_ids())
            .finish()
    }
}

impl PolicyEngine {
    /// Engine over an arbitrary policy source.
    pub fn new(policy: Arc<dyn RolePolicy>) -> Self {
        Self { policy }
    }

    /// Engine over the compiled-in table.
    pub fn builtin() -> Self {
        Self::from_table(PolicyTable::builtin().clone())
    }

    pub fn from_table(table: PolicyTable) -> Self {
        Self::new(Arc::new(table))
    }

    pub fn policy(&self) -> &dyn RolePolicy {
        self.policy.as_ref()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Predicates
    // ─────────────────────────────────────────────────────────────────────────

    /// Can `role` perform `action` on `resource`?
    ///
    /// `admin` is allowed everything regardless of table contents. Otherwise
    /// every permission entry of the role is consulted (union semantics).
    pub fn has_permission(&self, role: &str, resource: &str, action: &str) -> bool {
        if role == ADMIN_ROLE {
            return true;
        }
        match self.policy.role(role) {
            Some(r) => r.grants(resource, action),
            None => false,
        }
    }

    /// Can `role` navigate to `path`?
    ///
    /// Callers must pass canonical paths (no trailing slash); nothing is
    /// normalised here.
    pub fn can_access_route(&self, role: &str, path: &str) -> bool {
        let Some(r) = self.policy.role(role) else {
            return false;
        };
        role == ADMIN_ROLE || r.allows_route(path)
    }

    /// Widget ids for `role` in display order; empty if the role is unknown.
    pub fn dashboard_widgets(&self, role: &str) -> Vec<String> {
        self.policy
            .role(role)
            .map(|r| r.dashboard_widgets.clone())
            .unwrap_or_default()
    }

    /// Authority level of `role`, 0 if unknown.
    pub fn role_level(&self, role: &str) -> u32 {
        self.policy.role(role).map_or(0, |r| r.level)
    }

    /// Strictly greater level wins; equal levels (including self) never do.
    pub fn can_manage_role(&self, manager: &str, target: &str) -> bool {
        self.role_level(manager) > self.role_level(target)
    }

    pub fn role_display_info(&self, role: &str) -> Option<RoleDisplayInfo> {
        self.policy.role(role).map(|r| r.display_info())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Union of every permission entry of `role`, keyed by resource.
    ///
    /// Reports what the table lists; the admin bypass is not expanded here.
    pub fn effective_permissions(&self, role: &str) -> BTreeMap<Resource, BTreeSet<String>> {
        let mut out: BTreeMap<Resource, BTreeSet<String>> = BTreeMap::new();
        if let Some(r) = self.policy.role(role) {
            for perm in &r.permissions {
                out.entry(perm.resource)
                    .or_default()
                    .extend(perm.actions.iter().cloned());
            }
        }
        out
    }

    /// Role ids that `manager` may manage, in table order.
    pub fn manageable_roles(&self, manager: &str) -> Vec<String> {
        let level = self.role_level(manager);
        self.policy
            .role_ids()
            .into_iter()
            .filter(|id| self.role_level(id) < level)
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Decisions
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a single permission and explain a denial.
    pub fn check(&self, role: &str, permission: &RequiredPermission) -> PolicyDecision {
        if self.has_permission(role, &permission.resource, &permission.action) {
            debug!(role = %role, permission = %permission, "Permission granted");
            return PolicyDecision::Allow;
        }

        if self.policy.role(role).is_none() {
            return PolicyDecision::Deny(format!("Unknown role {}", role));
        }

        PolicyDecision::Deny(format!(
            "Role {} does not have permission {}",
            role, permission
        ))
    }

    /// Convenience: returns `Ok(())` if allowed, `Err(PolicyError)` if denied.
    pub fn enforce(&self, role: &str, permission: &RequiredPermission) -> Result<(), PolicyError> {
        if role != ADMIN_ROLE && self.policy.role(role).is_none() {
            return Err(PolicyError::RoleNotFound(role.to_string()));
        }
        match self.check(role, permission) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => Err(PolicyError::PermissionDenied(reason)),
        }
    }

    /// Check multiple permissions; returns `Allow` only if ALL are granted.
    pub fn check_all(&self, role: &str, permissions: &[RequiredPermission]) -> PolicyDecision {
        for perm in permissions {
            let decision = self.check(role, perm);
            if decision.is_denied() {
                return decision;
            }
        }
        PolicyDecision::Allow
    }

    /// Check multiple permissions; returns `Allow` if ANY is granted.
    pub fn check_any(&self, role: &str, permissions: &[RequiredPermission]) -> PolicyDecision {
        if permissions.iter().any(|p| self.check(role, p).is_allowed()) {
            return PolicyDecision::Allow;
        }
        PolicyDecision::Deny(format!(
            "Role {} has none of the required permissions",
            role
        ))
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Free functions over the compiled-in table
// ═══════════════════════════════════════════════════════════════════════════════

fn builtin_engine() -> &'static PolicyEngine {
    static ENGINE: std::sync::OnceLock<PolicyEngine> = std::sync::OnceLock::new();
    ENGINE.get_or_init(PolicyEngine::builtin)
}

pub fn has_permission(role: &str, resource: &str, action: &str) -> bool {
    builtin_engine().has_permission(role, resource, action)
}

pub fn can_access_route(role: &str, path: &str) -> bool {
    builtin_engine().can_access_route(role, path)
}

pub fn dashboard_widgets(role: &str) -> Vec<String> {
    builtin_engine().dashboard_widgets(role)
}

pub fn role_level(role: &str) -> u32 {
    builtin_engine().role_level(role)
}

pub fn can_manage_role(manager: &str, target: &str) -> bool {
    builtin_engine().can_manage_role(manager, target)
}

pub fn role_display_info(role: &str) -> Option<RoleDisplayInfo> {
    builtin_engine().role_display_info(role)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::models::{Permission, Role};

    fn perm(s: &str) -> RequiredPermission {
        RequiredPermission::parse(s).unwrap()
    }

    #[test]
    fn test_admin_allowed_everything() {
        let engine = PolicyEngine::builtin();
        assert!(engine.has_permission("admin", "finance", "manage_fees"));
        assert!(engine.has_permission("admin", "anything", "goes"));
        assert!(engine.can_access_route("admin", "/not/in/any/table"));
    }

    #[test]
    fn test_admin_bypass_independent_of_table() {
        // A table where "admin" exists but grants nothing and has no routes.
        let engine = PolicyEngine::from_table(PolicyTable::from_roles(vec![Role::new(
            "admin", "Admin", "", 1,
        )]));
        assert!(engine.has_permission("admin", "students", "delete"));
        assert!(engine.can_access_route("admin", "/students"));
    }

    #[test]
    fn test_unknown_role_denied() {
        let engine = PolicyEngine::builtin();
        assert!(!engine.has_permission("not_a_real_role", "students", "read"));
        assert!(!engine.can_access_route("not_a_real_role", "/dashboard"));
        assert!(engine.dashboard_widgets("not_a_real_role").is_empty());
        assert_eq!(engine.role_level("not_a_real_role"), 0);
        assert!(engine.role_display_info("not_a_real_role").is_none());
    }

    #[test]
    fn test_registrar_can_bulk_upload_students() {
        let engine = PolicyEngine::builtin();
        assert!(engine.has_permission("registrar", "students", "bulk_upload"));
        assert!(!engine.has_permission("registrar", "finance", "view_payments"));
    }

    #[test]
    fn test_hod_union_across_result_entries() {
        let engine = PolicyEngine::builtin();
        assert!(engine.has_permission("hod", "results", "update"));
        assert!(engine.has_permission("hod", "results", "approve"));
        assert!(!engine.has_permission("hod", "results", "publish"));
    }

    #[test]
    fn test_check_explains_denial() {
        let engine = PolicyEngine::builtin();
        assert!(engine.check("lecturer", &perm("results:upload")).is_allowed());

        match engine.check("lecturer", &perm("results:approve")) {
            PolicyDecision::Deny(reason) => assert!(reason.contains("results:approve")),
            PolicyDecision::Allow => panic!("lecturer must not approve results"),
        }

        match engine.check("ghost", &perm("results:read")) {
            PolicyDecision::Deny(reason) => assert!(reason.contains("Unknown role")),
            PolicyDecision::Allow => panic!("unknown role must be denied"),
        }
    }

    #[test]
    fn test_enforce() {
        let engine = PolicyEngine::builtin();
        assert!(engine.enforce("finance_officer", &perm("finance:manage_fees")).is_ok());
        assert!(matches!(
            engine.enforce("finance_officer", &perm("courses:delete")),
            Err(PolicyError::PermissionDenied(_))
        ));
        assert!(matches!(
            engine.enforce("ghost", &perm("courses:read")),
            Err(PolicyError::RoleNotFound(_))
        ));
        assert!(engine.enforce("admin", &perm("anything:goes")).is_ok());
    }

    #[test]
    fn test_check_all_and_any() {
        let engine = PolicyEngine::builtin();
        let both = [perm("results:upload"), perm("results:read")];
        assert!(engine.check_all("lecturer", &both).is_allowed());

        let mixed = [perm("results:upload"), perm("results:approve")];
        assert!(engine.check_all("lecturer", &mixed).is_denied());
        assert!(engine.check_any("lecturer", &mixed).is_allowed());

        let none = [perm("finance:manage_fees"), perm("users:delete")];
        assert!(engine.check_any("lecturer", &none).is_denied());
    }

    #[test]
    fn test_effective_permissions_unions() {
        let engine = PolicyEngine::from_table(PolicyTable::from_roles(vec![Role::new(
            "custom", "Custom", "", 1,
        )
        .with_permissions(vec![
            Permission::new(Resource::Students, ["read"]),
            Permission::new(Resource::Students, ["update"]),
        ])]));

        let effective = engine.effective_permissions("custom");
        let students = effective.get(&Resource::Students).unwrap();
        assert!(students.contains("read"));
        assert!(students.contains("update"));
        assert!(engine.effective_permissions("ghost").is_empty());
    }

    #[test]
    fn test_manageable_roles() {
        let engine = PolicyEngine::builtin();
        let hod = engine.manageable_roles("hod");
        assert!(hod.contains(&"lecturer".to_string()));
        assert!(hod.contains(&"student".to_string()));
        assert!(!hod.contains(&"hod".to_string()));
        assert!(!hod.contains(&"registrar".to_string()));

        assert!(engine.manageable_roles("student").is_empty());
        assert!(engine.manageable_roles("ghost").is_empty());
    }

    #[test]
    fn test_free_functions_use_builtin_table() {
        assert!(has_permission("lecturer", "results", "upload"));
        assert!(can_access_route("lecturer", "/academic-planning/calendar"));
        assert!(!can_access_route("lecturer", "/academic-planning"));
        assert_eq!(role_level("registrar"), 75);
        assert!(can_manage_role("registrar", "lecturer"));
        assert_eq!(dashboard_widgets("exam_officer")[0], "exam_schedule");
        assert_eq!(
            role_display_info("hod").unwrap().display_name,
            "Head of Department"
        );
    }
}
