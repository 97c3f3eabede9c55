//! Tests for the route guard and portal entry rules.
//!
//! Tests cover:
//! - Fixed check order (authentication, allow-list, route, permission)
//! - Skipped checks when allow-list or permission are absent
//! - Redirect targets and the remembered return location
//! - Custom guard configuration
//! - Wire form of guard decisions
//! - Portal admission

use campus_core::rbac::{
    GuardConfig, GuardDecision, GuardRequest, GuardStep, Portal, PolicyEngine, RequiredPermission,
    RouteGuard,
};
use serde_json::json;

fn guard() -> RouteGuard {
    RouteGuard::default()
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_unauthenticated_goes_to_login_before_other_checks() {
    let request = GuardRequest::anonymous("/finance/payments")
        .with_allowed_roles(["finance_officer"])
        .with_permission(RequiredPermission::new("finance", "process_payments"));

    let decision = guard().evaluate(&request);
    assert_eq!(decision.redirect_to(), Some("/login"));
    assert_eq!(decision.return_to(), Some("/finance/payments"));
    assert_eq!(decision.step(), Some(GuardStep::Authentication));
}

#[test]
fn test_authenticated_flag_without_role_is_unauthenticated() {
    let request = GuardRequest {
        current_role: None,
        is_authenticated: true,
        path: "/dashboard".into(),
        required_permission: None,
        allowed_roles: None,
    };
    assert_eq!(guard().evaluate(&request).step(), Some(GuardStep::Authentication));
}

#[test]
fn test_allow_list_checked_before_route() {
    // Student cannot reach /finance either, but the allow-list fails first.
    let request = GuardRequest::authenticated("student", "/finance").with_allowed_roles(["admin"]);
    let decision = guard().evaluate(&request);
    assert_eq!(decision.step(), Some(GuardStep::RoleAllowList));
    assert_eq!(decision.redirect_to(), Some("/unauthorized"));
    assert_eq!(decision.return_to(), None);
}

#[test]
fn test_route_checked_before_permission() {
    let request = GuardRequest::authenticated("student", "/finance")
        .with_permission(RequiredPermission::new("finance", "manage_fees"));
    assert_eq!(guard().evaluate(&request).step(), Some(GuardStep::RouteAccess));
}

#[test]
fn test_permission_step() {
    let request = GuardRequest::authenticated("lecturer", "/results/approval")
        .with_permission(RequiredPermission::new("results", "approve"));
    let decision = guard().evaluate(&request);
    assert_eq!(decision.step(), Some(GuardStep::Permission));
    assert_eq!(decision.redirect_to(), Some("/unauthorized"));
}

#[test]
fn test_finance_officer_course_deletion_denied() {
    let request = GuardRequest::authenticated("finance_officer", "/finance")
        .with_permission(RequiredPermission::new("courses", "delete"));
    let decision = guard().evaluate(&request);

    assert!(!decision.is_allowed());
    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        json!({ "allow": false, "redirectTo": "/unauthorized", "deniedBy": "permission" })
    );
}

// ============================================================================
// Allow
// ============================================================================

#[test]
fn test_absent_checks_are_skipped() {
    let decision = guard().evaluate(&GuardRequest::authenticated("lecturer", "/results/upload"));
    assert_eq!(decision, GuardDecision::Allow);
}

#[test]
fn test_all_checks_pass() {
    let request = GuardRequest::authenticated("lecturer", "/results/upload")
        .with_allowed_roles(["lecturer", "hod"])
        .with_permission(RequiredPermission::new("results", "upload"));
    let decision = guard().evaluate(&request);
    assert!(decision.is_allowed());
    assert_eq!(serde_json::to_value(&decision).unwrap(), json!({ "allow": true }));
}

#[test]
fn test_admin_passes_unknown_permission() {
    let request = GuardRequest::authenticated("admin", "/anything/at/all")
        .with_permission(RequiredPermission::new("library", "borrow"));
    assert!(guard().evaluate(&request).is_allowed());
}

#[test]
fn test_unknown_role_is_denied_not_sent_to_login() {
    let decision = guard().evaluate(&GuardRequest::authenticated("visitor", "/dashboard"));
    assert_eq!(decision.step(), Some(GuardStep::RouteAccess));
    assert_eq!(decision.redirect_to(), Some("/unauthorized"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_custom_redirect_paths() {
    let guard = RouteGuard::new(
        PolicyEngine::builtin(),
        GuardConfig {
            login_path: "/auth/sign-in".into(),
            fallback_path: "/403".into(),
        },
    );

    let anon = guard.evaluate(&GuardRequest::anonymous("/results"));
    assert_eq!(anon.redirect_to(), Some("/auth/sign-in"));

    let denied = guard.evaluate(&GuardRequest::authenticated("student", "/finance"));
    assert_eq!(denied.redirect_to(), Some("/403"));
}

#[test]
fn test_guard_request_wire_form() {
    let request: GuardRequest = serde_json::from_value(json!({
        "currentRole": "hod",
        "isAuthenticated": true,
        "path": "/courses",
        "requiredPermission": { "resource": "courses", "action": "assign_lecturers" },
        "allowedRoles": ["hod", "dean"]
    }))
    .unwrap();

    assert!(guard().evaluate(&request).is_allowed());
}

// ============================================================================
// Portals
// ============================================================================

#[test]
fn test_portal_admission() {
    assert!(Portal::Student.admits("student"));
    assert!(!Portal::Student.admits("lecturer"));
    assert!(Portal::Admin.admits("registrar"));
    assert!(!Portal::Admin.admits("student"));
    assert!(!Portal::Admin.admits("visitor"));
}

#[test]
fn test_portal_entry_roles_partition() {
    let admin = Portal::Admin.entry_roles();
    let student = Portal::Student.entry_roles();
    assert_eq!(student, vec!["student".to_string()]);
    assert_eq!(admin.len(), 11);
    assert!(!admin.contains(&"student".to_string()));
}
