//! Role-Based Access Control for the campus portals.
//!
//! This module provides:
//! - **Catalog**: every resource and the actions defined on it
//! - **Roles**: the compiled-in policy table of university roles
//! - **Policy Engine**: permission, route, widget and hierarchy questions
//! - **Guard**: the per-navigation allow/redirect decision
//! - **Navigation**: role-specific menus (presentation only)
//! - **Authorization Middleware**: tower layers for request-level checks
//!
//! # Usage
//!
//! ```rust,ignore
//! use campus_core::rbac::{GuardRequest, PolicyEngine, RouteGuard};
//!
//! let engine = PolicyEngine::builtin();
//! assert!(engine.has_permission("lecturer", "results", "upload"));
//!
//! let guard = RouteGuard::new(engine, Default::default());
//! let decision = guard.evaluate(&GuardRequest::authenticated("student", "/finance"));
//! assert_eq!(decision.redirect_to(), Some("/unauthorized"));
//! ```

pub mod catalog;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod policy;
pub mod roles;

pub use catalog::CatalogEntry;
pub use guard::{
    GuardConfig, GuardDecision, GuardOutcome, GuardRequest, GuardStep, Portal, RouteGuard,
};
pub use middleware::{
    RbacContext, RequireAdminLayer, RequireAdminService, RequirePermissionLayer,
    RequirePermissionService,
};
pub use models::{
    Permission, RequiredPermission, Resource, Role, RoleDisplayInfo, ADMIN_ROLE, ROUTE_WILDCARD,
};
pub use navigation::{build_navigation, NavEntry};
pub use policy::{
    can_access_route, can_manage_role, dashboard_widgets, has_permission, role_display_info,
    role_level, PolicyDecision, PolicyEngine, PolicyError,
};
pub use roles::{PolicyTable, PredefinedRole, RolePolicy};
