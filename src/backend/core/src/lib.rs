#![allow(clippy::result_large_err)]
//! # Campus Core
//!
//! Role-based access control for a university administration system.
//!
//! ## Architecture
//!
//! - **Permission Catalog**: Named `resource:action` groups
//! - **Role Policy Table**: Twelve built-in roles with levels, route prefixes and widgets
//! - **Authorization Evaluator**: Permission, route, widget and hierarchy queries
//! - **Route Guard**: Ordered allow/redirect decisions for navigation
//! - **Navigation Builder**: Per-role menu trees
//! - **Session**: Identity state with observable transitions
//! - **API**: Axum REST surface with JWT authentication and permission layers
//! - **Telemetry**: Structured logging and Prometheus metrics

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod rbac;
pub mod session;
pub mod telemetry;

pub use error::{CampusError, ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{CampusError, ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, Result};
    pub use crate::rbac::{
        build_navigation, GuardConfig, GuardDecision, GuardRequest, GuardStep, NavEntry,
        Permission, PolicyDecision, PolicyEngine, PolicyError, PolicyTable, Portal,
        PredefinedRole, RbacContext, RequireAdminLayer, RequirePermissionLayer,
        RequiredPermission, Resource, Role, RoleDisplayInfo, RolePolicy, RouteGuard,
    };
    pub use crate::session::{Identity, SessionError, SessionState, SessionStore};
    pub use crate::middleware::{AuthConfig, AuthContext, AuthError, AuthLayer, Claims};
    pub use crate::dashboard::{DashboardWidget, WidgetRegistry};
}
