//! REST API over the authorization core.
//!
//! `/health` and `/metrics` are public; everything under `/api/v1` passes
//! through the bearer-token auth layer first.

mod handlers;
pub mod v1;

pub use handlers::{
    CatalogEntryDto, CheckResponse, GuardCheckRequest, ManageResponse, MeResponse, RoleDetail,
    RoleSummary,
};

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::dashboard::WidgetRegistry;
use crate::middleware::auth::AuthLayer;
use crate::rbac::{GuardConfig, PolicyEngine, RouteGuard};
use crate::telemetry::MetricsRegistry;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: PolicyEngine,
    pub guard: RouteGuard,
    pub widgets: Arc<WidgetRegistry>,
    pub metrics: MetricsRegistry,
}

impl AppState {
    pub fn new(engine: PolicyEngine, guard_config: GuardConfig, metrics: MetricsRegistry) -> Self {
        Self {
            guard: RouteGuard::new(engine.clone(), guard_config),
            engine,
            widgets: Arc::new(WidgetRegistry::with_defaults()),
            metrics,
        }
    }

    /// Built-in policy table, default guard paths, metrics disabled.
    pub fn builtin() -> Self {
        Self::new(
            PolicyEngine::builtin(),
            GuardConfig::default(),
            MetricsRegistry::disabled(),
        )
    }
}

/// Build the API router.
///
/// `cors_origins` empty allows any origin.
///
/// # Example
///
/// ```rust,ignore
/// let auth = AuthLayer::from_config(config.auth.clone())?;
/// let app = build_router(AppState::builtin(), auth, &[]);
/// ```
pub fn build_router(state: AppState, auth: AuthLayer, cors_origins: &[String]) -> Router {
    let origins: Vec<_> = cors_origins
        .iter()
        .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::prometheus_metrics))
        .nest(v1::V1_PREFIX, v1::v1_router(state.engine.clone()))
        .layer(auth)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// API response wrapper.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_code: None,
        }
    }

    pub fn error_with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_code: Some(code.into()),
        }
    }

    pub fn from_campus_error(err: &crate::error::CampusError) -> Self {
        Self::error_with_code(err.user_message(), err.code().as_str())
    }
}
