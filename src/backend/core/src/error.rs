//! Error handling for the campus server.
//!
//! This module provides:
//! - A single error type carrying a stable, machine-readable code
//! - HTTP status code mapping for API responses
//! - User-facing messages kept apart from internal detail
//! - Logging and an error counter keyed by code
//!
//! # Usage
//!
//! ```rust,ignore
//! use campus_core::error::{CampusError, ErrorCode, ErrorContext, Result};
//!
//! fn load_role(id: &str) -> Result<Role> {
//!     table.get_role(id).cloned().with_error_code(ErrorCode::RoleNotFound)
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::rbac::policy::PolicyError;
use crate::session::SessionError;

/// A specialized Result type for campus operations.
pub type Result<T> = std::result::Result<T, CampusError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes for API responses.
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication (1000-1099)
    NotAuthenticated,
    InvalidToken,
    TokenExpired,

    // Authorization (1100-1199)
    InsufficientPermissions,
    Forbidden,
    PortalAccessDenied,

    // Lookup (1200-1299)
    RoleNotFound,
    NotFound,

    // Input (1300-1399)
    ValidationError,
    InvalidInput,
    SerializationError,
    DeserializationError,

    // Configuration (1400-1499)
    ConfigurationError,
    MissingConfiguration,
    InvalidConfiguration,

    // Generic (9000-9999)
    InternalError,
}

impl ErrorCode {
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::NotAuthenticated => 1000,
            Self::InvalidToken => 1001,
            Self::TokenExpired => 1002,

            Self::InsufficientPermissions => 1100,
            Self::Forbidden => 1101,
            Self::PortalAccessDenied => 1102,

            Self::RoleNotFound => 1200,
            Self::NotFound => 1201,

            Self::ValidationError => 1300,
            Self::InvalidInput => 1301,
            Self::SerializationError => 1302,
            Self::DeserializationError => 1303,

            Self::ConfigurationError => 1400,
            Self::MissingConfiguration => 1401,
            Self::InvalidConfiguration => 1402,

            Self::InternalError => 9000,
        }
    }

    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::NotAuthenticated | Self::InvalidToken | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            Self::InsufficientPermissions | Self::Forbidden | Self::PortalAccessDenied => {
                StatusCode::FORBIDDEN
            }

            Self::RoleNotFound | Self::NotFound => StatusCode::NOT_FOUND,

            Self::ValidationError | Self::InvalidInput | Self::DeserializationError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            Self::SerializationError
            | Self::ConfigurationError
            | Self::MissingConfiguration
            | Self::InvalidConfiguration
            | Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn category(&self) -> &'static str {
        match self {
            Self::NotAuthenticated | Self::InvalidToken | Self::TokenExpired => "authentication",
            Self::InsufficientPermissions | Self::Forbidden | Self::PortalAccessDenied => {
                "authorization"
            }
            Self::RoleNotFound | Self::NotFound => "lookup",
            Self::ValidationError
            | Self::InvalidInput
            | Self::SerializationError
            | Self::DeserializationError => "input",
            Self::ConfigurationError | Self::MissingConfiguration | Self::InvalidConfiguration => {
                "configuration"
            }
            Self::InternalError => "internal",
        }
    }

    /// Wire form, identical to the serde representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::Forbidden => "FORBIDDEN",
            Self::PortalAccessDenied => "PORTAL_ACCESS_DENIED",
            Self::RoleNotFound => "ROLE_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidInput => "INVALID_INPUT",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::DeserializationError => "DESERIALIZATION_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::MissingConfiguration => "MISSING_CONFIGURATION",
            Self::InvalidConfiguration => "INVALID_CONFIGURATION",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Severity
// ═══════════════════════════════════════════════════════════════════════════════

/// Error severity levels for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Expected client mistakes
    Low,
    /// Denials worth noticing
    Medium,
    /// Server-side failures
    High,
    /// The process cannot serve requests
    Critical,
}

impl ErrorSeverity {
    pub const fn from_code(code: &ErrorCode) -> Self {
        match code {
            ErrorCode::NotAuthenticated
            | ErrorCode::TokenExpired
            | ErrorCode::RoleNotFound
            | ErrorCode::NotFound
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput
            | ErrorCode::DeserializationError => Self::Low,

            ErrorCode::InvalidToken
            | ErrorCode::InsufficientPermissions
            | ErrorCode::Forbidden
            | ErrorCode::PortalAccessDenied => Self::Medium,

            ErrorCode::SerializationError | ErrorCode::InternalError => Self::High,

            ErrorCode::ConfigurationError
            | ErrorCode::MissingConfiguration
            | ErrorCode::InvalidConfiguration => Self::Critical,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Details
// ═══════════════════════════════════════════════════════════════════════════════

/// Additional structured details about an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// Related entity ID (role id, path, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Suggested action for resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_action = Some(suggestion.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.context.is_empty()
            && self.entity_id.is_none()
            && self.entity_type.is_none()
            && self.suggested_action.is_none()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for the campus server.
#[derive(Error, Debug)]
pub struct CampusError {
    code: ErrorCode,

    /// Safe to expose to clients
    user_message: Cow<'static, str>,

    /// For logs only
    internal_message: Option<String>,

    details: ErrorDetails,

    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for CampusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl CampusError {
    // ─────────────────────────────────────────────────────────────────────────
    // Constructors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        let error = Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            details: ErrorDetails::default(),
            source: None,
        };
        error.record_metrics();
        error
    }

    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Create an internal error (500).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An internal error occurred",
            message,
        )
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated, "Authentication required")
    }

    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// 403 naming what was required and what the caller holds.
    pub fn insufficient_permissions(required: impl Into<String>, current: impl Into<String>) -> Self {
        let required: String = required.into();
        let current: String = current.into();
        Self::new(
            ErrorCode::InsufficientPermissions,
            "You do not have permission to perform this action",
        )
        .with_context("required", required)
        .with_context("current", current)
    }

    pub fn role_not_found(role_id: impl Into<String>) -> Self {
        let role_id = role_id.into();
        Self::new(ErrorCode::RoleNotFound, format!("Role not found: {}", role_id))
            .with_details(ErrorDetails::new().with_entity("role", role_id))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_internal(
            ErrorCode::ConfigurationError,
            "Configuration error",
            message,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder Methods
    // ─────────────────────────────────────────────────────────────────────────

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_internal_message(mut self, message: impl Into<String>) -> Self {
        self.internal_message = Some(message.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.details.context.insert(key.into(), v);
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::from_code(&self.code)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────

    /// Log this error with appropriate severity.
    pub fn log(&self) {
        let code = self.code.as_str();
        let category = self.code.category();
        let status = self.http_status().as_u16();

        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    internal_message = ?self.internal_message,
                    source = ?self.source,
                    "Request failed"
                );
            }
            ErrorSeverity::Medium => {
                warn!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    "Request denied"
                );
            }
            ErrorSeverity::Low => {
                tracing::debug!(
                    error_code = %code,
                    category = category,
                    http_status = status,
                    user_message = %self.user_message,
                    "Request rejected"
                );
            }
        }
    }

    fn record_metrics(&self) {
        counter!(
            "campus_errors_total",
            "code" => self.code.as_str(),
            "category" => self.code.category(),
        )
        .increment(1);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response for API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false for errors
    pub success: bool,

    pub error: ErrorInfo,
}

/// Detailed error information for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,

    pub numeric_code: u32,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,

    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&CampusError> for ErrorResponse {
    fn from(error: &CampusError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                details: if error.details.is_empty() {
                    None
                } else {
                    Some(error.details.clone())
                },
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Integration
// ═══════════════════════════════════════════════════════════════════════════════

impl IntoResponse for CampusError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        let response = ErrorResponse::from(&self);

        (status, Json(response)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Error Context Extension Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;

    fn with_error_code(self, code: ErrorCode) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| CampusError::internal(message.into()).with_source(e))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.map_err(|e| CampusError::new(code, e.to_string()).with_source(e))
    }
}

impl<T> ErrorContext<T> for Option<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| CampusError::new(ErrorCode::NotFound, message.into()))
    }

    fn with_error_code(self, code: ErrorCode) -> Result<T> {
        self.ok_or_else(|| CampusError::new(code, "Resource not found"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// From Implementations
// ═══════════════════════════════════════════════════════════════════════════════

impl From<PolicyError> for CampusError {
    fn from(error: PolicyError) -> Self {
        match &error {
            PolicyError::RoleNotFound(role) => Self::role_not_found(role.clone()),
            PolicyError::PermissionDenied(reason) => Self::with_internal(
                ErrorCode::InsufficientPermissions,
                "You do not have permission to perform this action",
                reason.clone(),
            ),
            PolicyError::InvalidPermission(_) => Self::configuration(error.to_string()),
        }
    }
}

impl From<SessionError> for CampusError {
    fn from(error: SessionError) -> Self {
        Self::new(ErrorCode::PortalAccessDenied, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(error: serde_json::Error) -> Self {
        let code = if error.is_syntax() || error.is_data() || error.is_eof() {
            ErrorCode::DeserializationError
        } else {
            ErrorCode::SerializationError
        };

        Self::with_internal(code, "Failed to process JSON data", error.to_string())
            .with_source(error)
    }
}

impl From<std::io::Error> for CampusError {
    fn from(error: std::io::Error) -> Self {
        Self::with_internal(
            ErrorCode::InternalError,
            "An I/O error occurred",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<anyhow::Error> for CampusError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<CampusError>() {
            Ok(campus_error) => campus_error,
            Err(error) => Self::with_internal(
                ErrorCode::InternalError,
                "An internal error occurred",
                error.to_string(),
            ),
        }
    }
}

impl From<config::ConfigError> for CampusError {
    fn from(error: config::ConfigError) -> Self {
        let (code, user_msg) = match &error {
            config::ConfigError::NotFound(_) => (
                ErrorCode::MissingConfiguration,
                "Required configuration not found",
            ),
            config::ConfigError::PathParse(_) | config::ConfigError::FileParse { .. } => (
                ErrorCode::InvalidConfiguration,
                "Configuration file is invalid",
            ),
            _ => (ErrorCode::ConfigurationError, "Configuration error occurred"),
        };

        Self::with_internal(code, user_msg, error.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::NotAuthenticated.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::InsufficientPermissions.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ErrorCode::RoleNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::ValidationError.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_as_str_matches_serde() {
        for code in [
            ErrorCode::NotAuthenticated,
            ErrorCode::InsufficientPermissions,
            ErrorCode::PortalAccessDenied,
            ErrorCode::RoleNotFound,
            ErrorCode::InvalidConfiguration,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_role_not_found() {
        let error = CampusError::role_not_found("bursar");
        assert_eq!(error.code(), ErrorCode::RoleNotFound);
        assert_eq!(error.details().entity_id.as_deref(), Some("bursar"));
        assert!(error.user_message().contains("bursar"));
    }

    #[test]
    fn test_insufficient_permissions_context() {
        let error = CampusError::insufficient_permissions("admin", "dean");
        assert_eq!(error.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(error.details().context["required"], "admin");
        assert_eq!(error.details().context["current"], "dean");
    }

    #[test]
    fn test_error_response_serialization() {
        let error = CampusError::validation("Path must start with /");
        let response = ErrorResponse::from(&error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("VALIDATION_ERROR"));
        assert!(json.contains("Path must start with /"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_from_policy_error() {
        let error: CampusError = PolicyError::RoleNotFound("ghost".into()).into();
        assert_eq!(error.code(), ErrorCode::RoleNotFound);

        let error: CampusError = PolicyError::PermissionDenied("nope".into()).into();
        assert_eq!(error.code(), ErrorCode::InsufficientPermissions);
        assert_eq!(error.internal_message(), Some("nope"));

        let error: CampusError = PolicyError::InvalidPermission("users".into()).into();
        assert_eq!(error.code(), ErrorCode::ConfigurationError);
    }

    #[test]
    fn test_option_context() {
        let missing: Option<u8> = None;
        let error = missing.with_error_code(ErrorCode::RoleNotFound).unwrap_err();
        assert_eq!(error.code(), ErrorCode::RoleNotFound);
    }

    #[test]
    fn test_error_severity() {
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::ValidationError),
            ErrorSeverity::Low
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::InsufficientPermissions),
            ErrorSeverity::Medium
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::InternalError),
            ErrorSeverity::High
        );
        assert_eq!(
            ErrorSeverity::from_code(&ErrorCode::MissingConfiguration),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_error_display() {
        let error = CampusError::with_internal(
            ErrorCode::InternalError,
            "Something went wrong",
            "table index out of sync",
        );

        let display = format!("{}", error);
        assert!(display.contains("INTERNAL_ERROR"));
        assert!(display.contains("Something went wrong"));
        assert!(display.contains("table index out of sync"));
    }
}
