//! Bearer-token authentication middleware.
//!
//! Tokens are issued elsewhere; this layer only verifies them (HS256 shared
//! secret, optional issuer) and turns the claims into an [`Identity`] that
//! downstream layers and handlers read from request extensions.
//!
//! # Example
//!
//! ```rust,ignore
//! use campus_core::middleware::auth::{AuthConfig, AuthLayer};
//!
//! let layer = AuthLayer::from_config(AuthConfig {
//!     jwt_secret: "shared-secret".into(),
//!     ..Default::default()
//! })?;
//!
//! let app = Router::new()
//!     .route("/api/v1/me", get(me))
//!     .layer(layer);
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use thiserror::Error;
use tower::{Layer, Service};
use tracing::debug;
use uuid::Uuid;

use crate::session::Identity;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

// ═══════════════════════════════════════════════════════════════════════════════
// Error Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication credentials")]
    MissingCredentials,

    #[error("Invalid authentication token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication misconfigured: {0}")]
    Configuration(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "NOT_AUTHENTICATED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::MissingCredentials => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "The provided token is invalid"),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "The authentication token has expired",
            ),
            Self::Configuration(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An authentication error occurred",
            ),
        };
        let code = self.code();

        counter!("campus_auth_failures_total", "reason" => code).increment(1);

        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JWT Claims
// ═══════════════════════════════════════════════════════════════════════════════

/// JWT token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// Policy table role id
    pub role: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Claims builder, mostly for minting tokens in tests and tooling.
    pub fn builder(user_id: impl Into<String>, role: impl Into<String>) -> ClaimsBuilder {
        ClaimsBuilder::new(user_id, role)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.clone(),
        }
    }
}

/// Builder for JWT claims.
pub struct ClaimsBuilder {
    claims: Claims,
}

impl ClaimsBuilder {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            claims: Claims {
                sub: user_id.into(),
                email: String::new(),
                first_name: String::new(),
                last_name: String::new(),
                role: role.into(),
                iat: now.timestamp(),
                exp: (now + Duration::hours(1)).timestamp(),
                iss: None,
            },
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.claims.email = email.into();
        self
    }

    pub fn name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.claims.first_name = first.into();
        self.claims.last_name = last.into();
        self
    }

    pub fn expires_in(mut self, duration: Duration) -> Self {
        self.claims.exp = (Utc::now() + duration).timestamp();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.claims.iss = Some(issuer.into());
        self
    }

    pub fn build(self) -> Claims {
        self.claims
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════════════════════════════════════════

fn default_leeway_secs() -> u64 {
    30
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

/// Authentication configuration (`[auth]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret. Required.
    #[serde(default)]
    pub jwt_secret: String,

    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Leeway for expiration checks (in seconds)
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    /// Exact paths, or prefixes ending in `*`, that skip authentication.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: None,
            leeway_secs: default_leeway_secs(),
            public_paths: default_public_paths(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authentication Context
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication context attached to requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub identity: Identity,

    /// Request ID for correlation
    pub request_id: String,

    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims, request_id: String) -> Self {
        Self {
            identity: claims.identity(),
            request_id,
            expires_at: claims.expires_at(),
        }
    }

    pub fn role(&self) -> &str {
        &self.identity.role
    }

    pub fn user_id(&self) -> &str {
        &self.identity.id
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Authenticator
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies bearer tokens.
pub struct Authenticator {
    config: AuthConfig,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        if config.jwt_secret.is_empty() {
            return Err(AuthError::Configuration(
                "JWT secret must not be empty".into(),
            ));
        }

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            config,
            decoding_key,
            validation,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check if a path is public (doesn't require auth).
    pub fn is_public_path(&self, path: &str) -> bool {
        self.config.public_paths.iter().any(|p| match p.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == p,
        })
    }

    /// Authenticate a request from its headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthError> {
        let token = extract_bearer(headers).ok_or(AuthError::MissingCredentials)?;
        let claims = self.verify(token)?;
        Ok(AuthContext::from_claims(&claims, request_id(headers)))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("JWT validation failed: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tower Layer and Service
// ═══════════════════════════════════════════════════════════════════════════════

/// Authentication layer for Tower.
#[derive(Clone)]
pub struct AuthLayer {
    authenticator: Arc<Authenticator>,
}

impl AuthLayer {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    pub fn from_config(config: AuthConfig) -> Result<Self, AuthError> {
        let authenticator = Authenticator::new(config)?;
        Ok(Self::new(Arc::new(authenticator)))
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    authenticator: Arc<Authenticator>,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if authenticator.is_public_path(request.uri().path()) {
                return inner.call(request).await;
            }

            match authenticator.authenticate(request.headers()) {
                Ok(auth_context) => {
                    request.extensions_mut().insert(auth_context);
                    inner.call(request).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Axum Extractor
// ═══════════════════════════════════════════════════════════════════════════════

/// Extractor for authentication context in handlers.
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::MissingCredentials)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-key-for-testing-only";

    fn authenticator() -> Authenticator {
        Authenticator::new(AuthConfig {
            jwt_secret: SECRET.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn mint(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_claims_builder() {
        let claims = Claims::builder("u1", "lecturer")
            .email("ada@uni.edu")
            .name("Ada", "Obi")
            .expires_in(Duration::hours(24))
            .build();

        assert_eq!(claims.sub, "u1");
        assert!(!claims.is_expired());
        let identity = claims.identity();
        assert_eq!(identity.role, "lecturer");
        assert_eq!(identity.full_name(), "Ada Obi");
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            Authenticator::new(AuthConfig::default()),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_public_paths() {
        let auth = Authenticator::new(AuthConfig {
            jwt_secret: SECRET.to_string(),
            public_paths: vec!["/health".to_string(), "/public/*".to_string()],
            ..Default::default()
        })
        .unwrap();

        assert!(auth.is_public_path("/health"));
        assert!(auth.is_public_path("/public/docs"));
        assert!(!auth.is_public_path("/healthz"));
        assert!(!auth.is_public_path("/api/v1/me"));
    }

    #[test]
    fn test_valid_token_produces_identity() {
        let claims = Claims::builder("u1", "registrar").build();
        let mut headers = bearer(&mint(&claims, SECRET));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));

        let ctx = authenticator().authenticate(&headers).unwrap();
        assert_eq!(ctx.role(), "registrar");
        assert_eq!(ctx.user_id(), "u1");
        assert_eq!(ctx.request_id, "req-1");
        assert!(ctx.expires_at.is_some());
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            authenticator().authenticate(&HeaderMap::new()),
            Err(AuthError::MissingCredentials)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let claims = Claims::builder("u1", "student").build();
        let headers = bearer(&mint(&claims, "another-secret"));
        assert!(matches!(
            authenticator().authenticate(&headers),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let claims = Claims::builder("u1", "student")
            .expires_in(Duration::hours(-2))
            .build();
        let headers = bearer(&mint(&claims, SECRET));
        assert!(matches!(
            authenticator().authenticate(&headers),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_issuer_enforced() {
        let auth = Authenticator::new(AuthConfig {
            jwt_secret: SECRET.to_string(),
            issuer: Some("campus-idp".to_string()),
            ..Default::default()
        })
        .unwrap();

        let wrong = Claims::builder("u1", "dean").issuer("elsewhere").build();
        assert!(auth.verify(&mint(&wrong, SECRET)).is_err());

        let right = Claims::builder("u1", "dean").issuer("campus-idp").build();
        assert_eq!(auth.verify(&mint(&right, SECRET)).unwrap().role, "dean");
    }
}
