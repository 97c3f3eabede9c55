//! HTTP middleware.
//!
//! Bearer-token authentication lives here; permission and admin gating
//! layers live next to the evaluator in [`crate::rbac::middleware`].

pub mod auth;

pub use auth::{
    AuthConfig, AuthContext, AuthError, AuthLayer, AuthService, Authenticator, Claims,
    ClaimsBuilder, REQUEST_ID_HEADER,
};
