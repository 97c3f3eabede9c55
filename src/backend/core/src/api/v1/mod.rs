//! V1 API module.
//!
//! Stable endpoints for:
//! - The caller's identity, navigation and dashboard
//! - Route guard decisions
//! - Role, permission and hierarchy queries

pub mod routes;

pub use routes::{v1_router, V1_PREFIX};
