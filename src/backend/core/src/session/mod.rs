//! Identity and session handling for the portals.

pub mod identity;
pub mod store;

pub use identity::{Identity, SessionState};
pub use store::{ListenerError, SessionError, SessionListener, SessionStore, SubscriptionId};
