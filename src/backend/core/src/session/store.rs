//! Portal session store with change listeners.
//!
//! Transitions are serialised: each one stores the new state and notifies
//! listeners in registration order, on the caller's stack, before the next
//! transition starts. A listener may itself trigger a transition on the same
//! thread. A listener returning an error is logged and skipped; the remaining
//! listeners still run.

use parking_lot::{ReentrantMutex, RwLock};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::identity::{Identity, SessionState};
use crate::rbac::guard::{GuardRequest, Portal};

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Role {role} may not sign in to the {portal} portal")]
    PortalAccessDenied { role: String, portal: Portal },
}

/// Returned by a listener that could not handle a state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Session listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Listeners
// ═══════════════════════════════════════════════════════════════════════════════

/// Observer of session state changes.
pub trait SessionListener: Send + Sync {
    fn on_change(&self, state: &SessionState) -> Result<(), ListenerError>;
}

impl<F> SessionListener for F
where
    F: Fn(&SessionState) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_change(&self, state: &SessionState) -> Result<(), ListenerError> {
        self(state)
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Arc<dyn SessionListener>)>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Store
// ═══════════════════════════════════════════════════════════════════════════════

/// Session state for one portal.
pub struct SessionStore {
    portal: Portal,
    state: RwLock<SessionState>,
    listeners: RwLock<Listeners>,
    transitions: ReentrantMutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("portal", &self.portal)
            .field("state", &*self.state.read())
            .field("listeners", &self.listeners.read().entries.len())
            .finish()
    }
}

impl SessionStore {
    pub fn new(portal: Portal) -> Self {
        Self {
            portal,
            state: RwLock::new(SessionState::Uninitialized),
            listeners: RwLock::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
            transitions: ReentrantMutex::new(()),
        }
    }

    pub fn portal(&self) -> Portal {
        self.portal
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.read().identity().cloned()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn subscribe<L>(&self, listener: L) -> SubscriptionId
    where
        L: SessionListener + 'static,
    {
        let mut listeners = self.listeners.write();
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.entries.len();
        listeners.entries.retain(|(sid, _)| *sid != id);
        listeners.entries.len() != before
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign in. Roles outside the portal's entry set are rejected and leave
    /// the store unauthenticated.
    pub fn login(&self, identity: Identity) -> Result<(), SessionError> {
        if !self.portal.admits(&identity.role) {
            warn!(
                portal = %self.portal,
                user_id = %identity.id,
                role = %identity.role,
                "Portal access denied"
            );
            self.transition(SessionState::Unauthenticated);
            return Err(SessionError::PortalAccessDenied {
                role: identity.role,
                portal: self.portal,
            });
        }

        info!(portal = %self.portal, user_id = %identity.id, role = %identity.role, "Signed in");
        self.transition(SessionState::Authenticated(identity));
        Ok(())
    }

    pub fn logout(&self) {
        info!(portal = %self.portal, "Signed out");
        self.transition(SessionState::Unauthenticated);
    }

    /// Forced sign-out after the server rejected our credentials.
    pub fn expire(&self) {
        warn!(portal = %self.portal, "Session expired");
        self.transition(SessionState::Unauthenticated);
    }

    /// Initial load found no session.
    pub fn resolve_anonymous(&self) {
        debug!(portal = %self.portal, "No existing session");
        self.transition(SessionState::Unauthenticated);
    }

    /// Guard input for navigating to `path` with the current session,
    /// restricted to the portal's entry roles.
    pub fn guard_request(&self, path: impl Into<String>) -> GuardRequest {
        let state = self.state.read();
        GuardRequest {
            current_role: state.role().map(str::to_string),
            is_authenticated: state.is_authenticated(),
            path: path.into(),
            required_permission: None,
            allowed_roles: Some(self.portal.entry_roles()),
        }
    }

    fn transition(&self, next: SessionState) {
        let _serial = self.transitions.lock();
        {
            let mut state = self.state.write();
            *state = next.clone();
        }

        // Snapshot so listeners may (un)subscribe without deadlocking.
        let listeners: Vec<_> = self
            .listeners
            .read()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            if let Err(e) = listener.on_change(&next) {
                warn!(portal = %self.portal, error = %e, "Session listener failed");
            }
        }
    }
}
