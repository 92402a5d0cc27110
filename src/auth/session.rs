//! Session model and store adapter.
//!
//! Sessions are created lazily for any client, anonymous or not, and are
//! keyed by an opaque token carried in a cookie. The store is injected into
//! the flow and the gate rather than reached as ambient global state, so
//! tests can substitute their own.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Identity attached to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAccount {
    pub account_id: Uuid,
    pub display_name: String,
}

/// Per-client server-side state, alive across requests until expiry or
/// explicit sign-out.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    // Private: identity is set and cleared as one unit, never field by field.
    account: Option<SessionAccount>,
    pending_destination: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            account: None,
            pending_destination: None,
            expires_at: Utc::now(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }

    pub fn account(&self) -> Option<&SessionAccount> {
        self.account.as_ref()
    }

    /// Transition to the authenticated state, id and display name together.
    pub fn authenticate(&mut self, account_id: Uuid, display_name: &str) {
        self.account = Some(SessionAccount {
            account_id,
            display_name: display_name.to_string(),
        });
    }

    /// Record the destination to return to after login. Overwrites any
    /// earlier capture; only the most recent attempt survives.
    pub fn capture_destination(&mut self, destination: &str) {
        self.pending_destination = Some(destination.to_string());
    }

    /// Consume the captured destination, clearing it.
    pub fn take_destination(&mut self) -> Option<String> {
        self.pending_destination.take()
    }

    pub fn pending_destination(&self) -> Option<&str> {
        self.pending_destination.as_deref()
    }
}

/// Keyed session state with expiry.
pub trait SessionStore: Send + Sync {
    /// Look up a live session. Expired sessions are treated as absent.
    fn get(&self, id: &Uuid) -> Option<Session>;
    /// Persist a session, refreshing its idle deadline.
    fn put(&self, session: Session);
    /// Drop a session's server-side state. Idempotent.
    fn destroy(&self, id: &Uuid);
}

/// In-process session store over a `parking_lot` map.
pub struct MemorySessionStore {
    ttl: Duration,
    inner: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Drop all expired sessions, returning how many were removed. Called
    /// from a periodic task; `get` also drops expired entries lazily.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|_, s| s.expires_at > now);
        before - map.len()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &Uuid) -> Option<Session> {
        let now = Utc::now();
        let mut map = self.inner.write();
        match map.get(id) {
            Some(s) if s.expires_at > now => Some(s.clone()),
            Some(_) => {
                map.remove(id);
                None
            }
            None => None,
        }
    }

    fn put(&self, mut session: Session) {
        session.expires_at = Utc::now() + self.ttl;
        self.inner.write().insert(session.id, session);
    }

    fn destroy(&self, id: &Uuid) {
        self.inner.write().remove(id);
    }
}
