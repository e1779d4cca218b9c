//! In-memory session store with expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use teamgate_access::{SessionData, SessionIndex, SessionStore, StoreError};
use teamgate_core::SessionId;

#[derive(Debug, Clone)]
struct StoredSession {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

impl StoredSession {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Sessions kept in process memory.
///
/// Every save pushes the session's expiry `duration` into the future.
/// Expired sessions are invisible to `load` and are dropped by
/// [`delete_expired`](Self::delete_expired).
#[derive(Debug)]
pub struct MemorySessionStore {
    duration: Duration,
    sessions: Mutex<HashMap<SessionId, StoredSession>>,
}

impl MemorySessionStore {
    /// Creates an empty store whose sessions live `duration` past each save.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, StoredSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the number of stored sessions, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    /// Removes expired sessions and returns them.
    pub fn delete_expired(&self) -> Vec<SessionData> {
        self.delete_expired_at(Utc::now())
    }

    fn delete_expired_at(&self, now: DateTime<Utc>) -> Vec<SessionData> {
        let mut sessions = self.sessions();
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, stored)| stored.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        expired
            .iter()
            .filter_map(|id| sessions.remove(id))
            .map(|stored| stored.data)
            .collect()
    }
}

/// Drops expired sessions from the store and their entries from the index.
///
/// Returns the number of sessions removed.
pub fn sweep_expired(store: &MemorySessionStore, index: &SessionIndex) -> usize {
    let expired = store.delete_expired();
    for session in &expired {
        if let Some(username) = session.username() {
            index.remove_by_user_and_session(username, session.id());
        }
    }
    expired.len()
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, Report<StoreError>> {
        let now = Utc::now();
        Ok(self
            .sessions()
            .get(id)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.data.clone()))
    }

    async fn save(&self, session: &SessionData) -> Result<(), Report<StoreError>> {
        let expires_at = Utc::now()
            .checked_add_signed(self.duration)
            .ok_or_else(|| StoreError::Unavailable {
                details: format!("session expiry overflows for duration {}", self.duration),
            })?;
        self.sessions().insert(
            session.id().clone(),
            StoredSession {
                data: session.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), Report<StoreError>> {
        self.sessions().remove(id);
        Ok(())
    }
}
