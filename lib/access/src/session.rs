//! Session records and the store that owns them.
//!
//! The store is an external collaborator addressed by opaque session IDs.
//! The access engine only reads and writes a handful of fields by
//! convention; the serialized key names are kept stable so stores that
//! expose a generic key/value bag see `state`, `desiredurl`, `accesslevel`,
//! `teamID` and `username`.

use crate::error::StoreError;
use crate::tier::AccessTier;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use teamgate_core::SessionId;

/// Data kept in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    id: SessionId,
    /// CSRF state of a pending browser login.
    #[serde(rename = "state", default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    /// URL to return to once a browser login completes.
    #[serde(rename = "desiredurl", default, skip_serializing_if = "Option::is_none")]
    desired_url: Option<String>,
    #[serde(rename = "accesslevel", default, skip_serializing_if = "Option::is_none")]
    access_level: Option<AccessTier>,
    /// Identifier handed to the gated service once logged in.
    #[serde(rename = "teamID", default, skip_serializing_if = "Option::is_none")]
    team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
}

impl SessionData {
    /// Creates an empty session.
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: None,
            desired_url: None,
            access_level: None,
            team_id: None,
            username: None,
        }
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Returns true once a login completed for this session.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.team_id.is_some()
    }

    /// Returns the tier granted at login, `None` before login.
    #[must_use]
    pub fn tier(&self) -> AccessTier {
        self.access_level.unwrap_or_default()
    }

    /// Returns the logged-in GitHub username.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the team identifier set at login.
    #[must_use]
    pub fn team_id(&self) -> Option<&str> {
        self.team_id.as_deref()
    }

    /// Returns the pending CSRF state.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Returns the URL to return to after a browser login.
    #[must_use]
    pub fn desired_url(&self) -> Option<&str> {
        self.desired_url.as_deref()
    }

    /// Records a pending browser login.
    pub fn begin_login(&mut self, state: String, desired_url: String) {
        self.state = Some(state);
        self.desired_url = Some(desired_url);
    }

    /// Records a completed login.
    pub fn complete_login(&mut self, username: String, tier: AccessTier, team_id: String) {
        self.username = Some(username);
        self.access_level = Some(tier);
        self.team_id = Some(team_id);
    }

    /// Forgets the pending browser login once it has been used.
    pub fn clear_login_state(&mut self) {
        self.state = None;
        self.desired_url = None;
    }
}

/// Storage for session records.
///
/// Implementations must tolerate `destroy` for IDs they no longer hold.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session by ID.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, Report<StoreError>>;

    /// Persists a session, replacing any previous record with the same ID.
    async fn save(&self, session: &SessionData) -> Result<(), Report<StoreError>>;

    /// Invalidates a session so that later loads no longer find it.
    async fn destroy(&self, id: &SessionId) -> Result<(), Report<StoreError>>;
}
