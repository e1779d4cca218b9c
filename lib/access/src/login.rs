//! One authentication attempt against the identity provider.
//!
//! A login resolves the caller's identity and tier through a
//! [`TeamDirectory`] already bound to their access token, persists the
//! result into their session and only then records the session in the
//! [`SessionIndex`]. A failure at any step leaves the index untouched.

use crate::directory::TeamDirectory;
use crate::error::{LoginError, StoreError};
use crate::index::SessionIndex;
use crate::matcher::TeamMatcher;
use crate::session::{SessionData, SessionStore};
use crate::tier::AccessTier;
use rootcause::prelude::Report;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Why a login was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The provider reported no login name for the token's owner.
    MissingLogin,
    /// None of the caller's memberships matches a configured rule.
    NoMatchingTeam,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLogin => f.write_str("provider returned no login name"),
            Self::NoMatchingTeam => f.write_str("no matching team or organization"),
        }
    }
}

/// Result of a login that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The session now carries the caller's identity and tier.
    Authorized { username: String, tier: AccessTier },
    /// The caller holds no access; their session was cleaned up.
    Unauthorized(Denial),
}

/// Runs logins and cleans up the sessions they leave behind.
#[derive(Debug, Clone)]
pub struct LoginDance {
    matcher: TeamMatcher,
    index: Arc<SessionIndex>,
    default_team_id: String,
}

impl LoginDance {
    /// Creates a login runner recording sessions in `index`.
    ///
    /// `default_team_id` is written into every authorized session.
    #[must_use]
    pub fn new(
        matcher: TeamMatcher,
        index: Arc<SessionIndex>,
        default_team_id: impl Into<String>,
    ) -> Self {
        Self {
            matcher,
            index,
            default_team_id: default_team_id.into(),
        }
    }

    /// Authenticates the caller behind `directory` into `session`.
    ///
    /// # Errors
    ///
    /// Returns `Provider` if a directory call fails and `SessionStore` if
    /// the session cannot be persisted. The caller is responsible for
    /// cleaning up the session in that case.
    #[instrument(skip_all, fields(session_id = %session.id()))]
    pub async fn run(
        &self,
        directory: &dyn TeamDirectory,
        store: &dyn SessionStore,
        session: &mut SessionData,
    ) -> Result<LoginOutcome, Report<LoginError>> {
        let user = directory
            .current_user()
            .await
            .map_err(|e| LoginError::Provider {
                operation: "fetch current user",
                details: e.to_string(),
            })?;
        let Some(username) = user.login.filter(|login| !login.is_empty()) else {
            info!("login refused: provider returned no login name");
            self.cleanup(store, session).await;
            return Ok(LoginOutcome::Unauthorized(Denial::MissingLogin));
        };

        let grant = self
            .matcher
            .resolve(directory)
            .await
            .map_err(|e| LoginError::Provider {
                operation: "list memberships",
                details: e.to_string(),
            })?;
        let Some((tier, binding)) = grant.granted() else {
            info!(username, "login refused: no matching team or organization");
            self.cleanup(store, session).await;
            return Ok(LoginOutcome::Unauthorized(Denial::NoMatchingTeam));
        };

        session.complete_login(username.clone(), tier, self.default_team_id.clone());
        store
            .save(session)
            .await
            .map_err(|e| LoginError::SessionStore {
                details: e.to_string(),
            })?;
        self.index
            .insert(&username, session.id().clone(), binding.clone());

        info!(username, tier = %tier, binding = %binding, "login succeeded");
        Ok(LoginOutcome::Authorized { username, tier })
    }

    /// Forgets the caller's own session in both the index and the store.
    ///
    /// Store failures are logged; the session is gone from the index either
    /// way.
    pub async fn cleanup(&self, store: &dyn SessionStore, session: &SessionData) {
        if let Err(e) = self.try_cleanup(store, session).await {
            warn!(session_id = %session.id(), error = %e, "failed to destroy session");
        }
    }

    async fn try_cleanup(
        &self,
        store: &dyn SessionStore,
        session: &SessionData,
    ) -> Result<(), Report<StoreError>> {
        if let Some(username) = session.username() {
            if self.index.remove_by_user_and_session(username, session.id()) {
                debug!(username, session_id = %session.id(), "removed session from index");
            }
        }
        store.destroy(session.id()).await
    }
}
