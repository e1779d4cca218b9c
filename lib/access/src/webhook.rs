//! Session invalidation driven by provider webhooks.

use crate::error::WebhookError;
use crate::event::{MembershipAction, WebhookEvent};
use crate::index::SessionIndex;
use crate::matcher::TeamRules;
use crate::session::SessionStore;
use crate::signature::verify_signature;
use rootcause::prelude::Report;
use std::sync::Arc;
use teamgate_core::SessionId;
use tracing::{debug, info, warn};

/// What became of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The signature was missing or wrong; nothing was decoded.
    Unverified,
    /// The delivery does not concern any session.
    Ignored,
    /// The event was applied; these sessions were invalidated.
    Applied(Vec<SessionId>),
}

/// Verifies, decodes and applies webhook deliveries.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    index: Arc<SessionIndex>,
    rules: TeamRules,
    secret: String,
}

impl WebhookDispatcher {
    /// Creates a dispatcher pruning `index`, verifying with `secret`.
    #[must_use]
    pub fn new(index: Arc<SessionIndex>, rules: TeamRules, secret: impl Into<String>) -> Self {
        Self {
            index,
            rules,
            secret: secret.into(),
        }
    }

    /// Returns true if `signature` authenticates `body`.
    #[must_use]
    pub fn verify(&self, signature: Option<&str>, body: &[u8]) -> bool {
        verify_signature(&self.secret, signature, body)
    }

    /// Runs the index removal for `event` and returns the affected sessions.
    ///
    /// The sessions are not yet destroyed in the store.
    #[must_use]
    pub fn apply(&self, event: &WebhookEvent) -> Vec<SessionId> {
        match event {
            WebhookEvent::AppAuthRevoked { username } => {
                info!(username, "app authorization revoked, dropping all sessions");
                self.index.remove_all_for_user(username)
            }
            WebhookEvent::OrgMemberRemoved { username, org } => {
                info!(username, org, "organization member removed");
                self.index.remove_for_user_in_org(username, org)
            }
            WebhookEvent::TeamMembershipChanged {
                action: MembershipAction::Added,
                username,
                org,
                team,
            } => {
                if self.rules.is_read_write_team(org, team) {
                    info!(username, org, team, "added to read-write team, dropping all sessions");
                    self.index.remove_all_for_user(username)
                } else {
                    debug!(username, org, team, "added to team without read-write access");
                    Vec::new()
                }
            }
            WebhookEvent::TeamMembershipChanged {
                action: MembershipAction::Removed,
                username,
                org,
                team,
            } => {
                info!(username, org, team, "removed from team");
                self.index.remove_for_user_in_org_team(username, org, team)
            }
            WebhookEvent::TeamRenamedOrDeleted { org, old_team_name } => {
                info!(org, team = old_team_name, "team renamed or deleted");
                self.index.remove_for_org_team(org, old_team_name)
            }
        }
    }

    /// Destroys each session in the store.
    ///
    /// Store failures are logged and skipped; the index entries are already
    /// gone, so the session would otherwise outlive its binding.
    pub async fn destroy_all(&self, store: &dyn SessionStore, sessions: &[SessionId]) {
        for id in sessions {
            match store.destroy(id).await {
                Ok(()) => debug!(session_id = %id, "dropped session"),
                Err(e) => warn!(session_id = %id, error = %e, "failed to destroy session"),
            }
        }
    }

    /// Handles one delivery end to end.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` for a verified delivery whose body cannot
    /// be decoded; the index is left untouched.
    pub async fn handle(
        &self,
        signature: Option<&str>,
        event_type: Option<&str>,
        body: &[u8],
        store: &dyn SessionStore,
    ) -> Result<Delivery, Report<WebhookError>> {
        if signature.is_none() {
            debug!("ignoring delivery without signature");
            return Ok(Delivery::Unverified);
        }
        if !self.verify(signature, body) {
            debug!("ignoring delivery with invalid signature");
            return Ok(Delivery::Unverified);
        }

        let Some(event_type) = event_type else {
            debug!("ignoring delivery without event type");
            return Ok(Delivery::Ignored);
        };
        let Some(event) = WebhookEvent::decode(event_type, body)? else {
            return Ok(Delivery::Ignored);
        };

        let sessions = self.apply(&event);
        self.destroy_all(store, &sessions).await;
        Ok(Delivery::Applied(sessions))
    }
}
