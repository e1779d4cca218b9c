//! The membership that justified a session's tier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Builds the `"org/team"` form used by configuration and the team index.
#[must_use]
pub fn team_name(org: &str, team: &str) -> String {
    format!("{org}/{team}")
}

/// The (organization, optional team) membership behind a session.
///
/// `team` is `None` when organization-level membership alone granted
/// access. Such bindings are only reachable through per-user queries; they
/// never appear in the team → users side of the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamBinding {
    /// Organization login.
    pub org: String,
    /// Team name within the organization.
    pub team: Option<String>,
}

impl TeamBinding {
    /// Creates a binding to a specific team.
    #[must_use]
    pub fn team(org: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            team: Some(team.into()),
        }
    }

    /// Creates a binding satisfied by organization membership alone.
    #[must_use]
    pub fn org_only(org: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            team: None,
        }
    }

    /// Returns the `"org/team"` key for team-bound bindings.
    #[must_use]
    pub fn team_key(&self) -> Option<String> {
        self.team.as_deref().map(|team| team_name(&self.org, team))
    }

    /// Returns true if this binding is exactly `org`/`team`.
    #[must_use]
    pub fn is_team(&self, org: &str, team: &str) -> bool {
        self.org == org && self.team.as_deref() == Some(team)
    }

    /// Returns true if this is an org-only binding to `org`.
    #[must_use]
    pub fn is_org_only(&self, org: &str) -> bool {
        self.org == org && self.team.is_none()
    }
}

impl fmt::Display for TeamBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.team {
            Some(team) => write!(f, "{}/{team}", self.org),
            None => f.write_str(&self.org),
        }
    }
}
