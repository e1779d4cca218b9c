//! Access rule configuration.

use crate::matcher::TeamRules;
use serde::Deserialize;

/// Which teams grant which tier, plus the webhook secret.
///
/// Team lists are comma-separated `"org/team"` or `"org"` entries so they
/// can be set from a single environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Entries granting read-write access.
    #[serde(default)]
    read_write_teams: String,
    /// Entries granting read-only access.
    #[serde(default)]
    read_only_teams: String,
    /// Team identifier written into every authorized session.
    default_team_id: String,
    /// Secret shared with the provider for signing webhook deliveries.
    webhook_secret: String,
}

impl AccessConfig {
    /// Creates a configuration from raw comma-separated lists.
    #[must_use]
    pub fn new(
        read_write_teams: String,
        read_only_teams: String,
        default_team_id: String,
        webhook_secret: String,
    ) -> Self {
        Self {
            read_write_teams,
            read_only_teams,
            default_team_id,
            webhook_secret,
        }
    }

    /// Returns the read-write entries, parsed from the comma-separated list.
    #[must_use]
    pub fn read_write_teams(&self) -> Vec<&str> {
        split_list(&self.read_write_teams)
    }

    /// Returns the read-only entries, parsed from the comma-separated list.
    #[must_use]
    pub fn read_only_teams(&self) -> Vec<&str> {
        split_list(&self.read_only_teams)
    }

    /// Returns the team identifier written into authorized sessions.
    #[must_use]
    pub fn default_team_id(&self) -> &str {
        &self.default_team_id
    }

    /// Returns the secret webhook deliveries are signed with.
    #[must_use]
    pub fn webhook_secret(&self) -> &str {
        &self.webhook_secret
    }

    /// Builds the matching rules from the configured lists.
    #[must_use]
    pub fn rules(&self) -> TeamRules {
        TeamRules::new(
            self.read_write_teams().into_iter().map(String::from).collect(),
            self.read_only_teams().into_iter().map(String::from).collect(),
        )
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect()
}
