//! The identity provider's directory as seen by the login flow.
//!
//! The provider exposes the caller's identity plus paginated listings of
//! their team and organization memberships. Field shapes follow the GitHub
//! REST API; every field is optional because the provider may omit any of
//! them, and incomplete entries are skipped rather than rejected.

use crate::error::DirectoryError;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};

/// Number of the first page of every listing.
pub const FIRST_PAGE: u32 = 1;

/// The authenticated caller as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Stable login name.
    pub login: Option<String>,
}

/// An organization membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOrg {
    /// Organization login.
    pub login: Option<String>,
}

impl ProviderOrg {
    /// Creates an organization entry with the given login.
    #[must_use]
    pub fn named(login: impl Into<String>) -> Self {
        Self {
            login: Some(login.into()),
        }
    }
}

/// A team membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTeam {
    /// Team name.
    pub name: Option<String>,
    /// Organization owning the team.
    pub organization: Option<ProviderOrg>,
}

impl ProviderTeam {
    /// Creates a team entry in the given organization.
    #[must_use]
    pub fn named(org: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            organization: Some(ProviderOrg::named(org)),
        }
    }

    /// Returns `(org, team)` if both names are present.
    #[must_use]
    pub fn full_name(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref()?;
        let org = self.organization.as_ref()?.login.as_deref()?;
        Some((org, name))
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Entries on this page.
    pub items: Vec<T>,
    /// Number of the following page; `None` on the last page.
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    /// Creates the last page of a listing.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }

    /// Creates a page followed by `next_page`.
    #[must_use]
    pub fn followed_by(items: Vec<T>, next_page: u32) -> Self {
        Self {
            items,
            next_page: Some(next_page),
        }
    }
}

/// Read access to the caller's identity and memberships.
///
/// An implementation is bound to one caller's access token.
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Returns the authenticated caller.
    async fn current_user(&self) -> Result<ProviderUser, Report<DirectoryError>>;

    /// Returns one page of the caller's team memberships.
    async fn user_teams(&self, page: u32) -> Result<Page<ProviderTeam>, Report<DirectoryError>>;

    /// Returns one page of the caller's organization memberships.
    async fn user_orgs(&self, page: u32) -> Result<Page<ProviderOrg>, Report<DirectoryError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_requires_team_and_org() {
        assert_eq!(
            ProviderTeam::named("acme", "infra").full_name(),
            Some(("acme", "infra"))
        );

        let unnamed = ProviderTeam {
            name: None,
            organization: Some(ProviderOrg::named("acme")),
        };
        assert!(unnamed.full_name().is_none());

        let orphan = ProviderTeam {
            name: Some("infra".to_string()),
            organization: None,
        };
        assert!(orphan.full_name().is_none());

        let unnamed_org = ProviderTeam {
            name: Some("infra".to_string()),
            organization: Some(ProviderOrg::default()),
        };
        assert!(unnamed_org.full_name().is_none());
    }

    #[test]
    fn team_decodes_from_github_shape() {
        let json = r#"{
            "id": 1,
            "name": "infra",
            "slug": "infra",
            "organization": { "login": "acme", "id": 7 }
        }"#;
        let team: ProviderTeam = serde_json::from_str(json).expect("deserialize");
        assert_eq!(team.full_name(), Some(("acme", "infra")));
    }

    #[test]
    fn user_without_login_decodes() {
        let user: ProviderUser = serde_json::from_str("{}").expect("deserialize");
        assert!(user.login.is_none());
    }
}
