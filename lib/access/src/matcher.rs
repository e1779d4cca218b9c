//! Resolution of a caller's access tier from team and org memberships.
//!
//! Matching is a single pass with priority `ReadWrite > ReadOnly`:
//! - team memberships are checked first, as `"org/team"` names
//! - organization memberships are checked only if no team granted
//!   read-write, as bare `"org"` names
//! - the first read-write match ends the whole scan
//! - the first read-only match is kept, later ones are ignored

use crate::binding::{TeamBinding, team_name};
use crate::directory::{FIRST_PAGE, ProviderOrg, ProviderTeam, TeamDirectory};
use crate::error::DirectoryError;
use crate::tier::AccessTier;
use rootcause::prelude::Report;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// Configured team names granting each tier.
///
/// Entries are `"org/team"` for team membership or `"org"` for
/// organization-level membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamRules {
    read_write: Vec<String>,
    read_only: Vec<String>,
}

impl TeamRules {
    /// Creates rules from the read-write and read-only lists.
    #[must_use]
    pub fn new(read_write: Vec<String>, read_only: Vec<String>) -> Self {
        Self {
            read_write,
            read_only,
        }
    }

    /// Returns the tier a single name grants on its own.
    #[must_use]
    pub fn tier_for(&self, name: &str) -> AccessTier {
        if self.read_write.iter().any(|entry| entry == name) {
            AccessTier::ReadWrite
        } else if self.read_only.iter().any(|entry| entry == name) {
            AccessTier::ReadOnly
        } else {
            AccessTier::None
        }
    }

    /// Returns true if `org`/`team` is a configured read-write team.
    #[must_use]
    pub fn is_read_write_team(&self, org: &str, team: &str) -> bool {
        let name = team_name(org, team);
        self.read_write.iter().any(|entry| *entry == name)
    }

    /// Returns the read-write entries.
    #[must_use]
    pub fn read_write(&self) -> &[String] {
        &self.read_write
    }

    /// Returns the read-only entries.
    #[must_use]
    pub fn read_only(&self) -> &[String] {
        &self.read_only
    }
}

/// Result of matching a caller against the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Resolved tier.
    pub tier: AccessTier,
    /// Membership that justified the tier; `None` when denied.
    pub binding: Option<TeamBinding>,
}

impl AccessGrant {
    /// A grant with no access.
    #[must_use]
    pub fn denied() -> Self {
        Self {
            tier: AccessTier::None,
            binding: None,
        }
    }

    fn new(tier: AccessTier, binding: TeamBinding) -> Self {
        Self {
            tier,
            binding: Some(binding),
        }
    }

    /// Returns the binding if access was granted.
    #[must_use]
    pub fn granted(&self) -> Option<(AccessTier, &TeamBinding)> {
        match (&self.tier, &self.binding) {
            (AccessTier::None, _) | (_, None) => None,
            (tier, Some(binding)) => Some((*tier, binding)),
        }
    }
}

/// Fold state of one matching pass.
///
/// Breaks with the binding of the first read-write match.
#[derive(Debug)]
struct Scan<'r> {
    rules: &'r TeamRules,
    read_only: Option<TeamBinding>,
}

impl<'r> Scan<'r> {
    fn new(rules: &'r TeamRules) -> Self {
        Self {
            rules,
            read_only: None,
        }
    }

    fn observe(
        &mut self,
        name: &str,
        binding: impl FnOnce() -> TeamBinding,
    ) -> ControlFlow<TeamBinding> {
        match self.rules.tier_for(name) {
            AccessTier::ReadWrite => {
                debug!(entry = name, "found matching read-write entry");
                ControlFlow::Break(binding())
            }
            AccessTier::ReadOnly if self.read_only.is_none() => {
                debug!(entry = name, "found matching read-only entry");
                self.read_only = Some(binding());
                ControlFlow::Continue(())
            }
            _ => ControlFlow::Continue(()),
        }
    }

    fn teams(&mut self, teams: &[ProviderTeam]) -> ControlFlow<TeamBinding> {
        for team in teams {
            let Some((org, name)) = team.full_name() else {
                debug!("skipping team without name or organization");
                continue;
            };
            self.observe(&team_name(org, name), || TeamBinding::team(org, name))?;
        }
        ControlFlow::Continue(())
    }

    fn orgs(&mut self, orgs: &[ProviderOrg]) -> ControlFlow<TeamBinding> {
        for org in orgs {
            let Some(login) = org.login.as_deref() else {
                debug!("skipping organization without login");
                continue;
            };
            self.observe(login, || TeamBinding::org_only(login))?;
        }
        ControlFlow::Continue(())
    }

    fn finish(self) -> AccessGrant {
        match self.read_only {
            Some(binding) => AccessGrant::new(AccessTier::ReadOnly, binding),
            None => AccessGrant::denied(),
        }
    }
}

/// Decides a caller's tier from their memberships.
#[derive(Debug, Clone, Default)]
pub struct TeamMatcher {
    rules: TeamRules,
}

impl TeamMatcher {
    /// Creates a matcher for the given rules.
    #[must_use]
    pub fn new(rules: TeamRules) -> Self {
        Self { rules }
    }

    /// Returns the rules this matcher applies.
    #[must_use]
    pub fn rules(&self) -> &TeamRules {
        &self.rules
    }

    /// Matches fully-fetched membership lists.
    #[must_use]
    pub fn match_memberships(&self, teams: &[ProviderTeam], orgs: &[ProviderOrg]) -> AccessGrant {
        let mut scan = Scan::new(&self.rules);
        if let ControlFlow::Break(binding) = scan.teams(teams) {
            return AccessGrant::new(AccessTier::ReadWrite, binding);
        }
        if let ControlFlow::Break(binding) = scan.orgs(orgs) {
            return AccessGrant::new(AccessTier::ReadWrite, binding);
        }
        scan.finish()
    }

    /// Walks the directory's team pages, then its organization pages.
    ///
    /// Stops fetching as soon as a read-write match is found.
    ///
    /// # Errors
    ///
    /// Returns the first directory error; no partial grant is produced.
    pub async fn resolve(
        &self,
        directory: &dyn TeamDirectory,
    ) -> Result<AccessGrant, Report<DirectoryError>> {
        let mut scan = Scan::new(&self.rules);

        let mut page = FIRST_PAGE;
        loop {
            let listing = directory.user_teams(page).await?;
            if let ControlFlow::Break(binding) = scan.teams(&listing.items) {
                return Ok(AccessGrant::new(AccessTier::ReadWrite, binding));
            }
            match next_page(page, listing.next_page) {
                Some(next) => page = next,
                None => break,
            }
        }

        debug!("no read-write team found, trying organizations");
        let mut page = FIRST_PAGE;
        loop {
            let listing = directory.user_orgs(page).await?;
            if let ControlFlow::Break(binding) = scan.orgs(&listing.items) {
                return Ok(AccessGrant::new(AccessTier::ReadWrite, binding));
            }
            match next_page(page, listing.next_page) {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(scan.finish())
    }
}

/// Guards against a provider that never advances its cursor.
fn next_page(current: u32, next: Option<u32>) -> Option<u32> {
    match next {
        Some(next) if next > current => Some(next),
        Some(next) => {
            warn!(current, next, "provider returned a non-advancing next page");
            None
        }
        None => None,
    }
}
