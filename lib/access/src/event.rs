//! Normalized webhook events.
//!
//! GitHub delivers membership changes as loosely-typed JSON payloads keyed
//! by the `X-GitHub-Event` header. They are decoded once, here, into a
//! [`WebhookEvent`]; everything downstream works on the typed form.

use crate::error::WebhookError;
use rootcause::prelude::Report;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;

/// Direction of a team membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    Added,
    Removed,
}

impl fmt::Display for MembershipAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// A membership change that may invalidate live sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// The user revoked the app's authorization.
    AppAuthRevoked { username: String },
    /// The user left or was removed from an organization.
    OrgMemberRemoved { username: String, org: String },
    /// The user joined or left a team.
    TeamMembershipChanged {
        action: MembershipAction,
        username: String,
        org: String,
        team: String,
    },
    /// A team was deleted, or renamed away from `old_team_name`.
    TeamRenamedOrDeleted { org: String, old_team_name: String },
}

#[derive(Debug, Default, Deserialize)]
struct Account {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Membership {
    #[serde(default)]
    user: Account,
}

#[derive(Debug, Default, Deserialize)]
struct Team {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NameChange {
    #[serde(default)]
    from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Changes {
    #[serde(default)]
    name: NameChange,
}

#[derive(Debug, Deserialize)]
struct AppAuthorizationPayload {
    #[serde(default)]
    action: String,
    #[serde(default)]
    sender: Account,
}

#[derive(Debug, Deserialize)]
struct OrganizationPayload {
    #[serde(default)]
    action: String,
    #[serde(default)]
    membership: Membership,
    #[serde(default)]
    organization: Account,
}

#[derive(Debug, Deserialize)]
struct MembershipPayload {
    #[serde(default)]
    action: String,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    member: Account,
    #[serde(default)]
    team: Team,
    #[serde(default)]
    organization: Account,
}

#[derive(Debug, Deserialize)]
struct TeamPayload {
    #[serde(default)]
    action: String,
    #[serde(default)]
    changes: Changes,
    #[serde(default)]
    team: Team,
    #[serde(default)]
    organization: Account,
}

fn parse<T: DeserializeOwned>(event_type: &str, body: &[u8]) -> Result<T, Report<WebhookError>> {
    serde_json::from_slice(body).map_err(|e| {
        WebhookError::MalformedPayload {
            event_type: event_type.to_string(),
            details: e.to_string(),
        }
        .into()
    })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl WebhookEvent {
    /// Decodes a delivery of the given event type.
    ///
    /// Returns `Ok(None)` for event types, actions and scopes that never
    /// affect sessions, and for payloads missing the names an event needs.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the body of a handled event type is not
    /// valid JSON of the expected shape.
    pub fn decode(event_type: &str, body: &[u8]) -> Result<Option<Self>, Report<WebhookError>> {
        let event = match event_type {
            "github_app_authorization" => {
                let payload: AppAuthorizationPayload = parse(event_type, body)?;
                if payload.action != "revoked" {
                    debug!(event_type, action = %payload.action, "ignoring action");
                    return Ok(None);
                }
                present(payload.sender.login).map(|username| Self::AppAuthRevoked { username })
            }
            "organization" => {
                let payload: OrganizationPayload = parse(event_type, body)?;
                if payload.action != "member_removed" {
                    debug!(event_type, action = %payload.action, "ignoring action");
                    return Ok(None);
                }
                present(payload.membership.user.login)
                    .zip(present(payload.organization.login))
                    .map(|(username, org)| Self::OrgMemberRemoved { username, org })
            }
            "membership" => {
                let payload: MembershipPayload = parse(event_type, body)?;
                if payload.scope != "team" {
                    debug!(event_type, scope = %payload.scope, "ignoring scope");
                    return Ok(None);
                }
                let action = match payload.action.as_str() {
                    "added" => MembershipAction::Added,
                    "removed" => MembershipAction::Removed,
                    other => {
                        debug!(event_type, action = other, "ignoring action");
                        return Ok(None);
                    }
                };
                match (
                    present(payload.member.login),
                    present(payload.organization.login),
                    present(payload.team.name),
                ) {
                    (Some(username), Some(org), Some(team)) => Some(Self::TeamMembershipChanged {
                        action,
                        username,
                        org,
                        team,
                    }),
                    _ => None,
                }
            }
            "team" => {
                let payload: TeamPayload = parse(event_type, body)?;
                let old_team_name = match payload.action.as_str() {
                    "deleted" => payload.team.name,
                    "edited" => {
                        let from = present(payload.changes.name.from);
                        if from.is_none() {
                            debug!(event_type, "ignoring edit that does not rename the team");
                            return Ok(None);
                        }
                        from
                    }
                    other => {
                        debug!(event_type, action = other, "ignoring action");
                        return Ok(None);
                    }
                };
                present(payload.organization.login)
                    .zip(present(old_team_name))
                    .map(|(org, old_team_name)| Self::TeamRenamedOrDeleted { org, old_team_name })
            }
            other => {
                debug!(event_type = other, "ignoring event type");
                return Ok(None);
            }
        };

        if event.is_none() {
            debug!(event_type, "ignoring payload without the required names");
        }
        Ok(event)
    }
}
