//! Team-based access resolution and session invalidation for teamgate.
//!
//! This crate provides:
//! - Access tiers and the team bindings that justify them (`AccessTier`,
//!   `TeamBinding`)
//! - Rule matching over team and organization memberships (`TeamMatcher`)
//! - The live session index (`SessionIndex`)
//! - Logins against an identity provider directory (`LoginDance`)
//! - Webhook verification, decoding and dispatch (`WebhookDispatcher`)
//!
//! # Invalidation Model
//!
//! Sessions are long-lived. Each login records which membership granted
//! its tier; when the provider later reports that membership gone, every
//! session that depended on it is destroyed:
//! - app authorization revoked drops all of the user's sessions
//! - removal from an organization drops sessions granted by that
//!   organization alone
//! - removal from a team, or the team's deletion or rename, drops sessions
//!   granted by that team
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use teamgate_access::{MembershipAction, SessionIndex, TeamBinding, TeamRules, WebhookDispatcher, WebhookEvent};
//! use teamgate_core::SessionId;
//!
//! let index = Arc::new(SessionIndex::new());
//! index.insert("alice", SessionId::new("sess_1"), TeamBinding::team("acme", "infra"));
//!
//! let rules = TeamRules::new(vec!["acme/infra".to_string()], Vec::new());
//! let dispatcher = WebhookDispatcher::new(Arc::clone(&index), rules, "secret");
//!
//! let removed = dispatcher.apply(&WebhookEvent::TeamMembershipChanged {
//!     action: MembershipAction::Removed,
//!     username: "alice".to_string(),
//!     org: "acme".to_string(),
//!     team: "infra".to_string(),
//! });
//!
//! assert_eq!(removed, vec![SessionId::new("sess_1")]);
//! assert!(index.is_empty());
//! ```

pub mod binding;
pub mod config;
pub mod directory;
pub mod error;
pub mod event;
pub mod index;
pub mod login;
pub mod matcher;
pub mod session;
pub mod signature;
pub mod tier;
pub mod webhook;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use binding::{TeamBinding, team_name};
pub use config::AccessConfig;
pub use directory::{FIRST_PAGE, Page, ProviderOrg, ProviderTeam, ProviderUser, TeamDirectory};
pub use error::{DirectoryError, LoginError, StoreError, WebhookError};
pub use event::{MembershipAction, WebhookEvent};
pub use index::SessionIndex;
pub use login::{Denial, LoginDance, LoginOutcome};
pub use matcher::{AccessGrant, TeamMatcher, TeamRules};
pub use session::{SessionData, SessionStore};
pub use signature::{EVENT_HEADER, SIGNATURE_HEADER, sign, verify_signature};
pub use tier::AccessTier;
pub use webhook::{Delivery, WebhookDispatcher};
