//! Access tiers granted to authenticated sessions.
//!
//! Access to the gated service is derived from GitHub team and organization
//! membership. A session holds exactly one tier, fixed when the session is
//! created; picking up different rights requires a new login.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access tier resolved for a caller.
///
/// The service uses three levels of access:
/// - `None`: no configured team or organization matched
/// - `ReadOnly`: safe methods (`GET`, `HEAD`) only
/// - `ReadWrite`: every method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessTier {
    /// Caller is not authorized.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Caller may only read.
    #[serde(rename = "ro")]
    ReadOnly,
    /// Caller may read and mutate.
    #[serde(rename = "rw")]
    ReadWrite,
}

impl AccessTier {
    /// Returns true if any access is granted.
    #[must_use]
    pub fn has_access(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns true if the tier allows the given HTTP method.
    ///
    /// Only `GET` and `HEAD` are considered non-mutating.
    #[must_use]
    pub fn permits(&self, method: &str) -> bool {
        match self {
            Self::None => false,
            Self::ReadOnly => method == "GET" || method == "HEAD",
            Self::ReadWrite => true,
        }
    }

    /// Returns the value stored under the session's `accesslevel` key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ReadOnly => "ro",
            Self::ReadWrite => "rw",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_has_no_access() {
        assert!(!AccessTier::None.has_access());
        assert!(!AccessTier::None.permits("GET"));
    }

    #[test]
    fn read_only_permits_safe_methods_only() {
        let tier = AccessTier::ReadOnly;
        assert!(tier.has_access());
        assert!(tier.permits("GET"));
        assert!(tier.permits("HEAD"));
        assert!(!tier.permits("POST"));
        assert!(!tier.permits("DELETE"));
        assert!(!tier.permits("OPTIONS"));
    }

    #[test]
    fn read_write_permits_everything() {
        let tier = AccessTier::ReadWrite;
        for method in ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE"] {
            assert!(tier.permits(method), "{method} should be permitted");
        }
    }

    #[test]
    fn read_write_outranks_read_only() {
        assert!(AccessTier::ReadWrite > AccessTier::ReadOnly);
        assert!(AccessTier::ReadOnly > AccessTier::None);
    }

    #[test]
    fn serialization_uses_session_values() {
        let json = serde_json::to_string(&AccessTier::ReadWrite).expect("serialize");
        assert_eq!(json, "\"rw\"");

        let parsed: AccessTier = serde_json::from_str("\"ro\"").expect("deserialize");
        assert_eq!(parsed, AccessTier::ReadOnly);
    }
}
