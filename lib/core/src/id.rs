//! Session identifiers.
//!
//! Session IDs are opaque to everything except the session store that mints
//! them. The access engine only compares, hashes and hands them back to the
//! store for destruction.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque identifier of a stored session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

/// Prefix used for freshly minted session IDs.
const SESSION_PREFIX: &str = "sess";

impl SessionId {
    /// Creates a session ID from an existing opaque value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a new, unique session ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{SESSION_PREFIX}_{}", Ulid::new()))
    }

    /// Returns the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
