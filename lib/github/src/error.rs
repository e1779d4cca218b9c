//! Error types for the GitHub OAuth client.
//!
//! REST API failures are reported as
//! [`DirectoryError`](teamgate_access::DirectoryError) so that the login flow
//! sees one error type regardless of the directory behind it.

use std::fmt;

/// Errors from the OAuth authorization code flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    /// An endpoint or redirect URL could not be parsed.
    Configuration { details: String },
    /// GitHub refused or failed the code exchange.
    TokenExchange { details: String },
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { details } => write!(f, "invalid OAuth configuration: {details}"),
            Self::TokenExchange { details } => write!(f, "token exchange failed: {details}"),
        }
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = OAuthError::TokenExchange {
            details: "bad_verification_code".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "token exchange failed: bad_verification_code"
        );
    }
}
