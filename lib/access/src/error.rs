//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `DirectoryError`: failures talking to the identity provider
//! - `StoreError`: failures of the external session store
//! - `LoginError`: a login attempt that could not be completed
//! - `WebhookError`: webhook payloads that could not be decoded
//!
//! Business outcomes such as "no matching team" are not errors; they are
//! reported through [`LoginOutcome`](crate::login::LoginOutcome).

use std::fmt;

/// Errors from the identity provider's directory API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The API client could not be constructed.
    ClientSetup { details: String },
    /// The request could not be sent or no response was received.
    RequestFailed { endpoint: String, details: String },
    /// The provider answered with a non-success status.
    UnexpectedStatus { endpoint: String, status: u16 },
    /// The response body could not be decoded.
    InvalidResponse { endpoint: String, details: String },
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientSetup { details } => {
                write!(f, "failed to set up directory client: {details}")
            }
            Self::RequestFailed { endpoint, details } => {
                write!(f, "request to '{endpoint}' failed: {details}")
            }
            Self::UnexpectedStatus { endpoint, status } => {
                write!(f, "'{endpoint}' returned status {status}")
            }
            Self::InvalidResponse { endpoint, details } => {
                write!(f, "invalid response from '{endpoint}': {details}")
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

/// Errors from the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not complete the operation.
    Unavailable { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "session store unavailable: {details}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors that abort a login attempt.
///
/// Any of these maps to an internal failure for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// A provider call failed.
    Provider {
        operation: &'static str,
        details: String,
    },
    /// The session could not be persisted.
    SessionStore { details: String },
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { operation, details } => {
                write!(f, "provider call '{operation}' failed: {details}")
            }
            Self::SessionStore { details } => {
                write!(f, "failed to persist session: {details}")
            }
        }
    }
}

impl std::error::Error for LoginError {}

/// Errors from decoding webhook deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// The payload is not valid JSON for its event type.
    MalformedPayload { event_type: String, details: String },
}

impl fmt::Display for WebhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPayload {
                event_type,
                details,
            } => {
                write!(f, "malformed '{event_type}' payload: {details}")
            }
        }
    }
}

impl std::error::Error for WebhookError {}
