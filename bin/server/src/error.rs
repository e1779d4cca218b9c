//! Domain error types for server operations.
//!
//! `GateError` is what gated requests and the login routes fail with; it
//! maps onto the HTTP status the caller sees. `StartupError` covers
//! everything that can stop the server from coming up.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Request-level failures of the gate and login routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The caller could not be authenticated.
    Unauthorized { reason: String },
    /// The caller's tier does not allow the request method.
    Forbidden { method: String },
    /// A webhook payload could not be decoded.
    MalformedInput { details: String },
    /// A collaborator failed or the session lacked required fields.
    Internal { details: String },
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthorized { reason } => write!(f, "unauthorized: {reason}"),
            Self::Forbidden { method } => write!(f, "method '{method}' requires read-write access"),
            Self::MalformedInput { details } => write!(f, "malformed input: {details}"),
            Self::Internal { details } => write!(f, "internal failure: {details}"),
        }
    }
}

impl std::error::Error for GateError {}

impl GateError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::MalformedInput { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal { details } => tracing::error!(details = %details, "Internal failure"),
            other => tracing::debug!(error = %other, "Request rejected"),
        }
        // Reasons stay in the logs; callers only learn the status.
        let message = status.canonical_reason().unwrap_or_default();
        (status, message).into_response()
    }
}

/// Failures while starting the server.
#[derive(Debug)]
pub enum StartupError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// A session key is malformed.
    InvalidSessionKey { name: &'static str, details: String },
    /// A session setting is out of range.
    InvalidSessionSetting { name: &'static str, details: String },
    /// A GitHub client could not be built.
    Github { details: String },
    /// The listen address could not be bound.
    Bind { addr: String, details: String },
    /// The server stopped with an error.
    Serve { details: String },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "failed to load configuration: {details}"),
            Self::InvalidSessionKey { name, details } => {
                write!(f, "invalid session key '{name}': {details}")
            }
            Self::InvalidSessionSetting { name, details } => {
                write!(f, "invalid session setting '{name}': {details}")
            }
            Self::Github { details } => write!(f, "failed to set up GitHub client: {details}"),
            Self::Bind { addr, details } => write!(f, "failed to bind to '{addr}': {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for StartupError {}
