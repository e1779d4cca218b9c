//! GitHub REST and OAuth clients for teamgate.
//!
//! [`GithubClient`] implements [`TeamDirectory`](teamgate_access::TeamDirectory)
//! over the REST API, against github.com or a GitHub Enterprise Server.
//! [`GithubOAuth`] runs the browser authorization code flow that produces
//! the tokens the client acts with.

pub mod client;
pub mod config;
pub mod error;
pub mod oauth;

pub use client::{GithubClient, http_client};
pub use config::GithubConfig;
pub use error::OAuthError;
pub use oauth::{GithubOAuth, SCOPE};
