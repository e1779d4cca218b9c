//! Authentication module for the teamgate server.
//!
//! This module provides:
//! - The request gate enforcing access tiers (`authenticate`)
//! - The OAuth callback, webhook and logout routes
//! - In-memory session storage with an encrypted session cookie
//!
//! # Access Model
//!
//! Every gated request carries a session. A session that completed a login
//! holds one tier for its whole life:
//! - read-only sessions may only `GET` and `HEAD`
//! - read-write sessions may use every method
//!
//! Sessions without a login are sent through GitHub's OAuth flow, or logged
//! in on the spot when the request carries a `Bearer` token. Membership
//! changes reported by GitHub webhooks destroy the affected sessions.

pub mod cookie;
pub mod gate;
pub mod routes;
pub mod store;

use crate::config::SessionConfig;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rootcause::prelude::Report;
use std::sync::Arc;
use teamgate_access::{LoginDance, SessionData, SessionStore, StoreError, WebhookDispatcher};
use teamgate_core::SessionId;
use teamgate_github::GithubOAuth;

pub use gate::{GateIdentity, authenticate};
pub use routes::{login_callback, logout, session_info, webhook};
pub use store::{MemorySessionStore, sweep_expired};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Session storage.
    pub store: Arc<dyn SessionStore>,
    /// Login runner, holding the session index.
    pub login: LoginDance,
    /// Webhook verification and dispatch.
    pub webhooks: WebhookDispatcher,
    /// GitHub OAuth client.
    pub oauth: GithubOAuth,
    /// HTTP client for GitHub REST calls.
    pub http: reqwest::Client,
    /// GitHub REST API base URL.
    pub api_url: String,
    /// Key encrypting the session cookie.
    pub cookie_key: Key,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Loads the session the request points at, or starts a fresh one.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn load_session(
        &self,
        id: Option<SessionId>,
    ) -> Result<SessionData, Report<StoreError>> {
        if let Some(id) = id {
            if let Some(session) = self.store.load(&id).await? {
                return Ok(session);
            }
        }
        Ok(SessionData::new(SessionId::generate()))
    }
}
