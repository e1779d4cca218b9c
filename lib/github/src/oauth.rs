//! GitHub OAuth web application flow.
//!
//! The browser is sent to GitHub's authorization endpoint with a random
//! state; GitHub calls back with that state and a code, which is exchanged
//! for an access token usable with [`GithubClient`](crate::GithubClient).

use crate::config::GithubConfig;
use crate::error::OAuthError;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use rootcause::prelude::Report;
use tracing::{debug, instrument};

/// Scope needed to list the caller's teams and organizations.
pub const SCOPE: &str = "read:org";

/// OAuth client for one registered GitHub application.
#[derive(Debug, Clone)]
pub struct GithubOAuth {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: Option<RedirectUrl>,
    http: reqwest::Client,
}

impl GithubOAuth {
    /// Creates an OAuth client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if an endpoint or the redirect URL is not a
    /// valid URL.
    pub fn new(config: &GithubConfig, http: reqwest::Client) -> Result<Self, Report<OAuthError>> {
        let auth_url = AuthUrl::new(config.authorize_url()).map_err(|e| OAuthError::Configuration {
            details: format!("invalid authorization URL: {e}"),
        })?;
        let token_url = TokenUrl::new(config.token_url()).map_err(|e| OAuthError::Configuration {
            details: format!("invalid token URL: {e}"),
        })?;
        let redirect_url = config
            .redirect_url()
            .map(|url| RedirectUrl::new(url.to_string()))
            .transpose()
            .map_err(|e| OAuthError::Configuration {
                details: format!("invalid redirect URL: {e}"),
            })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            http,
        })
    }

    /// Generates a fresh random state for one authorization request.
    #[must_use]
    pub fn new_state() -> String {
        CsrfToken::new_random().secret().clone()
    }

    /// Returns the URL to send the browser to.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> String {
        let client = BasicClient::new(self.client_id.clone()).set_auth_uri(self.auth_url.clone());
        let client = match &self.redirect_url {
            Some(redirect_url) => client.set_redirect_uri(redirect_url.clone()),
            None => client,
        };

        let (url, _) = client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scope(Scope::new(SCOPE.to_string()))
            .url();
        url.to_string()
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `TokenExchange` if GitHub rejects the code or cannot be
    /// reached.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str) -> Result<String, Report<OAuthError>> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone());
        let client = match &self.redirect_url {
            Some(redirect_url) => client.set_redirect_uri(redirect_url.clone()),
            None => client,
        };

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange {
                details: e.to_string(),
            })?;

        debug!("exchanged authorization code for access token");
        Ok(token.access_token().secret().clone())
    }
}
