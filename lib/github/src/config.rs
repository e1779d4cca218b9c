//! GitHub endpoint and OAuth application configuration.

use serde::Deserialize;

const PUBLIC_API_URL: &str = "https://api.github.com";
const PUBLIC_WEB_URL: &str = "https://github.com";

/// Where GitHub lives and how teamgate is registered with it.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Base URL of a GitHub Enterprise Server instance
    /// (e.g., "https://github.example.com"). Empty for github.com.
    #[serde(default)]
    enterprise_url: String,
    /// OAuth application client ID.
    client_id: String,
    /// OAuth application client secret.
    client_secret: String,
    /// Callback URL registered with the OAuth application. When unset,
    /// GitHub uses the application's default callback.
    #[serde(default)]
    redirect_url: Option<String>,
}

impl GithubConfig {
    /// Creates a configuration for github.com without an explicit redirect URL.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            enterprise_url: String::new(),
            client_id,
            client_secret,
            redirect_url: None,
        }
    }

    /// Targets a GitHub Enterprise Server instance.
    #[must_use]
    pub fn with_enterprise_url(mut self, enterprise_url: String) -> Self {
        self.enterprise_url = enterprise_url;
        self
    }

    /// Sets the OAuth callback URL.
    #[must_use]
    pub fn with_redirect_url(mut self, redirect_url: String) -> Self {
        self.redirect_url = Some(redirect_url);
        self
    }

    /// Returns the enterprise base URL, if one is configured.
    #[must_use]
    pub fn enterprise_url(&self) -> Option<&str> {
        let url = self.enterprise_url.trim_end_matches('/');
        (!url.is_empty()).then_some(url)
    }

    /// Returns the OAuth application client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth application client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the OAuth redirect URL, if one is configured.
    #[must_use]
    pub fn redirect_url(&self) -> Option<&str> {
        self.redirect_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Returns the REST API base URL.
    #[must_use]
    pub fn api_url(&self) -> String {
        match self.enterprise_url() {
            Some(base) => format!("{base}/api/v3"),
            None => PUBLIC_API_URL.to_string(),
        }
    }

    /// Returns the OAuth authorization endpoint.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/login/oauth/authorize", self.web_url())
    }

    /// Returns the OAuth token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/login/oauth/access_token", self.web_url())
    }

    fn web_url(&self) -> &str {
        self.enterprise_url().unwrap_or(PUBLIC_WEB_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_endpoints_by_default() {
        let config = GithubConfig::new("id".to_string(), "secret".to_string());
        assert!(config.enterprise_url().is_none());
        assert_eq!(config.api_url(), "https://api.github.com");
        assert_eq!(config.authorize_url(), "https://github.com/login/oauth/authorize");
        assert_eq!(config.token_url(), "https://github.com/login/oauth/access_token");
    }

    #[test]
    fn enterprise_endpoints() {
        let config = GithubConfig::new("id".to_string(), "secret".to_string())
            .with_enterprise_url("https://git.example.com/".to_string());
        assert_eq!(config.api_url(), "https://git.example.com/api/v3");
        assert_eq!(
            config.authorize_url(),
            "https://git.example.com/login/oauth/authorize"
        );
        assert_eq!(
            config.token_url(),
            "https://git.example.com/login/oauth/access_token"
        );
    }

    #[test]
    fn empty_redirect_url_is_unset() {
        let config: GithubConfig = serde_json::from_str(
            r#"{"client_id": "id", "client_secret": "secret", "redirect_url": ""}"#,
        )
        .expect("deserialize");
        assert!(config.redirect_url().is_none());
        assert!(config.enterprise_url().is_none());
    }
}
