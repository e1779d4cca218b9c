//! GitHub REST API client bound to one user's access token.
//!
//! Only the three endpoints the login flow needs are implemented:
//! - `GET /user`
//! - `GET /user/teams`
//! - `GET /user/orgs`
//!
//! Listings are paginated with GitHub's `Link` response header.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use teamgate_access::{DirectoryError, Page, ProviderOrg, ProviderTeam, ProviderUser, TeamDirectory};
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("teamgate/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const PER_PAGE: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the HTTP client shared by API and OAuth requests.
///
/// # Errors
///
/// Returns `ClientSetup` if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, Report<DirectoryError>> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| {
            DirectoryError::ClientSetup {
                details: e.to_string(),
            }
            .into()
        })
}

/// A [`TeamDirectory`] backed by the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Creates a client for `api_url` acting with `token`.
    ///
    /// The HTTP client is cheap to clone; pass one shared instance.
    #[must_use]
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Fetches one JSON resource and the next page announced for it.
    #[instrument(skip(self, query), fields(api_url = %self.api_url))]
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, u32)],
    ) -> Result<(T, Option<u32>), Report<DirectoryError>> {
        let response = self
            .http
            .get(format!("{}{endpoint}", self.api_url))
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .query(query)
            .send()
            .await
            .map_err(|e| DirectoryError::RequestFailed {
                endpoint: endpoint.to_string(),
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "GitHub returned an error status");
            return Err(DirectoryError::UnexpectedStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_from_link);

        let body = response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::InvalidResponse {
                endpoint: endpoint.to_string(),
                details: e.to_string(),
            })?;

        Ok((body, next_page))
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page: u32,
    ) -> Result<Page<T>, Report<DirectoryError>> {
        let (items, next_page) = self
            .get::<Vec<T>>(endpoint, &[("per_page", PER_PAGE), ("page", page)])
            .await?;
        Ok(Page { items, next_page })
    }
}

#[async_trait]
impl TeamDirectory for GithubClient {
    async fn current_user(&self) -> Result<ProviderUser, Report<DirectoryError>> {
        let (user, _) = self.get::<ProviderUser>("/user", &[]).await?;
        Ok(user)
    }

    async fn user_teams(&self, page: u32) -> Result<Page<ProviderTeam>, Report<DirectoryError>> {
        self.get_page("/user/teams", page).await
    }

    async fn user_orgs(&self, page: u32) -> Result<Page<ProviderOrg>, Report<DirectoryError>> {
        self.get_page("/user/orgs", page).await
    }
}

/// Extracts the `page` parameter of the `rel="next"` link, if any.
///
/// The header looks like
/// `<https://api.github.com/user/teams?page=2>; rel="next", <…>; rel="last"`.
fn next_page_from_link(header: &str) -> Option<u32> {
    header.split(',').find_map(|link| {
        let mut parts = link.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            param
                .trim()
                .strip_prefix("rel=")
                .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "next"))
        });
        if !is_next {
            return None;
        }

        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let url = reqwest::Url::parse(url).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
    })
}
