//! The per-request gate in front of the protected service.

use super::AppState;
use super::cookie::{removal_cookie, session_cookie, session_id};
use crate::error::GateError;
use axum::extract::{Request, State};
use axum::http::Uri;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use serde::Serialize;
use teamgate_access::{AccessTier, LoginOutcome, SessionData};
use teamgate_github::{GithubClient, GithubOAuth};
use tracing::{debug, info};

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateIdentity {
    /// GitHub login name.
    pub username: String,
    /// Tier granted at login.
    pub tier: AccessTier,
    /// Team identifier of the gated service.
    pub team_id: String,
}

impl GateIdentity {
    /// Returns the identity of a logged-in session.
    fn from_session(session: &SessionData) -> Option<Self> {
        Some(Self {
            username: session.username().unwrap_or_default().to_string(),
            tier: session.tier(),
            team_id: session.team_id()?.to_string(),
        })
    }
}

/// Authenticates the request or starts a login.
///
/// - logged-in sessions pass if their tier permits the method, else 403
/// - without an `Authorization` header the browser is redirected (307) to
///   GitHub after the login state is stored in the session
/// - with a `Bearer` token a login runs immediately; any failure cleans the
///   session up and answers 401, or 500 for internal failures. A successful
///   login is then held to the same method check
pub async fn authenticate(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let mut session = match state.load_session(session_id(&jar)).await {
        Ok(session) => session,
        Err(e) => {
            return GateError::Internal {
                details: e.to_string(),
            }
            .into_response();
        }
    };

    if let Some(identity) = GateIdentity::from_session(&session) {
        let method = request.method().as_str();
        if !identity.tier.permits(method) {
            return GateError::Forbidden {
                method: method.to_string(),
            }
            .into_response();
        }
        request.extensions_mut().insert(identity);
        return next.run(request).await;
    }

    let Some(authorization) = request.headers().get(AUTHORIZATION) else {
        return start_browser_login(&state, jar, session, request.uri()).await;
    };
    let token = authorization
        .to_str()
        .ok()
        .and_then(bearer_token)
        .map(str::to_string);

    let result = match token {
        Some(token) => bearer_login(&state, &token, &mut session).await,
        None => Err(GateError::Unauthorized {
            reason: "malformed authorization header".to_string(),
        }),
    };

    match result {
        Ok(identity) => {
            let cookie = session_cookie(
                session.id(),
                state.session_config.secure_cookies,
                state.session_config.duration_minutes,
            );
            let method = request.method().as_str();
            if !identity.tier.permits(method) {
                let error = GateError::Forbidden {
                    method: method.to_string(),
                };
                return (jar.add(cookie), error).into_response();
            }
            request.extensions_mut().insert(identity);
            let response = next.run(request).await;
            (jar.add(cookie), response).into_response()
        }
        Err(error) => {
            state.login.cleanup(state.store.as_ref(), &session).await;
            (jar.add(removal_cookie()), error).into_response()
        }
    }
}

async fn start_browser_login(
    state: &AppState,
    jar: PrivateCookieJar,
    mut session: SessionData,
    uri: &Uri,
) -> Response {
    let csrf_state = GithubOAuth::new_state();
    session.begin_login(csrf_state.clone(), uri.to_string());
    if let Err(e) = state.store.save(&session).await {
        return GateError::Internal {
            details: e.to_string(),
        }
        .into_response();
    }

    debug!(session_id = %session.id(), desired_url = %uri, "Redirecting to GitHub for login");
    let cookie = session_cookie(
        session.id(),
        state.session_config.secure_cookies,
        state.session_config.duration_minutes,
    );
    let url = state.oauth.authorization_url(&csrf_state);
    (jar.add(cookie), Redirect::temporary(&url)).into_response()
}

async fn bearer_login(
    state: &AppState,
    token: &str,
    session: &mut SessionData,
) -> Result<GateIdentity, GateError> {
    let directory = GithubClient::new(state.http.clone(), state.api_url.clone(), token);
    match state.login.run(&directory, state.store.as_ref(), session).await {
        Ok(LoginOutcome::Authorized { username, .. }) => {
            info!(username, "Bearer token login succeeded");
            GateIdentity::from_session(session).ok_or_else(|| GateError::Internal {
                details: "session has no team id after login".to_string(),
            })
        }
        Ok(LoginOutcome::Unauthorized(denial)) => Err(GateError::Unauthorized {
            reason: denial.to_string(),
        }),
        Err(e) => Err(GateError::Internal {
            details: e.to_string(),
        }),
    }
}

/// Extracts the token of a `Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    let mut fields = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (fields.next(), fields.next(), fields.next()) else {
        return None;
    };
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teamgate_core::SessionId;

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer gho_abc"), Some("gho_abc"));
        assert_eq!(bearer_token("bearer   gho_abc "), Some("gho_abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
        assert_eq!(bearer_token(""), None);
    }

    #[test]
    fn identity_requires_team_id() {
        let mut session = SessionData::new(SessionId::new("sess1"));
        assert!(GateIdentity::from_session(&session).is_none());

        session.complete_login("alice".to_string(), AccessTier::ReadOnly, "team-1".to_string());
        assert_eq!(
            GateIdentity::from_session(&session),
            Some(GateIdentity {
                username: "alice".to_string(),
                tier: AccessTier::ReadOnly,
                team_id: "team-1".to_string(),
            })
        );
    }
}
