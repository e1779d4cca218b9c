//! Routes for the OAuth callback, GitHub webhooks, logout and identity.

use super::cookie::{removal_cookie, session_cookie, session_id};
use super::{AppState, GateIdentity};
use crate::error::GateError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Extension, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use teamgate_access::{
    AccessTier, Delivery, EVENT_HEADER, LoginOutcome, SIGNATURE_HEADER, SessionData,
};
use teamgate_github::GithubClient;
use tracing::{debug, info, warn};

/// Query parameters GitHub sends to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Completes a browser login started by the gate.
///
/// On success the browser is sent back (307) to the URL it originally
/// requested. Any failure cleans the session up.
pub async fn login_callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(query): Query<CallbackQuery>,
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

    match complete_login(&state, &query, &mut session).await {
        Ok(desired_url) => {
            let cookie = session_cookie(
                session.id(),
                state.session_config.secure_cookies,
                state.session_config.duration_minutes,
            );
            (jar.add(cookie), Redirect::temporary(&desired_url)).into_response()
        }
        Err(error) => {
            state.login.cleanup(state.store.as_ref(), &session).await;
            (jar.add(removal_cookie()), error).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: &CallbackQuery,
    session: &mut SessionData,
) -> Result<String, GateError> {
    let desired_url = session
        .desired_url()
        .ok_or_else(|| GateError::Internal {
            details: "session has no desired URL".to_string(),
        })?
        .to_string();
    let expected_state = session.state().ok_or_else(|| GateError::Internal {
        details: "session has no OAuth state".to_string(),
    })?;

    if query.state.as_deref() != Some(expected_state) {
        warn!(session_id = %session.id(), "OAuth state mismatch on login callback");
        return Err(GateError::Unauthorized {
            reason: "OAuth state mismatch".to_string(),
        });
    }
    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| GateError::Unauthorized {
            reason: "callback carries no authorization code".to_string(),
        })?;

    let token = state
        .oauth
        .exchange_code(code)
        .await
        .map_err(|e| GateError::Internal {
            details: e.to_string(),
        })?;

    session.clear_login_state();
    let directory = GithubClient::new(state.http.clone(), state.api_url.clone(), token);
    match state.login.run(&directory, state.store.as_ref(), session).await {
        Ok(LoginOutcome::Authorized { username, tier }) => {
            info!(username, tier = %tier, "Browser login succeeded");
            Ok(desired_url)
        }
        Ok(LoginOutcome::Unauthorized(denial)) => Err(GateError::Unauthorized {
            reason: denial.to_string(),
        }),
        Err(e) => Err(GateError::Internal {
            details: e.to_string(),
        }),
    }
}

/// Receives GitHub webhook deliveries.
///
/// Unverified and irrelevant deliveries get an empty 200 so GitHub does not
/// retry them; undecodable payloads get 400.
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok());

    match state
        .webhooks
        .handle(signature, event_type, &body, state.store.as_ref())
        .await
    {
        Ok(Delivery::Applied(sessions)) => {
            info!(event_type, dropped = sessions.len(), "Applied webhook event");
            StatusCode::OK.into_response()
        }
        Ok(Delivery::Ignored | Delivery::Unverified) => StatusCode::OK.into_response(),
        Err(e) => GateError::MalformedInput {
            details: e.to_string(),
        }
        .into_response(),
    }
}

/// Logs the caller out by destroying their session.
pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    if let Some(id) = session_id(&jar) {
        match state.store.load(&id).await {
            Ok(Some(session)) => state.login.cleanup(state.store.as_ref(), &session).await,
            Ok(None) => debug!(session_id = %id, "Logout for unknown session"),
            Err(e) => warn!(session_id = %id, error = %e, "Failed to load session on logout"),
        }
    }

    (jar.add(removal_cookie()), Redirect::to("/"))
}

/// Identity of the current session.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionInfo {
    pub username: String,
    pub access_level: AccessTier,
    pub team_id: String,
}

/// Returns the identity the gate attached to the request.
pub async fn session_info(Extension(identity): Extension<GateIdentity>) -> Json<SessionInfo> {
    Json(SessionInfo {
        username: identity.username,
        access_level: identity.tier,
        team_id: identity.team_id,
    })
}
