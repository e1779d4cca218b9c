//! The encrypted cookie carrying the session ID.

use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use teamgate_core::SessionId;
use time::Duration as TimeDuration;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "teamgate_session";

/// Returns the session ID carried by the request, if any.
///
/// Cookies that fail to decrypt are treated as absent.
#[must_use]
pub fn session_id(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::new(cookie.value().to_string()))
        .filter(|id| !id.as_str().is_empty())
}

/// Builds the cookie pointing the browser at `id`.
#[must_use]
pub fn session_cookie(id: &SessionId, secure: bool, max_age_minutes: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(max_age_minutes))
        .build()
}

/// Builds a cookie that removes the session cookie.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie(&SessionId::new("sess_1"), true, 30);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "sess_1");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(TimeDuration::minutes(30)));
    }

    #[test]
    fn jar_round_trips_session_id() {
        let jar = PrivateCookieJar::new(Key::generate());
        assert!(session_id(&jar).is_none());

        let jar = jar.add(session_cookie(&SessionId::new("sess_1"), false, 30));
        assert_eq!(session_id(&jar), Some(SessionId::new("sess_1")));
    }
}
