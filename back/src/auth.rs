//! Resolving the logged-in user for a request.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Duration;
use tickbox_api::v1::UserId;

use crate::{
    sessions::{SessionToken, COOKIE_NAME},
    AppState,
};

pub const LOGIN_PATH: &str = "/login";

/// The user behind the request's session cookie.
///
/// Requests without a live session are redirected to the login page before
/// the handler runs.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub token: SessionToken,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let login = || Redirect::to(LOGIN_PATH).into_response();

        let token = session_cookie(&parts.headers).ok_or_else(login)?;
        let id = state.sessions.resolve(&token).await.ok_or_else(login)?;
        let user = state.accounts.user(id).await.ok_or_else(login)?;

        Ok(Self {
            id,
            username: user.username,
            token,
        })
    }
}

pub fn session_cookie(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| SessionToken::from_cookie(value))
}

pub fn set_session_cookie(token: &SessionToken, ttl: Duration, secure: bool) -> String {
    cookie(token.as_str(), ttl.num_seconds(), secure)
}

pub fn clear_session_cookie(secure: bool) -> String {
    cookie("", 0, secure)
}

fn cookie(value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie =
        format!("{COOKIE_NAME}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn finds_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("lang=en; tickbox_session=abc123"),
        );

        let token = session_cookie(&headers).unwrap();
        assert_eq!(token.as_str(), "abc123");
    }

    #[test]
    fn missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));

        assert!(session_cookie(&headers).is_none());
    }

    #[test]
    fn secure_flag_follows_tls() {
        assert!(clear_session_cookie(true).ends_with("; Secure"));
        assert!(!clear_session_cookie(false).contains("Secure"));
        assert!(clear_session_cookie(false).contains("Max-Age=0"));
    }
}
