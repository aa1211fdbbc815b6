//! Session cookie codec.
//!
//! The session token travels in a single cookie:
//!
//! ```text
//! session_token=<hex>; Path=/; HttpOnly; SameSite=Lax; Expires=<expiry>; Max-Age=<secs>[; Secure]
//! ```
//!
//! `Secure` is only added in production, where the site is served over TLS.
//! This is the only place that touches the `Cookie` / `Set-Cookie` headers;
//! everything below the HTTP layer receives the token as a plain string.

use axum::http::{
    HeaderMap, HeaderValue,
    header::{COOKIE, InvalidHeaderValue},
};
use chrono::{DateTime, Utc};
use drive_school::auth::IssuedSession;

/// Default cookie name
pub const SESSION_COOKIE_NAME: &str = "session_token";

const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Cookie settings shared by every handler
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    /// Create cookie settings. `secure` adds the `Secure` attribute.
    pub fn new(secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            secure,
        }
    }

    /// Extract the session token from the request's `Cookie` headers.
    ///
    /// Empty values count as absent.
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.name && !value.is_empty())
            .map(|(_, value)| value.trim_matches('"').to_string())
    }

    /// `Set-Cookie` value carrying a freshly issued session
    pub fn issue(&self, session: &IssuedSession) -> Result<HeaderValue, InvalidHeaderValue> {
        let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
        HeaderValue::from_str(&self.render(
            &session.token,
            &http_date(session.expires_at),
            max_age,
        ))
    }

    /// `Set-Cookie` value that makes the browser drop the cookie
    pub fn clear(&self) -> HeaderValue {
        HeaderValue::from_str(&self.render("", EXPIRED, 0))
            .unwrap_or_else(|_| HeaderValue::from_static("session_token=; Path=/; Max-Age=0"))
    }

    fn render(&self, value: &str, expires: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Expires={}; Max-Age={}",
            self.name, value, expires, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self::new(false)
    }
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
