use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

// Same expiry policy the backend applies at login.
pub const ACCESS_TTL_SECS: i64 = 60 * 15;
pub const REFRESH_TTL_SECS: i64 = 60 * 60 * 24 * 30;

/// Opaque bearer token pair as the backend issues it. Rotated atomically on
/// refresh: both cookies are always replaced together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Request-scoped view of the session cookies, extracted once per inbound
/// request and handed to the backend caller explicitly. Keeps the
/// refresh/retry protocol testable without a web request in scope.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl Session {
    pub fn from_request(req: &HttpRequest) -> Self {
        Self {
            access: req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()),
            refresh: req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string()),
        }
    }
}

fn session_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(max_age_secs))
        .finish()
}

/// Cookies for a freshly issued or rotated token pair.
pub fn issue_cookies(pair: &TokenPair) -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_COOKIE, pair.access_token.clone(), ACCESS_TTL_SECS),
        session_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), REFRESH_TTL_SECS),
    ]
}

/// Logout cookies: empty value, max-age 0.
pub fn clear_cookies() -> [Cookie<'static>; 2] {
    [
        session_cookie(ACCESS_COOKIE, String::new(), 0),
        session_cookie(REFRESH_COOKIE, String::new(), 0),
    ]
}
