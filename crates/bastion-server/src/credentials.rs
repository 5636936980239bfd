//! The two session cookies.
//!
//! `admin_token` carries the upstream token and is `HttpOnly`.
//! `admin_token_client` carries the same token for console scripts. Both are
//! always issued and cleared together with identical attributes.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bastion_upstream::Credential;

use crate::config::ServerConfig;

/// Server-only credential cookie.
pub const CREDENTIAL_COOKIE: &str = "admin_token";

/// Script-readable companion cookie.
pub const CLIENT_CREDENTIAL_COOKIE: &str = "admin_token_client";

/// Attributes shared by both cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub max_age: Duration,
}

impl CookiePolicy {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            secure: config.secure_cookies,
            max_age: config.session_max_age,
        }
    }

    fn build(
        &self,
        name: &'static str,
        value: String,
        http_only: bool,
        max_age: Duration,
    ) -> Cookie<'static> {
        let seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((name, value))
            .path("/")
            .http_only(http_only)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(seconds))
            .build()
    }
}

/// Add both credential cookies to the jar.
pub fn issue(jar: CookieJar, credential: &Credential, policy: &CookiePolicy) -> CookieJar {
    let token = credential.expose().to_string();
    jar.add(policy.build(CREDENTIAL_COOKIE, token.clone(), true, policy.max_age))
        .add(policy.build(CLIENT_CREDENTIAL_COOKIE, token, false, policy.max_age))
}

/// Overwrite both credential cookies with empty, already-expired values.
pub fn clear(jar: CookieJar, policy: &CookiePolicy) -> CookieJar {
    jar.add(policy.build(CREDENTIAL_COOKIE, String::new(), true, Duration::ZERO))
        .add(policy.build(CLIENT_CREDENTIAL_COOKIE, String::new(), false, Duration::ZERO))
}

/// The session credential from `admin_token`, if present and non-empty.
///
/// The companion cookie is never consulted.
pub fn read_credential(jar: &CookieJar) -> Option<Credential> {
    jar.get(CREDENTIAL_COOKIE)
        .and_then(|cookie| Credential::new(cookie.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use axum::response::IntoResponse;

    fn policy(secure: bool) -> CookiePolicy {
        CookiePolicy {
            secure,
            max_age: Duration::from_secs(604_800),
        }
    }

    fn set_cookies(jar: CookieJar) -> Vec<Cookie<'static>> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| Cookie::parse(v.to_str().unwrap().to_string()).unwrap())
            .collect()
    }

    #[test]
    fn test_issue_sets_both_cookies() {
        let credential = Credential::new("tok-123").unwrap();
        let cookies = set_cookies(issue(CookieJar::new(), &credential, &policy(false)));
        assert_eq!(cookies.len(), 2);

        let server = cookies.iter().find(|c| c.name() == CREDENTIAL_COOKIE).unwrap();
        let client = cookies
            .iter()
            .find(|c| c.name() == CLIENT_CREDENTIAL_COOKIE)
            .unwrap();

        assert_eq!(server.value(), "tok-123");
        assert_eq!(client.value(), "tok-123");
        assert_eq!(server.http_only(), Some(true));
        assert_ne!(client.http_only(), Some(true));
        for cookie in [server, client] {
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
            assert_eq!(cookie.max_age(), Some(time::Duration::seconds(604_800)));
            assert_ne!(cookie.secure(), Some(true));
        }
    }

    #[test]
    fn test_issue_secure_in_production() {
        let credential = Credential::new("tok").unwrap();
        let cookies = set_cookies(issue(CookieJar::new(), &credential, &policy(true)));
        assert!(cookies.iter().all(|c| c.secure() == Some(true)));
    }

    #[test]
    fn test_clear_expires_both_cookies() {
        let cookies = set_cookies(clear(CookieJar::new(), &policy(false)));
        assert_eq!(cookies.len(), 2);
        for cookie in &cookies {
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
            assert_eq!(cookie.path(), Some("/"));
        }
    }

    #[test]
    fn test_read_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("admin_token=abc; admin_token_client=abc"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(read_credential(&jar).unwrap().expose(), "abc");
    }

    #[test]
    fn test_client_cookie_alone_is_not_a_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_token_client=abc"));
        assert!(read_credential(&CookieJar::from_headers(&headers)).is_none());
    }

    #[test]
    fn test_empty_cookie_is_not_a_session() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("admin_token="));
        assert!(read_credential(&CookieJar::from_headers(&headers)).is_none());
    }
}
