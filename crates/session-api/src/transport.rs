//! Session token carried in a cookie

use axum::http::{HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;

use session_core::{SessionConfig, TokenTransport};

pub struct CookieTransport {
    jar: CookieJar,
    name: String,
    secure: bool,
    issued: Option<Cookie<'static>>,
}

impl CookieTransport {
    pub fn from_headers(headers: &HeaderMap, config: &SessionConfig) -> Self {
        Self {
            jar: CookieJar::from_headers(headers),
            name: config.cookie_name.clone(),
            secure: config.secure,
            issued: None,
        }
    }

    pub fn session_cookie(name: &str, value: &str, secure: bool, ttl: Duration) -> Cookie<'static> {
        let max_age = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((name.to_string(), value.to_string()))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    /// Cookie that tells the client to drop its session token.
    pub fn removal_cookie(name: &str, secure: bool) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    /// `Set-Cookie` value for a token written during this request.
    pub fn set_cookie_header(&self) -> Option<HeaderValue> {
        self.issued
            .as_ref()
            .and_then(|c| HeaderValue::from_str(&c.to_string()).ok())
    }
}

impl TokenTransport for CookieTransport {
    fn get_token(&self) -> Option<String> {
        self.jar
            .get(&self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn set_token(&mut self, value: &str, ttl: Duration) {
        self.issued = Some(Self::session_cookie(&self.name, value, self.secure, ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    fn config(secure: bool) -> SessionConfig {
        SessionConfig {
            cookie_name: "sid".to_string(),
            secure,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_reads_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sid=abc123"));
        let transport = CookieTransport::from_headers(&headers, &config(false));
        assert_eq!(transport.get_token(), Some("abc123".to_string()));
    }

    #[test]
    fn test_missing_or_empty_cookie_is_absent() {
        let transport = CookieTransport::from_headers(&HeaderMap::new(), &config(false));
        assert_eq!(transport.get_token(), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sid="));
        let transport = CookieTransport::from_headers(&headers, &config(false));
        assert_eq!(transport.get_token(), None);
    }

    #[test]
    fn test_set_token_builds_cookie_attributes() {
        let mut transport = CookieTransport::from_headers(&HeaderMap::new(), &config(true));
        assert!(transport.set_cookie_header().is_none());

        transport.set_token("f00d", Duration::from_secs(3600));
        let header = transport.set_cookie_header().unwrap();
        let header = header.to_str().unwrap();
        assert!(header.starts_with("sid=f00d"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=3600"));
    }

    #[test]
    fn test_removal_cookie_expires_immediately() {
        let cookie = CookieTransport::removal_cookie("sid", false).to_string();
        assert!(cookie.starts_with("sid=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }
}
