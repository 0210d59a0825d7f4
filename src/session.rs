//! Session state threaded across otherwise stateless API calls.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Name of the J2EE web-session cookie issued by the BizFlow server.
pub const SESSION_COOKIE_NAME: &str = "JSESSIONID";

/// Cookie path the server scopes its session cookie to.
pub const SESSION_COOKIE_PATH: &str = "/bizflow";

/// Application session token plus the server's cookie session id.
///
/// Not synchronized; `TransportClient` guards its instance with a mutex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    app_session_token: Option<String>,
    cookie_session_id: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.app_session_token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.app_session_token = Some(token.into());
    }

    pub fn cookie_id(&self) -> Option<&str> {
        self.cookie_session_id.as_deref()
    }

    pub fn set_cookie_id(&mut self, id: impl Into<String>) {
        self.cookie_session_id = Some(id.into());
    }

    /// Forget both the token and the cookie session id.
    pub fn clear(&mut self) {
        self.app_session_token = None;
        self.cookie_session_id = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.app_session_token.is_some()
    }
}

/// Value for the outbound `Cookie` header replaying a known session id.
pub fn cookie_header(id: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={id}; Path={SESSION_COOKIE_PATH}; HttpOnly")
}

/// Find the session id in the response's `Set-Cookie` headers.
///
/// Only a cookie that names `JSESSIONID` and is scoped to `Path=/bizflow`
/// counts, e.g. `JSESSIONID=33A05732; Path=/bizflow; HttpOnly`.
pub fn session_cookie_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter(|cookie| {
            cookie.contains(SESSION_COOKIE_NAME)
                && cookie.contains(&format!("Path={SESSION_COOKIE_PATH}"))
        })
        .find_map(parse_session_id)
}

fn parse_session_id(cookie: &str) -> Option<String> {
    cookie
        .split(';')
        .map(str::trim)
        .find(|part| part.starts_with(SESSION_COOKIE_NAME))
        .and_then(|part| part.split_once('='))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn with_cookies(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(SET_COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn clear_resets_both_fields() {
        let mut session = SessionState::new();
        session.set_token("tok-1");
        session.set_cookie_id("ABC123");
        assert!(session.is_authenticated());

        session.clear();
        assert_eq!(session, SessionState::default());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn extracts_bizflow_session_cookie() {
        let headers = with_cookies(&["JSESSIONID=ABC123; Path=/bizflow; HttpOnly"]);
        assert_eq!(session_cookie_from_headers(&headers).as_deref(), Some("ABC123"));
    }

    #[test]
    fn ignores_cookie_without_bizflow_path() {
        let headers = with_cookies(&["JSESSIONID=ABC123; Path=/; HttpOnly"]);
        assert_eq!(session_cookie_from_headers(&headers), None);
    }

    #[test]
    fn picks_session_cookie_among_others() {
        let headers = with_cookies(&[
            "locale=en; Path=/bizflow",
            "Path=/bizflow; JSESSIONID=XYZ; Secure",
        ]);
        assert_eq!(session_cookie_from_headers(&headers).as_deref(), Some("XYZ"));
    }

    #[test]
    fn empty_session_value_is_not_an_update() {
        let headers = with_cookies(&["JSESSIONID=; Path=/bizflow; HttpOnly"]);
        assert_eq!(session_cookie_from_headers(&headers), None);
        assert_eq!(session_cookie_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn cookie_header_matches_wire_format() {
        assert_eq!(cookie_header("ABC123"), "JSESSIONID=ABC123; Path=/bizflow; HttpOnly");
    }
}
