//! Encrypted, session-continuous request transport.
//!
//! Every call POSTs the encrypted JSON payload as `text/plain` and replays
//! the current session: the application token in `x-bizflow-session-key`
//! and, once the server has issued one, the `JSESSIONID` cookie.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::crypto::PayloadCipher;
use crate::error::{Result, TransportError};
use crate::session::{cookie_header, session_cookie_from_headers, SessionState};

/// Header carrying the application session token.
pub const SESSION_KEY_HEADER: &str = "x-bizflow-session-key";

/// User agent sent on every encrypted API request.
pub const USER_AGENT: &str = "ApiTester/1.0";

/// Connection settings shared by the API and upload clients.
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// INSECURE: skip TLS certificate validation. Only for internal servers
    /// with self-signed certificates.
    pub accept_invalid_certs: bool,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

pub(crate) fn build_http_client(
    options: &HttpOptions,
    user_agent: Option<&str>,
) -> std::result::Result<Client, TransportError> {
    let mut builder = Client::builder();
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent);
    }
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    if options.accept_invalid_certs {
        warn!("TLS certificate validation is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }
    Ok(builder.build()?)
}

/// Client for the encrypted BizFlow API endpoint.
///
/// Owns one connection pool and one [`SessionState`]. Exchanges are
/// serialized: the session lock is held from request build until the
/// response has been fully read and the session updated.
pub struct TransportClient {
    http: Client,
    endpoint: String,
    cipher: PayloadCipher,
    session: Mutex<SessionState>,
}

impl TransportClient {
    pub fn new(
        endpoint: impl Into<String>,
        cipher: PayloadCipher,
        options: &HttpOptions,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http_client(options, Some(USER_AGENT))?,
            endpoint: endpoint.into(),
            cipher,
            session: Mutex::new(SessionState::new()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encrypt `envelope`, send it and return the response body unmodified.
    ///
    /// A `Set-Cookie` carrying a new `JSESSIONID` on a successful response
    /// replaces the stored cookie id. The application token is left alone;
    /// callers extract it from the login response themselves.
    ///
    /// Dropping the returned future before it completes leaves the session
    /// untouched.
    pub async fn send<T: Serialize + ?Sized>(&self, envelope: &T) -> Result<String> {
        let payload = serde_json::to_string(envelope).map_err(TransportError::from)?;
        let body = self.cipher.encrypt(&payload)?;
        debug!(
            operation = "transport.send",
            payload_bytes = payload.len(),
            encrypted_bytes = body.len(),
            "payload encrypted"
        );

        let mut session = self.session.lock().await;
        let headers = outbound_headers(&session)?;

        let response = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(TransportError::from)?;

        let status = response.status();
        let cookie = session_cookie_from_headers(response.headers());
        let text = response.text().await.map_err(TransportError::from)?;

        if !status.is_success() {
            warn!(operation = "transport.send", %status, "request failed");
            return Err(TransportError::Status { status, body: text }.into());
        }

        if let Some(id) = cookie {
            info!(operation = "transport.send", "session cookie updated");
            session.set_cookie_id(id);
        }
        debug!(operation = "transport.send", response_bytes = text.len(), "response received");

        Ok(text)
    }

    /// Store the application session token for subsequent requests.
    pub async fn set_session_token(&self, token: impl Into<String>) {
        self.session.lock().await.set_token(token);
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    /// Forget the token and the cookie session id before a fresh login.
    ///
    /// The HTTP client keeps no cookie store, so this discards all cookie
    /// state held by the transport.
    pub async fn reset_session(&self) {
        self.session.lock().await.clear();
        info!(operation = "transport.reset_session", "session cleared");
    }
}

/// Headers replaying `session` on an encrypted API request.
///
/// The token header is always present (empty before login); the `Cookie`
/// header only once a cookie session id is known.
pub fn outbound_headers(session: &SessionState) -> std::result::Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

    let token = session.token().unwrap_or_default();
    headers.insert(
        SESSION_KEY_HEADER,
        HeaderValue::from_str(token)
            .map_err(|_| TransportError::InvalidHeader(SESSION_KEY_HEADER.to_string()))?,
    );

    if let Some(id) = session.cookie_id() {
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie_header(id))
                .map_err(|_| TransportError::InvalidHeader(COOKIE.as_str().to_string()))?,
        );
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cookie_header_before_session_is_known() {
        let headers = outbound_headers(&SessionState::new()).unwrap();
        assert!(headers.get(COOKIE).is_none());
        assert_eq!(headers[SESSION_KEY_HEADER], "");
        assert_eq!(headers[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn replays_token_and_cookie() {
        let mut session = SessionState::new();
        session.set_token("tok-1");
        session.set_cookie_id("ABC123");

        let headers = outbound_headers(&session).unwrap();
        assert_eq!(headers[SESSION_KEY_HEADER], "tok-1");
        assert_eq!(headers[COOKIE], "JSESSIONID=ABC123; Path=/bizflow; HttpOnly");
    }

    #[test]
    fn rejects_token_that_cannot_be_a_header() {
        let mut session = SessionState::new();
        session.set_token("bad\ntoken");
        assert!(matches!(
            outbound_headers(&session),
            Err(TransportError::InvalidHeader(_))
        ));
    }
}
