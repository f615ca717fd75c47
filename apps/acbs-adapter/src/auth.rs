//! IdP session authentication.
//!
//! ACBS accepts a bearer token issued by its IdP. Getting one takes two
//! sequential round-trips:
//!
//! 1. `POST {auth}/sessions` with the login name and password. The IdP
//!    answers with a `JSESSIONID` cookie.
//! 2. `GET {auth}/idptoken/openid-connect?client_id=...` carrying that
//!    cookie. The IdP answers with `{"id_token": "..."}`.
//!
//! Both requests carry the API key header. Tokens are not cached: every
//! call to [`AcbsAuthenticator::get_token`] runs the full handshake.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use serde::Serialize;
use serde_json::Value;

use crate::application::ports::TokenProvider;
use crate::config::AcbsConfig;
use crate::error::AcbsError;
use crate::gateway::execute;

/// Cookie name prefix of the IdP session cookie.
pub const SESSION_COOKIE_PREFIX: &str = "JSESSIONID";

const CREATE_SESSION_FAILED: &str = "Failed to create a session with the IdP.";
const SESSION_COOKIE_MISSING: &str = "Session cookie was not returned by the IdP.";
const GET_TOKEN_FAILED: &str = "Failed to get a token from the IdP.";
const ID_TOKEN_MISSING: &str = "ID token was not returned by the IdP.";

// =============================================================================
// Credentials and tokens
// =============================================================================

/// Long-lived IdP credentials.
///
/// The `Debug` implementation redacts the password and API key.
#[derive(Clone)]
pub struct Credentials {
    login_name: String,
    password: String,
    api_key: String,
    api_key_header_name: String,
    client_id: String,
    auth_base_url: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(
        login_name: impl Into<String>,
        password: impl Into<String>,
        api_key: impl Into<String>,
        api_key_header_name: impl Into<String>,
        client_id: impl Into<String>,
        auth_base_url: impl Into<String>,
    ) -> Self {
        Self {
            login_name: login_name.into(),
            password: password.into(),
            api_key: api_key.into(),
            api_key_header_name: api_key_header_name.into(),
            client_id: client_id.into(),
            auth_base_url: auth_base_url.into(),
        }
    }

    /// Build credentials from the ACBS configuration.
    #[must_use]
    pub fn from_config(config: &AcbsConfig) -> Self {
        let auth = &config.authentication;
        Self::new(
            auth.login_name.clone(),
            auth.password.clone(),
            config.api_key.clone(),
            config.api_key_header_name.clone(),
            auth.client_id.clone(),
            auth.base_url.clone(),
        )
    }

    /// Login name.
    #[must_use]
    pub fn login_name(&self) -> &str {
        &self.login_name
    }

    /// OpenID Connect client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// IdP base URL.
    #[must_use]
    pub fn auth_base_url(&self) -> &str {
        &self.auth_base_url
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_name", &self.login_name)
            .field("password", &"[REDACTED]")
            .field("api_key", &"[REDACTED]")
            .field("api_key_header_name", &self.api_key_header_name)
            .field("client_id", &self.client_id)
            .field("auth_base_url", &self.auth_base_url)
            .finish()
    }
}

/// The meaningful part of the IdP session cookie, e.g. `JSESSIONID=abc123`.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie(String);

impl SessionCookie {
    /// Cookie value as sent back in the `Cookie` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCookie([REDACTED])")
    }
}

/// An opaque, non-empty bearer token for the ACBS business API.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a token. Returns `None` for an empty string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Pick the session cookie out of `Set-Cookie` values.
///
/// The first value starting with `JSESSIONID` wins; attributes after the
/// first `;` are dropped.
pub fn extract_session_cookie<'a, I>(set_cookie_values: I) -> Option<SessionCookie>
where
    I: IntoIterator<Item = &'a str>,
{
    let cookie = set_cookie_values
        .into_iter()
        .find(|value| value.starts_with(SESSION_COOKIE_PREFIX))?;
    let value = cookie.split_once(';').map_or(cookie, |(value, _)| value);
    Some(SessionCookie(value.to_string()))
}

/// Read `id_token` from a token-exchange body. Missing, null, empty and
/// non-string tokens, and bodies that are not JSON, all yield `None`.
pub fn extract_id_token(body: &str) -> Option<BearerToken> {
    let value: Value = serde_json::from_str(body).ok()?;
    let token = value.get("id_token")?.as_str()?;
    BearerToken::new(token)
}

// =============================================================================
// Authenticator
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest<'a> {
    login_name: &'a str,
    password: &'a str,
}

/// Runs the two-phase IdP handshake.
#[derive(Debug, Clone)]
pub struct AcbsAuthenticator {
    client: Client,
    credentials: Credentials,
}

impl AcbsAuthenticator {
    /// Create an authenticator.
    #[must_use]
    pub const fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Credentials in use.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Obtain a fresh bearer token: create a session, then exchange its
    /// cookie for a token.
    pub async fn get_token(&self) -> Result<BearerToken, AcbsError> {
        let session_cookie = self.create_session().await?;
        self.exchange_for_token(&session_cookie).await
    }

    /// Phase one: log in and return the session cookie.
    pub async fn create_session(&self) -> Result<SessionCookie, AcbsError> {
        let credentials = &self.credentials;
        let url = format!("{}/sessions", credentials.auth_base_url);

        let request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(
                credentials.api_key_header_name.as_str(),
                credentials.api_key.as_str(),
            )
            .json(&CreateSessionRequest {
                login_name: &credentials.login_name,
                password: &credentials.password,
            });

        let response = execute(request).await.map_err(|raw| {
            tracing::error!(
                error = %raw,
                status = ?raw.status(),
                "Failed to create a session with the IdP"
            );
            AcbsError::authentication_failed_with(CREATE_SESSION_FAILED, raw)
        })?;

        extract_session_cookie(response.header_values(SET_COOKIE.as_str())).ok_or_else(|| {
            tracing::warn!(
                status = %response.status(),
                "IdP session response did not include a JSESSIONID cookie"
            );
            AcbsError::authentication_failed(SESSION_COOKIE_MISSING)
        })
    }

    /// Phase two: exchange the session cookie for a bearer token.
    pub async fn exchange_for_token(
        &self,
        session_cookie: &SessionCookie,
    ) -> Result<BearerToken, AcbsError> {
        let credentials = &self.credentials;
        let url = format!("{}/idptoken/openid-connect", credentials.auth_base_url);

        let request = self
            .client
            .get(&url)
            .query(&[("client_id", credentials.client_id.as_str())])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(
                credentials.api_key_header_name.as_str(),
                credentials.api_key.as_str(),
            )
            .header(COOKIE, session_cookie.as_str());

        let response = execute(request).await.map_err(|raw| {
            tracing::error!(
                error = %raw,
                status = ?raw.status(),
                "Failed to get a token from the IdP"
            );
            AcbsError::authentication_failed_with(GET_TOKEN_FAILED, raw)
        })?;

        extract_id_token(response.body()).ok_or_else(|| {
            tracing::warn!(
                status = %response.status(),
                "IdP token response did not include an id_token"
            );
            AcbsError::authentication_failed(ID_TOKEN_MISSING)
        })
    }
}

#[async_trait]
impl TokenProvider for AcbsAuthenticator {
    async fn get_token(&self) -> Result<BearerToken, AcbsError> {
        Self::get_token(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_session_cookie_takes_first_jsessionid_without_attributes() {
        let cookies = [
            "cookie1=value1; Path=/",
            "JSESSIONID=abc123; Path=/p",
            "JSESSIONID=other; Path=/q",
            "cookie2=value2",
        ];
        let cookie = extract_session_cookie(cookies).unwrap();
        assert_eq!(cookie.as_str(), "JSESSIONID=abc123");
    }

    #[test]
    fn extract_session_cookie_without_attributes_keeps_whole_value() {
        let cookie = extract_session_cookie(["JSESSIONID=abc123"]).unwrap();
        assert_eq!(cookie.as_str(), "JSESSIONID=abc123");
    }

    #[test]
    fn extract_session_cookie_requires_prefix_at_start() {
        assert!(extract_session_cookie(["a=1", "x-JSESSIONID=2", "jsessionid=3"]).is_none());
        assert!(extract_session_cookie(std::iter::empty::<&str>()).is_none());
    }

    #[test]
    fn extract_id_token_accepts_non_empty_string() {
        let token = extract_id_token(r#"{"id_token":"tok1","expires_in":300}"#).unwrap();
        assert_eq!(token.as_str(), "tok1");
    }

    #[test]
    fn extract_id_token_rejects_missing_or_invalid_tokens() {
        for body in [
            r#"{"id_token":""}"#,
            r#"{"id_token":null}"#,
            r#"{"id_token":42}"#,
            "{}",
            "null",
            "",
            "not json",
        ] {
            assert!(extract_id_token(body).is_none(), "{body:?}");
        }
    }

    #[test]
    fn bearer_token_rejects_empty() {
        assert!(BearerToken::new("").is_none());
        let token = BearerToken::new("t").unwrap();
        assert_eq!(token.as_str(), "t");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials::new(
            "user",
            "super_secret",
            "api-key-value",
            "x-api-key",
            "client",
            "http://idp.test",
        );
        let debug = format!("{credentials:?}");
        assert!(debug.contains("user"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super_secret"));
        assert!(!debug.contains("api-key-value"));

        let token = BearerToken::new("secret-token").unwrap();
        assert!(!format!("{token:?}").contains("secret-token"));
    }

    #[test]
    fn create_session_request_uses_camel_case() {
        let body = serde_json::to_string(&CreateSessionRequest {
            login_name: "user",
            password: "pw",
        })
        .unwrap();
        assert_eq!(body, r#"{"loginName":"user","password":"pw"}"#);
    }
}
