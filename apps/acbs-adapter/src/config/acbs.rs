//! ACBS connection configuration.

use std::time::Duration;

use serde::Deserialize;

/// Connection settings for ACBS and its IdP.
#[derive(Clone, Deserialize)]
pub struct AcbsConfig {
    /// Base URL of the ACBS business API.
    pub base_url: String,
    /// API key sent to the IdP.
    pub api_key: String,
    /// Header name carrying the API key.
    pub api_key_header_name: String,
    /// Ask ACBS to return exception details in error bodies.
    #[serde(default)]
    pub use_return_exception_header: bool,
    /// HTTP client timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// IdP login settings.
    pub authentication: AuthenticationConfig,
}

impl AcbsConfig {
    /// HTTP client timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl std::fmt::Debug for AcbsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcbsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("api_key_header_name", &self.api_key_header_name)
            .field(
                "use_return_exception_header",
                &self.use_return_exception_header,
            )
            .field("timeout_secs", &self.timeout_secs)
            .field("authentication", &self.authentication)
            .finish()
    }
}

/// IdP login settings.
#[derive(Clone, Deserialize)]
pub struct AuthenticationConfig {
    /// Base URL of the IdP.
    pub base_url: String,
    /// Login name for session creation.
    pub login_name: String,
    /// Password for session creation.
    pub password: String,
    /// OpenID Connect client ID.
    pub client_id: String,
}

impl std::fmt::Debug for AuthenticationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationConfig")
            .field("base_url", &self.base_url)
            .field("login_name", &self.login_name)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

const fn default_timeout_secs() -> u64 {
    30
}
