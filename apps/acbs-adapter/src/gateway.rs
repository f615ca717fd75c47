//! Authenticated request gateway for the ACBS business API.
//!
//! The gateway attaches the bearer token (and the optional `ReturnException`
//! header) to every call and never interprets a failed response itself: the
//! raw failure goes to the caller's [`ErrorClassifier`], whose result is
//! returned as the call's only error. There is no retry; one failed attempt
//! is terminal.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::auth::BearerToken;
use crate::classifier::ErrorClassifier;
use crate::config::AcbsConfig;
use crate::error::{AcbsError, RawError};

/// Header asking ACBS to include exception details in error bodies.
pub const RETURN_EXCEPTION_HEADER: &str = "ReturnException";

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct AcbsResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl AcbsResponse {
    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All UTF-8 values of a header, in response order.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
    }

    /// Raw body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Deserialize the body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AcbsError> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::warn!(
                error = %e,
                status = %self.status,
                "ACBS response body did not match the expected shape"
            );
            AcbsError::unexpected("Failed to parse response body from ACBS.", None)
        })
    }
}

/// Send a request and read the full response.
///
/// Non-2xx statuses become [`RawError::Http`]; send or read failures become
/// [`RawError::Transport`].
pub(crate) async fn execute(request: RequestBuilder) -> Result<AcbsResponse, RawError> {
    let response = request.send().await?;
    let status = response.status();
    let headers = response.headers().clone();

    if !status.is_success() {
        let body = response.text().await?;
        return Err(RawError::http(status, &body));
    }

    let body = response.text().await?;
    Ok(AcbsResponse {
        status,
        headers,
        body,
    })
}

/// Gateway to the ACBS business API.
#[derive(Debug, Clone)]
pub struct AcbsHttpGateway {
    client: Client,
    base_url: String,
    use_return_exception_header: bool,
}

impl AcbsHttpGateway {
    /// Create a gateway. `base_url` is prefixed verbatim to every path.
    #[must_use]
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        use_return_exception_header: bool,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            use_return_exception_header,
        }
    }

    /// Create a gateway from configuration.
    #[must_use]
    pub fn from_config(client: Client, config: &AcbsConfig) -> Self {
        Self::new(
            client,
            config.base_url.clone(),
            config.use_return_exception_header,
        )
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base_url}{path}`.
    pub async fn get(
        &self,
        path: &str,
        token: &BearerToken,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.send(Method::GET, path, None::<&()>, token, on_error)
            .await
    }

    /// `POST {base_url}{path}` with a JSON body.
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
        token: &BearerToken,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.send(Method::POST, path, Some(body), token, on_error)
            .await
    }

    /// `PUT {base_url}{path}` with a JSON body.
    pub async fn put<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        body: &B,
        token: &BearerToken,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.send(Method::PUT, path, Some(body), token, on_error)
            .await
    }

    async fn send<B: Serialize + ?Sized + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: &BearerToken,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()));
        if self.use_return_exception_header {
            request = request.header(RETURN_EXCEPTION_HEADER, "true");
        }
        if let Some(b) = body {
            request = request.header(CONTENT_TYPE, "application/json").json(b);
        }

        tracing::debug!(method = %method, path, "Sending request to ACBS");

        execute(request).await.map_err(|raw| {
            tracing::debug!(
                method = %method,
                path,
                status = ?raw.status(),
                error = %raw,
                "ACBS request failed"
            );
            on_error.classify(raw)
        })
    }
}
