//! ACBS client facade.
//!
//! A business operation against ACBS is one [`AcbsOperation`]: a fresh
//! bearer token plus a sequence of gateway calls made with it. The calls take
//! `&mut self`, so an operation has at most one request in flight and its
//! requests reach ACBS in program order. Separate operations are independent
//! and may run concurrently.
//!
//! ```rust,ignore
//! let client = AcbsClient::from_config(&config.acbs)?;
//!
//! let mut operation = client.begin_operation().await?;
//! operation.post("/Party", &party, &create_party).await?;
//! operation.post("/Deal", &deal, &create_deal).await?;
//! ```

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::TokenProvider;
use crate::auth::{AcbsAuthenticator, BearerToken, Credentials};
use crate::classifier::ErrorClassifier;
use crate::config::AcbsConfig;
use crate::error::{AcbsError, RawError};
use crate::gateway::{AcbsHttpGateway, AcbsResponse};

/// Entry point for business services.
#[derive(Debug, Clone)]
pub struct AcbsClient<P = AcbsAuthenticator> {
    token_provider: P,
    gateway: AcbsHttpGateway,
}

impl AcbsClient<AcbsAuthenticator> {
    /// Build a client whose authenticator and gateway share one HTTP client.
    pub fn from_config(config: &AcbsConfig) -> Result<Self, AcbsError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                AcbsError::generic(
                    "Failed to build the ACBS HTTP client.",
                    Some(RawError::from(e)),
                )
            })?;

        let authenticator =
            AcbsAuthenticator::new(http.clone(), Credentials::from_config(config));
        let gateway = AcbsHttpGateway::from_config(http, config);

        tracing::info!(
            base_url = %config.base_url,
            auth_base_url = %config.authentication.base_url,
            return_exception = config.use_return_exception_header,
            "ACBS client configured"
        );

        Ok(Self::new(authenticator, gateway))
    }
}

impl<P: TokenProvider> AcbsClient<P> {
    /// Create a client from its parts.
    #[must_use]
    pub const fn new(token_provider: P, gateway: AcbsHttpGateway) -> Self {
        Self {
            token_provider,
            gateway,
        }
    }

    /// Start a business operation with a freshly issued token.
    pub async fn begin_operation(&self) -> Result<AcbsOperation<'_>, AcbsError> {
        let token = self.token_provider.get_token().await?;
        Ok(AcbsOperation {
            gateway: &self.gateway,
            token,
        })
    }

    /// The token source.
    #[must_use]
    pub const fn token_provider(&self) -> &P {
        &self.token_provider
    }

    /// The underlying gateway.
    #[must_use]
    pub const fn gateway(&self) -> &AcbsHttpGateway {
        &self.gateway
    }
}

/// One logical business operation: a token and sequential gateway calls.
#[derive(Debug)]
pub struct AcbsOperation<'a> {
    gateway: &'a AcbsHttpGateway,
    token: BearerToken,
}

#[allow(clippy::needless_pass_by_ref_mut)]
impl AcbsOperation<'_> {
    /// The token this operation authenticates with.
    #[must_use]
    pub const fn token(&self) -> &BearerToken {
        &self.token
    }

    /// Classified GET.
    pub async fn get(
        &mut self,
        path: &str,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.gateway.get(path, &self.token, on_error).await
    }

    /// Classified GET, deserializing the body.
    pub async fn get_json<T: DeserializeOwned>(
        &mut self,
        path: &str,
        on_error: &ErrorClassifier,
    ) -> Result<T, AcbsError> {
        self.get(path, on_error).await?.json()
    }

    /// Classified POST.
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &mut self,
        path: &str,
        body: &B,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.gateway.post(path, body, &self.token, on_error).await
    }

    /// Classified PUT.
    pub async fn put<B: Serialize + ?Sized + Sync>(
        &mut self,
        path: &str,
        body: &B,
        on_error: &ErrorClassifier,
    ) -> Result<AcbsResponse, AcbsError> {
        self.gateway.put(path, body, &self.token, on_error).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::AcbsErrorKind;
    use crate::known_errors::{KnownError, KnownErrorRegistry};

    mock! {
        Provider {}

        #[async_trait]
        impl TokenProvider for Provider {
            async fn get_token(&self) -> Result<BearerToken, AcbsError>;
        }
    }

    fn provider_returning(token: &'static str, times: usize) -> MockProvider {
        let mut provider = MockProvider::new();
        provider.expect_get_token().times(times).returning(move || {
            BearerToken::new(token).ok_or_else(|| AcbsError::authentication_failed("empty"))
        });
        provider
    }

    #[tokio::test]
    async fn operation_uses_issued_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Portfolio/E1/Facility/0030000321"))
            .and(header("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "FacilityIdentifier": "0030000321"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = AcbsHttpGateway::new(Client::new(), server.uri(), false);
        let client = AcbsClient::new(provider_returning("tok1", 1), gateway);

        let mut operation = client.begin_operation().await.unwrap();
        assert_eq!(operation.token().as_str(), "tok1");

        let classifier = ErrorClassifier::read(
            "Failed to get the facility.",
            KnownErrorRegistry::new().with(KnownError::facility_not_found("0030000321")),
        );
        let body: serde_json::Value = operation
            .get_json("/Portfolio/E1/Facility/0030000321", &classifier)
            .await
            .unwrap();
        assert_eq!(body["FacilityIdentifier"], "0030000321");
    }

    #[tokio::test]
    async fn each_operation_fetches_a_new_token() {
        let server = MockServer::start().await;
        let gateway = AcbsHttpGateway::new(Client::new(), server.uri(), false);
        let client = AcbsClient::new(provider_returning("tok", 2), gateway);

        let _first = client.begin_operation().await.unwrap();
        let _second = client.begin_operation().await.unwrap();
    }

    #[tokio::test]
    async fn authentication_failure_aborts_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut provider = MockProvider::new();
        provider.expect_get_token().times(1).returning(|| {
            Err(AcbsError::authentication_failed(
                "Session cookie was not returned by the IdP.",
            ))
        });

        let gateway = AcbsHttpGateway::new(Client::new(), server.uri(), false);
        let client = AcbsClient::new(provider, gateway);

        let err = client.begin_operation().await.unwrap_err();
        assert_eq!(err.kind(), AcbsErrorKind::AuthenticationFailed);
        assert_eq!(err.message(), "Session cookie was not returned by the IdP.");
    }

    #[tokio::test]
    async fn sequential_calls_reach_backend_in_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/Party"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/Deal/0020000123"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let gateway = AcbsHttpGateway::new(Client::new(), server.uri(), false);
        let client = AcbsClient::new(provider_returning("tok", 1), gateway);
        let on_error = ErrorClassifier::write("Failed to update.", KnownErrorRegistry::new());

        let mut operation = client.begin_operation().await.unwrap();
        operation
            .post("/Party", &json!({"PartyName": "ACME"}), &on_error)
            .await
            .unwrap();
        operation
            .put("/Deal/0020000123", &json!({"DealValue": 100}), &on_error)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let order: Vec<(String, String)> = received
            .iter()
            .map(|r| (r.method.to_string(), r.url.path().to_string()))
            .collect();
        assert_eq!(
            order,
            [
                ("POST".to_string(), "/Party".to_string()),
                ("PUT".to_string(), "/Deal/0020000123".to_string()),
            ]
        );
    }

    #[test]
    fn from_config_builds_client() {
        let config = crate::config::load_config_from_string(
            r#"
acbs:
  base_url: "http://acbs.test/api/"
  api_key: "key"
  api_key_header_name: "x-api-key"
  authentication:
    base_url: "http://idp.test"
    login_name: "user"
    password: "secret"
    client_id: "client"
"#,
        )
        .unwrap();

        let client = AcbsClient::from_config(&config.acbs).unwrap();
        assert_eq!(client.gateway().base_url(), "http://acbs.test/api");
        assert_eq!(client.token_provider().credentials().client_id(), "client");
    }
}
