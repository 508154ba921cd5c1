//! Generic connection to the Management API.
//!
//! Resource clients describe each call as an [`ApiRequest`]: an HTTP method, a
//! relative URL template such as `resource-servers/{id}`, path parameters, query
//! pairs and an optional JSON body. An [`ApiTransport`] executes the request;
//! [`HttpTransport`] is the reqwest-backed implementation. [`ApiConnection`] is the
//! typed facade resource clients hold.

use crate::client::ClientConfig;
use crate::config::ManagementApiConfig;
use crate::error::{ApiError, Error, Result};
use crate::query::QueryParams;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, Method};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;
use validator::Validate;

const USER_AGENT: &str = concat!("auth0-rust/", env!("CARGO_PKG_VERSION"));

/// A single Management API call, before it is bound to a base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Relative URL template, e.g. `resource-servers/{id}`
    pub template: String,
    /// Values substituted into `{name}` placeholders
    pub path_params: Vec<(&'static str, String)>,
    /// Query string pairs
    pub query: QueryParams,
    /// JSON body
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request without parameters or body.
    #[must_use]
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            path_params: Vec::new(),
            query: QueryParams::new(),
            body: None,
        }
    }

    /// Add a path parameter.
    #[must_use]
    pub fn with_path_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.path_params.push((name, value.into()));
        self
    }

    /// Replace the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a path parameter by name.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Resolve the template into unencoded path segments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when a placeholder has no value or an
    /// empty one.
    pub fn segments(&self) -> Result<Vec<String>> {
        self.template
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let Some(name) = segment
                    .strip_prefix('{')
                    .and_then(|rest| rest.strip_suffix('}'))
                else {
                    return Ok(segment.to_string());
                };

                match self.path_param(name) {
                    Some(value) if !value.is_empty() => Ok(value.to_string()),
                    Some(_) => Err(Error::InvalidRequest(format!(
                        "path parameter `{name}` is empty in `{}`",
                        self.template
                    ))),
                    None => Err(Error::InvalidRequest(format!(
                        "missing path parameter `{name}` for `{}`",
                        self.template
                    ))),
                }
            })
            .collect()
    }

    /// Resolved path, unencoded, for logging and routing.
    ///
    /// # Errors
    ///
    /// See [`ApiRequest::segments`].
    pub fn path(&self) -> Result<String> {
        Ok(self.segments()?.join("/"))
    }
}

/// Executes [`ApiRequest`]s against the Management API.
///
/// Implementations return `Ok(None)` for an empty success body and
/// [`Error::Api`] for any non-success status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Execute a request and return the decoded JSON body, if any.
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>>;
}

/// Builder for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    config: ManagementApiConfig,
    http_config: ClientConfig,
}

impl HttpTransportBuilder {
    /// Create a new builder from a [`ManagementApiConfig`].
    #[must_use]
    pub fn new(config: ManagementApiConfig) -> Self {
        let http_config = ClientConfig::new().with_timeout(config.timeout());
        Self {
            config,
            http_config,
        }
    }

    /// Override the HTTP client configuration used when building the transport.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the configuration breaks its field rules
    /// (for example a zero request timeout), and [`Error::Config`] if the base
    /// URL, CA certificate or HTTP client settings are invalid.
    pub fn build(self) -> Result<HttpTransport> {
        self.config.validate()?;
        let base_url = self.config.parse_api_url()?;
        let http_config = self.http_config;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(http_config.timeout)
            .connect_timeout(http_config.connect_timeout)
            .pool_idle_timeout(http_config.pool_idle_timeout)
            .pool_max_idle_per_host(http_config.pool_max_idle_per_host)
            .gzip(http_config.enable_compression);

        if !self.config.tls_verify {
            warn!("TLS verification disabled for Management API client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ca_cert) = &self.config.tls_ca_cert {
            debug!("loading CA certificate from {}", ca_cert.display());
            let bytes = std::fs::read(ca_cert).map_err(|err| {
                Error::Config(format!(
                    "Failed to read CA certificate {}: {err}",
                    ca_cert.display()
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&bytes)
                .map_err(|err| Error::Config(format!("Invalid CA certificate: {err}")))?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(HttpTransport {
            http,
            base_url,
            token: self.config.token,
            enable_logging: http_config.enable_logging,
        })
    }
}

/// reqwest-backed [`ApiTransport`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    token: Option<SecretString>,
    enable_logging: bool,
}

impl HttpTransport {
    /// Construct a transport directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpTransportBuilder::build`].
    pub fn from_config(config: &ManagementApiConfig) -> Result<Self> {
        HttpTransportBuilder::new(config.clone()).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: ManagementApiConfig) -> HttpTransportBuilder {
        HttpTransportBuilder::new(config)
    }

    /// Return the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, segments: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::InvalidEndpoint(format!("`{}` cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>> {
        let segments = request.segments()?;
        let url = self.build_url(&segments)?;
        let path = segments.join("/");

        if self.enable_logging {
            info!(
                method = %request.method,
                path = %path,
                query = ?request.query.as_pairs(),
                "Sending Management API request"
            );
        }

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(request.query.as_pairs());
        }

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if self.enable_logging {
            debug!(method = %request.method, path = %path, %status, "Received Management API response");
        }

        if !status.is_success() {
            let error = ApiError::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                &text,
            );
            return Err(Error::Api(error));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|err| {
            Error::Parse(format!("Failed to parse response for `{path}`: {err}"))
        })
    }
}

/// Typed facade over an [`ApiTransport`].
///
/// Cheap to clone; every clone shares the same transport.
#[derive(Clone)]
pub struct ApiConnection {
    transport: Arc<dyn ApiTransport>,
}

impl ApiConnection {
    /// Wrap an existing transport.
    #[must_use]
    pub fn new(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Build a connection backed by [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// See [`HttpTransportBuilder::build`].
    pub fn from_config(config: &ManagementApiConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Execute a raw request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without calling the transport when the
    /// template cannot be resolved, otherwise whatever the transport returns.
    pub async fn send(&self, request: ApiRequest) -> Result<Option<Value>> {
        request.segments()?;
        self.transport.execute(request).await
    }

    /// `GET` a template and decode the response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for non-success responses and [`Error::Parse`]
    /// when the body does not decode into `T`.
    pub async fn get<T>(
        &self,
        template: &str,
        path_params: &[(&'static str, &str)],
        query: QueryParams,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = with_path_params(ApiRequest::new(Method::GET, template), path_params)
            .with_query(query);
        decode(template, self.send(request).await?)
    }

    /// `POST` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// See [`ApiConnection::get`].
    pub async fn post<B, T>(
        &self,
        template: &str,
        body: &B,
        path_params: &[(&'static str, &str)],
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = with_path_params(ApiRequest::new(Method::POST, template), path_params)
            .with_body(encode(body)?);
        decode(template, self.send(request).await?)
    }

    /// `PATCH` a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// See [`ApiConnection::get`].
    pub async fn patch<B, T>(
        &self,
        template: &str,
        body: &B,
        path_params: &[(&'static str, &str)],
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = with_path_params(ApiRequest::new(Method::PATCH, template), path_params)
            .with_body(encode(body)?);
        decode(template, self.send(request).await?)
    }

    /// `DELETE` a template, discarding any response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] for non-success responses.
    pub async fn delete(&self, template: &str, path_params: &[(&'static str, &str)]) -> Result<()> {
        let request = with_path_params(ApiRequest::new(Method::DELETE, template), path_params);
        self.send(request).await.map(|_| ())
    }
}

impl fmt::Debug for ApiConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConnection").finish_non_exhaustive()
    }
}

fn with_path_params(request: ApiRequest, path_params: &[(&'static str, &str)]) -> ApiRequest {
    path_params
        .iter()
        .fold(request, |request, &(name, value)| {
            request.with_path_param(name, value)
        })
}

fn encode<B>(body: &B) -> Result<Value>
where
    B: Serialize + ?Sized,
{
    serde_json::to_value(body)
        .map_err(|err| Error::InvalidRequest(format!("Failed to serialize request body: {err}")))
}

fn decode<T>(template: &str, body: Option<Value>) -> Result<T>
where
    T: DeserializeOwned,
{
    let body =
        body.ok_or_else(|| Error::Parse(format!("Empty response body for `{template}`")))?;
    serde_json::from_value(body)
        .map_err(|err| Error::Parse(format!("Failed to parse response for `{template}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Widget {
        id: String,
    }

    fn test_transport(server: &MockServer) -> HttpTransport {
        let config = ManagementApiConfig::new(format!("{}/api/v2/", server.uri()))
            .unwrap()
            .with_token("test-token");
        HttpTransport::from_config(&config).unwrap()
    }

    #[test]
    fn build_rejects_out_of_range_timeout() {
        let config = ManagementApiConfig::new("https://tenant.auth0.com/api/v2/")
            .unwrap()
            .with_timeout(0);
        let err = HttpTransport::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");

        let config: ManagementApiConfig = serde_json::from_value(json!({
            "api_url": "https://tenant.auth0.com/api/v2/",
            "request_timeout_secs": 0
        }))
        .unwrap();
        let err = HttpTransport::builder(config).build().unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }

    #[test]
    fn segments_substitute_placeholders() {
        let request = ApiRequest::new(Method::GET, "resource-servers/{id}")
            .with_path_param("id", "abc123");
        assert_eq!(request.segments().unwrap(), vec!["resource-servers", "abc123"]);
        assert_eq!(request.path().unwrap(), "resource-servers/abc123");
    }

    #[test]
    fn segments_reject_missing_parameter() {
        let request = ApiRequest::new(Method::DELETE, "resource-servers/{id}");
        assert!(matches!(request.segments(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn segments_reject_empty_parameter() {
        let request =
            ApiRequest::new(Method::GET, "resource-servers/{id}").with_path_param("id", "");
        assert!(matches!(request.path(), Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn http_transport_sends_auth_query_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/widgets"))
            .and(query_param("include_fields", "true"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({ "name": "w" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "w1" })))
            .mount(&server)
            .await;

        let mut query = QueryParams::new();
        query.push("include_fields", true);
        let request = ApiRequest::new(Method::POST, "widgets")
            .with_query(query)
            .with_body(json!({ "name": "w" }));

        let body = test_transport(&server).execute(request).await.unwrap();
        assert_eq!(body, Some(json!({ "id": "w1" })));
    }

    #[tokio::test]
    async fn http_transport_encodes_path_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/widgets/a%2Fb%20c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "a/b c" })))
            .mount(&server)
            .await;

        let request =
            ApiRequest::new(Method::GET, "widgets/{id}").with_path_param("id", "a/b c");
        let body = test_transport(&server).execute(request).await.unwrap();
        assert_eq!(body, Some(json!({ "id": "a/b c" })));
    }

    #[tokio::test]
    async fn http_transport_maps_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/widgets/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "statusCode": 404,
                "error": "Not Found",
                "message": "The widget does not exist",
                "errorCode": "inexistent_widget"
            })))
            .mount(&server)
            .await;

        let request =
            ApiRequest::new(Method::GET, "widgets/{id}").with_path_param("id", "missing");
        let err = test_transport(&server).execute(request).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.api_error_code(), Some("inexistent_widget"));
    }

    #[tokio::test]
    async fn http_transport_maps_plain_text_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/widgets"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = test_transport(&server)
            .execute(ApiRequest::new(Method::GET, "widgets"))
            .await
            .unwrap_err();
        let api = err.api_error().unwrap();
        assert_eq!(api.status_code, 503);
        assert_eq!(api.error, "Service Unavailable");
        assert_eq!(api.message, "maintenance");
        assert!(api.error_code.is_none());
    }

    #[tokio::test]
    async fn http_transport_returns_none_for_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/widgets/w1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let request =
            ApiRequest::new(Method::DELETE, "widgets/{id}").with_path_param("id", "w1");
        let body = test_transport(&server).execute(request).await.unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn http_transport_rejects_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = test_transport(&server)
            .execute(ApiRequest::new(Method::GET, "widgets"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn connection_get_builds_request_and_decodes() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.method == Method::GET
                    && request.template == "widgets/{id}"
                    && request.path_param("id") == Some("w1")
                    && request.query.as_pairs() == [("include_fields", "false".to_string())]
                    && request.body.is_none()
            })
            .times(1)
            .returning(|_| Ok(Some(json!({ "id": "w1" }))));

        let connection = ApiConnection::new(Arc::new(transport));
        let mut query = QueryParams::new();
        query.push("include_fields", false);
        let widget: Widget = connection
            .get("widgets/{id}", &[("id", "w1")], query)
            .await
            .unwrap();
        assert_eq!(widget, Widget { id: "w1".into() });
    }

    #[tokio::test]
    async fn connection_patch_serializes_body() {
        let mut transport = MockApiTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                request.method == Method::PATCH && request.body == Some(json!({ "name": "n" }))
            })
            .returning(|_| Ok(Some(json!({ "id": "w1" }))));

        let connection = ApiConnection::new(Arc::new(transport));
        let widget: Widget = connection
            .patch("widgets/{id}", &json!({ "name": "n" }), &[("id", "w1")])
            .await
            .unwrap();
        assert_eq!(widget.id, "w1");
    }

    #[tokio::test]
    async fn connection_reports_empty_body_as_parse_error() {
        let mut transport = MockApiTransport::new();
        transport.expect_execute().with(always()).returning(|_| Ok(None));

        let connection = ApiConnection::new(Arc::new(transport));
        let result: Result<Widget> = connection.get("widgets", &[], QueryParams::new()).await;
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[tokio::test]
    async fn connection_propagates_api_errors_untouched() {
        let api_error = ApiError {
            status_code: 409,
            error: "Conflict".into(),
            message: "already exists".into(),
            error_code: Some("conflict".into()),
        };
        let expected = Error::Api(api_error.clone());

        let mut transport = MockApiTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(move |_| Err(Error::Api(api_error.clone())));

        let connection = ApiConnection::new(Arc::new(transport));
        let err = connection.delete("widgets/{id}", &[("id", "w1")]).await.unwrap_err();
        assert_eq!(err, expected);
    }
}
