//! Configuration for connecting to a tenant's Management API.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the Management API base URL.
pub const API_URL_ENV: &str = "AUTH0_MANAGEMENT_API_URL";

/// Environment variable holding the Management API bearer token.
pub const API_TOKEN_ENV: &str = "AUTH0_MANAGEMENT_API_TOKEN";

/// Configuration for a Management API connection.
///
/// The bearer token is never serialized; it is supplied through
/// [`ManagementApiConfig::with_token`] or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ManagementApiConfig {
    /// Management API base URL, e.g. `https://tenant.auth0.com/api/v2/`
    #[validate(url)]
    pub api_url: String,

    /// Bearer token sent with every request
    #[serde(skip)]
    pub token: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl ManagementApiConfig {
    /// Create a new configuration for the given Management API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(api_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            api_url: api_url.into(),
            token: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Create a configuration for a tenant domain such as `tenant.eu.auth0.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting URL is invalid.
    pub fn for_domain(domain: &str) -> Result<Self, Error> {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        Self::new(format!("https://{domain}/api/v2/"))
    }

    /// Load the configuration from `AUTH0_MANAGEMENT_API_URL` and
    /// `AUTH0_MANAGEMENT_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing or the URL is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let api_url = std::env::var(API_URL_ENV)
            .map_err(|_| Error::Config(format!("{API_URL_ENV} is not set")))?;
        let token = std::env::var(API_TOKEN_ENV)
            .map_err(|_| Error::Config(format!("{API_TOKEN_ENV} is not set")))?;

        Ok(Self::new(api_url)?.with_token(token))
    }

    /// Set the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Borrow the bearer token, if one is configured.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.expose_secret())
    }

    /// Parse the base URL, normalising it to end with `/` so relative paths
    /// join beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_api_url(&self) -> Result<Url, Error> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| Error::Config(format!("Invalid Management API URL: {e}")))?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}
