//! Error types for Management API operations.
//!
//! Server-side failures keep the payload Auth0 returns (status, error, message and
//! error code) so callers can branch on the error code. The remaining variants cover
//! failures that happen before a response is available or while decoding it.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for Management API operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The Management API answered with a non-success status
    #[error("API error: {0}")]
    Api(ApiError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request payload failed local validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response body could not be decoded
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid endpoint URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for Management API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error payload returned by the Management API for non-success responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// HTTP status code
    #[serde(default)]
    pub status_code: u16,
    /// Short error name (usually the HTTP reason phrase)
    #[serde(default)]
    pub error: String,
    /// Human-readable error message
    #[serde(default)]
    pub message: String,
    /// Machine-readable error code, e.g. `inexistent_resource_server`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ApiError {
    /// Decode an error body, falling back to the raw text when it is not the
    /// documented JSON shape or carries neither a message nor an error code.
    #[must_use]
    pub fn from_response(status_code: u16, reason: &str, body: &str) -> Self {
        let raw = || Self {
            status_code,
            error: reason.to_string(),
            message: body.trim().to_string(),
            error_code: None,
        };

        let parsed = match serde_json::from_str::<serde_json::Value>(body) {
            Ok(value @ serde_json::Value::Object(_)) => serde_json::from_value::<Self>(value),
            _ => return raw(),
        };

        match parsed {
            Ok(mut parsed) => {
                if parsed.status_code == 0 {
                    parsed.status_code = status_code;
                }
                if parsed.error.is_empty() {
                    parsed.error = reason.to_string();
                }
                if parsed.message.is_empty() && parsed.error_code.is_none() {
                    parsed.message = body.trim().to_string();
                }
                parsed
            }
            Err(_) => raw(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.error)?;
        if let Some(code) = &self.error_code {
            write!(f, " ({code})")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl Error {
    /// Returns the error kind for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Api(_) => "API_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns the server payload when this is an API error.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the server-provided error code, if any.
    #[must_use]
    pub fn api_error_code(&self) -> Option<&str> {
        self.api_error().and_then(|err| err.error_code.as_deref())
    }

    /// Returns the HTTP status of an API error.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.api_error().map(|err| err.status_code)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}
