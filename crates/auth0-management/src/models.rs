//! Resource server models for the Management API.
//!
//! A resource server is an API registered with the tenant: an identifier
//! (the token audience), scopes, and the signing configuration for access tokens
//! issued to it. Each operation takes its own request type carrying exactly the
//! fields that operation accepts; the server-assigned `id` only ever appears on
//! [`ResourceServer`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use validator::Validate;

const REDACTED: &str = "[REDACTED]";

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A permission that can be granted in access tokens for a resource server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct Scope {
    /// Scope name, e.g. `read:messages`.
    #[validate(length(min = 1))]
    pub value: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Scope {
    /// Create a scope without a description.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Algorithm used to sign access tokens issued for a resource server.
///
/// Serialized as its wire name; names this crate does not know round-trip
/// through [`SigningAlgorithm::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256, keyed by the signing secret.
    Hs256,
    /// RSA PKCS#1 v1.5 with SHA-256.
    Rs256,
    /// RSA-PSS with SHA-256.
    Ps256,
    /// Any other algorithm name.
    Other(String),
}

impl SigningAlgorithm {
    /// Wire name of the algorithm.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hs256 => "HS256",
            Self::Rs256 => "RS256",
            Self::Ps256 => "PS256",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for SigningAlgorithm {
    fn from(name: String) -> Self {
        match name.as_str() {
            "HS256" => Self::Hs256,
            "RS256" => Self::Rs256,
            "PS256" => Self::Ps256,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for SigningAlgorithm {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<SigningAlgorithm> for String {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes shared by every resource server.
///
/// Every attribute defaults when absent because a field selection can strip
/// any of them from a response.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceServerBase {
    /// Unique identifier (audience), usually a URI.
    #[serde(default, deserialize_with = "null_as_default")]
    pub identifier: String,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Scopes, in the order the server returns them.
    #[serde(default, deserialize_with = "null_as_default")]
    pub scopes: Vec<Scope>,
    /// Token signing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_alg: Option<SigningAlgorithm>,
    /// Secret used for HS256 signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_lifetime: Option<u32>,
}

impl fmt::Debug for ResourceServerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceServerBase")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("scopes", &self.scopes)
            .field("signing_alg", &self.signing_alg)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| REDACTED))
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

/// A resource server as returned by the Management API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceServer {
    /// Server-assigned id.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    /// Remaining attributes.
    #[serde(flatten)]
    pub base: ResourceServerBase,
}

impl ResourceServer {
    /// Drop the id and keep the shared attributes.
    #[must_use]
    pub fn into_base(self) -> ResourceServerBase {
        self.base
    }
}

/// Request payload for creating a resource server.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct CreateResourceServerRequest {
    /// Unique identifier (audience). Cannot be changed later.
    #[validate(length(min = 1))]
    pub identifier: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Scopes.
    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Scope>,
    /// Token signing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_alg: Option<SigningAlgorithm>,
    /// Secret used for HS256 signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    /// Access token lifetime in seconds.
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_lifetime: Option<u32>,
}

impl CreateResourceServerRequest {
    /// Start a request for the given identifier.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            scopes: Vec::new(),
            signing_alg: None,
            signing_secret: None,
            token_lifetime: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.push(scope);
        self
    }

    /// Replace the scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Set the signing algorithm.
    #[must_use]
    pub fn with_signing_alg(mut self, alg: impl Into<SigningAlgorithm>) -> Self {
        self.signing_alg = Some(alg.into());
        self
    }

    /// Set the signing secret.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Set the token lifetime in seconds.
    #[must_use]
    pub const fn with_token_lifetime(mut self, seconds: u32) -> Self {
        self.token_lifetime = Some(seconds);
        self
    }
}

impl fmt::Debug for CreateResourceServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateResourceServerRequest")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("scopes", &self.scopes)
            .field("signing_alg", &self.signing_alg)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| REDACTED))
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}

/// Request payload for updating a resource server.
///
/// Only fields that are `Some` are sent; everything else is left unchanged on
/// the server. `scopes: Some(vec![])` removes all scopes.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpdateResourceServerRequest {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Replacement scope list.
    #[validate(nested)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<Scope>>,
    /// Token signing algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_alg: Option<SigningAlgorithm>,
    /// Secret used for HS256 signing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,
    /// Access token lifetime in seconds.
    #[validate(range(min = 1))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_lifetime: Option<u32>,
}

impl UpdateResourceServerRequest {
    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Set the signing algorithm.
    #[must_use]
    pub fn with_signing_alg(mut self, alg: impl Into<SigningAlgorithm>) -> Self {
        self.signing_alg = Some(alg.into());
        self
    }

    /// Set the signing secret.
    #[must_use]
    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.signing_secret = Some(secret.into());
        self
    }

    /// Set the token lifetime in seconds.
    #[must_use]
    pub const fn with_token_lifetime(mut self, seconds: u32) -> Self {
        self.token_lifetime = Some(seconds);
        self
    }

    /// Returns true when no field would be sent.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.scopes.is_none()
            && self.signing_alg.is_none()
            && self.signing_secret.is_none()
            && self.token_lifetime.is_none()
    }
}

impl fmt::Debug for UpdateResourceServerRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateResourceServerRequest")
            .field("name", &self.name)
            .field("scopes", &self.scopes)
            .field("signing_alg", &self.signing_alg)
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| REDACTED))
            .field("token_lifetime", &self.token_lifetime)
            .finish()
    }
}
