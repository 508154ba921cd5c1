//! Auth0 Management API client for resource servers.
//!
//! Provides typed models and an asynchronous client for the `/resource-servers`
//! endpoints (APIs registered with a tenant), built on the connection layer in
//! [`auth0_core`].

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use auth0_core::config::ManagementApiConfig;
pub use auth0_core::{ApiConnection, ApiError, Error, FieldSelection};
pub use client::{ManagementApiClient, ResourceServerClient};
pub use models::{
    CreateResourceServerRequest, ResourceServer, ResourceServerBase, Scope, SigningAlgorithm,
    UpdateResourceServerRequest,
};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = auth0_core::Result<T>;
