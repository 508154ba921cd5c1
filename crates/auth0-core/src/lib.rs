//! # auth0-core
//!
//! Shared plumbing for Auth0 Management API clients.
//!
//! This crate provides the error taxonomy, configuration, query helpers and the
//! generic API connection that resource clients delegate their HTTP calls to.
//!
//! ## Modules
//!
//! - [`error`] - Error types and the Auth0 error payload
//! - [`config`] - Configuration for connecting to a tenant's Management API
//! - [`client`] - HTTP client tuning and timeout constants
//! - [`query`] - Query parameter builder and field selection
//! - [`connection`] - Request templates, transports and the typed connection facade

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod query;

// Re-export commonly used types
pub use connection::{ApiConnection, ApiRequest, ApiTransport, HttpTransport};
pub use error::{ApiError, Error, Result};
pub use query::FieldSelection;
pub use reqwest::Method;
