//! Management API clients.

use crate::models::{CreateResourceServerRequest, ResourceServer, UpdateResourceServerRequest};
use crate::Result;
use auth0_core::config::ManagementApiConfig;
use auth0_core::{ApiConnection, FieldSelection};
use tracing::debug;
use validator::Validate;

const RESOURCE_SERVERS: &str = "resource-servers";
const RESOURCE_SERVER: &str = "resource-servers/{id}";

/// Entry point handing out resource clients over a single connection.
#[derive(Debug, Clone)]
pub struct ManagementApiClient {
    connection: ApiConnection,
}

impl ManagementApiClient {
    /// Construct a client backed by the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be built from `config`.
    pub fn new(config: &ManagementApiConfig) -> Result<Self> {
        Ok(Self::with_connection(ApiConnection::from_config(config)?))
    }

    /// Construct a client from `AUTH0_MANAGEMENT_API_URL` and
    /// `AUTH0_MANAGEMENT_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(&ManagementApiConfig::from_env()?)
    }

    /// Wrap an existing connection.
    #[must_use]
    pub fn with_connection(connection: ApiConnection) -> Self {
        Self { connection }
    }

    /// Access the shared connection.
    #[must_use]
    pub fn connection(&self) -> &ApiConnection {
        &self.connection
    }

    /// Client for the `/resource-servers` endpoints.
    #[must_use]
    pub fn resource_servers(&self) -> ResourceServerClient {
        ResourceServerClient::new(self.connection.clone())
    }
}

/// Client for the `/resource-servers` endpoints.
///
/// Every call is a single round trip. Non-success responses surface as
/// [`auth0_core::Error::Api`] with the server's error code, e.g.
/// `inexistent_resource_server` or `invalid_uri`.
#[derive(Debug, Clone)]
pub struct ResourceServerClient {
    connection: ApiConnection,
}

impl ResourceServerClient {
    /// Create a client over the given connection.
    #[must_use]
    pub fn new(connection: ApiConnection) -> Self {
        Self { connection }
    }

    /// Create a resource server.
    ///
    /// # Errors
    ///
    /// Returns [`auth0_core::Error::Validation`] without sending anything when
    /// the request is malformed, otherwise whatever the server reports.
    pub async fn create(&self, request: &CreateResourceServerRequest) -> Result<ResourceServer> {
        request.validate()?;
        debug!(identifier = %request.identifier, "creating resource server");
        self.connection.post(RESOURCE_SERVERS, request, &[]).await
    }

    /// List resource servers, optionally including or excluding fields.
    ///
    /// # Errors
    ///
    /// Propagates API and transport errors.
    pub async fn list(&self, selection: &FieldSelection) -> Result<Vec<ResourceServer>> {
        self.connection
            .get(RESOURCE_SERVERS, &[], selection.to_query())
            .await
    }

    /// Fetch a resource server by id.
    ///
    /// # Errors
    ///
    /// Fails with error code `inexistent_resource_server` when the id is unknown.
    pub async fn get(&self, id: &str, selection: &FieldSelection) -> Result<ResourceServer> {
        self.connection
            .get(RESOURCE_SERVER, &[("id", id)], selection.to_query())
            .await
    }

    /// Update a resource server. Only the fields set on `request` change.
    ///
    /// # Errors
    ///
    /// Returns [`auth0_core::Error::Validation`] without sending anything when
    /// the request is malformed, otherwise whatever the server reports.
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateResourceServerRequest,
    ) -> Result<ResourceServer> {
        request.validate()?;
        debug!(id, "updating resource server");
        self.connection
            .patch(RESOURCE_SERVER, request, &[("id", id)])
            .await
    }

    /// Delete a resource server.
    ///
    /// Deleting an id twice is not normalised: the second call reports the
    /// server's not-found error.
    ///
    /// # Errors
    ///
    /// Propagates API and transport errors.
    pub async fn delete(&self, id: &str) -> Result<()> {
        debug!(id, "deleting resource server");
        self.connection.delete(RESOURCE_SERVER, &[("id", id)]).await
    }
}
