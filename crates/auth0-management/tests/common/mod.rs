//! In-memory stand-in for the `/resource-servers` endpoints.

#![allow(dead_code)]

use async_trait::async_trait;
use auth0_core::{ApiError, ApiRequest, ApiTransport, Error, Result};
use serde_json::{Map, Value};
use std::sync::Mutex;
use uuid::Uuid;

/// Keeps resource servers in insertion order and answers like the real API,
/// including its error payloads.
#[derive(Default)]
pub struct InMemoryManagementApi {
    servers: Mutex<Vec<Map<String, Value>>>,
}

impl InMemoryManagementApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, request: &ApiRequest) -> Value {
        let servers = self.servers.lock().unwrap();
        Value::Array(
            servers
                .iter()
                .map(|server| select_fields(server, request))
                .collect(),
        )
    }

    fn create(&self, request: &ApiRequest) -> Result<Value> {
        let mut body = body_object(request)?;
        let identifier = body
            .get("identifier")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        if !(identifier.starts_with("https://") || identifier.starts_with("http://")) {
            return Err(api_error(
                400,
                "Bad Request",
                "identifier must be a valid uri",
                "invalid_uri",
            ));
        }

        let mut servers = self.servers.lock().unwrap();
        if servers
            .iter()
            .any(|server| server.get("identifier").and_then(Value::as_str) == Some(identifier.as_str()))
        {
            return Err(api_error(
                409,
                "Conflict",
                "A resource server with the same identifier already exists",
                "conflict",
            ));
        }

        body.insert("id".into(), Value::String(Uuid::new_v4().simple().to_string()));
        body.entry("scopes").or_insert_with(|| Value::Array(Vec::new()));
        body.entry("signing_alg")
            .or_insert_with(|| Value::String("RS256".into()));
        servers.push(body.clone());
        Ok(Value::Object(body))
    }

    fn get(&self, id: &str, request: &ApiRequest) -> Result<Value> {
        let servers = self.servers.lock().unwrap();
        servers
            .iter()
            .find(|server| has_id(server, id))
            .map(|server| select_fields(server, request))
            .ok_or_else(not_found)
    }

    fn update(&self, id: &str, request: &ApiRequest) -> Result<Value> {
        let changes = body_object(request)?;
        let mut servers = self.servers.lock().unwrap();
        let server = servers
            .iter_mut()
            .find(|server| has_id(server, id))
            .ok_or_else(not_found)?;

        for (key, value) in changes {
            server.insert(key, value);
        }
        Ok(Value::Object(server.clone()))
    }

    fn delete(&self, id: &str) -> Result<Option<Value>> {
        let mut servers = self.servers.lock().unwrap();
        let position = servers
            .iter()
            .position(|server| has_id(server, id))
            .ok_or_else(not_found)?;
        servers.remove(position);
        Ok(None)
    }
}

#[async_trait]
impl ApiTransport for InMemoryManagementApi {
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>> {
        let segments = request.segments()?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("GET", ["resource-servers"]) => Ok(Some(self.list(&request))),
            ("POST", ["resource-servers"]) => self.create(&request).map(Some),
            ("GET", ["resource-servers", id]) => self.get(id, &request).map(Some),
            ("PATCH", ["resource-servers", id]) => self.update(id, &request).map(Some),
            ("DELETE", ["resource-servers", id]) => self.delete(id),
            _ => Err(api_error(404, "Not Found", "Unknown route", "not_found")),
        }
    }
}

fn has_id(server: &Map<String, Value>, id: &str) -> bool {
    server.get("id").and_then(Value::as_str) == Some(id)
}

fn body_object(request: &ApiRequest) -> Result<Map<String, Value>> {
    match &request.body {
        Some(Value::Object(body)) => Ok(body.clone()),
        _ => Err(api_error(
            400,
            "Bad Request",
            "Payload validation error: expected an object",
            "invalid_body",
        )),
    }
}

fn select_fields(server: &Map<String, Value>, request: &ApiRequest) -> Value {
    let pairs = request.query.as_pairs();
    let fields: Vec<&str> = pairs
        .iter()
        .find(|(key, _)| *key == "fields")
        .map(|(_, value)| value.split(',').collect())
        .unwrap_or_default();
    let include = pairs
        .iter()
        .find(|(key, _)| *key == "include_fields")
        .map_or(true, |(_, value)| value == "true");

    if fields.is_empty() {
        return Value::Object(server.clone());
    }

    Value::Object(
        server
            .iter()
            .filter(|(key, _)| fields.contains(&key.as_str()) == include)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn not_found() -> Error {
    api_error(
        404,
        "Not Found",
        "The resource server does not exist",
        "inexistent_resource_server",
    )
}

fn api_error(status_code: u16, error: &str, message: &str, code: &str) -> Error {
    Error::Api(ApiError {
        status_code,
        error: error.to_string(),
        message: message.to_string(),
        error_code: Some(code.to_string()),
    })
}
