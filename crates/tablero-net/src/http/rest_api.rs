//! REST API client helpers.
//!
//! This module provides a client bound to a base URL with default headers
//! and authentication. It sends each request once: retrying is left to the
//! caller, which knows whether a failure is worth another attempt.
//!
//! # Example
//!
//! ```ignore
//! use tablero_net::http::RestApiClient;
//!
//! let client = RestApiClient::builder("http://localhost:8000/api")
//!     .bearer_auth("my-token")
//!     .json_api()
//!     .build()?;
//!
//! // Paths are appended to the base URL
//! let resumen: serde_json::Value = client.get("/alertas/resumen").json_response().await?;
//!
//! // PUT with JSON body
//! let updated: serde_json::Value = client
//!     .put("/contratos-menores/7")
//!     .json(&serde_json::json!({"estado": "EN_PROCESO"}))
//!     .json_response()
//!     .await?;
//! ```

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tablero_core::logging::targets;

use super::client::{Authentication, HttpClient};
use super::request::{HttpMethod, HttpRequest, RequestBody};
use super::response::HttpResponse;
use crate::error::{NetworkError, Result};

/// Authentication method for REST APIs.
#[derive(Clone, Debug)]
pub enum ApiAuth {
    /// Bearer token authentication (Authorization: Bearer <token>).
    Bearer(String),
    /// API key in a custom header.
    ApiKey {
        /// Header name (e.g., "X-API-Key").
        header: String,
        /// API key value.
        value: String,
    },
}

/// Builder for creating a REST API client.
pub struct RestApiClientBuilder {
    base_url: String,
    http_client: Option<HttpClient>,
    default_headers: http::HeaderMap,
    auth: Option<ApiAuth>,
}

impl RestApiClientBuilder {
    /// Create a new builder with the specified base URL.
    ///
    /// All request paths will be appended to this base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: None,
            default_headers: http::HeaderMap::new(),
            auth: None,
        }
    }

    /// Use an existing HTTP client, for example one with a shorter timeout.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Add a default header that will be sent with every request.
    pub fn default_header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Set Accept header to application/json.
    pub fn accept_json(self) -> Self {
        self.default_header("Accept", "application/json")
    }

    /// Set Content-Type header to application/json.
    pub fn content_type_json(self) -> Self {
        self.default_header("Content-Type", "application/json")
    }

    /// Set both Accept and Content-Type to application/json.
    pub fn json_api(self) -> Self {
        self.accept_json().content_type_json()
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(ApiAuth::Bearer(token.into()));
        self
    }

    /// Set API key authentication in the given header.
    pub fn api_key(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.auth = Some(ApiAuth::ApiKey {
            header: header.into(),
            value: key.into(),
        });
        self
    }

    /// Build the REST API client.
    pub fn build(self) -> Result<RestApiClient> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(NetworkError::InvalidUrl("empty base URL".to_string()));
        }
        url::Url::parse(&base_url)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => HttpClient::builder().build()?,
        };

        Ok(RestApiClient {
            inner: Arc::new(RestApiClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                auth: self.auth,
            }),
        })
    }
}

struct RestApiClientInner {
    http_client: HttpClient,
    base_url: String,
    default_headers: http::HeaderMap,
    auth: Option<ApiAuth>,
}

/// A REST API client bound to a base URL.
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct RestApiClient {
    inner: Arc<RestApiClientInner>,
}

impl RestApiClient {
    /// Create a new builder for configuring a REST API client.
    pub fn builder(base_url: impl Into<String>) -> RestApiClientBuilder {
        RestApiClientBuilder::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Get a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &HttpClient {
        &self.inner.http_client
    }

    /// Create a GET request builder.
    pub fn get(&self, path: &str) -> RestApiRequestBuilder {
        self.request(HttpMethod::Get, path)
    }

    /// Create a POST request builder.
    pub fn post(&self, path: &str) -> RestApiRequestBuilder {
        self.request(HttpMethod::Post, path)
    }

    /// Create a PUT request builder.
    pub fn put(&self, path: &str) -> RestApiRequestBuilder {
        self.request(HttpMethod::Put, path)
    }

    fn request(&self, method: HttpMethod, path: &str) -> RestApiRequestBuilder {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let url = format!("{}{}", self.inner.base_url, path);

        RestApiRequestBuilder {
            client: self.clone(),
            method,
            url,
            headers: self.inner.default_headers.clone(),
            query: Vec::new(),
            body: RequestBody::None,
            body_error: None,
            auth_override: None,
        }
    }
}

impl std::fmt::Debug for RestApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApiClient")
            .field("base_url", &self.inner.base_url)
            .field("has_auth", &self.inner.auth.is_some())
            .finish()
    }
}

/// Builder for REST API requests.
pub struct RestApiRequestBuilder {
    client: RestApiClient,
    method: HttpMethod,
    url: String,
    headers: http::HeaderMap,
    query: Vec<(String, String)>,
    body: RequestBody,
    body_error: Option<NetworkError>,
    auth_override: Option<ApiAuth>,
}

impl RestApiRequestBuilder {
    /// Add a header to the request.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters. Repeated keys are sent repeatedly.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Set a JSON body from a serializable value.
    ///
    /// A value that fails to serialize makes [`send`](Self::send) return
    /// [`NetworkError::Json`] without contacting the server.
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = RequestBody::Json(value),
            Err(e) => self.body_error = Some(e.into()),
        }
        self
    }

    /// Override bearer token authentication for this request.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_override = Some(ApiAuth::Bearer(token.into()));
        self
    }

    /// Build the request without sending it.
    pub fn build(self) -> Result<HttpRequest> {
        if let Some(err) = self.body_error {
            return Err(err);
        }
        let mut headers = self.headers;
        let auth = match self.auth_override.as_ref().or(self.client.inner.auth.as_ref()) {
            Some(ApiAuth::Bearer(token)) => Some(Authentication::Bearer(token.clone())),
            Some(ApiAuth::ApiKey { header, value }) => {
                if let (Ok(name), Ok(val)) = (
                    http::HeaderName::try_from(header.as_str()),
                    http::HeaderValue::try_from(value.as_str()),
                ) {
                    headers.insert(name, val);
                }
                None
            }
            None => None,
        };

        Ok(HttpRequest {
            method: self.method,
            url: self.url,
            headers,
            query: self.query,
            body: self.body,
            auth,
        })
    }

    /// Send the request and return the response, whatever its status.
    pub async fn send(self) -> Result<HttpResponse> {
        let client = self.client.clone();
        let request = self.build().inspect_err(|e| {
            tracing::error!(target: targets::REST_API, error = %e, "request not sent");
        })?;
        client.inner.http_client.execute(request).await
    }

    /// Send the request, fail on a non-2xx status and parse the body as JSON.
    ///
    /// Error statuses become [`NetworkError::HttpStatus`] carrying the body
    /// text, and bodies that do not match `T` become [`NetworkError::Json`].
    pub async fn json_response<T: DeserializeOwned>(self) -> Result<T> {
        let response = self.send().await?.error_for_status_with_body().await?;
        response.json().await
    }
}
