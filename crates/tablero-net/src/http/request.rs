//! HTTP request types and builder.

use serde::Serialize;

use super::client::{Authentication, HttpClient};
use super::response::HttpResponse;
use crate::error::{NetworkError, Result};

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
}

impl HttpMethod {
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// JSON body (serialized from a value).
    Json(serde_json::Value),
}

/// A built HTTP request ready to be sent.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The request URL.
    pub url: String,
    /// Request headers.
    pub headers: http::HeaderMap,
    /// Query parameters, in send order. Keys may repeat.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Authentication.
    pub auth: Option<Authentication>,
}

/// Builder for constructing HTTP requests.
pub struct HttpRequestBuilder {
    client: HttpClient,
    request: HttpRequest,
    body_error: Option<NetworkError>,
}

impl HttpRequestBuilder {
    pub(crate) fn new(client: HttpClient, method: HttpMethod, url: String) -> Self {
        Self {
            client,
            request: HttpRequest {
                method,
                url,
                headers: http::HeaderMap::new(),
                query: Vec::new(),
                body: RequestBody::None,
                auth: None,
            },
            body_error: None,
        }
    }

    /// Add a header to the request. Invalid names or values are ignored.
    pub fn header(
        mut self,
        name: impl TryInto<http::HeaderName>,
        value: impl TryInto<http::HeaderValue>,
    ) -> Self {
        if let (Ok(name), Ok(value)) = (name.try_into(), value.try_into()) {
            self.request.headers.insert(name, value);
        }
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.request.query.extend(pairs);
        self
    }

    /// Set a JSON body from a serializable value.
    ///
    /// A serialization failure is reported by [`build`](Self::build) and
    /// [`send`](Self::send).
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.body = RequestBody::Json(value),
            Err(e) => self.body_error = Some(e.into()),
        }
        self
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.request.auth = Some(Authentication::Bearer(token.into()));
        self
    }

    /// Build the request without sending it.
    pub fn build(self) -> Result<HttpRequest> {
        match self.body_error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }

    /// Send the request and wait for the response.
    pub async fn send(self) -> Result<HttpResponse> {
        let client = self.client.clone();
        client.execute(self.build()?).await
    }
}
