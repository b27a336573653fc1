//! HTTP and REST client layer for Tablero.
//!
//! This crate wraps `reqwest` with the small surface the dashboard needs:
//!
//! - **HTTP Client**: [`HttpClient`] with timeouts, redirects, user agent and
//!   default headers
//! - **REST Client**: [`RestApiClient`] with a base URL, authentication,
//!   flat query parameters and JSON helpers. Requests are sent once.
//! - **Errors**: [`NetworkError`], classified into transient and client
//!   failures so callers can decide what to retry
//!
//! # Example
//!
//! ```ignore
//! use tablero_net::RestApiClient;
//!
//! let client = RestApiClient::builder("http://localhost:8000/api")
//!     .bearer_auth("token")
//!     .json_api()
//!     .build()?;
//!
//! let kpis: serde_json::Value = client
//!     .get("/presupuesto/kpis")
//!     .query("anio", "2026")
//!     .json_response()
//!     .await?;
//! ```

mod error;
pub mod http;

pub use error::{NetworkError, Result};

pub use http::{
    ApiAuth, Authentication, HttpClient, HttpClientBuilder, HttpClientConfig, HttpMethod,
    HttpRequest, HttpRequestBuilder, HttpResponse, RequestBody, RestApiClient,
    RestApiClientBuilder, RestApiRequestBuilder,
};
