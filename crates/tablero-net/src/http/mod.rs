//! HTTP client for Tablero.
//!
//! # Example
//!
//! ```ignore
//! use tablero_net::http::HttpClient;
//!
//! let client = HttpClient::builder().build()?;
//! let response = client.get("http://localhost:8000/api/alertas/resumen").send().await?;
//! println!("Status: {}", response.status());
//! ```

mod client;
mod request;
mod response;
mod rest_api;

pub use client::{Authentication, HttpClient, HttpClientBuilder, HttpClientConfig};
pub use request::{HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody};
pub use response::HttpResponse;
pub use rest_api::{ApiAuth, RestApiClient, RestApiClientBuilder, RestApiRequestBuilder};
