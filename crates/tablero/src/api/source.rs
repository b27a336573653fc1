//! Where query data comes from.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tablero_core::logging::targets;
use tablero_net::RestApiClient;

use super::params::QueryParams;
use crate::query::QueryError;

/// A JSON backend.
///
/// Implemented by [`ApiSource`] for the REST API and by in-memory fakes in
/// tests. Returned futures own everything they need, so they can be shared
/// and spawned by the query client.
pub trait DataSource: Send + Sync + 'static {
    /// `GET path` with query parameters.
    fn get(&self, path: &str, params: QueryParams) -> BoxFuture<'static, Result<Value, QueryError>>;

    /// `POST path` with a JSON body.
    fn post(&self, path: &str, body: Value) -> BoxFuture<'static, Result<Value, QueryError>>;

    /// `PUT path` with an optional JSON body.
    fn put(&self, path: &str, body: Option<Value>) -> BoxFuture<'static, Result<Value, QueryError>>;
}

/// [`DataSource`] over the dashboard REST API.
///
/// The wrapped client should not retry on its own: retries are decided by
/// the [`FetchPolicy`](crate::query::FetchPolicy) of each query.
/// [`DashboardConfig::rest_client`](crate::config::DashboardConfig::rest_client)
/// builds a suitable client.
#[derive(Clone, Debug)]
pub struct ApiSource {
    client: RestApiClient,
}

impl ApiSource {
    /// Wrap a REST client.
    pub fn new(client: RestApiClient) -> Self {
        Self { client }
    }

    /// The wrapped client.
    pub fn client(&self) -> &RestApiClient {
        &self.client
    }

    /// Type-erase into a shared source.
    pub fn shared(self) -> Arc<dyn DataSource> {
        Arc::new(self)
    }
}

impl DataSource for ApiSource {
    fn get(&self, path: &str, params: QueryParams) -> BoxFuture<'static, Result<Value, QueryError>> {
        let request = self.client.get(path).query_pairs(params.into_pairs());
        async move { request.json_response::<Value>().await.map_err(QueryError::from) }.boxed()
    }

    fn post(&self, path: &str, body: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        let request = self.client.post(path).json(&body);
        async move { request.json_response::<Value>().await.map_err(QueryError::from) }.boxed()
    }

    fn put(&self, path: &str, body: Option<Value>) -> BoxFuture<'static, Result<Value, QueryError>> {
        let mut request = self.client.put(path);
        if let Some(body) = &body {
            request = request.json(body);
        }
        async move { request.json_response::<Value>().await.map_err(QueryError::from) }.boxed()
    }
}

/// Deserialize a response payload.
///
/// A payload of the wrong shape is a contract violation: it is logged at
/// `error` level and never replaced by defaults.
pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, QueryError> {
    serde_json::from_value(value).map_err(|err| {
        tracing::error!(target: targets::API, path, error = %err, "unexpected response shape");
        QueryError::Contract(format!("{path}: {err}"))
    })
}

/// `GET path` and decode the payload as `T`.
pub fn get_json<T>(
    source: &dyn DataSource,
    path: &str,
    params: QueryParams,
) -> BoxFuture<'static, Result<T, QueryError>>
where
    T: DeserializeOwned + Send + 'static,
{
    let request = source.get(path, params);
    let path = path.to_string();
    async move { decode(&path, request.await?) }.boxed()
}

/// `POST path` with `body` serialized as JSON, decoding the response as `T`.
pub fn post_json<B, T>(
    source: &dyn DataSource,
    path: &str,
    body: &B,
) -> BoxFuture<'static, Result<T, QueryError>>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned + Send + 'static,
{
    let body = match serde_json::to_value(body) {
        Ok(body) => body,
        Err(err) => return future::ready(Err(QueryError::InvalidRequest(err.to_string()))).boxed(),
    };
    let request = source.post(path, body);
    let path = path.to_string();
    async move { decode(&path, request.await?) }.boxed()
}

/// `PUT path` with an optional JSON body, decoding the response as `T`.
pub fn put_json<B, T>(
    source: &dyn DataSource,
    path: &str,
    body: Option<&B>,
) -> BoxFuture<'static, Result<T, QueryError>>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned + Send + 'static,
{
    let body = match body.map(serde_json::to_value).transpose() {
        Ok(body) => body,
        Err(err) => return future::ready(Err(QueryError::InvalidRequest(err.to_string()))).boxed(),
    };
    let request = source.put(path, body);
    let path = path.to_string();
    async move { decode(&path, request.await?) }.boxed()
}

/// A reusable fetch function for [`QueryClient::resolve`](crate::query::QueryClient::resolve):
/// every call issues `GET path` with the same parameters.
pub fn json_fetcher<T>(
    source: Arc<dyn DataSource>,
    path: impl Into<String>,
    params: QueryParams,
) -> impl Fn() -> BoxFuture<'static, Result<T, QueryError>> + Send + Sync + 'static
where
    T: DeserializeOwned + Send + 'static,
{
    let path = path.into();
    move || get_json(source.as_ref(), &path, params.clone())
}
