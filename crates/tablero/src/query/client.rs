//! The shared query cache and fetch orchestrator.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tablero_core::Signal;
use tablero_core::logging::targets;
use tokio::time::Instant;

use super::error::QueryError;
use super::key::{InvalidationTarget, QueryKey};
use super::policy::FetchPolicy;

type AnyData = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<AnyData, QueryError>>>;

/// How cached data relates to the policy at resolve time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Data is younger than the stale time. No request is made.
    Fresh,
    /// Data is served, and a refetch runs in the background.
    Stale,
    /// Nothing usable is cached. A fetch is running.
    Missing,
}

struct InFlight {
    id: u64,
    future: SharedFetch,
}

struct CacheEntry {
    data: Option<AnyData>,
    /// Id of the fetch that produced `data`. Results from fetches issued
    /// before this one are dropped.
    data_fetch_id: u64,
    fetched_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    in_flight: Option<InFlight>,
    last_error: Option<QueryError>,
}

impl CacheEntry {
    fn new(fetch_floor: u64) -> Self {
        Self {
            data: None,
            data_fetch_id: fetch_floor,
            fetched_at: None,
            invalidated: false,
            generation: 0,
            in_flight: None,
            last_error: None,
        }
    }

    fn freshness(&self, stale_time: Duration, now: Instant) -> Freshness {
        match (&self.data, self.fetched_at) {
            (Some(_), Some(at)) if !self.invalidated && now.duration_since(at) < stale_time => {
                Freshness::Fresh
            }
            (Some(_), Some(_)) => Freshness::Stale,
            _ => Freshness::Missing,
        }
    }
}

/// Introspection snapshot of one cache entry.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryInfo {
    /// Whether data has been stored for the key.
    pub has_data: bool,
    /// Whether the entry was explicitly invalidated since its data was fetched.
    pub invalidated: bool,
    /// Whether a request for the key is in flight.
    pub fetching: bool,
    /// When the stored data arrived.
    pub fetched_at: Option<Instant>,
    /// The failure of the most recent fetch, cleared by the next success.
    pub last_error: Option<QueryError>,
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    next_fetch_id: AtomicU64,
    disposed: AtomicBool,
    invalidated: Signal<InvalidationTarget>,
}

impl Inner {
    /// Write a settled fetch back into its entry.
    fn settle(&self, key: &QueryKey, id: u64, generation: u64, result: &Result<AnyData, QueryError>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            tracing::debug!(target: targets::QUERY, %key, "entry removed before fetch settled");
            return;
        };

        if entry.in_flight.as_ref().is_some_and(|f| f.id == id) {
            entry.in_flight = None;
        }
        if id <= entry.data_fetch_id {
            tracing::debug!(target: targets::QUERY, %key, "dropping result of superseded fetch");
            return;
        }

        match result {
            Ok(data) => {
                entry.data = Some(data.clone());
                entry.data_fetch_id = id;
                entry.fetched_at = Some(Instant::now());
                entry.invalidated = generation != entry.generation;
                entry.last_error = None;
                tracing::debug!(
                    target: targets::QUERY,
                    %key,
                    stale = entry.invalidated,
                    "fetch stored"
                );
            }
            Err(err) => {
                entry.last_error = Some(err.clone());
            }
        }
    }
}

/// What a resolve hands back: fresh data, or a request plus whatever stale
/// data there is to show meanwhile.
enum Outcome<T> {
    Fresh(Arc<T>),
    Pending {
        stale: Option<Arc<T>>,
        fetch: PendingFetch<T>,
    },
}

/// The result of [`QueryClient::resolve`]: whatever is cached now, plus the
/// request that will bring it up to date.
///
/// A resolution always carries fresh data or a pending request.
pub struct Resolution<T> {
    /// The key that was resolved.
    pub key: QueryKey,
    /// How the cached data relates to the policy.
    pub freshness: Freshness,
    /// Failure of the last settled fetch for this key, if it failed.
    pub last_error: Option<QueryError>,
    outcome: Outcome<T>,
}

impl<T> Resolution<T> {
    /// Best-known data, possibly stale.
    pub fn data(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Fresh(data) => Some(data),
            Outcome::Pending { stale, .. } => stale.as_deref(),
        }
    }

    /// The in-flight request, shared with every other caller of this key.
    /// `None` when the data is fresh.
    pub fn pending(&self) -> Option<&PendingFetch<T>> {
        match &self.outcome {
            Outcome::Fresh(_) => None,
            Outcome::Pending { fetch, .. } => Some(fetch),
        }
    }

    /// Split into the data to show now and the request to wait for.
    pub fn into_parts(self) -> (Option<Arc<T>>, Option<PendingFetch<T>>) {
        match self.outcome {
            Outcome::Fresh(data) => (Some(data), None),
            Outcome::Pending { stale, fetch } => (stale, Some(fetch)),
        }
    }
}

impl<T: Send + Sync + 'static> Resolution<T> {
    /// Cached data if there is any, otherwise wait for the pending request.
    pub async fn current_or_wait(self) -> Result<Arc<T>, QueryError> {
        match self.outcome {
            Outcome::Fresh(data) | Outcome::Pending { stale: Some(data), .. } => Ok(data),
            Outcome::Pending { stale: None, fetch } => fetch.settled().await,
        }
    }

    /// Wait for the pending request if there is one, otherwise return the
    /// fresh cached data.
    pub async fn settled(self) -> Result<Arc<T>, QueryError> {
        match self.outcome {
            Outcome::Fresh(data) => Ok(data),
            Outcome::Pending { fetch, .. } => fetch.settled().await,
        }
    }
}

impl<T> std::fmt::Debug for Resolution<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("key", &self.key)
            .field("has_data", &self.data().is_some())
            .field("freshness", &self.freshness)
            .field("pending", &self.pending().is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

/// A handle to an in-flight request.
///
/// Every handle for the same request observes the same result. Dropping a
/// handle does not cancel the request; it still completes and is stored.
pub struct PendingFetch<T> {
    key: QueryKey,
    future: SharedFetch,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for PendingFetch<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            future: self.future.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> PendingFetch<T> {
    fn new(key: QueryKey, future: SharedFetch) -> Self {
        Self {
            key,
            future,
            _marker: PhantomData,
        }
    }

    /// The key this request was issued for.
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Wait for the request to settle.
    pub async fn settled(self) -> Result<Arc<T>, QueryError> {
        let data = self.future.await?;
        data.downcast::<T>().map_err(|_| QueryError::TypeMismatch {
            key: self.key.to_string(),
        })
    }
}

/// The shared cache of remote reads.
///
/// Created once by the application and handed to every controller. Clones
/// share the same store. For each [`QueryKey`] at most one request is in
/// flight at any time; concurrent callers share it.
///
/// Fetches are spawned onto the ambient Tokio runtime so that background
/// refetches complete even when nobody awaits them. In-flight tasks only hold
/// a weak reference to the store, so dropping every clone releases it.
///
/// # Example
///
/// ```ignore
/// let client = QueryClient::new();
/// let key = QueryKey::new("presupuesto", "kpis").with_filters(&filters);
/// let fetch = json_fetcher::<KpiPresupuesto>(source, "/presupuesto/kpis", params);
/// let kpis = client.fetch(&key, fetch, &FetchPolicy::kpis()).await?;
/// ```
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                next_fetch_id: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
                invalidated: Signal::new(),
            }),
        }
    }

    /// Emitted with the target after every [`invalidate`](Self::invalidate).
    pub fn on_invalidated(&self) -> &Signal<InvalidationTarget> {
        &self.inner.invalidated
    }

    /// Return the best-known data for `key` and bring it up to date.
    ///
    /// - Fresh data is returned without any request.
    /// - Stale data is returned immediately and one refetch is started.
    /// - Missing data starts a fetch.
    ///
    /// If a request for the key is already in flight it is joined instead of
    /// issuing another. Retryable failures are retried per `policy`; other
    /// failures settle immediately.
    pub fn resolve<T, F, Fut>(&self, key: &QueryKey, fetch: F, policy: &FetchPolicy) -> Resolution<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        if self.is_disposed() {
            let future = future::ready(Err(QueryError::Disposed)).boxed().shared();
            return Resolution {
                key: key.clone(),
                freshness: Freshness::Missing,
                last_error: None,
                outcome: Outcome::Pending {
                    stale: None,
                    fetch: PendingFetch::new(key.clone(), future),
                },
            };
        }

        let now = Instant::now();
        let mut spawned = None;
        let resolution = {
            let mut entries = self.inner.entries.lock();
            let floor = self.inner.next_fetch_id.load(Ordering::SeqCst);
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(floor));

            let data = match entry.data.clone().map(|d| d.downcast::<T>()) {
                Some(Ok(data)) => Some(data),
                Some(Err(_)) => {
                    tracing::error!(
                        target: targets::QUERY,
                        %key,
                        "cached value has a different type than requested"
                    );
                    None
                }
                None => None,
            };
            let freshness = match data {
                Some(_) => entry.freshness(policy.stale_time, now),
                None => Freshness::Missing,
            };

            let outcome = match data {
                Some(data) if freshness == Freshness::Fresh => {
                    tracing::trace!(target: targets::QUERY, %key, "cache hit");
                    Outcome::Fresh(data)
                }
                stale => {
                    let future = match &entry.in_flight {
                        Some(in_flight) => {
                            tracing::debug!(
                                target: targets::QUERY,
                                %key,
                                "joining in-flight request"
                            );
                            in_flight.future.clone()
                        }
                        None => {
                            let id = self.inner.next_fetch_id.fetch_add(1, Ordering::SeqCst) + 1;
                            tracing::debug!(
                                target: targets::QUERY,
                                %key,
                                fetch_id = id,
                                ?freshness,
                                "issuing request"
                            );
                            let future = self.make_fetch(
                                key.clone(),
                                id,
                                entry.generation,
                                fetch,
                                policy.clone(),
                            );
                            entry.in_flight = Some(InFlight {
                                id,
                                future: future.clone(),
                            });
                            spawned = Some(future.clone());
                            future
                        }
                    };
                    Outcome::Pending {
                        stale,
                        fetch: PendingFetch::new(key.clone(), future),
                    }
                }
            };

            Resolution {
                key: key.clone(),
                freshness,
                last_error: entry.last_error.clone(),
                outcome,
            }
        };

        if let Some(future) = spawned {
            drive(future);
        }
        resolution
    }

    /// Cached data if present (fresh or stale), otherwise wait for it.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
        policy: &FetchPolicy,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        self.resolve(key, fetch, policy).current_or_wait().await
    }

    /// Invalidate `key` and wait for newly fetched data.
    pub async fn refetch<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
        policy: &FetchPolicy,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        self.invalidate(&InvalidationTarget::Exact(key.clone()));
        self.resolve(key, fetch, policy).settled().await
    }

    /// Run a write, then invalidate `targets` if it succeeded.
    pub async fn mutate<T, Fut>(
        &self,
        targets: &[InvalidationTarget],
        mutation: Fut,
    ) -> Result<T, QueryError>
    where
        Fut: Future<Output = Result<T, QueryError>>,
    {
        let value = mutation.await?;
        for target in targets {
            self.invalidate(target);
        }
        Ok(value)
    }

    /// Mark every matching entry stale.
    ///
    /// Data stays available for display, and the next `resolve` of each key
    /// issues a new request. Requests already in flight are detached: they
    /// still store their result, but it stays marked stale.
    ///
    /// Returns the number of entries affected.
    pub fn invalidate(&self, target: &InvalidationTarget) -> usize {
        let count = {
            let mut entries = self.inner.entries.lock();
            let mut count = 0;
            for (_, entry) in entries.iter_mut().filter(|(key, _)| target.matches(key)) {
                entry.invalidated = true;
                entry.generation += 1;
                entry.in_flight = None;
                count += 1;
            }
            count
        };
        tracing::debug!(target: targets::QUERY, invalidation = %target, count, "invalidated");
        self.inner.invalidated.emit(target.clone());
        count
    }

    /// Drop every matching entry. Returns the number removed.
    pub fn remove(&self, target: &InvalidationTarget) -> usize {
        let mut entries = self.inner.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !target.matches(key));
        before - entries.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }

    /// Drop every entry and refuse further work.
    ///
    /// Requests still in flight settle into nothing, and later `resolve`
    /// calls fail with [`QueryError::Disposed`].
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.clear();
        self.inner.invalidated.disconnect_all();
        tracing::debug!(target: targets::QUERY, "query client disposed");
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// The cached data for `key`, whatever its age.
    pub fn cached<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let entries = self.inner.entries.lock();
        entries
            .get(key)
            .and_then(|entry| entry.data.clone())
            .and_then(|data| data.downcast::<T>().ok())
    }

    /// Introspect one entry.
    pub fn entry_info(&self, key: &QueryKey) -> Option<EntryInfo> {
        let entries = self.inner.entries.lock();
        entries.get(key).map(|entry| EntryInfo {
            has_data: entry.data.is_some(),
            invalidated: entry.invalidated,
            fetching: entry.in_flight.is_some(),
            fetched_at: entry.fetched_at,
            last_error: entry.last_error.clone(),
        })
    }

    /// Whether a request for `key` is in flight.
    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.entry_info(key).is_some_and(|info| info.fetching)
    }

    /// All cached keys, sorted.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.inner.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn make_fetch<T, F, Fut>(
        &self,
        key: QueryKey,
        id: u64,
        generation: u64,
        fetch: F,
        policy: FetchPolicy,
    ) -> SharedFetch
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let store: Weak<Inner> = Arc::downgrade(&self.inner);
        async move {
            let result = fetch_with_retry(&key, &fetch, &policy)
                .await
                .map(|data| Arc::new(data) as AnyData);
            match store.upgrade() {
                Some(inner) => inner.settle(&key, id, generation, &result),
                None => {
                    tracing::debug!(target: targets::QUERY, %key, "query client dropped before fetch settled");
                }
            }
            result
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Poll a shared fetch to completion on the ambient runtime.
fn drive(future: SharedFetch) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(future);
        }
        Err(_) => {
            tracing::warn!(
                target: targets::QUERY,
                "no Tokio runtime, request only progresses while awaited"
            );
        }
    }
}

async fn fetch_with_retry<T, F, Fut>(
    key: &QueryKey,
    fetch: &F,
    policy: &FetchPolicy,
) -> Result<T, QueryError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, QueryError>>,
{
    let mut attempt = 0u32;
    loop {
        match fetch().await {
            Ok(data) => return Ok(data),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.backoff.delay(attempt);
                attempt += 1;
                tracing::warn!(
                    target: targets::QUERY,
                    %key,
                    attempt,
                    ?delay,
                    error = %err,
                    "retrying request"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(err) => {
                if err.is_programming_error() {
                    tracing::error!(target: targets::QUERY, %key, error = %err, "request failed");
                } else {
                    tracing::warn!(target: targets::QUERY, %key, error = %err, "request failed");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    use crate::query::policy::BackoffStrategy;

    fn key(op: &str) -> QueryKey {
        QueryKey::new("presupuesto", op)
    }

    fn quick(max_retries: u32) -> FetchPolicy {
        FetchPolicy::default()
            .with_max_retries(max_retries)
            .with_backoff(BackoffStrategy::None)
            .with_stale_time(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_concurrent_resolves_share_one_fetch() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let rx = Arc::new(Mutex::new(Some(rx)));

        let fetch = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let rx = rx.lock().take();
                async move {
                    match rx {
                        Some(rx) => rx.await.map_err(|e| QueryError::Transient(e.to_string())),
                        None => Err(QueryError::Transient("fetched twice".into())),
                    }
                }
            }
        };

        let first = client.resolve(&key("kpis"), fetch.clone(), &quick(0));
        let second = client.resolve(&key("kpis"), fetch, &quick(0));
        assert_eq!(first.freshness, Freshness::Missing);
        assert_eq!(second.freshness, Freshness::Missing);
        assert!(client.is_fetching(&key("kpis")));

        tx.send(7).unwrap();
        let (a, b) = tokio::join!(first.settled(), second.settled());
        assert_eq!(*a.unwrap(), 7);
        assert_eq!(*b.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!client.is_fetching(&key("kpis")));
    }

    #[tokio::test]
    async fn test_fresh_data_is_not_refetched() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, QueryError>(n) }
            }
        };

        let value = client.fetch(&key("kpis"), fetch.clone(), &quick(0)).await.unwrap();
        assert_eq!(*value, 0);

        let again = client.resolve(&key("kpis"), fetch, &quick(0));
        assert_eq!(again.freshness, Freshness::Fresh);
        assert!(again.pending().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_propagates_immediately() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<u32, _>(QueryError::Rejected {
                        status: 404,
                        message: "no existe".into(),
                    })
                }
            }
        };

        let err = client.fetch(&key("tabla"), fetch, &quick(3)).await.unwrap_err();
        assert!(matches!(err, QueryError::Rejected { status: 404, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            client.entry_info(&key("tabla")).and_then(|i| i.last_error),
            Some(err)
        );
    }

    #[tokio::test]
    async fn test_transient_error_is_retried_up_to_budget() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<u32, _>(QueryError::Transient("503".into())) }
            }
        };

        let err = client.fetch(&key("tabla"), fetch, &quick(2)).await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(QueryError::Transient("timeout".into()))
                    } else {
                        Ok("ok".to_string())
                    }
                }
            }
        };

        let value = client.fetch(&key("kpis"), fetch, &quick(1)).await.unwrap();
        assert_eq!(value.as_str(), "ok");
        assert_eq!(client.entry_info(&key("kpis")).unwrap().last_error, None);
    }

    #[tokio::test]
    async fn test_invalidate_marks_stale_and_next_resolve_refetches() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU32::new(0));
        let fetch = {
            let calls = calls.clone();
            move || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, QueryError>(n) }
            }
        };

        client.fetch(&key("kpis"), fetch.clone(), &quick(0)).await.unwrap();
        client.fetch(&key("tabla"), fetch.clone(), &quick(0)).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        client.on_invalidated().connect(move |t: &InvalidationTarget| {
            seen_clone.lock().push(t.to_string());
        });

        let count = client.invalidate(&InvalidationTarget::operation("presupuesto", "kpis"));
        assert_eq!(count, 1);
        assert!(client.entry_info(&key("kpis")).unwrap().invalidated);
        assert!(!client.entry_info(&key("tabla")).unwrap().invalidated);
        assert_eq!(*seen.lock(), vec!["presupuesto/kpis *".to_string()]);

        let stale = client.resolve(&key("kpis"), fetch, &quick(0));
        assert_eq!(stale.freshness, Freshness::Stale);
        assert_eq!(stale.data(), Some(&0));
        assert_eq!(*stale.settled().await.unwrap(), 2);
        assert!(!client.entry_info(&key("kpis")).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_fetch_in_flight_during_invalidation_stays_stale() {
        let client = QueryClient::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<u32>();
        let rx = Arc::new(Mutex::new(Some(rx)));
        let fetch = move || {
            let rx = rx.lock().take();
            async move {
                match rx {
                    Some(rx) => rx.await.map_err(|e| QueryError::Transient(e.to_string())),
                    None => Ok(99),
                }
            }
        };

        let resolution = client.resolve(&key("kpis"), fetch, &quick(0));
        let pending = resolution.pending().cloned().unwrap();
        client.invalidate(&InvalidationTarget::namespace("presupuesto"));
        assert!(!client.is_fetching(&key("kpis")));

        tx.send(1).unwrap();
        assert_eq!(*pending.settled().await.unwrap(), 1);

        let info = client.entry_info(&key("kpis")).unwrap();
        assert!(info.has_data);
        assert!(info.invalidated);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_reported() {
        let client = QueryClient::new();
        client
            .fetch(&key("kpis"), || async { Ok::<_, QueryError>(1u32) }, &quick(0))
            .await
            .unwrap();

        let resolution =
            client.resolve(&key("kpis"), || async { Ok::<_, QueryError>(1u32) }, &quick(0));
        assert!(resolution.pending().is_none());
        assert_eq!(client.cached::<String>(&key("kpis")), None);
        assert_eq!(client.cached::<u32>(&key("kpis")).as_deref(), Some(&1));
    }

    #[tokio::test]
    async fn test_resolution_carries_data_or_request() {
        let client = QueryClient::new();

        let missing = client.resolve(&key("kpis"), || async { Ok::<_, QueryError>(7u32) }, &quick(0));
        assert_eq!(missing.freshness, Freshness::Missing);
        assert_eq!(missing.data(), None);
        assert!(missing.pending().is_some());
        assert_eq!(*missing.settled().await.unwrap(), 7);

        let fresh = client.resolve(&key("kpis"), || async { Ok::<_, QueryError>(8u32) }, &quick(0));
        let (data, pending) = fresh.into_parts();
        assert_eq!(data.as_deref(), Some(&7));
        assert!(pending.is_none());

        client.dispose();
        let disposed = client.resolve(&key("kpis"), || async { Ok::<_, QueryError>(9u32) }, &quick(0));
        assert_eq!(disposed.data(), None);
        assert_eq!(disposed.current_or_wait().await, Err(QueryError::Disposed));
    }

    #[tokio::test]
    async fn test_mutate_invalidates_on_success_only() {
        let client = QueryClient::new();
        client
            .fetch(&key("kpis"), || async { Ok::<_, QueryError>(1u32) }, &quick(0))
            .await
            .unwrap();
        let targets = [InvalidationTarget::namespace("presupuesto")];

        let failed = client
            .mutate(&targets, async {
                Err::<(), _>(QueryError::Rejected {
                    status: 422,
                    message: "monto invalido".into(),
                })
            })
            .await;
        assert!(failed.is_err());
        assert!(!client.entry_info(&key("kpis")).unwrap().invalidated);

        let created = client.mutate(&targets, async { Ok::<_, QueryError>(5u32) }).await;
        assert_eq!(created, Ok(5));
        assert!(client.entry_info(&key("kpis")).unwrap().invalidated);
    }

    #[tokio::test]
    async fn test_remove_and_dispose() {
        let client = QueryClient::new();
        for op in ["kpis", "tabla"] {
            client
                .fetch(&key(op), || async { Ok::<_, QueryError>(()) }, &quick(0))
                .await
                .unwrap();
        }
        assert_eq!(client.len(), 2);
        assert_eq!(client.remove(&InvalidationTarget::Exact(key("kpis"))), 1);
        assert_eq!(client.keys(), vec![key("tabla")]);

        client.dispose();
        assert!(client.is_empty());
        let err = client
            .fetch(&key("kpis"), || async { Ok::<_, QueryError>(()) }, &quick(0))
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Disposed);
    }
}
