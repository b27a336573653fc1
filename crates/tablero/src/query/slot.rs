//! Display slots bound to one query at a time.

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tablero_core::Signal;
use tablero_core::logging::targets;

use super::client::{Freshness, QueryClient};
use super::error::QueryError;
use super::key::QueryKey;
use super::policy::FetchPolicy;

/// Lifecycle of a display slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryStatus {
    /// Nothing was requested yet.
    #[default]
    Idle,
    /// Waiting for the first data of the current key.
    Loading,
    /// Showing stale data while a refetch runs.
    Refreshing,
    /// Showing data for the current key.
    Success,
    /// The last request for the current key failed.
    Error,
}

/// What a view shows for one panel.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Data to display, if any.
    pub data: Option<Arc<T>>,
    /// The key `data` was fetched for.
    pub data_key: Option<QueryKey>,
    /// Failure of the last request for the current key.
    pub error: Option<QueryError>,
    /// Current lifecycle stage.
    pub status: QueryStatus,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            data_key: None,
            error: None,
            status: QueryStatus::Idle,
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            data_key: self.data_key.clone(),
            error: self.error.clone(),
            status: self.status,
        }
    }
}

impl<T> QueryState<T> {
    /// Whether a request is running for the current key.
    pub fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading | QueryStatus::Refreshing)
    }

    /// Whether the last request failed.
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// The displayed data.
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }
}

struct SlotState<T> {
    desired: Option<QueryKey>,
    /// Bumped by every `load` and `reset`; only the latest load may apply.
    generation: u64,
    view: QueryState<T>,
}

struct SlotInner<T> {
    name: &'static str,
    state: Mutex<SlotState<T>>,
    changed: Signal<QueryState<T>>,
}

/// One panel of a view (KPIs, a chart, the table) bound to the key it
/// currently wants.
///
/// Every [`load`](Self::load) supersedes the previous one. When a request
/// settles, its result is applied only if it answers the latest load;
/// responses for superseded loads are discarded, whatever order they arrive
/// in. This covers a new key as well as a refetch of the same key after an
/// invalidation.
pub struct QuerySlot<T> {
    inner: Arc<SlotInner<T>>,
}

impl<T> Clone for QuerySlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> QuerySlot<T> {
    /// Create an idle slot. `name` only appears in logs.
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                name,
                state: Mutex::new(SlotState {
                    desired: None,
                    generation: 0,
                    view: QueryState::default(),
                }),
                changed: Signal::new(),
            }),
        }
    }

    /// Emitted with a snapshot after every state change.
    pub fn changed(&self) -> &Signal<QueryState<T>> {
        &self.inner.changed
    }

    /// Snapshot of what the panel shows.
    pub fn state(&self) -> QueryState<T> {
        self.inner.state.lock().view.clone()
    }

    /// The key most recently passed to [`load`](Self::load).
    pub fn desired_key(&self) -> Option<QueryKey> {
        self.inner.state.lock().desired.clone()
    }

    /// Point the slot at `key` and resolve it.
    ///
    /// Cached data for `key` is shown immediately. The returned future
    /// completes once the request (if any) settled and was applied or
    /// discarded; dropping it does not cancel the request.
    pub fn load<F, Fut>(
        &self,
        client: &QueryClient,
        key: QueryKey,
        fetch: F,
        policy: &FetchPolicy,
    ) -> BoxFuture<'static, ()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let resolution = client.resolve(&key, fetch, policy);
        let freshness = resolution.freshness;
        let (data, pending) = resolution.into_parts();

        let (generation, snapshot) = {
            let mut state = self.inner.state.lock();
            state.desired = Some(key.clone());
            state.generation += 1;
            let generation = state.generation;
            let view = &mut state.view;
            match data {
                Some(data) => {
                    view.data = Some(data);
                    view.data_key = Some(key.clone());
                }
                None if view.data_key.as_ref() != Some(&key) => {
                    view.data = None;
                    view.data_key = None;
                }
                None => {}
            }
            view.error = None;
            view.status = match freshness {
                Freshness::Fresh => QueryStatus::Success,
                Freshness::Stale => QueryStatus::Refreshing,
                Freshness::Missing => QueryStatus::Loading,
            };
            (generation, view.clone())
        };
        self.inner.changed.emit(snapshot);

        let inner = self.inner.clone();
        async move {
            if let Some(pending) = pending {
                let result = pending.settled().await;
                apply(&inner, &key, generation, result);
            }
        }
        .boxed()
    }

    /// Forget the wanted key and the displayed data.
    pub fn reset(&self) {
        {
            let mut state = self.inner.state.lock();
            state.desired = None;
            state.generation += 1;
            state.view = QueryState::default();
        }
        self.inner.changed.emit(QueryState::default());
    }
}

fn apply<T: Send + Sync + 'static>(
    inner: &SlotInner<T>,
    key: &QueryKey,
    generation: u64,
    result: Result<Arc<T>, QueryError>,
) {
    let snapshot = {
        let mut state = inner.state.lock();
        if state.generation != generation {
            tracing::debug!(
                target: targets::QUERY,
                slot = inner.name,
                %key,
                "discarding response for superseded load"
            );
            return;
        }
        let view = &mut state.view;
        match result {
            Ok(data) => {
                view.data = Some(data);
                view.data_key = Some(key.clone());
                view.error = None;
                view.status = QueryStatus::Success;
            }
            Err(err) => {
                if !err.is_recoverable() {
                    view.data = None;
                    view.data_key = None;
                }
                view.error = Some(err);
                view.status = QueryStatus::Error;
            }
        }
        view.clone()
    };
    inner.changed.emit(snapshot);
}

impl<T> std::fmt::Debug for QuerySlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("QuerySlot")
            .field("name", &self.inner.name)
            .field("desired", &state.desired)
            .field("status", &state.view.status)
            .finish()
    }
}
