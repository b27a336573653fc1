//! Cached, deduplicated remote reads.
//!
//! Every remote read is addressed by a [`QueryKey`] built from a namespace,
//! an operation, the committed filter snapshot and optional page selection.
//! The [`QueryClient`] owns the cache: it serves fresh data without I/O,
//! serves stale data while refetching, joins concurrent requests for the
//! same key and retries transient failures per [`FetchPolicy`].
//!
//! [`QuerySlot`] binds one display panel to the key it currently wants, so
//! that a slow response for an old filter combination never overwrites the
//! panel after the filters moved on.

mod client;
mod error;
mod key;
mod policy;
mod slot;

pub use client::{EntryInfo, Freshness, PendingFetch, QueryClient, Resolution};
pub use error::QueryError;
pub use key::{InvalidationTarget, PageRequest, QueryKey};
pub use policy::{BackoffStrategy, FetchPolicy};
pub use slot::{QuerySlot, QueryState, QueryStatus};
