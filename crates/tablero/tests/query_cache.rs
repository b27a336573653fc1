//! Cache behavior of the query client under a paused clock.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tablero::query::{BackoffStrategy, Freshness};
use tablero::{FetchPolicy, FilterState, InvalidationTarget, QueryClient, QueryError, QueryKey};
use tokio::sync::Notify;

fn counter_fetch(
    calls: Arc<AtomicUsize>,
) -> impl Fn() -> futures_util::future::BoxFuture<'static, Result<usize, QueryError>>
+ Send
+ Sync
+ 'static {
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok(n) }.boxed()
    }
}

fn key(anio: &str) -> QueryKey {
    QueryKey::new("presupuesto", "kpis").with_filters(&FilterState::new().with("anio", anio))
}

#[tokio::test]
async fn test_concurrent_resolves_share_one_request() {
    common::init_tracing();
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let gate = Arc::new(Notify::new());
    let policy = FetchPolicy::dashboard();

    let fetch = {
        let calls = calls.clone();
        let gate = gate.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok::<_, QueryError>("kpis")
            }
            .boxed()
        }
    };

    let first = client.resolve(&key("2026"), fetch.clone(), &policy);
    let second = client.resolve(&key("2026"), fetch, &policy);
    assert_eq!(first.freshness, Freshness::Missing);
    assert!(client.is_fetching(&key("2026")));

    gate.notify_one();
    let (a, b) = futures_util::join!(first.settled(), second.settled());
    assert_eq!(*a.unwrap(), "kpis");
    assert_eq!(*b.unwrap(), "kpis");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_time_controls_refetch() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = FetchPolicy::default().with_stale_time(Duration::from_secs(60));
    let key = key("2026");

    let first = client
        .fetch(&key, counter_fetch(calls.clone()), &policy)
        .await
        .unwrap();
    assert_eq!(*first, 1);

    tokio::time::advance(Duration::from_secs(30)).await;
    let resolution = client.resolve(&key, counter_fetch(calls.clone()), &policy);
    assert_eq!(resolution.freshness, Freshness::Fresh);
    assert!(resolution.pending().is_none());
    assert_eq!(resolution.data(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(31)).await;
    let resolution = client.resolve(&key, counter_fetch(calls.clone()), &policy);
    assert_eq!(resolution.freshness, Freshness::Stale);
    assert_eq!(resolution.data(), Some(&1));

    // A second caller joins the background refetch.
    let joined = client.resolve(&key, counter_fetch(calls.clone()), &policy);
    assert_eq!(*resolution.settled().await.unwrap(), 2);
    assert_eq!(*joined.settled().await.unwrap(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_back_off_then_surface() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = FetchPolicy::default()
        .with_max_retries(2)
        .with_backoff(BackoffStrategy::Fixed { delay_ms: 1000 });

    let fetch = {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(QueryError::Transient("connection reset".into())) }.boxed()
        }
    };

    let started = tokio::time::Instant::now();
    let err = client.fetch(&key("2026"), fetch, &policy).await.unwrap_err();
    assert!(err.is_recoverable());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_secs(2));

    let info = client.entry_info(&key("2026")).unwrap();
    assert!(!info.has_data);
    assert_eq!(info.last_error, Some(err));
}

#[tokio::test]
async fn test_namespace_invalidation_spares_other_modules() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let policy = FetchPolicy::kpis();

    let contratos = QueryKey::new("contratos-menores", "kpis");
    let presupuesto = QueryKey::new("presupuesto", "kpis");
    client.fetch(&contratos, counter_fetch(calls.clone()), &policy).await.unwrap();
    client.fetch(&presupuesto, counter_fetch(calls.clone()), &policy).await.unwrap();

    let invalidated = client.invalidate(&InvalidationTarget::namespace("contratos-menores"));
    assert_eq!(invalidated, 1);

    let stale = client.resolve(&contratos, counter_fetch(calls.clone()), &policy);
    assert_eq!(stale.freshness, Freshness::Stale);
    let fresh = client.resolve(&presupuesto, counter_fetch(calls.clone()), &policy);
    assert_eq!(fresh.freshness, Freshness::Fresh);

    assert_eq!(*stale.settled().await.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
