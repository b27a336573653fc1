//! Per-view orchestration of filters, panels and the table.

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tablero_core::logging::targets;

use super::module::DashboardModule;
use crate::api::{DataSource, Page, QueryParams, json_fetcher};
use crate::config::{DashboardConfig, PolicyConfig};
use crate::filter::{FilterState, FilterStateManager};
use crate::query::{
    InvalidationTarget, PageRequest, QueryClient, QueryError, QueryKey, QuerySlot, QueryState,
};
use crate::table::TableEngine;

/// One independently loaded part of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    /// The KPI cards.
    Kpis,
    /// A chart series, by operation name.
    Chart(&'static str),
    /// The table page.
    Table,
}

/// Point-in-time view of every panel.
pub struct DashboardSnapshot<M: DashboardModule> {
    /// Committed filters the panels were keyed on.
    pub filters: FilterState,
    /// KPI panel.
    pub kpis: QueryState<M::Kpis>,
    /// Chart panels, in declaration order.
    pub charts: Vec<(&'static str, QueryState<Value>)>,
    /// Table panel.
    pub table: QueryState<Page<M::Row>>,
}

impl<M: DashboardModule> fmt::Debug for DashboardSnapshot<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardSnapshot")
            .field("namespace", &M::NAMESPACE)
            .field("filters", &self.filters)
            .field("kpis", &self.kpis.status)
            .field(
                "charts",
                &self.charts.iter().map(|(name, s)| (*name, s.status)).collect::<Vec<_>>(),
            )
            .field("table", &self.table.status)
            .finish()
    }
}

struct ControllerInner<M: DashboardModule> {
    client: QueryClient,
    source: Arc<dyn DataSource>,
    policies: PolicyConfig,
    page_size: usize,
    filters: FilterStateManager,
    table_page: Mutex<PageRequest>,
    kpis: QuerySlot<M::Kpis>,
    charts: Vec<(&'static str, QuerySlot<Value>)>,
    table: QuerySlot<Page<M::Row>>,
}

/// Drives one dashboard view.
///
/// Owns the view's [`FilterStateManager`] and one [`QuerySlot`] per panel.
/// Every refresh keys all panels on the same committed filter snapshot and
/// loads them concurrently; each panel keeps its own loading, error and data
/// state, so a failing chart never blanks the KPIs or the table.
///
/// Cheap to clone; clones drive the same view.
///
/// # Example
///
/// ```ignore
/// let client = QueryClient::new();
/// let source = ApiSource::new(config.rest_client()?).shared();
/// let view: DashboardController<Presupuesto> =
///     DashboardController::with_config(client, source, &config);
///
/// view.refresh().await;
/// view.apply_filters(&FilterState::new().with("ue", "3")).await;
/// let engine = view.table_engine();
/// ```
pub struct DashboardController<M: DashboardModule> {
    inner: Arc<ControllerInner<M>>,
}

impl<M: DashboardModule> Clone for DashboardController<M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<M: DashboardModule> DashboardController<M> {
    /// Create a controller with default configuration.
    pub fn new(client: QueryClient, source: Arc<dyn DataSource>) -> Self {
        Self::with_config(client, source, &DashboardConfig::default())
    }

    /// Create a controller using the policies and table sizes of `config`.
    pub fn with_config(
        client: QueryClient,
        source: Arc<dyn DataSource>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                client,
                source,
                policies: config.policies.clone(),
                page_size: config.table.page_size,
                filters: FilterStateManager::new(M::default_filters()),
                table_page: Mutex::new(PageRequest::new(1, config.table.fetch_page_size)),
                kpis: QuerySlot::new("kpis"),
                charts: M::CHARTS
                    .iter()
                    .map(|&name| (name, QuerySlot::new(name)))
                    .collect(),
                table: QuerySlot::new("tabla"),
            }),
        }
    }

    /// The view's filters.
    pub fn filters(&self) -> &FilterStateManager {
        &self.inner.filters
    }

    /// The shared query cache.
    pub fn client(&self) -> &QueryClient {
        &self.inner.client
    }

    /// The backend.
    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.inner.source
    }

    /// Reload every panel for the committed filters.
    ///
    /// All panels are pointed at their new keys before this returns; the
    /// future completes once every panel settled.
    pub fn refresh(&self) -> BoxFuture<'static, ()> {
        let filters = self.inner.filters.committed();
        tracing::debug!(
            target: targets::DASHBOARD,
            namespace = M::NAMESPACE,
            filters = %filters.canonical(),
            "refreshing panels"
        );

        let mut loads = Vec::with_capacity(M::CHARTS.len() + 2);
        loads.push(self.load(Panel::Kpis, &filters));
        for &chart in M::CHARTS {
            loads.push(self.load(Panel::Chart(chart), &filters));
        }
        loads.push(self.load(Panel::Table, &filters));

        future::join_all(loads.into_iter().flatten()).map(|_| ()).boxed()
    }

    /// Merge `patch` into the committed filters and reload if they changed.
    ///
    /// A filter change goes back to the first table page.
    pub fn apply_filters(&self, patch: &FilterState) -> BoxFuture<'static, ()> {
        if self.inner.filters.apply_filters(patch) {
            self.reset_table_page();
            self.refresh()
        } else {
            future::ready(()).boxed()
        }
    }

    /// Commit the draft filters and reload if they changed.
    pub fn commit_draft(&self) -> BoxFuture<'static, ()> {
        let draft = self.inner.filters.draft();
        self.apply_filters(&draft)
    }

    /// Clear all filters and reload if anything was cleared.
    pub fn clear_filters(&self) -> BoxFuture<'static, ()> {
        if self.inner.filters.clear_filters() {
            self.reset_table_page();
            self.refresh()
        } else {
            future::ready(()).boxed()
        }
    }

    /// The server page the table panel is on.
    pub fn table_page(&self) -> PageRequest {
        *self.inner.table_page.lock()
    }

    /// Move the table panel to server page `page` (1-based) and load it.
    pub fn set_table_page(&self, page: u32) -> BoxFuture<'static, ()> {
        {
            let mut current = self.inner.table_page.lock();
            *current = PageRequest::new(page, current.page_size);
        }
        let filters = self.inner.filters.committed();
        self.load(Panel::Table, &filters)
            .unwrap_or_else(|| future::ready(()).boxed())
    }

    /// Invalidate one panel's current key and load it again.
    pub fn retry(&self, panel: Panel) -> BoxFuture<'static, ()> {
        let filters = self.inner.filters.committed();
        let Some(key) = self.key(panel, &filters) else {
            tracing::warn!(target: targets::DASHBOARD, ?panel, "retry of unknown panel");
            return future::ready(()).boxed();
        };
        self.inner.client.invalidate(&InvalidationTarget::Exact(key));
        self.load(panel, &filters)
            .unwrap_or_else(|| future::ready(()).boxed())
    }

    /// Mark every cached entry of this module stale.
    pub fn invalidate(&self) -> usize {
        self.inner
            .client
            .invalidate(&InvalidationTarget::namespace(M::NAMESPACE))
    }

    /// KPI panel state.
    pub fn kpis(&self) -> QueryState<M::Kpis> {
        self.inner.kpis.state()
    }

    /// State of the chart panel `name`.
    pub fn chart(&self, name: &str) -> Option<QueryState<Value>> {
        self.inner
            .charts
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, slot)| slot.state())
    }

    /// Table panel state.
    pub fn table(&self) -> QueryState<Page<M::Row>> {
        self.inner.table.state()
    }

    /// The KPI slot, for change notifications.
    pub fn kpis_slot(&self) -> &QuerySlot<M::Kpis> {
        &self.inner.kpis
    }

    /// The table slot, for change notifications.
    pub fn table_slot(&self) -> &QuerySlot<Page<M::Row>> {
        &self.inner.table
    }

    /// State of every panel.
    pub fn snapshot(&self) -> DashboardSnapshot<M> {
        DashboardSnapshot {
            filters: self.inner.filters.committed(),
            kpis: self.kpis(),
            charts: self
                .inner
                .charts
                .iter()
                .map(|(name, slot)| (*name, slot.state()))
                .collect(),
            table: self.table(),
        }
    }

    /// A table engine over the rows of the current table page.
    pub fn table_engine(&self) -> TableEngine<M::Row> {
        let rows = self
            .inner
            .table
            .state()
            .data
            .map(|page| page.rows.clone())
            .unwrap_or_default();
        TableEngine::new(rows, M::columns()).with_page_size(self.inner.page_size)
    }

    /// The fetch policies panels load with.
    pub fn policies(&self) -> &PolicyConfig {
        &self.inner.policies
    }

    /// Read `path` through the cache under `{namespace}/{operation}`, outside
    /// of any panel. Used for detail and drill-down lookups.
    pub(crate) fn lookup<T>(
        &self,
        operation: String,
        path: String,
        params: QueryParams,
    ) -> BoxFuture<'static, Result<T, QueryError>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let key = QueryKey::new(M::NAMESPACE, operation);
        let client = self.inner.client.clone();
        let fetch = json_fetcher::<T>(self.inner.source.clone(), path, params);
        let policy = self.inner.policies.table.clone();
        async move {
            let value = client.fetch(&key, fetch, &policy).await?;
            Ok(T::clone(&value))
        }
        .boxed()
    }

    fn reset_table_page(&self) {
        let mut current = self.inner.table_page.lock();
        *current = PageRequest::new(1, current.page_size);
    }

    fn key(&self, panel: Panel, filters: &FilterState) -> Option<QueryKey> {
        let key = match panel {
            Panel::Kpis => QueryKey::new(M::NAMESPACE, M::KPIS),
            Panel::Chart(name) if M::CHARTS.contains(&name) => QueryKey::new(M::NAMESPACE, name),
            Panel::Chart(_) => return None,
            Panel::Table => QueryKey::new(M::NAMESPACE, M::TABLE).with_page(self.table_page()),
        };
        Some(key.with_filters(filters))
    }

    fn load(&self, panel: Panel, filters: &FilterState) -> Option<BoxFuture<'static, ()>> {
        let key = self.key(panel, filters)?;
        let params = QueryParams::from_filters(filters, M::PARAMS);
        let inner = &self.inner;
        let source = inner.source.clone();

        let load = match panel {
            Panel::Kpis => inner.kpis.load(
                &inner.client,
                key,
                json_fetcher::<M::Kpis>(source, M::path(M::KPIS), params),
                &inner.policies.kpis,
            ),
            Panel::Chart(name) => {
                let (_, slot) = inner.charts.iter().find(|(n, _)| *n == name)?;
                slot.load(
                    &inner.client,
                    key,
                    json_fetcher::<Value>(source, M::path(name), params),
                    &inner.policies.charts,
                )
            }
            Panel::Table => {
                let params = params.with_page(self.table_page());
                inner.table.load(
                    &inner.client,
                    key,
                    json_fetcher::<Page<M::Row>>(source, M::path(M::TABLE), params),
                    &inner.policies.table,
                )
            }
        };
        Some(load)
    }
}

impl<M: DashboardModule> fmt::Debug for DashboardController<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardController")
            .field("namespace", &M::NAMESPACE)
            .field("filters", &self.inner.filters.committed())
            .field("table_page", &self.table_page())
            .finish()
    }
}
