//! Alert center: filtered alert list, badge summary and read/resolve actions.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tablero_core::logging::targets;

use crate::api::{DataSource, QueryParams, json_fetcher, put_json};
use crate::config::DashboardConfig;
use crate::filter::{FilterState, FilterStateManager};
use crate::query::{
    FetchPolicy, InvalidationTarget, QueryClient, QueryError, QueryKey, QuerySlot, QueryState,
};

/// Cache namespace and URL prefix of the alert endpoints.
pub const NAMESPACE: &str = "alertas";

/// One generated alert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alerta {
    pub id: i64,
    pub tipo: Option<String>,
    /// `ROJO`, `AMARILLO` or `VERDE`.
    pub nivel: Option<String>,
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    pub ue_sigla: Option<String>,
    pub modulo: Option<String>,
    pub entidad_id: Option<i64>,
    pub entidad_tipo: Option<String>,
    pub leida: bool,
    pub resuelta: bool,
    pub fecha_generacion: String,
}

impl Alerta {
    fn has_nivel(&self, nivel: &str) -> bool {
        self.nivel
            .as_deref()
            .is_some_and(|n| n.eq_ignore_ascii_case(nivel))
    }
}

/// Server-side alert totals shown on the badge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResumenAlertas {
    pub total: u32,
    pub no_leidas: u32,
    pub rojas: u32,
    pub amarillas: u32,
    /// Alert count per module.
    #[serde(default)]
    pub by_modulo: BTreeMap<String, u32>,
}

/// Counts over the currently listed alerts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertCounts {
    /// Unresolved red alerts.
    pub rojas: usize,
    /// Unresolved yellow alerts.
    pub amarillas: usize,
    pub no_leidas: usize,
    pub resueltas: usize,
}

impl AlertCounts {
    /// Count `alertas`.
    pub fn of(alertas: &[Alerta]) -> Self {
        let mut counts = Self::default();
        for alerta in alertas {
            if !alerta.resuelta {
                if alerta.has_nivel("ROJO") {
                    counts.rojas += 1;
                } else if alerta.has_nivel("AMARILLO") {
                    counts.amarillas += 1;
                }
            }
            if !alerta.leida {
                counts.no_leidas += 1;
            }
            if alerta.resuelta {
                counts.resueltas += 1;
            }
        }
        counts
    }
}

/// Translate the alert filters to query parameters.
///
/// `nivel` and `modulo` are sent as is. `estado` is one of `no_leida`,
/// `leida` or `resuelta` and expands to the `leida`/`resuelta` flags.
pub fn alert_params(filters: &FilterState) -> QueryParams {
    let mut params = QueryParams::new();
    if let Some(nivel) = filters.get_single("nivel") {
        params.push("nivel", nivel);
    }
    match filters.get_single("estado") {
        Some("no_leida") => {
            params.push("leida", "false");
            params.push("resuelta", "false");
        }
        Some("leida") => {
            params.push("leida", "true");
            params.push("resuelta", "false");
        }
        Some("resuelta") => params.push("resuelta", "true"),
        Some(other) => {
            tracing::warn!(target: targets::API, estado = other, "unknown alert state filter");
        }
        None => {}
    }
    if let Some(modulo) = filters.get_single("modulo") {
        params.push("modulo", modulo);
    }
    params
}

struct AlertInner {
    client: QueryClient,
    source: Arc<dyn DataSource>,
    list_policy: FetchPolicy,
    summary_policy: FetchPolicy,
    filters: FilterStateManager,
    lista: QuerySlot<Vec<Alerta>>,
    resumen: QuerySlot<ResumenAlertas>,
}

/// Alert list and summary with their write actions.
///
/// Every successful write invalidates the whole `alertas` namespace, so the
/// list and the badge reload together.
#[derive(Clone)]
pub struct AlertCenter {
    inner: Arc<AlertInner>,
}

impl AlertCenter {
    /// Create an alert center with default configuration.
    pub fn new(client: QueryClient, source: Arc<dyn DataSource>) -> Self {
        Self::with_config(client, source, &DashboardConfig::default())
    }

    /// Create an alert center using the table policy of `config` for the list.
    pub fn with_config(
        client: QueryClient,
        source: Arc<dyn DataSource>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AlertInner {
                client,
                source,
                list_policy: config.policies.table.clone(),
                summary_policy: FetchPolicy::alert_summary(),
                filters: FilterStateManager::default(),
                lista: QuerySlot::new("lista"),
                resumen: QuerySlot::new("resumen"),
            }),
        }
    }

    /// The list filters (`nivel`, `estado`, `modulo`).
    pub fn filters(&self) -> &FilterStateManager {
        &self.inner.filters
    }

    /// Cache key of the list for the committed filters.
    pub fn list_key(&self) -> QueryKey {
        QueryKey::new(NAMESPACE, "lista").with_filters(&self.inner.filters.committed())
    }

    /// Cache key of the summary.
    pub fn summary_key() -> QueryKey {
        QueryKey::new(NAMESPACE, "resumen")
    }

    /// Reload the list and the summary.
    pub fn refresh(&self) -> BoxFuture<'static, ()> {
        let inner = &self.inner;
        let filters = inner.filters.committed();
        let lista = inner.lista.load(
            &inner.client,
            self.list_key(),
            json_fetcher::<Vec<Alerta>>(
                inner.source.clone(),
                format!("/{NAMESPACE}/"),
                alert_params(&filters),
            ),
            &inner.list_policy,
        );
        let resumen = inner.resumen.load(
            &inner.client,
            Self::summary_key(),
            json_fetcher::<ResumenAlertas>(
                inner.source.clone(),
                format!("/{NAMESPACE}/resumen"),
                QueryParams::new(),
            ),
            &inner.summary_policy,
        );
        future::join(lista, resumen).map(|_| ()).boxed()
    }

    /// Merge `patch` into the list filters and reload if they changed.
    pub fn apply_filters(&self, patch: &FilterState) -> BoxFuture<'static, ()> {
        if self.inner.filters.apply_filters(patch) {
            self.refresh()
        } else {
            future::ready(()).boxed()
        }
    }

    /// Clear the list filters and reload if anything was cleared.
    pub fn clear_filters(&self) -> BoxFuture<'static, ()> {
        if self.inner.filters.clear_filters() {
            self.refresh()
        } else {
            future::ready(()).boxed()
        }
    }

    /// List panel state.
    pub fn lista(&self) -> QueryState<Vec<Alerta>> {
        self.inner.lista.state()
    }

    /// Summary panel state.
    pub fn resumen(&self) -> QueryState<ResumenAlertas> {
        self.inner.resumen.state()
    }

    /// The list slot, for change notifications.
    pub fn lista_slot(&self) -> &QuerySlot<Vec<Alerta>> {
        &self.inner.lista
    }

    /// Counts over the listed alerts. Zero while nothing is listed.
    pub fn counts(&self) -> AlertCounts {
        self.inner
            .lista
            .state()
            .data()
            .map(|alertas| AlertCounts::of(alertas))
            .unwrap_or_default()
    }

    /// Mark alert `id` as read.
    pub fn mark_read(&self, id: i64) -> BoxFuture<'static, Result<(), QueryError>> {
        self.action(id, "leer")
    }

    /// Mark alert `id` as resolved.
    pub fn mark_resolved(&self, id: i64) -> BoxFuture<'static, Result<(), QueryError>> {
        self.action(id, "resolver")
    }

    /// Mark every unread listed alert as read.
    ///
    /// Requests run concurrently; the namespace is invalidated once, after
    /// all of them succeeded. Returns how many alerts were marked.
    pub fn mark_all_read(&self) -> BoxFuture<'static, Result<usize, QueryError>> {
        let unread: Vec<i64> = self
            .inner
            .lista
            .state()
            .data()
            .map(|alertas| alertas.iter().filter(|a| !a.leida).map(|a| a.id).collect())
            .unwrap_or_default();
        if unread.is_empty() {
            return future::ready(Ok(0)).boxed();
        }

        let requests: Vec<_> = unread
            .iter()
            .map(|id| self.put(*id, "leer"))
            .collect();
        let client = self.inner.client.clone();
        async move {
            client
                .mutate(
                    &[InvalidationTarget::namespace(NAMESPACE)],
                    future::try_join_all(requests).map(|done| done.map(|v| v.len())),
                )
                .await
        }
        .boxed()
    }

    fn put(&self, id: i64, action: &str) -> BoxFuture<'static, Result<Value, QueryError>> {
        put_json::<Value, Value>(
            self.inner.source.as_ref(),
            &format!("/{NAMESPACE}/{id}/{action}"),
            None,
        )
    }

    fn action(&self, id: i64, action: &'static str) -> BoxFuture<'static, Result<(), QueryError>> {
        let request = self.put(id, action);
        let client = self.inner.client.clone();
        async move {
            client
                .mutate(&[InvalidationTarget::namespace(NAMESPACE)], request)
                .await?;
            tracing::debug!(target: targets::DASHBOARD, id, action, "alert updated");
            Ok(())
        }
        .boxed()
    }
}

impl fmt::Debug for AlertCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertCenter")
            .field("filters", &self.inner.filters.committed())
            .field("lista", &self.inner.lista.state().status)
            .field("resumen", &self.inner.resumen.state().status)
            .finish()
    }
}
