//! Static description of a dashboard view.

use serde::de::DeserializeOwned;

use crate::api::ParamSpec;
use crate::filter::FilterState;
use crate::format::{format_monto_completo, format_percent};
use crate::table::{CellValue, Column};

/// Everything a [`DashboardController`](super::DashboardController) needs to
/// know about one reporting module: where its endpoints live, how filters
/// map to parameters and how its table renders.
///
/// Every panel's operation name doubles as its endpoint path below the
/// namespace, so `kpis` of `presupuesto` is fetched from
/// `/presupuesto/kpis` and cached under `presupuesto/kpis`.
pub trait DashboardModule: Send + Sync + 'static {
    /// Payload of the KPI endpoint.
    type Kpis: DeserializeOwned + Send + Sync + 'static;
    /// One row of the table endpoint.
    type Row: DeserializeOwned + Clone + Send + Sync + 'static;

    /// Cache namespace and URL prefix, e.g. `contratos-menores`.
    const NAMESPACE: &'static str;
    /// KPI operation.
    const KPIS: &'static str = "kpis";
    /// Table operation.
    const TABLE: &'static str = "tabla";
    /// Chart operations, each returning an opaque JSON series.
    const CHARTS: &'static [&'static str];
    /// Filter-to-parameter mapping shared by every endpoint of the module.
    const PARAMS: &'static [ParamSpec];

    /// Committed filters when the view opens.
    fn default_filters() -> FilterState;

    /// Table columns.
    fn columns() -> Vec<Column<Self::Row>>;

    /// Endpoint path of an operation.
    fn path(operation: &str) -> String {
        format!("/{}/{}", Self::NAMESPACE, operation)
    }
}

pub(crate) fn monto(value: &CellValue) -> String {
    value.as_f64().map(format_monto_completo).unwrap_or_default()
}

pub(crate) fn percent(value: &CellValue) -> String {
    value.as_f64().map(|v| format_percent(v, 1)).unwrap_or_default()
}

pub(crate) fn anio_actual() -> FilterState {
    FilterState::new().with("anio", DEFAULT_ANIO)
}

/// Fiscal year every view opens on.
pub const DEFAULT_ANIO: &str = "2026";
