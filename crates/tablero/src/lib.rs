//! Filter-driven query orchestration and table engine for reporting
//! dashboards.
//!
//! Tablero sits between a dashboard UI and its REST API:
//!
//! - **Filters**: [`FilterStateManager`] keeps draft and committed criteria
//! - **Queries**: [`QueryClient`] caches, deduplicates and retries remote
//!   reads keyed by [`QueryKey`]; [`QuerySlot`] keeps one panel on its
//!   newest key
//! - **Tables**: [`TableEngine`] sorts stably and paginates rows
//! - **Dashboards**: [`DashboardController`] ties the three together for
//!   each reporting module
//! - **API**: [`ApiSource`] adapts the REST client; [`DashboardConfig`]
//!   reads connection and policy settings from TOML
//!
//! # Example
//!
//! ```ignore
//! use tablero::prelude::*;
//!
//! let config = DashboardConfig::load("tablero.toml")?;
//! let client = QueryClient::new();
//! let source = ApiSource::new(config.rest_client()?).shared();
//!
//! let view = PresupuestoDashboard::with_config(client.clone(), source, &config);
//! view.refresh().await;
//!
//! view.filters().set_filter("ue", "3");
//! view.commit_draft().await;
//!
//! if let Some(kpis) = view.kpis().data() {
//!     println!("{}", format_percent(kpis.ejecucion_porcentaje, 1));
//! }
//! let page = view.table_engine().render_page();
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod format;
pub mod query;
pub mod table;

pub use api::{ApiSource, DataSource, Page, ParamKind, ParamSpec, QueryParams};
pub use config::{ConfigError, DashboardConfig};
pub use dashboard::{
    AlertCenter, DashboardController, DashboardModule, DashboardSnapshot, ImportStatus, MasterData,
    Panel,
};
pub use filter::{FilterState, FilterStateManager, FilterValue};
pub use query::{
    BackoffStrategy, FetchPolicy, InvalidationTarget, PageRequest, QueryClient, QueryError,
    QueryKey, QuerySlot, QueryState, QueryStatus,
};
pub use table::{CellValue, Column, SortDirection, SortSpec, TableEngine};

pub use tablero_core::{Property, Signal};

/// Commonly used items.
pub mod prelude {
    pub use crate::api::{ApiSource, DataSource, Page};
    pub use crate::config::DashboardConfig;
    pub use crate::dashboard::{
        ActividadesOperativasDashboard, AdquisicionesDashboard, AlertCenter,
        ContratosMenoresDashboard, DashboardController, ImportStatus, MasterData, Panel,
        PresupuestoDashboard,
    };
    pub use crate::filter::{FilterState, FilterStateManager};
    pub use crate::format::{Semaforo, format_fecha, format_monto, format_percent};
    pub use crate::query::{FetchPolicy, InvalidationTarget, QueryClient, QueryError, QueryKey};
    pub use crate::table::{Column, SortSpec, TableEngine};
}
