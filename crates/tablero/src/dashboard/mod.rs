//! Dashboard views built on the filter, query and table layers.
//!
//! Each reporting module is a [`DashboardModule`] type driven by a generic
//! [`DashboardController`]:
//!
//! - [`Presupuesto`]: budget execution
//! - [`Adquisiciones`]: procurement processes
//! - [`ContratosMenores`]: minor contracts, with create and update
//! - [`ActividadesOperativas`]: operational activities and their drill-down
//!
//! The alert center, import status and reference catalogs have their own
//! shapes and are served by [`AlertCenter`], [`ImportStatus`] and
//! [`MasterData`].

mod actividades_operativas;
mod adquisiciones;
mod alertas;
mod contratos_menores;
mod controller;
mod importacion;
mod maestros;
mod module;
mod presupuesto;

pub use actividades_operativas::{
    AOTablaRow, ActividadesOperativas, ActividadesOperativasDashboard, DrillDownAO, KpiAO, TareaAO,
};
pub use adquisiciones::{AdquisicionRow, Adquisiciones, AdquisicionesDashboard, KpiAdquisiciones};
pub use alertas::{AlertCenter, AlertCounts, Alerta, ResumenAlertas, alert_params};
pub use contratos_menores::{
    ActualizarContratoMenor, ContratoMenorHito, ContratoMenorRow, ContratosMenores,
    ContratosMenoresDashboard, FraccionamientoAlerta, KpiContratosMenores, MONTO_MAXIMO,
    NuevoContratoMenor,
};
pub use controller::{DashboardController, DashboardSnapshot, Panel};
pub use importacion::{EstadoFormatos, FormatoEstadoItem, HistorialImportacion, ImportStatus};
pub use maestros::{
    ActividadOperativa, Clasificador, MasterData, MetaPresupuestal, Proveedor, UnidadEjecutora,
};
pub use module::{DEFAULT_ANIO, DashboardModule};
pub use presupuesto::{KpiPresupuesto, Presupuesto, PresupuestoDashboard, TablaPresupuestoRow};

/// Cache namespaces of the modules without a [`DashboardModule`] type.
pub mod namespaces {
    pub use super::alertas::NAMESPACE as ALERTAS;
    pub use super::importacion::NAMESPACE as IMPORTACION;
    pub use super::maestros::NAMESPACE as MAESTROS;
}
