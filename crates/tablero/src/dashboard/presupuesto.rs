//! Budget execution view.

use serde::{Deserialize, Serialize};

use super::controller::DashboardController;
use super::module::{DashboardModule, anio_actual, monto, percent};
use crate::api::ParamSpec;
use crate::filter::FilterState;
use crate::table::Column;

/// Headline budget indicators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiPresupuesto {
    pub total_ues: u32,
    pub total_metas: u32,
    pub pim_total: f64,
    pub certificado_total: f64,
    pub devengado_total: f64,
    pub ejecucion_porcentaje: f64,
}

/// One classifier line of the budget table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TablaPresupuestoRow {
    pub id: i64,
    pub ue: String,
    pub meta: String,
    pub clasificador: String,
    pub descripcion: String,
    pub pim: f64,
    pub certificado: f64,
    pub devengado: f64,
    pub saldo: f64,
    pub ejecucion: f64,
}

/// `presupuesto` module.
#[derive(Clone, Copy, Debug, Default)]
pub struct Presupuesto;

impl DashboardModule for Presupuesto {
    type Kpis = KpiPresupuesto;
    type Row = TablaPresupuestoRow;

    const NAMESPACE: &'static str = "presupuesto";
    const CHARTS: &'static [&'static str] = &[
        "grafico-pim-certificado",
        "grafico-ejecucion",
        "grafico-devengado-mensual",
    ];
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::integer("anio", "anio"),
        ParamSpec::integer("ue", "ue_id"),
        ParamSpec::integer("meta", "meta_id"),
        ParamSpec::text("fuenteFinanciamiento", "fuente"),
        ParamSpec::integer("mes", "mes"),
    ];

    fn default_filters() -> FilterState {
        anio_actual()
    }

    fn columns() -> Vec<Column<Self::Row>> {
        vec![
            Column::new("ue", "UE", |r: &TablaPresupuestoRow| r.ue.as_str().into()),
            Column::new("meta", "Meta", |r: &TablaPresupuestoRow| r.meta.as_str().into()),
            Column::new("clasificador", "Clasificador", |r: &TablaPresupuestoRow| {
                r.clasificador.as_str().into()
            }),
            Column::new("descripcion", "Descripción", |r: &TablaPresupuestoRow| {
                r.descripcion.as_str().into()
            }),
            Column::new("pim", "PIM", |r: &TablaPresupuestoRow| r.pim.into()).with_formatter(monto),
            Column::new("certificado", "Certificado", |r: &TablaPresupuestoRow| {
                r.certificado.into()
            })
            .with_formatter(monto),
            Column::new("devengado", "Devengado", |r: &TablaPresupuestoRow| r.devengado.into())
                .with_formatter(monto),
            Column::new("saldo", "Saldo", |r: &TablaPresupuestoRow| r.saldo.into())
                .with_formatter(monto),
            Column::new("ejecucion", "% Ejec.", |r: &TablaPresupuestoRow| r.ejecucion.into())
                .with_formatter(percent),
        ]
    }
}

/// Controller of the budget view.
pub type PresupuestoDashboard = DashboardController<Presupuesto>;
