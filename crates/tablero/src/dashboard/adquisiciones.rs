//! Procurement processes view.

use std::collections::BTreeMap;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::controller::DashboardController;
use super::module::{DEFAULT_ANIO, DashboardModule, monto};
use crate::api::{ParamSpec, QueryParams};
use crate::filter::FilterState;
use crate::query::QueryError;
use crate::table::Column;

/// Headline procurement indicators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiAdquisiciones {
    pub total: u32,
    pub monto_pim: f64,
    pub monto_adjudicado: f64,
    pub avance_porcentaje: f64,
    pub culminados: u32,
    pub en_proceso: u32,
    /// Process count per state.
    pub by_estado: BTreeMap<String, u32>,
}

/// One procurement process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdquisicionRow {
    pub id: i64,
    pub codigo: String,
    pub anio: Option<i32>,
    pub ue_id: Option<i64>,
    pub ue_sigla: Option<String>,
    pub meta_id: Option<i64>,
    pub meta_codigo: Option<String>,
    pub descripcion: String,
    pub tipo_objeto: Option<String>,
    pub tipo_procedimiento: Option<String>,
    pub estado: Option<String>,
    pub fase_actual: Option<String>,
    pub monto_referencial: Option<f64>,
    pub monto_adjudicado: Option<f64>,
    pub proveedor_id: Option<i64>,
    pub proveedor_razon_social: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// `adquisiciones` module.
#[derive(Clone, Copy, Debug, Default)]
pub struct Adquisiciones;

impl DashboardModule for Adquisiciones {
    type Kpis = KpiAdquisiciones;
    type Row = AdquisicionRow;

    const NAMESPACE: &'static str = "adquisiciones";
    const CHARTS: &'static [&'static str] = &["graficos"];
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::integer("anioFiscal", "anio"),
        ParamSpec::integer("ue_id", "ue_id"),
        ParamSpec::text("estado", "estado"),
        ParamSpec::text("tipo_procedimiento", "tipo_procedimiento"),
        ParamSpec::integer("mes", "mes"),
    ];

    fn default_filters() -> FilterState {
        FilterState::new().with("anioFiscal", DEFAULT_ANIO)
    }

    fn columns() -> Vec<Column<Self::Row>> {
        vec![
            Column::new("codigo", "Código", |r: &AdquisicionRow| r.codigo.as_str().into()),
            Column::new("descripcion", "Descripción", |r: &AdquisicionRow| {
                r.descripcion.as_str().into()
            }),
            Column::new("ue", "UE", |r: &AdquisicionRow| r.ue_sigla.clone().into()),
            Column::new("tipo_objeto", "Tipo Objeto", |r: &AdquisicionRow| {
                r.tipo_objeto.clone().into()
            }),
            Column::new("tipo_procedimiento", "Procedimiento", |r: &AdquisicionRow| {
                r.tipo_procedimiento.clone().into()
            }),
            Column::new("estado", "Estado", |r: &AdquisicionRow| r.estado.clone().into()),
            Column::new("fase_actual", "Fase", |r: &AdquisicionRow| {
                r.fase_actual.clone().into()
            }),
            Column::new("monto_referencial", "Monto Ref.", |r: &AdquisicionRow| {
                r.monto_referencial.into()
            })
            .with_formatter(monto),
        ]
    }
}

/// Controller of the procurement view.
pub type AdquisicionesDashboard = DashboardController<Adquisiciones>;

impl DashboardController<Adquisiciones> {
    /// One procurement process, cached under `adquisiciones/detalle/{id}`.
    pub fn detalle(&self, id: i64) -> BoxFuture<'static, Result<AdquisicionRow, QueryError>> {
        self.lookup(
            format!("detalle/{id}"),
            format!("/{}/{id}", Adquisiciones::NAMESPACE),
            QueryParams::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_year_alias() {
        let params = QueryParams::from_filters(
            &Adquisiciones::default_filters().with("estado", "CONVOCADO"),
            Adquisiciones::PARAMS,
        );
        assert_eq!(
            params.pairs(),
            &[
                ("anio".to_string(), "2026".to_string()),
                ("estado".to_string(), "CONVOCADO".to_string()),
            ]
        );
    }

    #[test]
    fn test_row_decodes_nullable_fields() {
        let row: AdquisicionRow = serde_json::from_value(serde_json::json!({
            "id": 4,
            "codigo": "AS-004-2026",
            "descripcion": "Servicio de limpieza",
            "anio": null,
            "ue_id": null,
            "ue_sigla": null,
            "meta_id": null,
            "meta_codigo": null,
            "tipo_objeto": "SERVICIO",
            "tipo_procedimiento": null,
            "estado": "CONVOCADO",
            "fase_actual": null,
            "monto_referencial": 15000.5,
            "monto_adjudicado": null,
            "proveedor_id": null,
            "proveedor_razon_social": null,
            "created_at": "2026-01-10T09:00:00",
            "updated_at": "2026-01-12T09:00:00"
        }))
        .unwrap();
        assert_eq!(row.monto_referencial, Some(15000.5));
        assert_eq!(row.ue_sigla, None);

        let cells: Vec<String> = Adquisiciones::columns()
            .iter()
            .map(|c| c.display(&row))
            .collect();
        assert_eq!(cells[2], "");
        assert_eq!(cells[7], "S/ 15,000.50");
    }
}
