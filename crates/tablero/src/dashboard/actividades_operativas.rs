//! Operational activities view.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::controller::DashboardController;
use super::module::{DashboardModule, anio_actual, monto, percent};
use crate::api::{ParamSpec, QueryParams};
use crate::filter::FilterState;
use crate::format::Semaforo;
use crate::query::QueryError;
use crate::table::Column;

/// Traffic-light distribution of the operational activities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiAO {
    pub total_aos: u32,
    pub verdes: u32,
    pub amarillos: u32,
    pub rojos: u32,
    pub porcentaje_verde: f64,
    pub porcentaje_amarillo: f64,
    pub porcentaje_rojo: f64,
}

/// One operational activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AOTablaRow {
    pub id: i64,
    pub codigo_ceplan: String,
    pub nombre: String,
    pub ue_sigla: String,
    pub programado_total: f64,
    pub ejecutado_total: f64,
    pub ejecucion_porcentaje: f64,
    pub semaforo: Semaforo,
}

/// Execution of one spending classifier inside an activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TareaAO {
    pub clasificador_codigo: String,
    pub clasificador_descripcion: String,
    pub programado: f64,
    pub ejecutado: f64,
    pub ejecucion_porcentaje: f64,
}

/// Per-classifier breakdown of one activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrillDownAO {
    pub ao_id: i64,
    pub ao_nombre: String,
    pub ao_codigo: String,
    pub semaforo: Semaforo,
    pub programado_total: f64,
    pub ejecutado_total: f64,
    pub tareas: Vec<TareaAO>,
}

/// `actividades-operativas` module.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActividadesOperativas;

impl DashboardModule for ActividadesOperativas {
    type Kpis = KpiAO;
    type Row = AOTablaRow;

    const NAMESPACE: &'static str = "actividades-operativas";
    const CHARTS: &'static [&'static str] = &["programado-vs-ejecutado"];
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::integer("anio", "anio"),
        ParamSpec::integer("ue_id", "ue_id"),
        ParamSpec::integer("mes", "mes"),
    ];

    fn default_filters() -> FilterState {
        anio_actual()
    }

    fn columns() -> Vec<Column<Self::Row>> {
        vec![
            Column::new("codigo_ceplan", "Código CEPLAN", |r: &AOTablaRow| {
                r.codigo_ceplan.as_str().into()
            }),
            Column::new("nombre", "Nombre AO", |r: &AOTablaRow| r.nombre.as_str().into()),
            Column::new("ue", "UE", |r: &AOTablaRow| r.ue_sigla.as_str().into()),
            Column::new("programado", "Programado (S/)", |r: &AOTablaRow| {
                r.programado_total.into()
            })
            .with_formatter(monto),
            Column::new("ejecutado", "Ejecutado (S/)", |r: &AOTablaRow| {
                r.ejecutado_total.into()
            })
            .with_formatter(monto),
            Column::new("ejecucion", "% Ejecución", |r: &AOTablaRow| {
                r.ejecucion_porcentaje.into()
            })
            .with_formatter(percent),
            Column::new("semaforo", "Estado", |r: &AOTablaRow| r.semaforo.as_str().into()),
        ]
    }
}

/// Controller of the operational activities view.
pub type ActividadesOperativasDashboard = DashboardController<ActividadesOperativas>;

impl DashboardController<ActividadesOperativas> {
    /// Classifier breakdown of activity `id`.
    pub fn drill_down(&self, id: i64) -> BoxFuture<'static, Result<DrillDownAO, QueryError>> {
        self.lookup(
            format!("drill-down/{id}"),
            ActividadesOperativas::path(&format!("{id}/drill-down")),
            QueryParams::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{SortSpec, TableEngine};

    fn row(id: i64, ejecucion: f64) -> AOTablaRow {
        AOTablaRow {
            id,
            codigo_ceplan: format!("AOI00{id}"),
            nombre: format!("Actividad {id}"),
            ue_sigla: "DRA".into(),
            programado_total: 100.0,
            ejecutado_total: ejecucion,
            ejecucion_porcentaje: ejecucion,
            semaforo: Semaforo::from_percent(ejecucion),
        }
    }

    #[test]
    fn test_sort_by_traffic_light_label() {
        let mut engine = TableEngine::new(
            vec![row(1, 95.0), row(2, 40.0), row(3, 75.0)],
            ActividadesOperativas::columns(),
        );
        engine.set_sort(Some(SortSpec::ascending("semaforo")));
        let ids: Vec<i64> = engine.page_rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_drill_down_decodes_uppercase_semaforo() {
        let detail: DrillDownAO = serde_json::from_value(serde_json::json!({
            "ao_id": 9,
            "ao_nombre": "Asistencia técnica",
            "ao_codigo": "AOI009",
            "semaforo": "ROJO",
            "programado_total": 1000.0,
            "ejecutado_total": 120.0,
            "tareas": [{
                "clasificador_codigo": "2.3.1.5.1.2",
                "clasificador_descripcion": "Papelería",
                "programado": 1000.0,
                "ejecutado": 120.0,
                "ejecucion_porcentaje": 12.0
            }]
        }))
        .unwrap();
        assert_eq!(detail.semaforo, Semaforo::Rojo);
        assert_eq!(detail.tareas.len(), 1);
    }
}
