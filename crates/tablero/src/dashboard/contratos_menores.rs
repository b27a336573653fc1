//! Minor contracts view and its write operations.
//!
//! Contracts up to [`MONTO_MAXIMO`] soles are registered and tracked here.
//! Creating or updating a contract invalidates every cached read of the
//! `contratos-menores` namespace, so all panels reload on their next resolve.

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};
use tablero_core::logging::targets;

use super::controller::DashboardController;
use super::module::{DashboardModule, anio_actual, monto};
use crate::api::{ParamSpec, QueryParams, post_json, put_json};
use crate::filter::FilterState;
use crate::query::{InvalidationTarget, QueryError};
use crate::table::{CellValue, Column};

/// Largest amount, in soles, a minor contract may be estimated at.
pub const MONTO_MAXIMO: f64 = 44_000.0;

/// Headline minor-contract indicators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiContratosMenores {
    pub total: u32,
    pub monto_total: f64,
    pub completados: u32,
    pub en_proceso: u32,
    pub porcentaje_avance: f64,
    /// Number of possible split-purchase groups detected.
    pub alerta_fraccionamiento: u32,
}

/// One milestone of a contract's process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContratoMenorHito {
    pub id: i64,
    pub contrato_menor_id: i64,
    pub orden: u32,
    pub hito: String,
    pub area_responsable: Option<String>,
    pub dias_planificados: Option<u32>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
    pub estado: Option<String>,
}

/// One minor contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContratoMenorRow {
    pub id: i64,
    pub codigo: Option<String>,
    pub anio: Option<i32>,
    pub descripcion: Option<String>,
    pub tipo_objeto: Option<String>,
    pub categoria: Option<String>,
    pub estado: Option<String>,
    pub monto_estimado: Option<f64>,
    pub monto_ejecutado: Option<f64>,
    pub n_orden: Option<String>,
    pub n_cotizaciones: u32,
    pub ue_id: Option<i64>,
    pub ue_sigla: Option<String>,
    pub meta_id: Option<i64>,
    pub meta_codigo: Option<String>,
    pub proveedor_id: Option<i64>,
    pub proveedor_razon_social: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Milestones; listings omit them.
    #[serde(default)]
    pub procesos: Vec<ContratoMenorHito>,
}

/// Request body of a contract registration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NuevoContratoMenor {
    pub descripcion: String,
    pub tipo_objeto: String,
    pub categoria: String,
    pub ue_id: i64,
    pub meta_id: Option<i64>,
    pub monto_estimado: f64,
}

impl NuevoContratoMenor {
    /// Reject bodies the server would refuse.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.descripcion.trim().is_empty() {
            return Err(QueryError::InvalidRequest(
                "descripcion must not be empty".to_string(),
            ));
        }
        if !self.monto_estimado.is_finite() || self.monto_estimado <= 0.0 {
            return Err(QueryError::InvalidRequest(format!(
                "monto_estimado must be positive, got {}",
                self.monto_estimado
            )));
        }
        if self.monto_estimado > MONTO_MAXIMO {
            return Err(QueryError::InvalidRequest(format!(
                "monto_estimado {} exceeds the minor contract limit of {MONTO_MAXIMO}",
                self.monto_estimado
            )));
        }
        Ok(())
    }
}

/// Request body of a contract update. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActualizarContratoMenor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_ejecutado: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proveedor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_orden: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_cotizaciones: Option<u32>,
}

/// A group of contracts of one category and month that together look like a
/// split purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FraccionamientoAlerta {
    pub ue_sigla: String,
    pub categoria: String,
    pub mes: u32,
    pub cantidad_contratos: u32,
    pub monto_acumulado: f64,
    pub tipo_alerta: String,
    pub detalle: String,
}

/// `contratos-menores` module.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContratosMenores;

impl DashboardModule for ContratosMenores {
    type Kpis = KpiContratosMenores;
    type Row = ContratoMenorRow;

    const NAMESPACE: &'static str = "contratos-menores";
    const CHARTS: &'static [&'static str] = &["graficos"];
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::integer("anio", "anio"),
        ParamSpec::integer("ue_id", "ue_id"),
        ParamSpec::integer("meta_id", "meta_id"),
        ParamSpec::text("estado", "estado"),
        ParamSpec::text("tipo_objeto", "tipo_objeto"),
        ParamSpec::integer("mes", "mes"),
    ];

    fn default_filters() -> FilterState {
        anio_actual()
    }

    fn columns() -> Vec<Column<Self::Row>> {
        vec![
            Column::new("codigo", "Código", |r: &ContratoMenorRow| r.codigo.clone().into()),
            Column::new("descripcion", "Descripción", |r: &ContratoMenorRow| {
                r.descripcion.clone().into()
            }),
            Column::new("ue", "DDNNTT", |r: &ContratoMenorRow| r.ue_sigla.clone().into()),
            Column::new("tipo_objeto", "Tipo", |r: &ContratoMenorRow| {
                r.tipo_objeto.clone().into()
            }),
            Column::new("estado", "Estado", |r: &ContratoMenorRow| r.estado.clone().into()),
            Column::new("monto_estimado", "Monto Estim. (S/)", |r: &ContratoMenorRow| {
                r.monto_estimado.into()
            })
            .with_formatter(monto),
            Column::new("proveedor", "Proveedor", |r: &ContratoMenorRow| {
                r.proveedor_razon_social.clone().into()
            }),
            Column::new("n_orden", "N° Orden", |r: &ContratoMenorRow| r.n_orden.clone().into()),
            Column::new("n_cotizaciones", "Cotizaciones", |r: &ContratoMenorRow| {
                CellValue::from(r.n_cotizaciones)
            }),
        ]
    }
}

/// Controller of the minor contracts view.
pub type ContratosMenoresDashboard = DashboardController<ContratosMenores>;

impl DashboardController<ContratosMenores> {
    /// Register a contract.
    ///
    /// The body is validated before any request is sent. On success every
    /// cached `contratos-menores` read is invalidated.
    pub fn create(
        &self,
        nuevo: NuevoContratoMenor,
    ) -> BoxFuture<'static, Result<ContratoMenorRow, QueryError>> {
        if let Err(err) = nuevo.validate() {
            tracing::warn!(target: targets::DASHBOARD, error = %err, "contract registration rejected");
            return future::ready(Err(err)).boxed();
        }
        let request = post_json(self.source().as_ref(), &ContratosMenores::path(""), &nuevo);
        self.write(request)
    }

    /// Update a contract's state, execution or supplier data.
    pub fn update(
        &self,
        id: i64,
        cambios: ActualizarContratoMenor,
    ) -> BoxFuture<'static, Result<ContratoMenorRow, QueryError>> {
        let path = format!("/{}/{id}", ContratosMenores::NAMESPACE);
        let request = put_json(self.source().as_ref(), &path, Some(&cambios));
        self.write(request)
    }

    /// One contract with its milestones.
    pub fn detalle(&self, id: i64) -> BoxFuture<'static, Result<ContratoMenorRow, QueryError>> {
        self.lookup(
            format!("detalle/{id}"),
            format!("/{}/{id}", ContratosMenores::NAMESPACE),
            QueryParams::new(),
        )
    }

    /// Split-purchase alerts of a fiscal year.
    pub fn fraccionamiento(
        &self,
        anio: i32,
    ) -> BoxFuture<'static, Result<Vec<FraccionamientoAlerta>, QueryError>> {
        self.lookup(
            format!("fraccionamiento/{anio}"),
            ContratosMenores::path("fraccionamiento"),
            QueryParams::new().with("anio", anio.to_string()),
        )
    }

    fn write(
        &self,
        request: BoxFuture<'static, Result<ContratoMenorRow, QueryError>>,
    ) -> BoxFuture<'static, Result<ContratoMenorRow, QueryError>> {
        let client = self.client().clone();
        async move {
            client
                .mutate(
                    &[InvalidationTarget::namespace(ContratosMenores::NAMESPACE)],
                    request,
                )
                .await
        }
        .boxed()
    }
}
