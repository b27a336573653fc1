//! Import status: which spreadsheet formats were loaded and the upload history.
//!
//! Uploads themselves are posted by the application; once one completes,
//! [`ImportStatus::record_upload`] invalidates the cached status so both
//! panels reload. A failed upload is surfaced as is and never replaced by
//! placeholder data.

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tablero_core::logging::targets;

use crate::api::{DataSource, QueryParams, json_fetcher};
use crate::config::DashboardConfig;
use crate::dashboard::module::DEFAULT_ANIO;
use crate::filter::FilterState;
use crate::query::{FetchPolicy, InvalidationTarget, QueryClient, QueryKey, QuerySlot, QueryState};

/// Cache namespace and URL prefix of the import endpoints.
pub const NAMESPACE: &str = "importacion";

/// Load status of one import format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormatoEstadoItem {
    pub formato: String,
    pub plantilla_key: String,
    pub nombre: String,
    pub descripcion: String,
    pub categoria: String,
    pub es_requerido: bool,
    pub tiene_plantilla: bool,
    pub impacto: String,
    pub upload_endpoint: String,
    pub ultima_carga: Option<String>,
    pub estado: String,
    pub registros_ok: u32,
    pub usuario_ultima_carga: Option<String>,
}

/// Load status of every format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstadoFormatos {
    pub formatos: Vec<FormatoEstadoItem>,
    pub total: u32,
    pub cargados_exitosos: u32,
    pub cargados_parcial: u32,
    pub sin_cargar: u32,
    pub requeridos_faltantes: u32,
}

impl EstadoFormatos {
    /// Required formats that were never loaded.
    pub fn faltantes(&self) -> impl Iterator<Item = &FormatoEstadoItem> {
        self.formatos
            .iter()
            .filter(|f| f.es_requerido && f.ultima_carga.is_none())
    }
}

/// One past upload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistorialImportacion {
    pub id: i64,
    pub formato: String,
    pub archivo_nombre: String,
    pub fecha: String,
    pub usuario: String,
    pub ue: Option<String>,
    pub registros_ok: u32,
    pub registros_error: u32,
    pub estado: String,
}

struct ImportInner {
    client: QueryClient,
    source: Arc<dyn DataSource>,
    policy: FetchPolicy,
    anio: Mutex<String>,
    estado: QuerySlot<EstadoFormatos>,
    historial: QuerySlot<Vec<HistorialImportacion>>,
}

/// Format status and upload history panels.
#[derive(Clone)]
pub struct ImportStatus {
    inner: Arc<ImportInner>,
}

impl ImportStatus {
    /// Create the panels with default configuration.
    pub fn new(client: QueryClient, source: Arc<dyn DataSource>) -> Self {
        Self::with_config(client, source, &DashboardConfig::default())
    }

    /// Create the panels using the table policy of `config`.
    pub fn with_config(
        client: QueryClient,
        source: Arc<dyn DataSource>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ImportInner {
                client,
                source,
                policy: config.policies.table.clone(),
                anio: Mutex::new(DEFAULT_ANIO.to_string()),
                estado: QuerySlot::new("estado-formatos"),
                historial: QuerySlot::new("historial"),
            }),
        }
    }

    /// Fiscal year the history is listed for.
    pub fn anio(&self) -> String {
        self.inner.anio.lock().clone()
    }

    /// Switch the history to another fiscal year and reload it.
    pub fn set_anio(&self, anio: i32) -> BoxFuture<'static, ()> {
        let anio = anio.to_string();
        {
            let mut current = self.inner.anio.lock();
            if *current == anio {
                return future::ready(()).boxed();
            }
            *current = anio;
        }
        self.load_historial()
    }

    /// Reload both panels.
    pub fn refresh(&self) -> BoxFuture<'static, ()> {
        let inner = &self.inner;
        let estado = inner.estado.load(
            &inner.client,
            QueryKey::new(NAMESPACE, "estado-formatos"),
            json_fetcher::<EstadoFormatos>(
                inner.source.clone(),
                format!("/{NAMESPACE}/estado-formatos"),
                QueryParams::new(),
            ),
            &inner.policy,
        );
        future::join(estado, self.load_historial())
            .map(|_| ())
            .boxed()
    }

    /// Format status panel state.
    pub fn estado(&self) -> QueryState<EstadoFormatos> {
        self.inner.estado.state()
    }

    /// History panel state.
    pub fn historial(&self) -> QueryState<Vec<HistorialImportacion>> {
        self.inner.historial.state()
    }

    /// Note a completed upload of `formato`: both panels are stale from now on.
    ///
    /// Returns the number of cache entries invalidated.
    pub fn record_upload(&self, formato: &str) -> usize {
        let count = self
            .inner
            .client
            .invalidate(&InvalidationTarget::namespace(NAMESPACE));
        tracing::info!(target: targets::DASHBOARD, formato, "upload recorded");
        count
    }

    fn load_historial(&self) -> BoxFuture<'static, ()> {
        let inner = &self.inner;
        let anio = self.anio();
        let filters = FilterState::new().with("anio", anio.as_str());
        inner.historial.load(
            &inner.client,
            QueryKey::new(NAMESPACE, "historial").with_filters(&filters),
            json_fetcher::<Vec<HistorialImportacion>>(
                inner.source.clone(),
                format!("/{NAMESPACE}/historial"),
                QueryParams::new().with("anio", anio),
            ),
            &inner.policy,
        )
    }
}

impl fmt::Debug for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportStatus")
            .field("anio", &self.anio())
            .field("estado", &self.inner.estado.state().status)
            .field("historial", &self.inner.historial.state().status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_formats() {
        let estado: EstadoFormatos = serde_json::from_value(serde_json::json!({
            "formatos": [
                {
                    "formato": "F1", "plantilla_key": "f1", "nombre": "PIM",
                    "descripcion": "", "categoria": "presupuesto", "es_requerido": true,
                    "tiene_plantilla": true, "impacto": "alto", "upload_endpoint": "/importacion/f1",
                    "ultima_carga": null, "estado": "SIN_CARGAR", "registros_ok": 0,
                    "usuario_ultima_carga": null
                },
                {
                    "formato": "F2", "plantilla_key": "f2", "nombre": "CM",
                    "descripcion": "", "categoria": "contratos", "es_requerido": true,
                    "tiene_plantilla": false, "impacto": "medio", "upload_endpoint": "/importacion/f2",
                    "ultima_carga": "2026-01-05T10:00:00", "estado": "EXITOSO", "registros_ok": 120,
                    "usuario_ultima_carga": "admin"
                }
            ],
            "total": 2, "cargados_exitosos": 1, "cargados_parcial": 0,
            "sin_cargar": 1, "requeridos_faltantes": 1
        }))
        .unwrap();
        let faltantes: Vec<&str> = estado.faltantes().map(|f| f.formato.as_str()).collect();
        assert_eq!(faltantes, vec!["F1"]);
    }
}
