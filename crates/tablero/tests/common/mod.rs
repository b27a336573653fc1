//! In-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tablero::{DataSource, QueryError, QueryParams};

/// One request seen by a [`FakeSource`].
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub params: QueryParams,
    pub body: Option<Value>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }
}

type Handler = dyn Fn(&Call) -> BoxFuture<'static, Result<Value, QueryError>> + Send + Sync;

/// A [`DataSource`] answering through a closure and recording every call.
pub struct FakeSource {
    calls: Mutex<Vec<Call>>,
    handler: Box<Handler>,
}

impl FakeSource {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&Call) -> BoxFuture<'static, Result<Value, QueryError>> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
        })
    }

    /// A source answering every call immediately with `respond(call)`.
    pub fn answering<F>(respond: F) -> Arc<Self>
    where
        F: Fn(&Call) -> Result<Value, QueryError> + Send + Sync + 'static,
    {
        Self::new(move |call| future::ready(respond(call)).boxed())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn gets(&self, path: &str) -> usize {
        self.count("GET", path)
    }

    fn record(&self, call: Call) -> BoxFuture<'static, Result<Value, QueryError>> {
        let response = (self.handler)(&call);
        self.calls.lock().push(call);
        response
    }
}

impl DataSource for FakeSource {
    fn get(&self, path: &str, params: QueryParams) -> BoxFuture<'static, Result<Value, QueryError>> {
        self.record(Call {
            method: "GET",
            path: path.to_string(),
            params,
            body: None,
        })
    }

    fn post(&self, path: &str, body: Value) -> BoxFuture<'static, Result<Value, QueryError>> {
        self.record(Call {
            method: "POST",
            path: path.to_string(),
            params: QueryParams::new(),
            body: Some(body),
        })
    }

    fn put(&self, path: &str, body: Option<Value>) -> BoxFuture<'static, Result<Value, QueryError>> {
        self.record(Call {
            method: "PUT",
            path: path.to_string(),
            params: QueryParams::new(),
            body,
        })
    }
}

pub fn kpis_presupuesto(total_ues: u32) -> Value {
    json!({
        "total_ues": total_ues,
        "total_metas": 12,
        "pim_total": 1_500_000.0,
        "certificado_total": 1_200_000.0,
        "devengado_total": 900_000.0,
        "ejecucion_porcentaje": 60.0
    })
}

pub fn fila_presupuesto(id: i64, devengado: f64) -> Value {
    json!({
        "id": id,
        "ue": "UE 001",
        "meta": format!("{id:04}"),
        "clasificador": format!("2.3.1.{id}"),
        "descripcion": "Bienes",
        "pim": 1000.0,
        "certificado": 900.0,
        "devengado": devengado,
        "saldo": 1000.0 - devengado,
        "ejecucion": devengado / 10.0
    })
}

pub fn pagina(rows: Vec<Value>, total: u64, page: u32, page_size: u32) -> Value {
    json!({ "rows": rows, "total": total, "page": page, "page_size": page_size })
}

pub fn kpis_contratos(total: u32) -> Value {
    json!({
        "total": total,
        "monto_total": 52_000.0,
        "completados": 1,
        "en_proceso": 2,
        "porcentaje_avance": 33.3,
        "alerta_fraccionamiento": 0
    })
}

pub fn contrato(id: i64, monto: f64) -> Value {
    json!({
        "id": id,
        "codigo": format!("CM-{id:03}"),
        "anio": 2026,
        "descripcion": "Útiles de escritorio",
        "tipo_objeto": "BIEN",
        "categoria": "MATERIALES",
        "estado": "PENDIENTE",
        "monto_estimado": monto,
        "n_cotizaciones": 0,
        "ue_id": 2,
        "ue_sigla": "DRA"
    })
}

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
