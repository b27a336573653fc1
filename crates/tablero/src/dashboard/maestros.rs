//! Reference data behind the filter selectors.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::{DataSource, QueryParams, json_fetcher};
use crate::config::DashboardConfig;
use crate::filter::FilterState;
use crate::query::{FetchPolicy, QueryClient, QueryError, QueryKey};

/// Cache namespace of reference data.
pub const NAMESPACE: &str = "maestros";

const PREFIX: &str = "/datos-maestros";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnidadEjecutora {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub sigla: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPresupuestal {
    pub id: i64,
    pub codigo: String,
    pub descripcion: String,
    pub ue_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActividadOperativa {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub meta_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clasificador {
    pub id: i64,
    pub codigo: String,
    pub descripcion: String,
    pub tipo_generico: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proveedor {
    pub id: i64,
    pub ruc: String,
    pub razon_social: String,
    pub tipo: String,
}

/// Cached reads of the reference catalogs.
///
/// Catalogs change rarely, so they are fetched with the `master_data`
/// policy and shared by every view through the common [`QueryClient`].
#[derive(Clone)]
pub struct MasterData {
    client: QueryClient,
    source: Arc<dyn DataSource>,
    policy: FetchPolicy,
}

impl MasterData {
    /// Create with default configuration.
    pub fn new(client: QueryClient, source: Arc<dyn DataSource>) -> Self {
        Self::with_config(client, source, &DashboardConfig::default())
    }

    /// Create using the `master_data` policy of `config`.
    pub fn with_config(
        client: QueryClient,
        source: Arc<dyn DataSource>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            client,
            source,
            policy: config.policies.master_data.clone(),
        }
    }

    /// Executing units.
    pub fn unidades_ejecutoras(
        &self,
    ) -> BoxFuture<'static, Result<Arc<Vec<UnidadEjecutora>>, QueryError>> {
        self.catalog("unidades-ejecutoras", &[])
    }

    /// Budget goals, optionally of one executing unit.
    pub fn metas(
        &self,
        ue_id: Option<i64>,
    ) -> BoxFuture<'static, Result<Arc<Vec<MetaPresupuestal>>, QueryError>> {
        self.catalog("metas-presupuestales", &[("ue_id", ue_id)])
    }

    /// Operational activities, optionally narrowed by goal and unit.
    pub fn actividades_operativas(
        &self,
        meta_id: Option<i64>,
        ue_id: Option<i64>,
    ) -> BoxFuture<'static, Result<Arc<Vec<ActividadOperativa>>, QueryError>> {
        self.catalog(
            "actividades-operativas",
            &[("meta_id", meta_id), ("ue_id", ue_id)],
        )
    }

    /// Spending classifiers, optionally of one generic type.
    pub fn clasificadores(
        &self,
        tipo_generico: Option<&str>,
    ) -> BoxFuture<'static, Result<Arc<Vec<Clasificador>>, QueryError>> {
        let mut filters = FilterState::new();
        if let Some(tipo) = tipo_generico {
            filters.insert("tipo_generico", tipo);
        }
        self.fetch("clasificadores", filters)
    }

    /// Suppliers.
    pub fn proveedores(&self) -> BoxFuture<'static, Result<Arc<Vec<Proveedor>>, QueryError>> {
        self.catalog("proveedores", &[])
    }

    fn catalog<T>(
        &self,
        catalog: &'static str,
        ids: &[(&'static str, Option<i64>)],
    ) -> BoxFuture<'static, Result<Arc<Vec<T>>, QueryError>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let mut filters = FilterState::new();
        for (name, id) in ids {
            if let Some(id) = id {
                filters.insert(*name, id.to_string());
            }
        }
        self.fetch(catalog, filters)
    }

    fn fetch<T>(
        &self,
        catalog: &'static str,
        filters: FilterState,
    ) -> BoxFuture<'static, Result<Arc<Vec<T>>, QueryError>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let key = QueryKey::new(NAMESPACE, catalog).with_filters(&filters);
        let mut params = QueryParams::new();
        for (name, value) in filters.iter() {
            for raw in value.values() {
                params.push(name, raw);
            }
        }
        let fetch =
            json_fetcher::<Vec<T>>(self.source.clone(), format!("{PREFIX}/{catalog}"), params);
        let client = self.client.clone();
        let policy = self.policy.clone();
        async move { client.fetch(&key, fetch, &policy).await }.boxed()
    }
}

impl std::fmt::Debug for MasterData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterData")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_catalogs() {
        let meta: MetaPresupuestal = serde_json::from_value(serde_json::json!({
            "id": 1, "codigo": "0012", "descripcion": "Gestión", "ueId": 3
        }))
        .unwrap();
        assert_eq!(meta.ue_id, 3);

        let proveedor: Proveedor = serde_json::from_value(serde_json::json!({
            "id": 5, "ruc": "20123456789", "razonSocial": "Servicios SAC", "tipo": "JURIDICA"
        }))
        .unwrap();
        assert_eq!(proveedor.razon_social, "Servicios SAC");
    }
}
