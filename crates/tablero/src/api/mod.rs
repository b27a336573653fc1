//! Remote data access: sources, parameter mapping and response envelopes.

mod params;
mod source;

use serde::{Deserialize, Serialize};

pub use params::{ParamKind, ParamSpec, QueryParams};
pub use source::{ApiSource, DataSource, decode, get_json, json_fetcher, post_json, put_json};

/// A page of a server-side paginated listing.
///
/// The field names are part of the API contract; a response using other
/// names fails to decode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Rows of this page.
    pub rows: Vec<T>,
    /// Total rows across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl<T> Page<T> {
    /// An empty first page.
    pub fn empty(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            page: 1,
            page_size,
        }
    }

    /// Number of server pages, at least 1.
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.page_size)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn test_page_decodes_contract_fields() {
        let value = serde_json::json!({
            "rows": [{"id": 1}, {"id": 2}],
            "total": 41,
            "page": 1,
            "page_size": 20
        });
        let page: Page<Row> = decode("/presupuesto/tabla", value).unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.page_count(), 3);
    }

    #[test]
    fn test_alternate_field_names_are_contract_violations() {
        let value = serde_json::json!({
            "items": [],
            "total": 0,
            "page": 1,
            "pageSize": 20
        });
        let err = decode::<Page<Row>>("/presupuesto/tabla", value).unwrap_err();
        assert!(matches!(err, QueryError::Contract(msg) if msg.contains("/presupuesto/tabla")));
    }

    #[test]
    fn test_empty_page() {
        let page: Page<Row> = Page::empty(20);
        assert_eq!(page.page_count(), 1);
    }
}
