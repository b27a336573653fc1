//! Cache-addressable query identities.

use std::fmt;

use crate::filter::FilterState;

/// Server-side page selection carried by table queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRequest {
    /// 1-based page number, as the API expects it.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Create a page request. `page` is clamped to at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size,
        }
    }
}

/// The identity of one cached remote read.
///
/// Two keys are equal exactly when namespace, operation, canonical filter
/// snapshot and page selection are equal. The filter snapshot is serialized
/// at construction time, so later edits to a [`FilterState`] never change an
/// existing key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    namespace: String,
    operation: String,
    filters: String,
    page: Option<PageRequest>,
}

impl QueryKey {
    /// A key without filters or paging.
    pub fn new(namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            operation: operation.into(),
            filters: "{}".to_string(),
            page: None,
        }
    }

    /// Attach the canonical form of a filter snapshot.
    #[must_use]
    pub fn with_filters(mut self, filters: &FilterState) -> Self {
        self.filters = filters.canonical();
        self
    }

    /// Attach a server-side page selection.
    #[must_use]
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// The module namespace, e.g. `contratos-menores`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The operation within the namespace, e.g. `kpis`.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// The canonical filter snapshot.
    pub fn filters(&self) -> &str {
        &self.filters
    }

    /// The page selection, if any.
    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} {}", self.namespace, self.operation, self.filters)?;
        if let Some(page) = self.page {
            write!(f, " p{}x{}", page.page, page.page_size)?;
        }
        Ok(())
    }
}

/// Which cache entries an invalidation or removal applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InvalidationTarget {
    /// Exactly one key.
    Exact(QueryKey),
    /// Every key in a namespace.
    Namespace(String),
    /// Every key of one operation in a namespace, whatever its filters.
    Operation {
        /// Namespace of the keys.
        namespace: String,
        /// Operation of the keys.
        operation: String,
    },
}

impl InvalidationTarget {
    /// Target every key in `namespace`.
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self::Namespace(namespace.into())
    }

    /// Target every key of `operation` in `namespace`.
    pub fn operation(namespace: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Operation {
            namespace: namespace.into(),
            operation: operation.into(),
        }
    }

    /// Whether `key` falls under this target.
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Namespace(namespace) => key.namespace == *namespace,
            Self::Operation {
                namespace,
                operation,
            } => key.namespace == *namespace && key.operation == *operation,
        }
    }
}

impl From<QueryKey> for InvalidationTarget {
    fn from(key: QueryKey) -> Self {
        Self::Exact(key)
    }
}

impl fmt::Display for InvalidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(key) => write!(f, "{key}"),
            Self::Namespace(namespace) => write!(f, "{namespace}/*"),
            Self::Operation {
                namespace,
                operation,
            } => write!(f, "{namespace}/{operation} *"),
        }
    }
}
