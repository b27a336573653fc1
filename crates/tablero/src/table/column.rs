//! Column descriptors.

use std::sync::Arc;

use super::cell::CellValue;

/// Extracts the cell value of one column from a row.
pub type Accessor<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;

/// Turns a cell value into display text.
pub type CellFormatter = Arc<dyn Fn(&CellValue) -> String + Send + Sync>;

/// Describes one column of a [`TableEngine`](super::TableEngine).
///
/// # Example
///
/// ```ignore
/// let columns = vec![
///     Column::new("codigo", "Código", |r: &ContratoMenorRow| r.codigo.clone().into()),
///     Column::new("monto", "Monto", |r: &ContratoMenorRow| r.monto.into())
///         .with_formatter(|v| v.as_f64().map(format_monto).unwrap_or_default()),
///     Column::new("acciones", "", |_| CellValue::Null).unsortable(),
/// ];
/// ```
pub struct Column<R> {
    id: String,
    label: String,
    accessor: Accessor<R>,
    sortable: bool,
    formatter: Option<CellFormatter>,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            accessor: self.accessor.clone(),
            sortable: self.sortable,
            formatter: self.formatter.clone(),
        }
    }
}

impl<R> Column<R> {
    /// A sortable column.
    pub fn new<F>(id: impl Into<String>, label: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            label: label.into(),
            accessor: Arc::new(accessor),
            sortable: true,
            formatter: None,
        }
    }

    /// Exclude this column from sorting.
    #[must_use]
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Format cells with `formatter` instead of their plain text.
    #[must_use]
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&CellValue) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Stable identifier used by sort requests.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header text.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the column accepts sort requests.
    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    /// The cell value of this column for `row`.
    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    /// The display text of this column for `row`.
    pub fn display(&self, row: &R) -> String {
        let value = self.value(row);
        match &self.formatter {
            Some(formatter) => formatter(&value),
            None => value.to_string(),
        }
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("formatted", &self.formatter.is_some())
            .finish()
    }
}
