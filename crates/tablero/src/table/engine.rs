//! Sorting and pagination over an in-memory row set.

use std::cmp::Ordering;

use tablero_core::Signal;
use tablero_core::logging::targets;

use super::cell::CellValue;
use super::column::Column;

/// Rows per page when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of page buttons in [`TableEngine::page_window`].
pub const PAGE_WINDOW: usize = 5;

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// The active sort of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    /// Id of the sorted column.
    pub column: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Ascending sort on `column`.
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `column`.
    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Bounds of the visible page, for "showing X to Y of Z" captions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Current page, 0-based.
    pub page: usize,
    /// Number of pages, at least 1.
    pub page_count: usize,
    /// 1-based position of the first visible row, 0 when there are no rows.
    pub start: usize,
    /// 1-based position of the last visible row, 0 when there are no rows.
    pub end: usize,
    /// Total number of rows.
    pub total: usize,
    /// Whether [`TableEngine::previous`] would move.
    pub can_previous: bool,
    /// Whether [`TableEngine::next`] would move.
    pub can_next: bool,
}

/// Text produced by [`TableEngine::render_page`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    /// Column labels, with a sort indicator on sortable columns.
    pub headers: Vec<String>,
    /// Formatted cells of the visible rows.
    pub rows: Vec<Vec<String>>,
    /// Page bounds.
    pub info: PageInfo,
    /// Page numbers to offer as buttons, 0-based.
    pub window: Vec<usize>,
}

/// A sorted, paginated view over a row set.
///
/// Sorting never reorders the rows themselves: the engine keeps an index
/// mapping rebuilt from source order on every change, so the same sort
/// request always yields the same order. The page index stays within
/// `[0, page_count)` through every operation.
pub struct TableEngine<R> {
    rows: Vec<R>,
    columns: Vec<Column<R>>,
    sort: Option<SortSpec>,
    mapping: Vec<usize>,
    page: usize,
    page_size: usize,
    /// Emitted with the new page index when the page changes.
    pub page_changed: Signal<usize>,
    /// Emitted with the new sort when it changes.
    pub sort_changed: Signal<Option<SortSpec>>,
}

impl<R> TableEngine<R> {
    /// Create an unsorted engine on the first page.
    pub fn new(rows: Vec<R>, columns: Vec<Column<R>>) -> Self {
        let mut engine = Self {
            rows,
            columns,
            sort: None,
            mapping: Vec::new(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            page_changed: Signal::new(),
            sort_changed: Signal::new(),
        };
        engine.rebuild_mapping();
        engine
    }

    /// Builder-style [`set_page_size`](Self::set_page_size).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.set_page_size(page_size);
        self
    }

    /// The rows in source order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// The column descriptors.
    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Replace the rows, keeping sort and clamping the page.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        self.rebuild_mapping();
        self.clamp_page();
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Change the page size (at least 1) and clamp the page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_page();
    }

    /// The active sort.
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Replace the sort.
    ///
    /// A sort on an unknown or unsortable column is ignored. An effective
    /// change goes back to the first page. Returns whether the sort changed.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> bool {
        if let Some(spec) = &sort
            && !self.column(&spec.column).is_some_and(Column::is_sortable)
        {
            tracing::debug!(target: targets::TABLE, column = %spec.column, "ignoring sort on unsortable column");
            return false;
        }
        if self.sort == sort {
            return false;
        }
        self.sort = sort;
        self.rebuild_mapping();
        self.set_page(0);
        self.sort_changed.emit(self.sort.clone());
        true
    }

    /// Sort by `column` in `direction`.
    pub fn sort_by(&mut self, column: &str, direction: SortDirection) -> bool {
        self.set_sort(Some(SortSpec {
            column: column.to_string(),
            direction,
        }))
    }

    /// Back to source order.
    pub fn clear_sort(&mut self) -> bool {
        self.set_sort(None)
    }

    /// Cycle the sort of `column`: ascending, descending, unsorted.
    pub fn toggle_sort(&mut self, column: &str) -> bool {
        let next = match &self.sort {
            Some(spec) if spec.column == column => match spec.direction {
                SortDirection::Ascending => Some(SortSpec::descending(column)),
                SortDirection::Descending => None,
            },
            _ => Some(SortSpec::ascending(column)),
        };
        if next.is_none() && !self.column(column).is_some_and(Column::is_sortable) {
            return false;
        }
        self.set_sort(next)
    }

    /// All rows in display order.
    pub fn sorted_rows(&self) -> impl Iterator<Item = &R> {
        self.mapping.iter().map(|&i| &self.rows[i])
    }

    /// Current page, 0-based.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages. An empty table still has one (empty) page.
    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    /// The rows of the current page, in display order.
    pub fn page_rows(&self) -> Vec<&R> {
        let start = self.page * self.page_size;
        self.mapping
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.rows[i])
            .collect()
    }

    /// Go to the next page. Returns `false` on the last page.
    pub fn next(&mut self) -> bool {
        if self.page + 1 < self.page_count() {
            self.set_page(self.page + 1);
            true
        } else {
            false
        }
    }

    /// Go to the previous page. Returns `false` on the first page.
    pub fn previous(&mut self) -> bool {
        if self.page > 0 {
            self.set_page(self.page - 1);
            true
        } else {
            false
        }
    }

    /// Go to page `page` (0-based). Returns `false`, staying put, when it
    /// does not exist.
    pub fn go_to(&mut self, page: usize) -> bool {
        if page >= self.page_count() {
            return false;
        }
        self.set_page(page);
        true
    }

    /// Up to [`PAGE_WINDOW`] page numbers around the current page.
    pub fn page_window(&self) -> Vec<usize> {
        let count = self.page_count();
        let start = self.page.saturating_sub(PAGE_WINDOW / 2);
        let end = (start + PAGE_WINDOW).min(count);
        let start = end.saturating_sub(PAGE_WINDOW);
        (start..end).collect()
    }

    /// Bounds of the visible page.
    pub fn page_info(&self) -> PageInfo {
        let total = self.rows.len();
        let first = self.page * self.page_size;
        let (start, end) = if total == 0 {
            (0, 0)
        } else {
            (first + 1, (first + self.page_size).min(total))
        };
        PageInfo {
            page: self.page,
            page_count: self.page_count(),
            start,
            end,
            total,
            can_previous: self.page > 0,
            can_next: self.page + 1 < self.page_count(),
        }
    }

    /// Headers and formatted cells of the current page.
    pub fn render_page(&self) -> RenderedPage {
        let headers = self
            .columns
            .iter()
            .map(|column| {
                if !column.is_sortable() {
                    return column.label().to_string();
                }
                let indicator = match &self.sort {
                    Some(spec) if spec.column == column.id() => match spec.direction {
                        SortDirection::Ascending => '↑',
                        SortDirection::Descending => '↓',
                    },
                    _ => '↕',
                };
                format!("{} {indicator}", column.label())
            })
            .collect();

        let rows = self
            .page_rows()
            .into_iter()
            .map(|row| self.columns.iter().map(|c| c.display(row)).collect())
            .collect();

        RenderedPage {
            headers,
            rows,
            info: self.page_info(),
            window: self.page_window(),
        }
    }

    fn column(&self, id: &str) -> Option<&Column<R>> {
        self.columns.iter().find(|c| c.id() == id)
    }

    fn set_page(&mut self, page: usize) {
        if self.page != page {
            self.page = page;
            self.page_changed.emit(page);
        }
    }

    fn clamp_page(&mut self) {
        let last = self.page_count() - 1;
        if self.page > last {
            self.set_page(last);
        }
    }

    fn rebuild_mapping(&mut self) {
        let mut mapping: Vec<usize> = (0..self.rows.len()).collect();

        if let Some(spec) = &self.sort
            && let Some(column) = self.column(&spec.column)
        {
            let keys: Vec<CellValue> = self.rows.iter().map(|row| column.value(row)).collect();
            let direction = spec.direction;
            // `sort_by` is stable, so ties keep source order.
            mapping.sort_by(|&a, &b| compare_cells(&keys[a], &keys[b], direction));
        }

        self.mapping = mapping;
    }
}

/// Compare two cells for display order. Nulls go last in both directions.
fn compare_cells(a: &CellValue, b: &CellValue, direction: SortDirection) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let ordering = a.compare(b);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        }
    }
}

impl<R> std::fmt::Debug for TableEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableEngine")
            .field("rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .finish()
    }
}
