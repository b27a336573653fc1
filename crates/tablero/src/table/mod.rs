//! Generic table rendering: stable sorting, pagination and page windows.
//!
//! A [`TableEngine`] holds one row set and a list of [`Column`] descriptors.
//! It performs no I/O; controllers feed it the rows of the current server
//! page.

mod cell;
mod column;
mod engine;

pub use cell::CellValue;
pub use column::{Accessor, CellFormatter, Column};
pub use engine::{
    DEFAULT_PAGE_SIZE, PAGE_WINDOW, PageInfo, RenderedPage, SortDirection, SortSpec, TableEngine,
};
