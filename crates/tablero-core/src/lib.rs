//! Core primitives for Tablero.
//!
//! This crate provides the small reactive toolkit the dashboard layer is
//! built on:
//!
//! - **Signal/Slot System**: Type-safe change notification ([`Signal`])
//! - **Property System**: Values with change detection ([`Property`])
//! - **Logging**: `tracing` target names for every Tablero subsystem
//!
//! # Example
//!
//! ```
//! use tablero_core::{Property, Signal};
//!
//! struct Selection {
//!     year: Property<u16>,
//!     year_changed: Signal<u16>,
//! }
//!
//! impl Selection {
//!     fn select(&self, year: u16) {
//!         if self.year.set(year) {
//!             self.year_changed.emit(year);
//!         }
//!     }
//! }
//!
//! let selection = Selection {
//!     year: Property::new(2026),
//!     year_changed: Signal::new(),
//! };
//! selection.year_changed.connect(|year| println!("year is now {year}"));
//! selection.select(2025);
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
