//! Logging facilities for Tablero.
//!
//! Tablero uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tablero::query=debug,tablero_net=warn")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "tablero_core::signal";
    /// HTTP transport target.
    pub const HTTP: &str = "tablero_net::http";
    /// REST client target.
    pub const REST_API: &str = "tablero_net::rest_api";
    /// Filter state target.
    pub const FILTER: &str = "tablero::filter";
    /// Query cache and fetch orchestration target.
    pub const QUERY: &str = "tablero::query";
    /// Table engine target.
    pub const TABLE: &str = "tablero::table";
    /// Dashboard controllers target.
    pub const DASHBOARD: &str = "tablero::dashboard";
    /// Remote API mapping target.
    pub const API: &str = "tablero::api";
    /// Configuration loading target.
    pub const CONFIG: &str = "tablero::config";
}
