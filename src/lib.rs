//! Contribtrack: multi-tenant contribution tracking REST backend.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod report;
pub mod response;
pub mod routes;
pub mod sql;
pub mod state;
pub mod store;
pub mod tenant;
pub mod validation;

pub use config::Config;
pub use error::AppError;
pub use report::{build_print_html, FieldSelection, ReportContext};
pub use routes::app;
pub use state::{AppState, DegradedMode};
pub use store::ensure_schema;
pub use tenant::ResolvedTenant;
