//! panel-core: Shared infrastructure for the restaurant admin panel services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
