//! sqlgate-server: HTTP surface for the sqlgate registry.
//!
//! Provides the sqlx Postgres implementation of the core driver traits and
//! the axum routing layer that renders core errors as HTTP responses.

pub mod db;
pub mod http;

pub use db::postgres::PostgresDriver;
pub use http::server::{run_server, AppState, ServerConfig, ServerError};
