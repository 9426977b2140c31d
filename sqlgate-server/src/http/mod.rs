//! HTTP layer: routes, error rendering, server setup.

pub mod error;
pub mod routes;
pub mod server;
