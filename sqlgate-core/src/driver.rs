//! Driver seam: the opaque "execute SQL, return columns and rows" capability.
//!
//! The core never talks to a database directly. It resolves a registered
//! [`SqlConnection`] and hands it query text verbatim; everything about wire
//! protocols, cursors, and type decoding lives behind these traits.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::value::Value;

/// Raw result of a driver-level query: a column list plus rows of cells
/// aligned with that list.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Factory for live connections.
#[async_trait]
pub trait SqlDriver: Send + Sync {
    /// Establish a connection for the given driver kind and connection
    /// string. On failure, return [`crate::GatewayError::Connection`] with
    /// the underlying driver's message; nothing may be left half-open.
    async fn connect(&self, kind: &str, conn_str: &str) -> Result<Arc<dyn SqlConnection>>;
}

/// A live, driver-managed channel to a SQL data source.
///
/// One connection object may be queried by many concurrent callers; the core
/// never serializes access. Implementations must either be safe for
/// concurrent use (e.g. pool-backed) or document that they are not.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// Run `sql` verbatim and drain the cursor to completion.
    ///
    /// The cursor must be released on every exit path, including
    /// mid-iteration decode failure. Errors carry the driver's message via
    /// [`crate::GatewayError::Execution`].
    async fn query(&self, sql: &str) -> Result<QueryOutput>;

    /// Close the underlying native resource. Called once, at shutdown.
    async fn close(&self);
}
