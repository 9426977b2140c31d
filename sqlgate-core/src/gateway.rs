//! The execution engine: resolves handles, runs queries, owns the two
//! registries for the life of the process.

use std::sync::Arc;

use crate::driver::SqlDriver;
use crate::error::{GatewayError, Result};
use crate::handle::Handle;
use crate::registry::{ConnectionRegistry, QueryRegistry, SavedQuery};
use crate::value::RecordSet;

/// Process-lifetime facade over the connection registry, the query registry,
/// and the driver. One instance is shared by every request task.
pub struct Gateway {
    driver: Arc<dyn SqlDriver>,
    connections: ConnectionRegistry,
    queries: QueryRegistry,
}

impl Gateway {
    pub fn new(driver: Arc<dyn SqlDriver>) -> Self {
        Self {
            driver,
            connections: ConnectionRegistry::new(),
            queries: QueryRegistry::new(),
        }
    }

    /// Open a connection and register it under a fresh handle.
    ///
    /// On any failure (driver connect, handle generation) nothing is stored.
    pub async fn open(&self, kind: &str, conn_str: &str) -> Result<Handle> {
        let conn = self.driver.connect(kind, conn_str).await?;
        let handle = Handle::generate()?;
        self.connections.insert(handle.clone(), conn).await;

        tracing::info!(%handle, driver = kind, "connection registered");
        Ok(handle)
    }

    /// Execute query text against a registered connection.
    ///
    /// The text is submitted to the driver verbatim; arbitrary SQL including
    /// DDL/DML is permitted, and injection protection is the caller's
    /// responsibility. Driver failures propagate with the driver's message;
    /// nothing is retried.
    pub async fn execute(&self, handle: &Handle, sql: &str) -> Result<RecordSet> {
        let conn = self
            .connections
            .lookup(handle)
            .await
            .ok_or(GatewayError::NotFound)?;

        let output = conn.query(sql).await?;
        tracing::debug!(%handle, rows = output.rows.len(), "query executed");

        Ok(RecordSet::from_output(output))
    }

    /// Store a (connection handle, query text) pair under a fresh handle.
    ///
    /// The connection handle is not validated against the connection
    /// registry; a dangling reference surfaces as `NotFound` at replay.
    pub async fn save_query(&self, connection: Handle, text: impl Into<String>) -> Result<Handle> {
        let handle = Handle::generate()?;
        let saved = SavedQuery {
            connection,
            text: text.into(),
        };
        self.queries.insert(handle.clone(), saved).await;

        tracing::info!(%handle, "query saved");
        Ok(handle)
    }

    /// Look up a saved query by its handle.
    pub async fn resolve_query(&self, handle: &Handle) -> Result<SavedQuery> {
        self.queries
            .lookup(handle)
            .await
            .ok_or(GatewayError::NotFound)
    }

    /// Replay a saved query: resolve the pair, then delegate to
    /// [`execute`](Gateway::execute). `NotFound` from either lookup
    /// propagates unchanged.
    pub async fn execute_saved(&self, handle: &Handle) -> Result<RecordSet> {
        let saved = self.resolve_query(handle).await?;
        self.execute(&saved.connection, &saved.text).await
    }

    /// Close every registered connection. The only point at which
    /// connection entries die; called once when the process shuts down.
    pub async fn shutdown(&self) {
        let drained = self.connections.drain().await;
        let count = drained.len();
        for conn in drained {
            conn.close().await;
        }
        tracing::info!(connections = count, "registry shut down");
    }

    /// Number of live connection entries. Exposed for observability.
    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::driver::{QueryOutput, SqlConnection};
    use crate::value::Value;

    /// Driver that hands out connections answering every query with a fixed
    /// two-row result, and counts closes.
    struct FixedDriver {
        fail_connect: bool,
        closed: Arc<AtomicUsize>,
    }

    impl FixedDriver {
        fn new() -> Self {
            Self {
                fail_connect: false,
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                fail_connect: true,
                closed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    struct FixedConnection {
        closed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SqlDriver for FixedDriver {
        async fn connect(&self, kind: &str, _conn_str: &str) -> Result<Arc<dyn SqlConnection>> {
            if self.fail_connect {
                return Err(GatewayError::connection(format!(
                    "no listener for driver {kind}"
                )));
            }
            Ok(Arc::new(FixedConnection {
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    #[async_trait]
    impl SqlConnection for FixedConnection {
        async fn query(&self, sql: &str) -> Result<QueryOutput> {
            if sql.contains("BROKEN") {
                return Err(GatewayError::execution("syntax error near BROKEN"));
            }
            Ok(QueryOutput {
                columns: vec!["id".to_string(), "name".to_string()],
                rows: vec![
                    vec![Value::Int(1), Value::from("a")],
                    vec![Value::Int(2), Value::from("b")],
                ],
            })
        }

        async fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gateway() -> Gateway {
        Gateway::new(Arc::new(FixedDriver::new()))
    }

    #[tokio::test]
    async fn open_then_execute_returns_records() {
        let gw = gateway();
        let handle = gw.open("postgres", "postgres://localhost/t").await.unwrap();

        let set = gw.execute(&handle, "SELECT id, name FROM t").await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.records()[0]["id"], Value::Int(1));
        assert_eq!(set.records()[1]["name"], Value::from("b"));
    }

    #[tokio::test]
    async fn execute_with_unknown_handle_is_not_found() {
        let gw = gateway();
        let err = gw
            .execute(&Handle::from("bogus-handle"), "SELECT 1")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
        assert_eq!(err.to_string(), "key does not exist");
    }

    #[tokio::test]
    async fn failed_connect_stores_nothing() {
        let gw = Gateway::new(Arc::new(FixedDriver::failing()));
        let err = gw.open("postgres", "postgres://nowhere/x").await.unwrap_err();

        assert!(matches!(err, GatewayError::Connection(_)));
        assert_eq!(gw.connection_count().await, 0);
    }

    #[tokio::test]
    async fn driver_failure_propagates_as_execution_error() {
        let gw = gateway();
        let handle = gw.open("postgres", "postgres://localhost/t").await.unwrap();

        let err = gw.execute(&handle, "BROKEN").await.unwrap_err();
        assert!(matches!(err, GatewayError::Execution(_)));
        assert!(err.to_string().contains("syntax error"));
    }

    #[tokio::test]
    async fn save_then_resolve_is_byte_for_byte() {
        let gw = gateway();
        let conn = gw.open("postgres", "postgres://localhost/t").await.unwrap();

        let qhandle = gw
            .save_query(conn.clone(), "SELECT 1 AS x FROM dual")
            .await
            .unwrap();
        let saved = gw.resolve_query(&qhandle).await.unwrap();

        assert_eq!(saved.connection, conn);
        assert_eq!(saved.text, "SELECT 1 AS x FROM dual");
    }

    #[tokio::test]
    async fn replay_matches_direct_execution() {
        let gw = gateway();
        let conn = gw.open("postgres", "postgres://localhost/t").await.unwrap();

        let direct = gw.execute(&conn, "SELECT id, name FROM t").await.unwrap();
        let qhandle = gw
            .save_query(conn.clone(), "SELECT id, name FROM t")
            .await
            .unwrap();

        let first = gw.execute_saved(&qhandle).await.unwrap();
        let second = gw.execute_saved(&qhandle).await.unwrap();

        assert_eq!(first, direct);
        // Unchanged source, unchanged result.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn replay_of_unknown_query_handle_is_not_found() {
        let gw = gateway();
        let err = gw.execute_saved(&Handle::from("bogus")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn save_accepts_dangling_connection_handle() {
        let gw = gateway();

        // No foreign-key check at save time.
        let qhandle = gw
            .save_query(Handle::from("never-opened"), "SELECT 1")
            .await
            .unwrap();

        // The failure surfaces lazily, at replay.
        let err = gw.execute_saved(&qhandle).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn concurrent_opens_yield_distinct_live_handles() {
        let gw = Arc::new(gateway());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let gw = Arc::clone(&gw);
                tokio::spawn(async move { gw.open("postgres", "postgres://localhost/t").await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        let mut deduped = handles.clone();
        deduped.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        deduped.dedup();
        assert_eq!(deduped.len(), 32);

        assert_eq!(gw.connection_count().await, 32);
        for handle in &handles {
            assert!(gw.execute(handle, "SELECT 1").await.is_ok());
        }
    }

    #[tokio::test]
    async fn shutdown_closes_every_connection() {
        let driver = FixedDriver::new();
        let closed = Arc::clone(&driver.closed);
        let gw = Gateway::new(Arc::new(driver));

        for _ in 0..5 {
            gw.open("postgres", "postgres://localhost/t").await.unwrap();
        }

        gw.shutdown().await;
        assert_eq!(closed.load(Ordering::SeqCst), 5);
        assert_eq!(gw.connection_count().await, 0);
    }
}
