//! sqlx Postgres implementation of the core driver traits.
//!
//! Each registered connection is backed by a small `PgPool`, which makes one
//! handle safe for concurrent `execute` calls and guarantees cursor release
//! on every exit path of `fetch_all`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::{PgColumn, PgPoolOptions, PgRow};
use sqlx::{Column, PgPool, Row, TypeInfo};

use sqlgate_core::{GatewayError, QueryOutput, Result, SqlConnection, SqlDriver, Value};

/// Maximum connections per registered pool. Kept low; every `open` call
/// creates its own pool and none is ever closed before shutdown.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Driver factory for Postgres data sources.
#[derive(Debug, Default)]
pub struct PostgresDriver;

impl PostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SqlDriver for PostgresDriver {
    async fn connect(&self, kind: &str, conn_str: &str) -> Result<Arc<dyn SqlConnection>> {
        if !matches!(kind, "postgres" | "postgresql") {
            return Err(GatewayError::connection(format!(
                "unsupported driver kind '{kind}'"
            )));
        }

        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(conn_str)
            .await
            .map_err(|e| GatewayError::connection(e.to_string()))?;

        Ok(Arc::new(PostgresConnection { pool }))
    }
}

/// A registered connection: a pool plus the decoding logic that turns
/// dynamically-typed rows into tagged values.
pub struct PostgresConnection {
    pool: PgPool,
}

#[async_trait]
impl SqlConnection for PostgresConnection {
    async fn query(&self, sql: &str) -> Result<QueryOutput> {
        let rows: Vec<PgRow> = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GatewayError::execution(e.to_string()))?;

        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(row.columns().len());
            for (i, column) in row.columns().iter().enumerate() {
                cells.push(decode_cell(row, i, column)?);
            }
            out.push(cells);
        }

        Ok(QueryOutput {
            columns,
            rows: out,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Decode one cell by its Postgres type name.
///
/// Best-effort passthrough: known scalar types map onto the tagged union,
/// temporal and UUID types render as text, and anything else falls back to a
/// string read, degrading to null when the type cannot be read at all.
fn decode_cell(row: &PgRow, index: usize, column: &PgColumn) -> Result<Value> {
    let type_name = column.type_info().name();

    let scan_err = |e: sqlx::Error| {
        GatewayError::execution(format!(
            "failed to read column '{}' ({}): {}",
            column.name(),
            type_name,
            e
        ))
    };

    let value = match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Int(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Int(v.into())),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, Value::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Float(v.into())),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, Value::Float),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
            .try_get::<Option<String>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, Value::Text),
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_string())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_string())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, Value::Bytes),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .map_err(scan_err)?
            .map_or(Value::Null, |v| Value::Text(v.to_string())),
        _ => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map_or(Value::Null, Value::Text),
            Err(e) => {
                tracing::warn!(
                    column = column.name(),
                    type_name,
                    error = %e,
                    "unreadable column type, substituting null"
                );
                Value::Null
            }
        },
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_driver_kind_is_a_connection_error() {
        let driver = PostgresDriver::new();
        let err = driver
            .connect("oci8", "user/pass@host/db")
            .await
            .err()
            .expect("oci8 should not resolve");

        assert!(matches!(err, GatewayError::Connection(_)));
        assert!(err.to_string().contains("oci8"));
    }

    // Integration tests require a real database.
    // Run with: DATABASE_URL=postgres://... cargo test -p sqlgate-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn connects_and_runs_a_scalar_query() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let driver = PostgresDriver::new();
        let conn = driver.connect("postgres", &url).await.expect("connect failed");

        let output = conn.query("SELECT 1 AS x").await.expect("query failed");
        assert_eq!(output.columns, vec!["x".to_string()]);
        assert_eq!(output.rows, vec![vec![Value::Int(1)]]);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn decodes_mixed_scalar_types() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let driver = PostgresDriver::new();
        let conn = driver.connect("postgres", &url).await.expect("connect failed");

        let output = conn
            .query("SELECT true AS b, 2::int8 AS n, 1.5::float8 AS f, 'hi' AS t, NULL::text AS z")
            .await
            .expect("query failed");

        assert_eq!(
            output.rows,
            vec![vec![
                Value::Bool(true),
                Value::Int(2),
                Value::Float(1.5),
                Value::Text("hi".to_string()),
                Value::Null,
            ]]
        );
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn syntax_errors_surface_the_driver_message() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let driver = PostgresDriver::new();
        let conn = driver.connect("postgres", &url).await.expect("connect failed");

        let err = conn.query("SELEKT 1").await.expect_err("bad SQL accepted");
        assert!(matches!(err, GatewayError::Execution(_)));
    }
}
