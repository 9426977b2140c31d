//! Structured error types for sqlgate-core.
//!
//! Uses `thiserror` so library consumers get composable errors; the binary
//! crate can still wrap these in `anyhow` for reporting.

use thiserror::Error;

/// Main error type for registry and execution operations.
///
/// Every variant is local to a single request: a failed operation never
/// leaves a partial entry in either registry. None of these are retried by
/// the core; retry policy belongs to the caller.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Failed to establish a connection (bad credentials, unreachable host,
    /// malformed connection string, unsupported driver kind).
    #[error("connection failed: {0}")]
    Connection(String),

    /// Handle not present in the relevant registry.
    #[error("key does not exist")]
    NotFound,

    /// Driver-level failure while running a query (syntax error, runtime
    /// error, connectivity loss). Carries the driver's message.
    #[error("query execution failed: {0}")]
    Execution(String),

    /// Handle generation failed (randomness source exhausted). Fatal to the
    /// request, not to the process.
    #[error("handle generation failed: {0}")]
    Generation(String),
}

/// Result type alias for sqlgate-core operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    /// Create a connection error from a driver message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create an execution error from a driver message.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}
