//! Database driver implementations.
//!
//! One driver ships today: Postgres over sqlx, pool-backed so a single
//! connection handle is safe for concurrent use.

pub mod postgres;

pub use postgres::PostgresDriver;
