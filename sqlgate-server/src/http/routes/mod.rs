//! Route modules, one per resource.

pub mod connections;
pub mod health;
pub mod queries;
