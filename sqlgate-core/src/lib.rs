//! sqlgate-core: ephemeral in-process registry and query execution engine.
//!
//! Callers register database connections and receive opaque handles, execute
//! arbitrary SQL against a registered connection, and save (connection, query)
//! pairs under their own handles for later replay. All state lives in process
//! memory; nothing survives a restart.

pub mod driver;
pub mod error;
pub mod gateway;
pub mod handle;
pub mod registry;
pub mod value;

pub use driver::{QueryOutput, SqlConnection, SqlDriver};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use handle::Handle;
pub use registry::{ConnectionRegistry, QueryRegistry, SavedQuery};
pub use value::{Record, RecordSet, Value};
