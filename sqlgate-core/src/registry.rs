//! Handle-keyed registries for connections and saved queries.
//!
//! Both maps are mutated and read from arbitrarily many concurrent request
//! tasks, so each is guarded by an `RwLock` and exposes only insert/lookup.
//! The raw maps are never handed out.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::driver::SqlConnection;
use crate::handle::Handle;

/// Maps a handle to a live connection object and owns its lifetime.
///
/// Entries live until [`drain`](ConnectionRegistry::drain) at process
/// shutdown; there is no per-entry close. A present handle is assumed
/// reusable for the process lifetime — a dead remote database only shows up
/// when a query against it fails.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: RwLock<HashMap<Handle, Arc<dyn SqlConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: Handle, conn: Arc<dyn SqlConnection>) {
        self.entries.write().await.insert(handle, conn);
    }

    pub async fn lookup(&self, handle: &Handle) -> Option<Arc<dyn SqlConnection>> {
        self.entries.read().await.get(handle).cloned()
    }

    /// Remove and return every registered connection, for shutdown cleanup.
    pub async fn drain(&self) -> Vec<Arc<dyn SqlConnection>> {
        self.entries.write().await.drain().map(|(_, c)| c).collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// A stored (connection handle, query text) pair, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedQuery {
    pub connection: Handle,
    pub text: String,
}

/// Maps a query handle to a saved query for later replay.
///
/// Insertion does not check the connection handle against the connection
/// registry; a dangling reference fails lazily at replay time.
#[derive(Default)]
pub struct QueryRegistry {
    entries: RwLock<HashMap<Handle, SavedQuery>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: Handle, saved: SavedQuery) {
        self.entries.write().await.insert(handle, saved);
    }

    pub async fn lookup(&self, handle: &Handle) -> Option<SavedQuery> {
        self.entries.read().await.get(handle).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
