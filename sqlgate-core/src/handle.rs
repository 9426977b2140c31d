//! Opaque handle generation.
//!
//! Handles are RFC-4122 v4 UUIDs rendered as strings. They identify registry
//! entries and are the only thing callers ever hold; the registries never
//! hand out their underlying objects by any other name.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GatewayError, Result};

/// Opaque unique string identifier referencing a registry entry.
///
/// Never mutated after creation. Uniqueness comes from 128 random bits; the
/// registries do not re-check for collisions against existing keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Generate a fresh handle from the OS randomness source.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Generation`] if the randomness source fails.
    /// Callers propagate this as a request failure; it is never retried.
    pub fn generate() -> Result<Handle> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| GatewayError::Generation(e.to_string()))?;

        let id = uuid::Builder::from_random_bytes(bytes).into_uuid();
        Ok(Handle(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Handle(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Handle(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_handles_are_valid_v4_uuids() {
        let handle = Handle::generate().unwrap();
        let parsed = Uuid::parse_str(handle.as_str()).expect("handle is not a UUID");
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn generated_handles_are_distinct() {
        let a = Handle::generate().unwrap();
        let b = Handle::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn handles_round_trip_through_json() {
        let handle = Handle::generate().unwrap();
        let json = serde_json::to_string(&handle).unwrap();
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(handle, back);
    }
}
