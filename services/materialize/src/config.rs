//! Environment-driven configuration for the materialize binary.

use serde::{Deserialize, Serialize};

/// Runtime settings, each overridable through a `MATERIALIZE_*` variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeConfig {
    /// Topic to consume encoded snapshots from.
    pub topic: String,
    /// Consumer group whose committed offsets this instance resumes from.
    pub group: String,
    /// Time-series engine address.
    pub store_addr: String,
    /// Key prefix for the materialized snapshot set and stream.
    pub key_prefix: String,
}

impl Default for MaterializeConfig {
    fn default() -> Self {
        Self {
            topic: "ticks".to_string(),
            group: "materialize".to_string(),
            store_addr: "localhost:6379".to_string(),
            key_prefix: "ticks".to_string(),
        }
    }
}

impl MaterializeConfig {
    /// Defaults overridden by whatever `MATERIALIZE_*` variables are set.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            topic: env_string("MATERIALIZE_TOPIC", defaults.topic),
            group: env_string("MATERIALIZE_GROUP", defaults.group),
            store_addr: env_string("MATERIALIZE_STORE_ADDR", defaults.store_addr),
            key_prefix: env_string("MATERIALIZE_KEY_PREFIX", defaults.key_prefix),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => default,
    }
}
