use serde::{Deserialize, Serialize};

/// Subdirectory under the data path that holds the persistent store.
pub const VGRAPH_REPOSITORY: &str = "vgraph";

/// Backend type for the triple store
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TripleStoreBackendType {
    /// Embedded oxigraph store persisted under the data path
    Oxigraph,
    /// Embedded oxigraph store kept in memory (lost on exit)
    Memory,
}

/// Configuration for the Triple Store Manager
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TripleStoreManagerConfig {
    /// Backend type to use.
    pub backend: TripleStoreBackendType,

    /// Timeout configuration for different operation types
    pub timeouts: TimeoutConfig,

    /// Maximum concurrent operations.
    /// Limits how many triple store operations can run simultaneously.
    pub max_concurrent_operations: usize,
}

/// Timeout configuration for different SPARQL operations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Timeout for CONSTRUCT/SELECT queries in milliseconds
    pub query_ms: u64,

    /// Time budget for INSERT/UPDATE operations in milliseconds. Not a
    /// deadline: an update that overruns it still completes and is only
    /// logged as slow.
    ///
    /// The embedded store commits in place, so abandoning a submitted update
    /// could let it land after the caller saw a failure.
    pub insert_ms: u64,

    /// Timeout for ASK queries in milliseconds
    pub ask_ms: u64,
}

impl TimeoutConfig {
    /// Get query timeout as Duration
    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.query_ms)
    }

    /// Get insert timeout as Duration
    pub fn insert_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.insert_ms)
    }

    /// Get ask timeout as Duration
    pub fn ask_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ask_ms)
    }
}

impl Default for TripleStoreManagerConfig {
    fn default() -> Self {
        Self {
            backend: TripleStoreBackendType::Oxigraph,
            timeouts: TimeoutConfig {
                query_ms: 30_000,
                insert_ms: 300_000,
                ask_ms: 10_000,
            },
            max_concurrent_operations: 16,
        }
    }
}
