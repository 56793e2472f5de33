mod oxigraph_backend;

use std::time::Duration;

use async_trait::async_trait;
pub use oxigraph_backend::OxigraphBackend;

use crate::error::Result;

/// Trait for triple store backends
///
/// Implementations provide the low-level SPARQL execution against a concrete
/// store. An `update` request may carry several operations separated by `;`
/// and must be applied atomically: either every operation takes effect or none.
#[async_trait]
pub trait TripleStoreBackend: Send + Sync {
    /// Backend name for logging/debugging
    fn name(&self) -> &'static str;

    /// Health check - verify the triple store is usable
    async fn health_check(&self) -> Result<bool>;

    /// Execute a SPARQL UPDATE request (one or more operations, atomically)
    async fn update(&self, query: &str) -> Result<()>;

    /// Execute a SPARQL CONSTRUCT query
    ///
    /// Returns N-Triples lines
    async fn construct(&self, query: &str, timeout: Duration) -> Result<String>;

    /// Execute a SPARQL ASK query
    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool>;

    /// Execute a SPARQL SELECT query
    ///
    /// Returns SPARQL results JSON as a string
    async fn select(&self, query: &str, timeout: Duration) -> Result<String>;
}
