mod backend;
mod config;
pub mod error;
mod management;
mod metrics;
pub mod query;
pub mod rdf;
pub(crate) mod sparql;
mod statements;
mod transaction;

use std::{
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

pub use backend::{OxigraphBackend, TripleStoreBackend};
pub use config::{TimeoutConfig, TripleStoreBackendType, TripleStoreManagerConfig, VGRAPH_REPOSITORY};
use error::{Result, TripleStoreError};
pub use management::{ManagementGraph, ManagementRecord};
pub use oxigraph::io::RdfFormat;
pub use statements::StatementPattern;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
pub use transaction::StoreTransaction;

#[cfg(test)]
mod tests;

/// Triple Store Manager
///
/// Context-scoped statement store on top of a SPARQL backend. Reads go
/// straight to the backend; writes are buffered in a [`StoreTransaction`]
/// and applied as one atomic update on commit.
pub struct TripleStoreManager {
    pub(crate) backend: Box<dyn TripleStoreBackend>,
    pub(crate) config: TripleStoreManagerConfig,
    /// Semaphore for limiting concurrent operations
    concurrency_limiter: Arc<Semaphore>,
}

impl TripleStoreManager {
    /// Create a new Triple Store Manager
    ///
    /// # Arguments
    /// * `config` - Triple store configuration
    /// * `data_path` - Directory for persistent storage (ignored for the memory backend)
    pub async fn connect(config: &TripleStoreManagerConfig, data_path: &Path) -> Result<Self> {
        let backend: Box<dyn TripleStoreBackend> = match config.backend {
            TripleStoreBackendType::Memory => Box::new(OxigraphBackend::in_memory()?),
            TripleStoreBackendType::Oxigraph => {
                let store_path = data_path.join(VGRAPH_REPOSITORY);
                std::fs::create_dir_all(&store_path)?;
                Box::new(OxigraphBackend::open(store_path)?)
            }
        };

        let manager = Self::from_backend(backend, config.clone());

        if !manager.backend.health_check().await? {
            return Err(TripleStoreError::Other(format!(
                "Triple store backend {} failed its health check",
                manager.backend.name()
            )));
        }

        tracing::info!(
            backend = %manager.backend.name(),
            max_concurrent = manager.max_concurrent_operations(),
            "Connected to triple store"
        );

        Ok(manager)
    }

    /// Wrap an already constructed backend.
    pub fn from_backend(
        backend: Box<dyn TripleStoreBackend>,
        config: TripleStoreManagerConfig,
    ) -> Self {
        let max_concurrent = config.max_concurrent_operations.max(1);
        if max_concurrent != config.max_concurrent_operations {
            tracing::warn!(
                configured = config.max_concurrent_operations,
                effective = max_concurrent,
                "Triple store max_concurrent_operations too low; clamped"
            );
        }
        let concurrency_limiter = Arc::new(Semaphore::new(max_concurrent));

        Self {
            backend,
            config,
            concurrency_limiter,
        }
    }

    /// Fresh in-memory store, used by tests and one-shot tooling.
    pub fn in_memory() -> Result<Self> {
        let config = TripleStoreManagerConfig {
            backend: TripleStoreBackendType::Memory,
            ..TripleStoreManagerConfig::default()
        };
        Ok(Self::from_backend(
            Box::new(OxigraphBackend::in_memory()?),
            config,
        ))
    }

    /// Open a transaction. Nothing reaches the store until
    /// [`StoreTransaction::commit`].
    pub fn begin(&self) -> StoreTransaction<'_> {
        StoreTransaction::new(self)
    }

    // ========== Internal Backend Wrappers (with concurrency limiting) ==========

    /// Effective concurrency limit used by the internal semaphore.
    pub fn max_concurrent_operations(&self) -> usize {
        self.config.max_concurrent_operations.max(1)
    }

    fn record_permit_snapshot(&self, backend: &str) {
        metrics::record_backend_permit_snapshot(
            backend,
            self.max_concurrent_operations(),
            self.concurrency_limiter.available_permits(),
        );
    }

    async fn acquire_permit(&self, backend: &str, op: &str) -> Result<OwnedSemaphorePermit> {
        let wait_started = Instant::now();
        let permit = self
            .concurrency_limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| TripleStoreError::SemaphoreClosed)?;
        metrics::record_backend_permit_wait(backend, op, wait_started.elapsed());
        self.record_permit_snapshot(backend);
        Ok(permit)
    }

    /// Execute a SPARQL UPDATE with concurrency limiting
    pub(crate) async fn backend_update(&self, query: &str) -> Result<()> {
        let backend = self.backend.name();
        let op = "update";
        let started = Instant::now();
        metrics::record_backend_query_bytes_total(backend, op, query.len());

        let permit = match self.acquire_permit(backend, op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = self.backend.update(query).await;
        drop(permit);
        self.record_permit_snapshot(backend);

        let elapsed = started.elapsed();
        if elapsed > self.config.timeouts.insert_timeout() {
            tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = self.config.timeouts.insert_ms,
                "Triple store update exceeded its time budget"
            );
        }
        metrics::record_backend_operation(backend, op, result.as_ref().err(), elapsed);
        result
    }

    /// Execute a SPARQL CONSTRUCT with concurrency limiting
    pub(crate) async fn backend_construct(&self, query: &str, timeout: Duration) -> Result<String> {
        let backend = self.backend.name();
        let op = "construct";
        let started = Instant::now();
        metrics::record_backend_query_bytes_total(backend, op, query.len());

        let permit = match self.acquire_permit(backend, op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = self.backend.construct(query, timeout).await;
        drop(permit);
        self.record_permit_snapshot(backend);

        if let Ok(body) = &result {
            metrics::record_backend_result_bytes_total(backend, op, body.len());
        }

        metrics::record_backend_operation(backend, op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Execute a SPARQL ASK with concurrency limiting
    pub(crate) async fn backend_ask(&self, query: &str, timeout: Duration) -> Result<bool> {
        let backend = self.backend.name();
        let op = "ask";
        let started = Instant::now();
        metrics::record_backend_query_bytes_total(backend, op, query.len());

        let permit = match self.acquire_permit(backend, op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = self.backend.ask(query, timeout).await;
        drop(permit);
        self.record_permit_snapshot(backend);
        metrics::record_backend_operation(backend, op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Execute a SPARQL SELECT with concurrency limiting
    pub(crate) async fn backend_select(&self, query: &str, timeout: Duration) -> Result<String> {
        let backend = self.backend.name();
        let op = "select";
        let started = Instant::now();
        metrics::record_backend_query_bytes_total(backend, op, query.len());

        let permit = match self.acquire_permit(backend, op).await {
            Ok(permit) => permit,
            Err(error) => {
                metrics::record_backend_operation(backend, op, Some(&error), started.elapsed());
                return Err(error);
            }
        };

        let result = self.backend.select(query, timeout).await;
        drop(permit);
        self.record_permit_snapshot(backend);

        if let Ok(body) = &result {
            metrics::record_backend_result_bytes_total(backend, op, body.len());
        }

        metrics::record_backend_operation(backend, op, result.as_ref().err(), started.elapsed());
        result
    }
}
