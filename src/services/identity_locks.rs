use std::{sync::Arc, time::Instant};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vgraph_observability as observability;

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// Per-document mutexes that serialize read-modify-publish sequences.
///
/// Different document IRIs never contend. Entries are dropped once the last
/// holder or waiter for a document goes away.
#[derive(Default)]
pub(crate) struct IdentityLocks {
    locks: Arc<LockTable>,
}

impl IdentityLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn acquire(&self, document_iri: &str, operation: &str) -> IdentityGuard {
        let lock = self
            .locks
            .entry(document_iri.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let started = Instant::now();
        let guard = lock.lock_owned().await;
        observability::record_identity_lock_wait(operation, started.elapsed());
        observability::record_identity_locks_held(self.locks.len());

        tracing::trace!(document = document_iri, operation, "Identity lock acquired");

        IdentityGuard {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            document_iri: document_iri.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held while a document is being modified. Releases on drop.
pub(crate) struct IdentityGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    document_iri: String,
}

impl Drop for IdentityGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.document_iri, |_, lock| Arc::strong_count(lock) == 1);
        observability::record_identity_locks_held(self.locks.len());
    }
}
