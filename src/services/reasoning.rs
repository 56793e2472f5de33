use std::{sync::Arc, time::Duration};

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use vgraph_reasoner::{
    CheckRequest, ConsistencyEngine, InferenceCategory, InferenceMaterializer, InferredDocument,
    Profile,
};
use vgraph_triple_store::error::TripleStoreError;

use crate::error::{LifecycleError, consistency_error};

#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub profile: Profile,
    /// Upper bound on one consistency check.
    pub timeout: Duration,
    /// Statement categories materialized into inferred graphs.
    pub categories: Vec<InferenceCategory>,
}

/// Runs the consistency engine off the async runtime under a timeout, then
/// materializes the inferred document.
pub(crate) struct ReasoningService {
    engine: Arc<dyn ConsistencyEngine>,
    materializer: InferenceMaterializer,
    profile: Profile,
    timeout: Duration,
}

impl ReasoningService {
    pub(crate) fn new(
        engine: Arc<dyn ConsistencyEngine>,
        config: &ReasoningConfig,
        inferred_prefix: &str,
    ) -> Self {
        Self {
            engine,
            materializer: InferenceMaterializer::new(config.categories.clone(), inferred_prefix),
            profile: config.profile,
            timeout: config.timeout,
        }
    }

    pub(crate) fn profile(&self) -> Profile {
        self.profile
    }

    /// Checks the staged request and returns its inferred document.
    ///
    /// On timeout the engine is told to stop through its cancellation token
    /// and `ReasoningTimeout` is returned. Dropping the returned future
    /// cancels the engine the same way.
    pub(crate) async fn check_and_materialize(
        &self,
        request: Arc<CheckRequest>,
    ) -> Result<InferredDocument, LifecycleError> {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let cancel = CancellationToken::new();
        let _cancel_on_exit = cancel.clone().drop_guard();

        let task = {
            let engine = Arc::clone(&self.engine);
            let request = Arc::clone(&request);
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || engine.check(&request, &cancel))
        };

        let handle = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result.map_err(|error| consistency_error(error, timeout_ms))?,
            Ok(Err(join_error)) => return Err(join_failure(join_error)),
            Err(_) => {
                cancel.cancel();
                tracing::warn!(
                    document = %request.document.identity(),
                    engine = self.engine.name(),
                    timeout_ms,
                    "Consistency check timed out"
                );
                return Err(LifecycleError::ReasoningTimeout { timeout_ms });
            }
        };

        Ok(self
            .materializer
            .materialize(&handle, request.document.identity()))
    }
}

/// A reasoning task that ended without a result. Panics are resumed; a task
/// cancelled by runtime shutdown is an internal failure, not a timeout.
fn join_failure(join_error: JoinError) -> LifecycleError {
    if join_error.is_panic() {
        std::panic::resume_unwind(join_error.into_panic());
    }
    tracing::error!(error = %join_error, "Consistency check task was cancelled");
    LifecycleError::StoreTransaction(TripleStoreError::Other(format!(
        "consistency check did not complete: {join_error}"
    )))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn cancelled_check_task_is_not_a_timeout() {
        let task = tokio::spawn(std::future::pending::<()>());
        task.abort();
        let join_error = task.await.unwrap_err();
        assert!(join_error.is_cancelled());

        let error = join_failure(join_error);
        assert_eq!(error.kind(), ErrorKind::StoreTransactionError);
        assert!(!matches!(error, LifecycleError::ReasoningTimeout { .. }));
    }
}
