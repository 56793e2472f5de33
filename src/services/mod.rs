pub(crate) mod dangling;
pub(crate) mod document_loader;
pub(crate) mod document_scope;
pub(crate) mod identity_locks;
pub(crate) mod lifecycle;
pub(crate) mod reasoning;
pub(crate) mod schema_bootstrap;

use std::sync::Arc;

pub use document_loader::{LoaderConfig, LoaderError};
pub use lifecycle::{ArtifactLifecycleManager, ArtifactSnapshot, LifecycleConfig, SerializedDocument};
pub use reasoning::ReasoningConfig;
pub use schema_bootstrap::SchemaSource;
use vgraph_reasoner::{ConsistencyEngine, RuleConsistencyEngine};

use crate::{config::Config, managers::Managers};

/// Container for all initialized services.
pub(crate) struct Services {
    pub lifecycle: Arc<ArtifactLifecycleManager>,
}

/// Wires the lifecycle manager with the default rule-based engine.
pub(crate) fn initialize(config: &Config, managers: &Managers) -> Services {
    let engine: Arc<dyn ConsistencyEngine> = Arc::new(RuleConsistencyEngine);
    tracing::debug!(
        engine = engine.name(),
        profile = %config.reasoning.profile,
        "Consistency engine selected"
    );

    let lifecycle = ArtifactLifecycleManager::new(
        Arc::clone(&managers.triple_store),
        engine,
        config.loader.clone(),
        &config.reasoning,
        config.lifecycle.clone(),
    );

    Services {
        lifecycle: Arc::new(lifecycle),
    }
}
