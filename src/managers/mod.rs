use std::sync::Arc;

use vgraph_triple_store::{TripleStoreManager, TripleStoreManagerConfig, error::TripleStoreError};

use crate::config::AppPaths;

/// Container for all initialized managers.
pub(crate) struct Managers {
    pub triple_store: Arc<TripleStoreManager>,
}

pub(crate) async fn initialize(
    config: &TripleStoreManagerConfig,
    paths: &AppPaths,
) -> Result<Managers, TripleStoreError> {
    let triple_store = TripleStoreManager::connect(config, &paths.triple_store).await?;

    Ok(Managers {
        triple_store: Arc::new(triple_store),
    })
}
