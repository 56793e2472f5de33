use std::{path::Path, sync::Arc};

use vgraph_domain::DocumentIdentity;

use crate::{
    config::{self, AppPaths, Config},
    error::AppError,
    managers,
    services::{self, Services, schema_bootstrap::bootstrap_schemas},
};

pub(crate) struct CoreBootstrap {
    pub(crate) config: Arc<Config>,
    pub(crate) services: Services,
    pub(crate) schemas: Vec<DocumentIdentity>,
}

/// Loads configuration, installs logging, opens the store and makes sure
/// every configured schema is current.
pub(crate) async fn build_core(config_path: Option<&Path>) -> Result<CoreBootstrap, AppError> {
    let config = Arc::new(config::load_configuration(config_path)?);
    crate::logger::initialize(&config.logger, &config.telemetry);

    let paths = AppPaths::from_root(config.app_data_path.clone());
    let managers = managers::initialize(&config.triple_store, &paths).await?;
    let services = services::initialize(&config, &managers);

    let schemas = bootstrap_schemas(&services.lifecycle, &config.schemas).await?;
    if !schemas.is_empty() {
        tracing::info!(schemas = schemas.len(), "Schema bootstrap complete");
    }

    Ok(CoreBootstrap {
        config,
        services,
        schemas,
    })
}
