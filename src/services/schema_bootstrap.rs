use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use vgraph_domain::DocumentIdentity;

use super::ArtifactLifecycleManager;
use crate::error::AppError;

/// A schema document loaded at startup under a fixed identity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchemaSource {
    pub path: PathBuf,
    /// Media type of the file, e.g. `text/turtle`.
    pub format: String,
    pub document_iri: String,
    pub version_iri: String,
}

/// Loads the configured schemas in order, so a schema can import any
/// schema listed before it. Versions that are already current are skipped.
pub(crate) async fn bootstrap_schemas(
    lifecycle: &ArtifactLifecycleManager,
    sources: &[SchemaSource],
) -> Result<Vec<DocumentIdentity>, AppError> {
    let mut loaded = Vec::with_capacity(sources.len());

    for source in sources {
        let identity = DocumentIdentity::new(&source.document_iri, &source.version_iri)
            .map_err(|error| {
                AppError::Usage(format!("schema {}: {error}", source.path.display()))
            })?;
        let data = tokio::fs::read(&source.path)
            .await
            .map_err(|source_error| AppError::Io {
                path: source.path.display().to_string(),
                source: source_error,
            })?;

        let identity = lifecycle.load_schema(&data, &source.format, identity).await?;
        tracing::info!(schema = %identity, path = %source.path.display(), "Schema ready");
        loaded.push(identity);
    }

    Ok(loaded)
}
