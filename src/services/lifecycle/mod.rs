//! Load, read, edit and delete of versioned graph documents.
//!
//! Every write path runs the same pipeline: load into a scoped cache, check
//! consistency, materialize the inferred document, then write the version
//! graph, the inferred graph and the management record in one transaction.

mod edit;
mod publish;

use std::{sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use vgraph_domain::DocumentIdentity;
use vgraph_observability as observability;
use vgraph_reasoner::ConsistencyEngine;
use vgraph_triple_store::{ManagementGraph, TripleStoreManager};

use super::{
    document_loader::{DocumentLoader, LoaderConfig, parse_format},
    identity_locks::IdentityLocks,
    reasoning::{ReasoningConfig, ReasoningService},
};
use crate::error::LifecycleError;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LifecycleConfig {
    /// Predicates marking an object as a compositional part of another.
    /// Sub-properties of these count as well.
    pub containment_predicates: Vec<String>,
}

/// RDF payload returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedDocument {
    pub identity: DocumentIdentity,
    /// Media type of `data`.
    pub format: String,
    pub data: Vec<u8>,
}

/// What a deleted document looked like just before deletion.
#[derive(Debug, Clone)]
pub struct ArtifactSnapshot {
    pub graph: ManagementGraph,
    /// Every version IRI recorded for the document.
    pub versions: Vec<String>,
    /// Current version and its inferred graph.
    pub document: SerializedDocument,
}

pub struct ArtifactLifecycleManager {
    triple_store: Arc<TripleStoreManager>,
    loader: DocumentLoader,
    reasoning: ReasoningService,
    locks: IdentityLocks,
    containment_predicates: Vec<String>,
}

impl ArtifactLifecycleManager {
    pub fn new(
        triple_store: Arc<TripleStoreManager>,
        engine: Arc<dyn ConsistencyEngine>,
        loader_config: LoaderConfig,
        reasoning_config: &ReasoningConfig,
        lifecycle_config: LifecycleConfig,
    ) -> Self {
        let reasoning =
            ReasoningService::new(engine, reasoning_config, &loader_config.inferred_prefix);
        Self {
            loader: DocumentLoader::new(Arc::clone(&triple_store), loader_config),
            triple_store,
            reasoning,
            locks: IdentityLocks::new(),
            containment_predicates: lifecycle_config.containment_predicates,
        }
    }

    /// Serializes the current version of a document, optionally together
    /// with its inferred graph.
    pub async fn get(
        &self,
        document_iri: &str,
        include_inferred: bool,
        format: &str,
    ) -> Result<SerializedDocument, LifecycleError> {
        let started = Instant::now();
        let result = async {
            let (_, identity) = self.locate(document_iri).await?;
            self.serialize(&identity, include_inferred, format).await
        }
        .await;
        record("get", &result, started);
        result
    }

    /// Serializes an explicit version. Superseded versions have no inferred
    /// graph any more, so `include_inferred` only applies to the current one.
    pub async fn get_version(
        &self,
        document_iri: &str,
        version_iri: &str,
        include_inferred: bool,
        format: &str,
    ) -> Result<SerializedDocument, LifecycleError> {
        let started = Instant::now();
        let result = async {
            for graph in LOOKUP_ORDER {
                if let Some(identity) = self
                    .triple_store
                    .version_identity(graph, document_iri, version_iri)
                    .await?
                {
                    return self.serialize(&identity, include_inferred, format).await;
                }
            }
            Err(LifecycleError::NotFound {
                document_iri: document_iri.to_string(),
            })
        }
        .await;
        record("get_version", &result, started);
        result
    }

    /// Current identities recorded in a management graph.
    pub async fn list(&self, graph: ManagementGraph) -> Result<Vec<DocumentIdentity>, LifecycleError> {
        Ok(self.triple_store.list_current(graph).await?)
    }

    /// Finds the management graph holding the document and its current
    /// identity. Artifacts shadow schemas.
    async fn locate(
        &self,
        document_iri: &str,
    ) -> Result<(ManagementGraph, DocumentIdentity), LifecycleError> {
        for graph in LOOKUP_ORDER {
            if let Some(identity) = self
                .triple_store
                .current_identity(graph, document_iri)
                .await?
            {
                return Ok((graph, identity));
            }
        }
        Err(LifecycleError::NotFound {
            document_iri: document_iri.to_string(),
        })
    }

    async fn serialize(
        &self,
        identity: &DocumentIdentity,
        include_inferred: bool,
        format: &str,
    ) -> Result<SerializedDocument, LifecycleError> {
        let format = parse_format(format)?;
        let mut contexts = vec![identity.version_iri()];
        if include_inferred && let Some(inferred) = identity.inferred_iri() {
            contexts.push(inferred);
        }
        let data = self.triple_store.export(&contexts, format).await?;
        Ok(SerializedDocument {
            identity: identity.clone(),
            format: format.media_type().to_string(),
            data,
        })
    }
}

const LOOKUP_ORDER: [ManagementGraph; 2] = [ManagementGraph::Artifact, ManagementGraph::Schema];

fn record<T>(operation: &str, result: &Result<T, LifecycleError>, started: Instant) {
    let (status, kind) = match result {
        Ok(_) => ("ok", "none"),
        Err(error) => ("error", error.kind().as_str()),
    };
    observability::record_lifecycle_operation(operation, status, kind, started.elapsed());
}
