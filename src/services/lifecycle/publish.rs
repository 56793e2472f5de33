use std::{sync::Arc, time::Instant};

use vgraph_domain::{DocumentIdentity, GraphDocument, increment_version};
use vgraph_observability as observability;
use vgraph_reasoner::CheckRequest;
use vgraph_triple_store::ManagementGraph;

use super::{ArtifactLifecycleManager, record};
use crate::{
    error::LifecycleError,
    services::{
        document_loader::restamp,
        document_scope::{DocumentScope, load_import_closure},
    },
};

impl ArtifactLifecycleManager {
    /// Loads a new artifact document and publishes it as its document's
    /// current version. A version IRI that is already taken is advanced
    /// until it is free.
    pub async fn load_new(&self, data: &[u8], format: &str) -> Result<DocumentIdentity, LifecycleError> {
        let started = Instant::now();
        let result = self.load_new_inner(data, format).await;
        record("load_new", &result, started);
        result
    }

    /// Loads a schema document under a caller-supplied identity. Loading a
    /// version that is already current is a no-op.
    pub async fn load_schema(
        &self,
        data: &[u8],
        format: &str,
        identity: DocumentIdentity,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let started = Instant::now();
        let result = self.load_schema_inner(data, format, identity).await;
        record("load_schema", &result, started);
        result
    }

    async fn load_new_inner(&self, data: &[u8], format: &str) -> Result<DocumentIdentity, LifecycleError> {
        let loaded = self.loader.load(data, format, None).await?;
        let document_iri = loaded.document.identity().document_iri().to_string();
        tracing::debug!(
            document = %document_iri,
            promoted = loaded.promoted,
            "Accepted new document"
        );
        let _guard = self.locks.acquire(&document_iri, "load_new").await;

        let (identity, mut statements) = loaded.document.into_parts();
        let identity = self.unused_version(identity).await?;
        restamp(&mut statements, &identity)?;

        let imports =
            load_import_closure(&self.triple_store, &identity, &loaded.imports).await?;
        self.validate_and_publish(
            "load_new",
            ManagementGraph::Artifact,
            GraphDocument::new(identity, statements),
            imports,
            loaded.unresolved_imports,
        )
        .await
    }

    async fn load_schema_inner(
        &self,
        data: &[u8],
        format: &str,
        identity: DocumentIdentity,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let _guard = self
            .locks
            .acquire(identity.document_iri(), "load_schema")
            .await;

        if let Some(current) = self
            .triple_store
            .current_identity(ManagementGraph::Schema, identity.document_iri())
            .await?
            && current.version_iri() == identity.version_iri()
        {
            tracing::debug!(schema = %current, "Schema version already current");
            return Ok(current);
        }

        let loaded = self.loader.load(data, format, Some(identity)).await?;
        let imports = load_import_closure(
            &self.triple_store,
            loaded.document.identity(),
            &loaded.imports,
        )
        .await?;
        self.validate_and_publish(
            "load_schema",
            ManagementGraph::Schema,
            loaded.document,
            imports,
            loaded.unresolved_imports,
        )
        .await
    }

    /// First version IRI, starting at the identity's own, that no
    /// management graph or stored graph uses yet.
    pub(super) async fn unused_version(
        &self,
        identity: DocumentIdentity,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let mut version = identity.version_iri().to_string();
        while self.triple_store.version_exists(&version).await? {
            version = increment_version(&version);
        }
        if version == identity.version_iri() {
            Ok(identity)
        } else {
            tracing::debug!(
                document = identity.document_iri(),
                requested = identity.version_iri(),
                assigned = %version,
                "Version already recorded; advanced"
            );
            Ok(identity.with_version(version))
        }
    }

    /// Checks the document, materializes its inferred document and writes
    /// both graphs plus the management record in one transaction.
    ///
    /// The caller holds the document's identity lock. The document scope is
    /// evicted whichever way this returns.
    pub(super) async fn validate_and_publish(
        &self,
        operation: &'static str,
        graph: ManagementGraph,
        document: GraphDocument,
        imports: Vec<GraphDocument>,
        unresolved_imports: Vec<String>,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let mut scope = DocumentScope::new(operation);
        let result = self
            .check_and_write(&mut scope, graph, document, imports, unresolved_imports)
            .await;
        scope.evict();

        if let Err(error) = &result {
            tracing::info!(
                operation,
                management_graph = %graph,
                kind = error.kind().as_str(),
                error = %error,
                "Document rejected"
            );
        }
        result
    }

    async fn check_and_write(
        &self,
        scope: &mut DocumentScope,
        graph: ManagementGraph,
        document: GraphDocument,
        imports: Vec<GraphDocument>,
        unresolved_imports: Vec<String>,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let request = scope.stage(CheckRequest {
            document,
            imports,
            unresolved_imports,
            profile: self.reasoning.profile(),
        });
        let inferred = self.reasoning.check_and_materialize(Arc::clone(&request)).await?;

        let asserted = &request.document;
        let identity = inferred.identity();
        let inferred_iri = inferred.iri();

        let mut transaction = self.triple_store.begin();
        transaction.clear_graph(asserted.identity().version_iri())?;
        transaction.add(asserted.identity().version_iri(), asserted.statements())?;
        transaction.clear_graph(inferred_iri)?;
        transaction.add(inferred_iri, inferred.statements())?;
        transaction.publish(graph, identity)?;
        transaction.commit().await?;

        observability::record_published_statements(graph.as_str(), asserted.len(), inferred.len());
        tracing::info!(
            document = %identity,
            management_graph = %graph,
            asserted = asserted.len(),
            inferred = inferred.len(),
            "Document published"
        );

        Ok(identity.clone())
    }
}
