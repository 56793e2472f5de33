use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use vgraph_domain::{DocumentIdentity, GraphDocument, document::import_targets};
use vgraph_observability as observability;
use vgraph_reasoner::CheckRequest;
use vgraph_triple_store::{TripleStoreManager, error::TripleStoreError};

use super::document_loader::ResolvedImport;

/// In-memory cache of one operation's document and its import closure.
///
/// Nothing here is shared between operations. The cache is released by
/// [`DocumentScope::evict`] on every exit path, and by `Drop` when the
/// operation future is cancelled before it gets there.
pub(crate) struct DocumentScope {
    operation: &'static str,
    request: Option<Arc<CheckRequest>>,
}

impl DocumentScope {
    pub(crate) fn new(operation: &'static str) -> Self {
        Self {
            operation,
            request: None,
        }
    }

    /// Caches a prepared check request, replacing anything staged before.
    pub(crate) fn stage(&mut self, request: CheckRequest) -> Arc<CheckRequest> {
        let request = Arc::new(request);
        self.request = Some(Arc::clone(&request));
        request
    }

    /// Number of documents held: the staged document plus its imports.
    pub(crate) fn cached_documents(&self) -> usize {
        self.request
            .as_ref()
            .map_or(0, |request| 1 + request.imports.len())
    }

    pub(crate) fn evict(mut self) {
        self.release(false);
    }

    fn release(&mut self, on_drop: bool) {
        let cached = self.cached_documents();
        if self.request.take().is_none() {
            return;
        }
        observability::record_document_scope_eviction(self.operation, cached, on_drop);
        tracing::trace!(
            operation = self.operation,
            cached_documents = cached,
            on_drop,
            "Document scope evicted"
        );
    }
}

impl Drop for DocumentScope {
    fn drop(&mut self) {
        self.release(true);
    }
}

/// Reads the transitive import closure from the store.
///
/// Each import contributes its version graph plus its inferred graph.
/// Nested imports resolve to the current version of their target; the root
/// document is never loaded as its own import.
pub(crate) async fn load_import_closure(
    triple_store: &TripleStoreManager,
    root: &DocumentIdentity,
    imports: &[ResolvedImport],
) -> Result<Vec<GraphDocument>, TripleStoreError> {
    let mut visited: HashSet<String> = HashSet::from([root.document_iri().to_string()]);
    let mut pending: VecDeque<DocumentIdentity> = imports
        .iter()
        .map(|import| {
            tracing::trace!(
                import_target = %import.target,
                management_graph = %import.graph,
                resolved = %import.identity,
                "Loading import"
            );
            import.identity.clone()
        })
        .collect();
    let mut closure = Vec::new();

    while let Some(identity) = pending.pop_front() {
        if !visited.insert(identity.document_iri().to_string()) {
            continue;
        }

        let mut statements: HashSet<_> = triple_store
            .graph_statements(identity.version_iri())
            .await?
            .into_iter()
            .collect();

        for target in import_targets(&statements) {
            match triple_store.resolve_import_target(&target).await? {
                Some((_, nested)) => pending.push_back(nested),
                None => tracing::warn!(
                    import = %identity,
                    import_target = %target,
                    "Nested import has no current version"
                ),
            }
        }

        if let Some(inferred) = identity.inferred_iri() {
            statements.extend(triple_store.graph_statements(inferred).await?);
        }
        closure.push(GraphDocument::new(identity, statements));
    }

    Ok(closure)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use std::collections::HashSet;

    use vgraph_reasoner::Profile;

    use super::*;

    fn request() -> CheckRequest {
        let identity =
            DocumentIdentity::new("http://example.org/doc", "http://example.org/doc:version:1")
                .unwrap();
        CheckRequest {
            document: GraphDocument::new(identity, HashSet::new()),
            imports: Vec::new(),
            unresolved_imports: Vec::new(),
            profile: Profile::Dl,
        }
    }

    #[test]
    fn evict_releases_staged_request() {
        let mut scope = DocumentScope::new("load");
        let staged = scope.stage(request());
        assert_eq!(scope.cached_documents(), 1);
        assert_eq!(Arc::strong_count(&staged), 2);

        scope.evict();
        assert_eq!(Arc::strong_count(&staged), 1);
    }

    #[test]
    fn drop_releases_staged_request() {
        let staged = {
            let mut scope = DocumentScope::new("edit");
            scope.stage(request())
        };
        assert_eq!(Arc::strong_count(&staged), 1);
    }
}
