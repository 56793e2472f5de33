use std::{collections::HashSet, time::Instant};

use oxigraph::model::{NamedOrBlankNode, Triple};
use vgraph_domain::{DocumentIdentity, EditMode, GraphDocument, increment_version};
use vgraph_observability as observability;

use super::{ArtifactLifecycleManager, ArtifactSnapshot, record};
use crate::{
    error::LifecycleError,
    services::{
        dangling::{containment_predicates, newly_dangling},
        document_loader::restamp,
        document_scope::load_import_closure,
    },
};

impl ArtifactLifecycleManager {
    /// Applies a fragment to the current version and publishes the result
    /// as a new version. Published versions are never rewritten in place.
    ///
    /// Objects the edit leaves uncontained fail the edit with
    /// `DanglingObjects` unless `allow_dangling` is set.
    pub async fn edit(
        &self,
        document_iri: &str,
        fragment: &[u8],
        format: &str,
        mode: EditMode,
        allow_dangling: bool,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let started = Instant::now();
        let result = self
            .edit_inner(document_iri, fragment, format, mode, allow_dangling)
            .await;
        record("edit", &result, started);
        result
    }

    /// Removes every version graph, every inferred graph and the management
    /// record of a document. Returns what the current version looked like.
    pub async fn delete(
        &self,
        document_iri: &str,
        format: &str,
    ) -> Result<ArtifactSnapshot, LifecycleError> {
        let started = Instant::now();
        let result = self.delete_inner(document_iri, format).await;
        record("delete", &result, started);
        result
    }

    async fn edit_inner(
        &self,
        document_iri: &str,
        fragment: &[u8],
        format: &str,
        mode: EditMode,
        allow_dangling: bool,
    ) -> Result<DocumentIdentity, LifecycleError> {
        let fragment = self.loader.parse_fragment(fragment, format)?;
        let _guard = self.locks.acquire(document_iri, "edit").await;

        let (graph, current) = self.locate(document_iri).await?;
        let before: HashSet<Triple> = self
            .triple_store
            .graph_statements(current.version_iri())
            .await?
            .into_iter()
            .collect();

        let mut after = apply_edit(&before, fragment, mode);
        let identity = self
            .unused_version(current.with_version(increment_version(current.version_iri())))
            .await?;
        restamp(&mut after, &identity)?;

        let (resolved, unresolved) = self.loader.resolve_imports(&mut after).await?;
        let imports = load_import_closure(&self.triple_store, &identity, &resolved).await?;

        let containment = containment_predicates(
            &self.containment_predicates,
            after
                .iter()
                .chain(imports.iter().flat_map(|import| import.statements())),
        );
        let dangling = newly_dangling(&before, &after, document_iri, &containment);
        if !dangling.is_empty() {
            observability::record_dangling_objects(dangling.len(), allow_dangling);
            if !allow_dangling {
                tracing::info!(
                    document = document_iri,
                    dangling = dangling.len(),
                    "Edit rejected: dangling objects"
                );
                return Err(LifecycleError::DanglingObjects { objects: dangling });
            }
            tracing::warn!(
                document = document_iri,
                objects = ?dangling,
                "Publishing edit with dangling objects"
            );
        }

        tracing::debug!(
            document = document_iri,
            mode = mode.as_str(),
            from = current.version_iri(),
            to = identity.version_iri(),
            before = before.len(),
            after = after.len(),
            "Edit applied"
        );

        self.validate_and_publish(
            "edit",
            graph,
            GraphDocument::new(identity, after),
            imports,
            unresolved,
        )
        .await
    }

    async fn delete_inner(
        &self,
        document_iri: &str,
        format: &str,
    ) -> Result<ArtifactSnapshot, LifecycleError> {
        let _guard = self.locks.acquire(document_iri, "delete").await;

        let (graph, current) = self.locate(document_iri).await?;
        let record = self
            .triple_store
            .management_record(graph, document_iri)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                document_iri: document_iri.to_string(),
            })?;
        let document = self.serialize(&current, true, format).await?;

        let mut transaction = self.triple_store.begin();
        for context in record.contexts() {
            transaction.clear_graph(context)?;
        }
        transaction.remove_record(graph, &record)?;
        transaction.commit().await?;

        tracing::info!(
            document = %current,
            management_graph = %graph,
            versions = record.versions.len(),
            inferred_graphs = record.inferred_graphs.len(),
            "Document deleted"
        );

        Ok(ArtifactSnapshot {
            graph,
            versions: record.versions,
            document,
        })
    }
}

/// Merge: union. Replace: drop every statement about a subject the fragment
/// describes, then union.
fn apply_edit(before: &HashSet<Triple>, fragment: HashSet<Triple>, mode: EditMode) -> HashSet<Triple> {
    let mut after = match mode {
        EditMode::Merge => before.clone(),
        EditMode::Replace => {
            let redefined: HashSet<&NamedOrBlankNode> =
                fragment.iter().map(|triple| &triple.subject).collect();
            before
                .iter()
                .filter(|triple| !redefined.contains(&&triple.subject))
                .cloned()
                .collect()
        }
    };
    after.extend(fragment);
    after
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use vgraph_triple_store::{RdfFormat, rdf};

    use super::*;

    fn parse(ntriples: &str) -> HashSet<Triple> {
        rdf::parse_triples(ntriples.as_bytes(), RdfFormat::NTriples)
            .unwrap()
            .into_iter()
            .collect()
    }

    const BASE: &str = "<http://ex.org/a> <http://ex.org/p> \"1\" .\n\
                        <http://ex.org/a> <http://ex.org/q> \"2\" .\n\
                        <http://ex.org/b> <http://ex.org/p> \"3\" .\n";

    #[test]
    fn merge_is_a_union() {
        let before = parse(BASE);
        let fragment = parse("<http://ex.org/a> <http://ex.org/r> \"4\" .\n");
        let after = apply_edit(&before, fragment, EditMode::Merge);
        assert_eq!(after.len(), 4);
    }

    #[test]
    fn replace_drops_redefined_subjects() {
        let before = parse(BASE);
        let fragment = parse("<http://ex.org/a> <http://ex.org/r> \"4\" .\n");
        let after = apply_edit(&before, fragment, EditMode::Replace);
        assert_eq!(
            after,
            parse(
                "<http://ex.org/a> <http://ex.org/r> \"4\" .\n\
                 <http://ex.org/b> <http://ex.org/p> \"3\" .\n"
            )
        );
    }
}
