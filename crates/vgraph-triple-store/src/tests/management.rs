#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use vgraph_domain::{DocumentIdentity, vocab};

use super::{literal_triple, triple};
use crate::{ManagementGraph, TripleStoreManager};

const DOC: &str = "http://example.org/project";
const PREFIX: &str = "urn:vgraph:inferred:";

fn identity(version: u32) -> DocumentIdentity {
    DocumentIdentity::new(DOC, format!("{DOC}:version:{version}"))
        .unwrap()
        .with_derived_inferred(PREFIX)
}

/// Write both graphs and the record the way a lifecycle publish does.
async fn publish(manager: &TripleStoreManager, graph: ManagementGraph, identity: &DocumentIdentity) {
    let inferred = identity.inferred_iri().unwrap();
    let mut transaction = manager.begin();
    transaction.clear_graph(identity.version_iri()).unwrap();
    transaction
        .add(
            identity.version_iri(),
            &[
                triple(DOC, vocab::RDF_TYPE, vocab::OWL_ONTOLOGY),
                literal_triple(DOC, "http://example.org/label", identity.version_iri()),
            ],
        )
        .unwrap();
    transaction.clear_graph(inferred).unwrap();
    transaction
        .add(inferred, &[triple("http://example.org/x", vocab::RDF_TYPE, "http://example.org/C")])
        .unwrap();
    transaction.publish(graph, identity).unwrap();
    transaction.commit().await.unwrap();
}

#[tokio::test]
async fn publish_records_current_identity() {
    let manager = TripleStoreManager::in_memory().unwrap();
    let first = identity(1);
    publish(&manager, ManagementGraph::Artifact, &first).await;

    let current = manager
        .current_identity(ManagementGraph::Artifact, DOC)
        .await
        .unwrap();
    assert_eq!(current, Some(first.clone()));
    assert_eq!(
        manager.current_identity(ManagementGraph::Schema, DOC).await.unwrap(),
        None
    );
    assert_eq!(
        manager
            .version_identity(ManagementGraph::Artifact, DOC, first.version_iri())
            .await
            .unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn repeated_publishes_keep_one_current_marker() {
    let manager = TripleStoreManager::in_memory().unwrap();
    for version in 1..=4 {
        publish(&manager, ManagementGraph::Artifact, &identity(version)).await;
        assert_eq!(
            manager
                .current_marker_count(ManagementGraph::Artifact, DOC)
                .await
                .unwrap(),
            1
        );
    }

    let versions = manager.versions(ManagementGraph::Artifact, DOC).await.unwrap();
    assert_eq!(versions.len(), 4);
    assert_eq!(
        manager
            .current_identity(ManagementGraph::Artifact, DOC)
            .await
            .unwrap(),
        Some(identity(4))
    );
}

#[tokio::test]
async fn prior_inferred_graphs_are_collected() {
    let manager = TripleStoreManager::in_memory().unwrap();
    for version in 1..=3 {
        publish(&manager, ManagementGraph::Artifact, &identity(version)).await;
    }

    let links = manager.inferred_links(ManagementGraph::Artifact, DOC).await.unwrap();
    assert_eq!(links, vec![identity(3).inferred_iri().unwrap().to_string()]);

    for version in 1..=2 {
        let old = identity(version);
        assert_eq!(manager.size(old.inferred_iri().unwrap()).await.unwrap(), 0);
        // asserted versions stay queryable
        assert_eq!(manager.size(old.version_iri()).await.unwrap(), 2);
        assert_eq!(
            manager
                .version_identity(ManagementGraph::Artifact, DOC, old.version_iri())
                .await
                .unwrap(),
            Some(old.asserted())
        );
    }
    assert_eq!(manager.size(identity(3).inferred_iri().unwrap()).await.unwrap(), 1);
}

#[tokio::test]
async fn republishing_the_current_version_keeps_its_inferred_graph() {
    let manager = TripleStoreManager::in_memory().unwrap();
    let first = identity(1);
    publish(&manager, ManagementGraph::Schema, &first).await;
    publish(&manager, ManagementGraph::Schema, &first).await;

    assert_eq!(manager.size(first.inferred_iri().unwrap()).await.unwrap(), 1);
    assert_eq!(
        manager.current_identity(ManagementGraph::Schema, DOC).await.unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn import_targets_resolve_schema_first() {
    let manager = TripleStoreManager::in_memory().unwrap();
    publish(&manager, ManagementGraph::Artifact, &identity(7)).await;

    let (graph, resolved) = manager.resolve_import_target(DOC).await.unwrap().unwrap();
    assert_eq!(graph, ManagementGraph::Artifact);
    assert_eq!(resolved, identity(7));

    publish(&manager, ManagementGraph::Schema, &identity(2)).await;
    let (graph, resolved) = manager
        .resolve_import_target(identity(7).version_iri())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(graph, ManagementGraph::Artifact);
    assert_eq!(resolved, identity(7));

    let (graph, resolved) = manager.resolve_import_target(DOC).await.unwrap().unwrap();
    assert_eq!(graph, ManagementGraph::Schema);
    assert_eq!(resolved, identity(2));

    assert!(
        manager
            .resolve_import_target("http://example.org/unknown")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn stale_version_imports_resolve_to_current() {
    let manager = TripleStoreManager::in_memory().unwrap();
    publish(&manager, ManagementGraph::Schema, &identity(1)).await;
    publish(&manager, ManagementGraph::Schema, &identity(2)).await;

    let (_, resolved) = manager
        .resolve_import_target(identity(1).version_iri())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved, identity(2));
}

#[tokio::test]
async fn version_exists_sees_records_and_contexts() {
    let manager = TripleStoreManager::in_memory().unwrap();
    assert!(!manager.version_exists(identity(1).version_iri()).await.unwrap());

    publish(&manager, ManagementGraph::Artifact, &identity(1)).await;
    assert!(manager.version_exists(identity(1).version_iri()).await.unwrap());

    manager
        .add("http://example.org/stray", &[triple(DOC, vocab::RDF_TYPE, vocab::OWL_ONTOLOGY)])
        .await
        .unwrap();
    assert!(manager.version_exists("http://example.org/stray").await.unwrap());
}

#[tokio::test]
async fn list_current_is_sorted_by_document() {
    let manager = TripleStoreManager::in_memory().unwrap();
    let other = DocumentIdentity::new("http://example.org/another", "http://example.org/another:version:1")
        .unwrap()
        .with_derived_inferred(PREFIX);

    let mut transaction = manager.begin();
    transaction.publish(ManagementGraph::Artifact, &identity(1)).unwrap();
    transaction.publish(ManagementGraph::Artifact, &other).unwrap();
    transaction.commit().await.unwrap();

    let listed = manager.list_current(ManagementGraph::Artifact).await.unwrap();
    assert_eq!(listed, vec![other, identity(1)]);
    assert!(manager.list_current(ManagementGraph::Schema).await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_record_clears_bookkeeping() {
    let manager = TripleStoreManager::in_memory().unwrap();
    publish(&manager, ManagementGraph::Artifact, &identity(1)).await;
    publish(&manager, ManagementGraph::Artifact, &identity(2)).await;

    let record = manager
        .management_record(ManagementGraph::Artifact, DOC)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.versions.len(), 2);

    let mut transaction = manager.begin();
    for context in record.contexts() {
        transaction.clear_graph(context).unwrap();
    }
    transaction.remove_record(ManagementGraph::Artifact, &record).unwrap();
    transaction.commit().await.unwrap();

    assert_eq!(manager.size(ManagementGraph::Artifact.iri()).await.unwrap(), 0);
    assert!(
        manager
            .management_record(ManagementGraph::Artifact, DOC)
            .await
            .unwrap()
            .is_none()
    );
    for context in record.contexts() {
        assert_eq!(manager.size(context).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn rolled_back_publish_keeps_previous_version_current() {
    let manager = TripleStoreManager::in_memory().unwrap();
    publish(&manager, ManagementGraph::Artifact, &identity(1)).await;

    let mut transaction = manager.begin();
    transaction.publish(ManagementGraph::Artifact, &identity(2)).unwrap();
    transaction.rollback();

    assert_eq!(
        manager
            .current_identity(ManagementGraph::Artifact, DOC)
            .await
            .unwrap(),
        Some(identity(1))
    );
}

#[tokio::test]
async fn concurrent_publishes_of_different_documents() {
    let manager = Arc::new(TripleStoreManager::in_memory().unwrap());
    let mut tasks = Vec::new();
    for index in 0..4 {
        let manager = Arc::clone(&manager);
        tasks.push(tokio::spawn(async move {
            let doc = format!("http://example.org/doc{index}");
            let identity = DocumentIdentity::new(doc.clone(), format!("{doc}:version:1"))
                .unwrap()
                .with_derived_inferred(PREFIX);
            let mut transaction = manager.begin();
            transaction.publish(ManagementGraph::Artifact, &identity).unwrap();
            transaction.commit().await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(
        manager.list_current(ManagementGraph::Artifact).await.unwrap().len(),
        4
    );
}
