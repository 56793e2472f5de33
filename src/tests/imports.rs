use vgraph_domain::{DocumentIdentity, EditMode, vocab};
use vgraph_reasoner::ViolationKind;
use vgraph_triple_store::ManagementGraph;

use super::{TURTLE, harness, turtle, type_triple};
use crate::{
    error::{ErrorKind, LifecycleError},
    services::{SchemaSource, schema_bootstrap::bootstrap_schemas},
};

const SCHEMA: &str = "http://example.org/schema";
const SCHEMA_V1: &str = "http://example.org/schema/1";
const SCHEMA_V2: &str = "http://example.org/schema/2";
const DOC: &str = "http://example.org/batch";
const DOC_V1: &str = "http://example.org/batch/v1";

fn schema_v1() -> Vec<u8> {
    turtle(&format!(
        "<{SCHEMA}> a owl:Ontology .\n\
         ex:Material a owl:Class .\n\
         ex:Sample a owl:Class ; rdfs:subClassOf ex:Material .\n"
    ))
}

fn schema_v2() -> Vec<u8> {
    turtle(&format!(
        "<{SCHEMA}> a owl:Ontology .\n\
         ex:Material a owl:Class .\n\
         ex:Specimen a owl:Class .\n\
         ex:Sample a owl:Class ; rdfs:subClassOf ex:Material , ex:Specimen .\n"
    ))
}

fn importing_artifact(target: &str) -> Vec<u8> {
    turtle(&format!(
        "<{DOC}> a owl:Ontology ;\n\
         \x20   owl:versionIRI <{DOC_V1}> ;\n\
         \x20   owl:imports <{target}> ;\n\
         \x20   vg:artifactHasTopObject ex:sample1 .\n\
         ex:sample1 a ex:Sample .\n"
    ))
}

fn schema_identity(version: &str) -> DocumentIdentity {
    DocumentIdentity::new(SCHEMA, version).unwrap()
}

fn imports_of(statements: &[oxigraph::model::Triple]) -> Vec<String> {
    let mut targets: Vec<String> = statements
        .iter()
        .filter(|triple| triple.predicate.as_str() == vocab::OWL_IMPORTS)
        .map(|triple| triple.object.to_string())
        .collect();
    targets.sort();
    targets
}

#[tokio::test]
async fn schema_load_is_idempotent_per_version() {
    let h = harness();
    let first = h
        .lifecycle
        .load_schema(&schema_v1(), TURTLE, schema_identity(SCHEMA_V1))
        .await
        .unwrap();
    let again = h
        .lifecycle
        .load_schema(&schema_v1(), TURTLE, schema_identity(SCHEMA_V1))
        .await
        .unwrap();

    assert_eq!(first, again);
    assert_eq!(h.store.versions(ManagementGraph::Schema, SCHEMA).await.unwrap(), vec![SCHEMA_V1.to_string()]);
    assert_eq!(h.lifecycle.list(ManagementGraph::Schema).await.unwrap(), vec![first]);

    // the stored header carries the supplied version, not a default one
    let header = h.store.graph_statements(SCHEMA_V1).await.unwrap();
    assert!(header.iter().any(|triple| {
        triple.predicate.as_str() == vocab::OWL_VERSION_IRI && triple.object.to_string() == format!("<{SCHEMA_V1}>")
    }));
}

#[tokio::test]
async fn imports_resolve_to_current_schema_version() {
    let h = harness();
    h.lifecycle
        .load_schema(&schema_v1(), TURTLE, schema_identity(SCHEMA_V1))
        .await
        .unwrap();

    let identity = h.lifecycle.load_new(&importing_artifact(SCHEMA), TURTLE).await.unwrap();

    let asserted = h.store.graph_statements(DOC_V1).await.unwrap();
    assert_eq!(imports_of(&asserted), vec![format!("<{SCHEMA_V1}>")]);
    let inferred = h.store.graph_statements(identity.inferred_iri().unwrap()).await.unwrap();
    assert!(inferred.contains(&type_triple("http://example.org/sample1", "http://example.org/Material")));
    // schema statements stay in the schema graph
    assert!(!asserted.iter().any(|triple| triple.predicate.as_str() == vocab::RDFS_SUB_CLASS_OF));
}

#[tokio::test]
async fn edits_pick_up_a_newer_schema_version() {
    let h = harness();
    h.lifecycle
        .load_schema(&schema_v1(), TURTLE, schema_identity(SCHEMA_V1))
        .await
        .unwrap();
    h.lifecycle.load_new(&importing_artifact(SCHEMA_V1), TURTLE).await.unwrap();
    h.lifecycle
        .load_schema(&schema_v2(), TURTLE, schema_identity(SCHEMA_V2))
        .await
        .unwrap();

    let edited = h
        .lifecycle
        .edit(DOC, &turtle("ex:sample1 rdfs:label \"first\" .\n"), TURTLE, EditMode::Merge, false)
        .await
        .unwrap();

    let asserted = h.store.graph_statements(edited.version_iri()).await.unwrap();
    assert_eq!(imports_of(&asserted), vec![format!("<{SCHEMA_V2}>")]);
    let inferred = h.store.graph_statements(edited.inferred_iri().unwrap()).await.unwrap();
    assert!(inferred.contains(&type_triple("http://example.org/sample1", "http://example.org/Specimen")));

    // the superseded schema version is still readable
    let old = h.lifecycle.get_version(SCHEMA, SCHEMA_V1, false, TURTLE).await.unwrap();
    assert!(!String::from_utf8(old.data).unwrap().contains("Specimen"));
}

#[tokio::test]
async fn unresolved_import_is_a_profile_violation() {
    let h = harness();
    let error = h
        .lifecycle
        .load_new(&importing_artifact("http://example.org/missing"), TURTLE)
        .await
        .unwrap_err();

    match &error {
        LifecycleError::ProfileViolation(report) => {
            assert_eq!(report.violations.len(), 1);
            assert_eq!(report.violations[0].kind, ViolationKind::UnresolvedImport);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(h.lifecycle.list(ManagementGraph::Artifact).await.unwrap().is_empty());
}

#[tokio::test]
async fn lookup_falls_back_to_schemas() {
    let h = harness();
    h.lifecycle
        .load_schema(&schema_v1(), TURTLE, schema_identity(SCHEMA_V1))
        .await
        .unwrap();

    let schema = h.lifecycle.get(SCHEMA, false, TURTLE).await.unwrap();
    assert_eq!(schema.identity.version_iri(), SCHEMA_V1);

    let snapshot = h.lifecycle.delete(SCHEMA, TURTLE).await.unwrap();
    assert_eq!(snapshot.graph, ManagementGraph::Schema);
    assert_eq!(h.lifecycle.get(SCHEMA, false, TURTLE).await.unwrap_err().kind(), ErrorKind::NotFoundError);
}

#[tokio::test]
async fn bootstrap_loads_configured_schema_files() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.ttl");
    tokio::fs::write(&path, schema_v1()).await.unwrap();
    let sources = vec![SchemaSource {
        path,
        format: TURTLE.to_string(),
        document_iri: SCHEMA.to_string(),
        version_iri: SCHEMA_V1.to_string(),
    }];

    let loaded = bootstrap_schemas(&h.lifecycle, &sources).await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].version_iri(), SCHEMA_V1);

    let reloaded = bootstrap_schemas(&h.lifecycle, &sources).await.unwrap();
    assert_eq!(reloaded, loaded);
    assert_eq!(h.store.versions(ManagementGraph::Schema, SCHEMA).await.unwrap().len(), 1);
}

#[tokio::test]
async fn bootstrap_reports_missing_files() {
    let h = harness();
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![SchemaSource {
        path: dir.path().join("absent.ttl"),
        format: TURTLE.to_string(),
        document_iri: SCHEMA.to_string(),
        version_iri: SCHEMA_V1.to_string(),
    }];

    let error = bootstrap_schemas(&h.lifecycle, &sources).await.unwrap_err();
    assert!(matches!(error, crate::error::AppError::Io { .. }));
}
