#![allow(clippy::unwrap_used)]

mod imports;

use std::{sync::Arc, time::Duration};

use vgraph_domain::vocab;
use vgraph_reasoner::{ConsistencyEngine, InferenceCategory, Profile, RuleConsistencyEngine};
use vgraph_triple_store::TripleStoreManager;

use crate::services::{ArtifactLifecycleManager, LifecycleConfig, LoaderConfig, ReasoningConfig};

pub(super) const TURTLE: &str = "text/turtle";
pub(super) const INFERRED_PREFIX: &str = "urn:vgraph:inferred:";

pub(super) const PREFIXES: &str = "\
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix vg: <http://purl.org/vgraph/base#> .
@prefix ex: <http://example.org/> .
";

pub(super) struct Harness {
    pub store: Arc<TripleStoreManager>,
    pub lifecycle: ArtifactLifecycleManager,
}

pub(super) fn harness() -> Harness {
    harness_with(Arc::new(RuleConsistencyEngine), Duration::from_secs(30))
}

pub(super) fn harness_with(engine: Arc<dyn ConsistencyEngine>, timeout: Duration) -> Harness {
    let store = Arc::new(TripleStoreManager::in_memory().unwrap());
    let lifecycle = ArtifactLifecycleManager::new(
        Arc::clone(&store),
        engine,
        LoaderConfig {
            temporary_prefixes: vec!["urn:temp:".to_string()],
            artifact_namespace: "urn:vgraph:artifact:".to_string(),
            inferred_prefix: INFERRED_PREFIX.to_string(),
        },
        &ReasoningConfig {
            profile: Profile::Dl,
            timeout,
            categories: InferenceCategory::defaults(),
        },
        LifecycleConfig {
            containment_predicates: vec![
                vocab::CONTAINS.to_string(),
                vocab::ARTIFACT_HAS_TOP_OBJECT.to_string(),
            ],
        },
    );
    Harness { store, lifecycle }
}

/// Prepends the common prefixes to a Turtle body.
pub(super) fn turtle(body: &str) -> Vec<u8> {
    format!("{PREFIXES}{body}").into_bytes()
}

/// A small artifact: a project containing one sample, plus local classes.
pub(super) fn artifact(document_iri: &str, version_iri: &str) -> Vec<u8> {
    turtle(&format!(
        "<{document_iri}> a owl:Ontology ;\n\
         \x20   owl:versionIRI <{version_iri}> ;\n\
         \x20   vg:artifactHasTopObject ex:project .\n\
         ex:Project a owl:Class .\n\
         ex:Material a owl:Class .\n\
         ex:Sample a owl:Class ; rdfs:subClassOf ex:Material .\n\
         ex:project a ex:Project ; vg:contains ex:sample1 .\n\
         ex:sample1 a ex:Sample .\n"
    ))
}

pub(super) fn type_triple(subject: &str, class: &str) -> oxigraph::model::Triple {
    oxigraph::model::Triple::new(
        oxigraph::model::NamedNode::new(subject).unwrap(),
        oxigraph::model::NamedNode::new(vocab::RDF_TYPE).unwrap(),
        oxigraph::model::NamedNode::new(class).unwrap(),
    )
}
