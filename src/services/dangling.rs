//! Detection of objects an edit leaves without a compositional parent.

use std::collections::{BTreeSet, HashSet};

use oxigraph::model::Triple;
use vgraph_domain::{
    document::{object_iri, subject_iri},
    vocab,
};

/// Configured containment predicates plus every property declared a
/// sub-property of one of them, transitively.
pub(crate) fn containment_predicates<'a>(
    configured: &[String],
    statements: impl IntoIterator<Item = &'a Triple>,
) -> HashSet<String> {
    let sub_properties: Vec<(&str, &str)> = statements
        .into_iter()
        .filter(|triple| triple.predicate.as_str() == vocab::RDFS_SUB_PROPERTY_OF)
        .filter_map(|triple| Some((subject_iri(&triple.subject)?, object_iri(&triple.object)?)))
        .collect();

    let mut predicates: HashSet<String> = configured.iter().cloned().collect();
    loop {
        let before = predicates.len();
        for (sub, sup) in &sub_properties {
            if predicates.contains(*sup) {
                predicates.insert((*sub).to_string());
            }
        }
        if predicates.len() == before {
            return predicates;
        }
    }
}

/// Objects of a document that nothing contains.
///
/// Candidates are IRI subjects with at least one non-vocabulary type, plus
/// any `extra` IRI still described by the document. The document itself and
/// its top objects never dangle.
pub(crate) fn dangling_objects(
    statements: &HashSet<Triple>,
    document_iri: &str,
    containment: &HashSet<String>,
    extra: &BTreeSet<String>,
) -> BTreeSet<String> {
    let top_objects: HashSet<&str> = statements
        .iter()
        .filter(|triple| {
            triple.predicate.as_str() == vocab::ARTIFACT_HAS_TOP_OBJECT
                && subject_iri(&triple.subject) == Some(document_iri)
        })
        .filter_map(|triple| object_iri(&triple.object))
        .collect();

    let contained = contained_objects(statements, containment);
    let described: HashSet<&str> = statements
        .iter()
        .filter_map(|triple| subject_iri(&triple.subject))
        .collect();

    let typed = statements
        .iter()
        .filter(|triple| triple.predicate.as_str() == vocab::RDF_TYPE)
        .filter(|triple| object_iri(&triple.object).is_some_and(|class| !vocab::is_builtin(class)))
        .filter_map(|triple| subject_iri(&triple.subject));
    let parts = extra
        .iter()
        .map(String::as_str)
        .filter(|iri| described.contains(iri));

    typed
        .chain(parts)
        .filter(|subject| {
            *subject != document_iri && !top_objects.contains(subject) && !contained.contains(subject)
        })
        .map(str::to_string)
        .collect()
}

/// IRIs referenced through a containment predicate.
fn contained_objects<'a>(statements: &'a HashSet<Triple>, containment: &HashSet<String>) -> HashSet<&'a str> {
    statements
        .iter()
        .filter(|triple| containment.contains(triple.predicate.as_str()))
        .filter_map(|triple| object_iri(&triple.object))
        .collect()
}

/// Objects dangling after an edit that were not dangling before it.
///
/// Whatever was a contained part before the edit is a candidate afterwards,
/// typed or not.
pub(crate) fn newly_dangling(
    before: &HashSet<Triple>,
    after: &HashSet<Triple>,
    document_iri: &str,
    containment: &HashSet<String>,
) -> Vec<String> {
    let parts: BTreeSet<String> = contained_objects(before, containment)
        .into_iter()
        .map(str::to_string)
        .collect();
    let already = dangling_objects(before, document_iri, containment, &BTreeSet::new());
    dangling_objects(after, document_iri, containment, &parts)
        .into_iter()
        .filter(|object| !already.contains(object))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use vgraph_triple_store::{RdfFormat, rdf};

    use super::*;

    const DOC: &str = "http://example.org/doc";

    fn parse(turtle: &str) -> HashSet<Triple> {
        let document = format!(
            "@prefix ex: <http://example.org/> .\n\
             @prefix base: <http://purl.org/vgraph/base#> .\n\
             @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .\n\
             @prefix owl: <http://www.w3.org/2002/07/owl#> .\n{turtle}"
        );
        rdf::parse_triples(document.as_bytes(), RdfFormat::Turtle)
            .unwrap()
            .into_iter()
            .collect()
    }

    fn configured() -> Vec<String> {
        vec![vocab::CONTAINS.to_string(), vocab::ARTIFACT_HAS_TOP_OBJECT.to_string()]
    }

    #[test]
    fn sub_properties_of_contains_are_containment() {
        let statements = parse(
            "ex:hasStep rdfs:subPropertyOf base:contains .\n\
             ex:hasSubStep rdfs:subPropertyOf ex:hasStep .\n\
             ex:unrelated rdfs:subPropertyOf ex:other .",
        );
        let predicates = containment_predicates(&configured(), &statements);
        assert!(predicates.contains("http://example.org/hasStep"));
        assert!(predicates.contains("http://example.org/hasSubStep"));
        assert!(!predicates.contains("http://example.org/unrelated"));
    }

    #[test]
    fn uncontained_typed_object_dangles() {
        let statements = parse(
            "ex:doc a owl:Ontology ; base:artifactHasTopObject ex:project .\n\
             ex:project a ex:Project ; base:contains ex:sample .\n\
             ex:sample a ex:Sample .\n\
             ex:orphan a ex:Sample .\n\
             ex:Sample a owl:Class .",
        );
        let containment = containment_predicates(&configured(), &statements);
        let dangling = dangling_objects(&statements, DOC, &containment, &BTreeSet::new());
        assert_eq!(
            dangling.into_iter().collect::<Vec<_>>(),
            vec!["http://example.org/orphan".to_string()]
        );
    }

    #[test]
    fn only_new_dangling_objects_are_reported() {
        let before = parse(
            "ex:doc base:artifactHasTopObject ex:project .\n\
             ex:project base:contains ex:sample .\n\
             ex:sample a ex:Sample .\n\
             ex:legacy a ex:Sample .",
        );
        let mut after = before.clone();
        after.retain(|triple| triple.predicate.as_str() != vocab::CONTAINS);

        let containment = containment_predicates(&configured(), &after);
        assert_eq!(
            newly_dangling(&before, &after, DOC, &containment),
            vec!["http://example.org/sample".to_string()]
        );
    }

    #[test]
    fn uncontained_untyped_part_dangles() {
        let before = parse(
            "ex:doc base:artifactHasTopObject ex:project .\n\
             ex:project base:contains ex:note .\n\
             ex:note rdfs:label \"lab notes\" .",
        );
        let mut after = before.clone();
        after.retain(|triple| triple.predicate.as_str() != vocab::CONTAINS);

        let containment = containment_predicates(&configured(), &after);
        assert_eq!(
            newly_dangling(&before, &after, DOC, &containment),
            vec!["http://example.org/note".to_string()]
        );
    }

    #[test]
    fn removed_part_does_not_dangle() {
        let before = parse(
            "ex:doc base:artifactHasTopObject ex:project .\n\
             ex:project base:contains ex:note .\n\
             ex:note rdfs:label \"lab notes\" .",
        );
        let after: HashSet<Triple> = before
            .iter()
            .filter(|triple| subject_iri(&triple.subject) == Some("http://example.org/doc"))
            .cloned()
            .collect();

        let containment = containment_predicates(&configured(), &after);
        assert!(newly_dangling(&before, &after, DOC, &containment).is_empty());
    }
}
