use std::collections::{BTreeMap, HashSet};

use oxigraph::model::{NamedNode, NamedOrBlankNode, Term, Triple};
use serde::{Deserialize, Serialize};
use vgraph_domain::{DocumentIdentity, GraphDocument, vocab};
use vgraph_observability as observability;

use crate::ReasonerHandle;

/// Families of entailed statements that can be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceCategory {
    ClassHierarchy,
    EquivalentClasses,
    PropertyHierarchy,
    EquivalentProperties,
    InverseProperties,
    PropertyCharacteristics,
    ClassAssertions,
    /// Entailed `x p y` facts for user properties. Grows quickly on large
    /// documents, so it is not materialized by default.
    PropertyAssertions,
}

impl InferenceCategory {
    pub const ALL: [InferenceCategory; 8] = [
        InferenceCategory::ClassHierarchy,
        InferenceCategory::EquivalentClasses,
        InferenceCategory::PropertyHierarchy,
        InferenceCategory::EquivalentProperties,
        InferenceCategory::InverseProperties,
        InferenceCategory::PropertyCharacteristics,
        InferenceCategory::ClassAssertions,
        InferenceCategory::PropertyAssertions,
    ];

    pub fn defaults() -> Vec<InferenceCategory> {
        Self::ALL
            .into_iter()
            .filter(|category| *category != InferenceCategory::PropertyAssertions)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InferenceCategory::ClassHierarchy => "class_hierarchy",
            InferenceCategory::EquivalentClasses => "equivalent_classes",
            InferenceCategory::PropertyHierarchy => "property_hierarchy",
            InferenceCategory::EquivalentProperties => "equivalent_properties",
            InferenceCategory::InverseProperties => "inverse_properties",
            InferenceCategory::PropertyCharacteristics => "property_characteristics",
            InferenceCategory::ClassAssertions => "class_assertions",
            InferenceCategory::PropertyAssertions => "property_assertions",
        }
    }

    /// Category of an entailed statement, `None` for statements no
    /// category covers.
    fn of(triple: &Triple) -> Option<InferenceCategory> {
        match triple.predicate.as_str() {
            vocab::RDFS_SUB_CLASS_OF => Some(InferenceCategory::ClassHierarchy),
            vocab::OWL_EQUIVALENT_CLASS => Some(InferenceCategory::EquivalentClasses),
            vocab::RDFS_SUB_PROPERTY_OF => Some(InferenceCategory::PropertyHierarchy),
            vocab::OWL_EQUIVALENT_PROPERTY => Some(InferenceCategory::EquivalentProperties),
            vocab::OWL_INVERSE_OF => Some(InferenceCategory::InverseProperties),
            vocab::RDF_TYPE => match &triple.object {
                Term::NamedNode(class)
                    if matches!(
                        class.as_str(),
                        vocab::OWL_FUNCTIONAL_PROPERTY
                            | vocab::OWL_INVERSE_FUNCTIONAL_PROPERTY
                            | vocab::OWL_SYMMETRIC_PROPERTY
                            | vocab::OWL_TRANSITIVE_PROPERTY
                    ) =>
                {
                    Some(InferenceCategory::PropertyCharacteristics)
                }
                Term::NamedNode(class) if !vocab::is_builtin(class.as_str()) => {
                    Some(InferenceCategory::ClassAssertions)
                }
                _ => None,
            },
            predicate if vocab::is_builtin(predicate) && predicate != vocab::OWL_SAME_AS => None,
            _ => Some(InferenceCategory::PropertyAssertions),
        }
    }
}

/// Derived statements of one asserted version, stored under the inferred
/// identity.
#[derive(Debug, Clone)]
pub struct InferredDocument {
    identity: DocumentIdentity,
    statements: HashSet<Triple>,
    counts: BTreeMap<InferenceCategory, usize>,
}

impl InferredDocument {
    /// Source identity with its inferred graph set.
    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    /// IRI of the inferred graph.
    pub fn iri(&self) -> &str {
        self.identity.inferred_iri().unwrap_or_default()
    }

    pub fn statements(&self) -> &HashSet<Triple> {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Number of derived statements per category, header excluded.
    pub fn counts(&self) -> &BTreeMap<InferenceCategory, usize> {
        &self.counts
    }

    /// The inferred graph as a document of its own.
    pub fn into_document(self) -> GraphDocument {
        let iri = self.iri().to_string();
        let identity = DocumentIdentity::new(iri.clone(), iri).unwrap_or(self.identity);
        GraphDocument::new(identity, self.statements)
    }
}

/// Turns a reasoner handle into an inferred document for the configured
/// categories.
#[derive(Debug, Clone)]
pub struct InferenceMaterializer {
    categories: Vec<InferenceCategory>,
    inferred_prefix: String,
}

impl InferenceMaterializer {
    pub fn new(categories: Vec<InferenceCategory>, inferred_prefix: impl Into<String>) -> Self {
        Self {
            categories,
            inferred_prefix: inferred_prefix.into(),
        }
    }

    pub fn categories(&self) -> &[InferenceCategory] {
        &self.categories
    }

    pub fn inferred_prefix(&self) -> &str {
        &self.inferred_prefix
    }

    /// Derive the inferred document for `source`.
    ///
    /// Only named statements that are entailed and not asserted anywhere in
    /// the import closure are kept.
    pub fn materialize(&self, handle: &ReasonerHandle, source: &DocumentIdentity) -> InferredDocument {
        let identity = source.with_derived_inferred(&self.inferred_prefix);
        let mut statements = HashSet::new();
        let mut counts = BTreeMap::new();

        for triple in handle.closure().statements() {
            if handle.asserted().contains(triple) || !is_reportable(triple) {
                continue;
            }
            let Some(category) = InferenceCategory::of(triple) else {
                continue;
            };
            if !self.categories.contains(&category) {
                continue;
            }
            statements.insert(triple.clone());
            *counts.entry(category).or_insert(0) += 1;
        }

        for (category, count) in &counts {
            observability::record_inferred_statements(category.as_str(), *count);
        }

        if let Some(inferred) = identity.inferred_iri()
            && let Ok(inferred) = NamedNode::new(inferred)
        {
            statements.insert(Triple::new(
                inferred.clone(),
                NamedNode::new_unchecked(vocab::RDF_TYPE),
                NamedNode::new_unchecked(vocab::OWL_ONTOLOGY),
            ));
            statements.insert(Triple::new(
                inferred.clone(),
                NamedNode::new_unchecked(vocab::OWL_VERSION_IRI),
                inferred,
            ));
        }

        tracing::debug!(
            source = %source,
            inferred = identity.inferred_iri().unwrap_or_default(),
            statements = statements.len(),
            "Inference materialized"
        );

        InferredDocument {
            identity,
            statements,
            counts,
        }
    }
}

fn is_reportable(triple: &Triple) -> bool {
    let NamedOrBlankNode::NamedNode(subject) = &triple.subject else {
        return false;
    };
    let Term::NamedNode(object) = &triple.object else {
        return matches!(triple.object, Term::Literal(_));
    };
    subject != object && object.as_str() != vocab::OWL_THING
}
