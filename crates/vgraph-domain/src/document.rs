use std::collections::{BTreeSet, HashSet};

use oxigraph::model::{NamedOrBlankNode, Term, Triple};

use crate::{DocumentIdentity, vocab};

/// An in-memory graph document: a statement set plus the identity it is
/// stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDocument {
    identity: DocumentIdentity,
    statements: HashSet<Triple>,
}

impl GraphDocument {
    pub fn new(identity: DocumentIdentity, statements: HashSet<Triple>) -> Self {
        Self {
            identity,
            statements,
        }
    }

    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn statements(&self) -> &HashSet<Triple> {
        &self.statements
    }

    pub fn into_parts(self) -> (DocumentIdentity, HashSet<Triple>) {
        (self.identity, self.statements)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Targets of every `owl:imports` statement, in sorted order.
    pub fn imports(&self) -> Vec<String> {
        import_targets(&self.statements)
    }

    /// Statements sorted by their N-Triples form, for stable output.
    pub fn sorted_statements(&self) -> Vec<&Triple> {
        let mut sorted: Vec<&Triple> = self.statements.iter().collect();
        sorted.sort_by_cached_key(|triple| triple.to_string());
        sorted
    }
}

/// IRIs imported by a statement set (`?x owl:imports <target>`).
pub fn import_targets(statements: &HashSet<Triple>) -> Vec<String> {
    statements
        .iter()
        .filter(|triple| triple.predicate.as_str() == vocab::OWL_IMPORTS)
        .filter_map(|triple| match &triple.object {
            Term::NamedNode(target) => Some(target.as_str().to_string()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// IRI of a subject, `None` for blank nodes.
pub fn subject_iri(subject: &NamedOrBlankNode) -> Option<&str> {
    match subject {
        NamedOrBlankNode::NamedNode(node) => Some(node.as_str()),
        NamedOrBlankNode::BlankNode(_) => None,
    }
}

/// IRI of an object, `None` for blank nodes and literals.
pub fn object_iri(object: &Term) -> Option<&str> {
    match object {
        Term::NamedNode(node) => Some(node.as_str()),
        _ => None,
    }
}
