#![allow(clippy::unwrap_used)]

mod management;

use oxigraph::model::{Literal, NamedNode, Triple};

pub(super) fn iri(value: &str) -> NamedNode {
    NamedNode::new(value).unwrap()
}

pub(super) fn triple(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(iri(s), iri(p), iri(o))
}

pub(super) fn literal_triple(s: &str, p: &str, o: &str) -> Triple {
    Triple::new(iri(s), iri(p), Literal::new_simple_literal(o))
}
