//! Forward-chaining closure over an RDFS / OWL RL rule subset.

use std::collections::{HashMap, HashSet};

use oxigraph::model::{NamedNode, NamedOrBlankNode, Term, Triple};
use tokio_util::sync::CancellationToken;
use vgraph_domain::vocab;

use crate::ConsistencyError;

/// Asserted statements plus everything the rules entail from them.
#[derive(Debug, Clone)]
pub struct Closure {
    statements: HashSet<Triple>,
    asserted: usize,
    rounds: usize,
}

impl Closure {
    /// Run the rules to a fixpoint. The token is polled between rounds.
    pub fn compute(
        asserted: impl IntoIterator<Item = Triple>,
        cancel: &CancellationToken,
    ) -> Result<Self, ConsistencyError> {
        let mut statements: HashSet<Triple> = asserted.into_iter().collect();
        let asserted = statements.len();
        let mut rounds = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ConsistencyError::Cancelled);
            }
            rounds += 1;

            let index = Index::build(&statements);
            let derived = index.apply_rules();
            let before = statements.len();
            statements.extend(derived);

            tracing::trace!(round = rounds, added = statements.len() - before, "Closure round");
            if statements.len() == before {
                break;
            }
        }

        Ok(Self {
            statements,
            asserted,
            rounds,
        })
    }

    pub fn statements(&self) -> &HashSet<Triple> {
        &self.statements
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.statements.contains(triple)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn asserted_count(&self) -> usize {
        self.asserted
    }

    pub fn entailed_count(&self) -> usize {
        self.statements.len() - self.asserted
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Objects of `subject predicate ?o`.
    pub fn objects<'a>(&'a self, subject: &'a Term, predicate: &'a str) -> impl Iterator<Item = &'a Term> + 'a {
        self.statements.iter().filter_map(move |triple| {
            (triple.predicate.as_str() == predicate && Term::from(triple.subject.clone()) == *subject)
                .then_some(&triple.object)
        })
    }

    /// `(subject, object)` pairs of a predicate, with subjects as terms.
    pub fn pairs<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = (Term, &'a Term)> + 'a {
        self.statements.iter().filter_map(move |triple| {
            (triple.predicate.as_str() == predicate)
                .then(|| (Term::from(triple.subject.clone()), &triple.object))
        })
    }
}

/// Per-round snapshot of the statement set, grouped by predicate.
struct Index {
    by_predicate: HashMap<String, Vec<(Term, Term)>>,
}

impl Index {
    fn build(statements: &HashSet<Triple>) -> Self {
        let mut by_predicate: HashMap<String, Vec<(Term, Term)>> = HashMap::new();
        for triple in statements {
            by_predicate
                .entry(triple.predicate.as_str().to_string())
                .or_default()
                .push((triple.subject.clone().into(), triple.object.clone()));
        }
        Self { by_predicate }
    }

    fn pairs(&self, predicate: &str) -> &[(Term, Term)] {
        self.by_predicate.get(predicate).map(Vec::as_slice).unwrap_or_default()
    }

    fn adjacency(&self, predicate: &str) -> HashMap<&Term, Vec<&Term>> {
        let mut adjacency: HashMap<&Term, Vec<&Term>> = HashMap::new();
        for (subject, object) in self.pairs(predicate) {
            adjacency.entry(subject).or_default().push(object);
        }
        adjacency
    }

    fn typed(&self, class: &str) -> HashSet<&Term> {
        self.pairs(vocab::RDF_TYPE)
            .iter()
            .filter(|(_, object)| matches!(object, Term::NamedNode(node) if node.as_str() == class))
            .map(|(subject, _)| subject)
            .collect()
    }

    fn apply_rules(&self) -> Vec<Triple> {
        let mut out = Derived::default();
        self.equivalences(&mut out);
        self.hierarchies(&mut out);
        self.class_membership(&mut out);
        self.sub_properties(&mut out);
        self.inverses(&mut out);
        self.domains_and_ranges(&mut out);
        self.property_characteristics(&mut out);
        self.symmetric_and_transitive(&mut out);
        out.triples
    }

    /// Equivalence and disjointness are symmetric; equivalence implies
    /// mutual subsumption and mutual subsumption implies equivalence.
    fn equivalences(&self, out: &mut Derived) {
        for (equivalent, sub) in [
            (vocab::OWL_EQUIVALENT_CLASS, vocab::RDFS_SUB_CLASS_OF),
            (vocab::OWL_EQUIVALENT_PROPERTY, vocab::RDFS_SUB_PROPERTY_OF),
        ] {
            for (a, b) in self.pairs(equivalent) {
                out.push(b, equivalent, a);
                out.push(a, sub, b);
                out.push(b, sub, a);
            }
            let adjacency = self.adjacency(sub);
            for (a, b) in self.pairs(sub) {
                if adjacency.get(b).is_some_and(|supers| supers.contains(&a)) {
                    out.push(a, equivalent, b);
                }
            }
        }
        for symmetric in [vocab::OWL_DISJOINT_WITH, vocab::OWL_SAME_AS, vocab::OWL_DIFFERENT_FROM] {
            for (a, b) in self.pairs(symmetric) {
                out.push(b, symmetric, a);
            }
        }
    }

    fn hierarchies(&self, out: &mut Derived) {
        for sub in [vocab::RDFS_SUB_CLASS_OF, vocab::RDFS_SUB_PROPERTY_OF] {
            let adjacency = self.adjacency(sub);
            for (a, b) in self.pairs(sub) {
                for c in adjacency.get(b).into_iter().flatten() {
                    out.push(a, sub, c);
                }
            }
        }
    }

    fn class_membership(&self, out: &mut Derived) {
        let supers = self.adjacency(vocab::RDFS_SUB_CLASS_OF);
        for (instance, class) in self.pairs(vocab::RDF_TYPE) {
            for super_class in supers.get(class).into_iter().flatten() {
                out.push(instance, vocab::RDF_TYPE, super_class);
            }
        }
    }

    fn sub_properties(&self, out: &mut Derived) {
        let supers = self.adjacency(vocab::RDFS_SUB_PROPERTY_OF);
        for (property, super_properties) in &supers {
            let Some(property) = iri(property) else {
                continue;
            };
            for (s, o) in self.pairs(property) {
                for super_property in super_properties {
                    if let Some(super_property) = iri(super_property) {
                        out.push(s, super_property, o);
                    }
                }
            }
        }
    }

    fn inverses(&self, out: &mut Derived) {
        for (p, q) in self.pairs(vocab::OWL_INVERSE_OF) {
            out.push(q, vocab::OWL_INVERSE_OF, p);
            let (Some(p), Some(q)) = (iri(p), iri(q)) else {
                continue;
            };
            for (s, o) in self.pairs(p) {
                out.push(o, q, s);
            }
        }
    }

    fn domains_and_ranges(&self, out: &mut Derived) {
        for (property, class) in self.pairs(vocab::RDFS_DOMAIN) {
            let Some(property) = iri(property) else {
                continue;
            };
            for (s, _) in self.pairs(property) {
                out.push(s, vocab::RDF_TYPE, class);
            }
        }
        for (property, class) in self.pairs(vocab::RDFS_RANGE) {
            let Some(property) = iri(property) else {
                continue;
            };
            for (_, o) in self.pairs(property) {
                out.push(o, vocab::RDF_TYPE, class);
            }
        }
    }

    /// Characteristics carried across property equivalence and inversion.
    fn property_characteristics(&self, out: &mut Derived) {
        let characteristics = [
            vocab::OWL_FUNCTIONAL_PROPERTY,
            vocab::OWL_INVERSE_FUNCTIONAL_PROPERTY,
            vocab::OWL_SYMMETRIC_PROPERTY,
            vocab::OWL_TRANSITIVE_PROPERTY,
        ];
        let typed: Vec<(&str, HashSet<&Term>)> = characteristics
            .iter()
            .map(|characteristic| (*characteristic, self.typed(characteristic)))
            .collect();

        for (p, q) in self.pairs(vocab::OWL_EQUIVALENT_PROPERTY) {
            for (characteristic, members) in &typed {
                if members.contains(q) {
                    out.push(p, vocab::RDF_TYPE, &named(characteristic));
                }
            }
        }

        for (p, q) in self.pairs(vocab::OWL_INVERSE_OF) {
            for (characteristic, members) in &typed {
                if !members.contains(q) {
                    continue;
                }
                let mirrored = match *characteristic {
                    vocab::OWL_FUNCTIONAL_PROPERTY => vocab::OWL_INVERSE_FUNCTIONAL_PROPERTY,
                    vocab::OWL_INVERSE_FUNCTIONAL_PROPERTY => vocab::OWL_FUNCTIONAL_PROPERTY,
                    other => other,
                };
                out.push(p, vocab::RDF_TYPE, &named(mirrored));
            }
        }
    }

    fn symmetric_and_transitive(&self, out: &mut Derived) {
        for property in self.typed(vocab::OWL_SYMMETRIC_PROPERTY) {
            let Some(property) = iri(property) else {
                continue;
            };
            for (s, o) in self.pairs(property) {
                out.push(o, property, s);
            }
        }
        for property in self.typed(vocab::OWL_TRANSITIVE_PROPERTY) {
            let Some(property) = iri(property) else {
                continue;
            };
            let adjacency = self.adjacency(property);
            for (a, b) in self.pairs(property) {
                for c in adjacency.get(b).into_iter().flatten() {
                    out.push(a, property, c);
                }
            }
        }
    }
}

#[derive(Default)]
struct Derived {
    triples: Vec<Triple>,
}

impl Derived {
    /// Queue `s p o`, skipping literal subjects and reflexive statements of
    /// the symmetric vocabulary.
    fn push(&mut self, subject: &Term, predicate: &str, object: &Term) {
        let subject = match subject {
            Term::NamedNode(node) => NamedOrBlankNode::from(node.clone()),
            Term::BlankNode(node) => NamedOrBlankNode::from(node.clone()),
            _ => return,
        };
        if subject_is(&subject, object) && is_reflexive_noise(predicate) {
            return;
        }
        let Ok(predicate) = NamedNode::new(predicate) else {
            return;
        };
        self.triples.push(Triple::new(subject, predicate, object.clone()));
    }
}

fn subject_is(subject: &NamedOrBlankNode, object: &Term) -> bool {
    match (subject, object) {
        (NamedOrBlankNode::NamedNode(a), Term::NamedNode(b)) => a == b,
        (NamedOrBlankNode::BlankNode(a), Term::BlankNode(b)) => a == b,
        _ => false,
    }
}

fn is_reflexive_noise(predicate: &str) -> bool {
    matches!(
        predicate,
        vocab::RDFS_SUB_CLASS_OF
            | vocab::RDFS_SUB_PROPERTY_OF
            | vocab::OWL_EQUIVALENT_CLASS
            | vocab::OWL_EQUIVALENT_PROPERTY
            | vocab::OWL_SAME_AS
    )
}

fn iri(term: &Term) -> Option<&str> {
    match term {
        Term::NamedNode(node) => Some(node.as_str()),
        _ => None,
    }
}

fn named(iri: &str) -> Term {
    Term::NamedNode(NamedNode::new_unchecked(iri))
}
