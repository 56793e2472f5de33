use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    time::Instant,
};

use oxigraph::model::{Term, Triple};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use vgraph_domain::{DocumentIdentity, GraphDocument, vocab};
use vgraph_observability as observability;

use crate::{Closure, ConsistencyError, Profile, check_profile};

/// Input of one consistency check.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub document: GraphDocument,
    /// Loaded import closure (asserted plus inferred graphs of each import).
    pub imports: Vec<GraphDocument>,
    /// Import targets with no current version in any management graph.
    pub unresolved_imports: Vec<String>,
    pub profile: Profile,
}

impl CheckRequest {
    fn import_statements(&self) -> HashSet<Triple> {
        self.imports
            .iter()
            .flat_map(|import| import.statements().iter().cloned())
            .collect()
    }
}

/// Outcome of a successful check: the document's asserted statements and
/// their closure, ready for inference.
#[derive(Debug, Clone)]
pub struct ReasonerHandle {
    identity: DocumentIdentity,
    profile: Profile,
    asserted: HashSet<Triple>,
    closure: Closure,
}

impl ReasonerHandle {
    pub fn identity(&self) -> &DocumentIdentity {
        &self.identity
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Statements asserted by the document or anything it imports.
    pub fn asserted(&self) -> &HashSet<Triple> {
        &self.asserted
    }

    pub fn closure(&self) -> &Closure {
        &self.closure
    }
}

/// Consistency checker seam.
///
/// Implementations run the cheap profile check first and must not reason
/// over a document that violates its profile. `check` is synchronous and
/// CPU bound; callers run it off the async runtime and cancel through the
/// token.
pub trait ConsistencyEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(
        &self,
        request: &CheckRequest,
        cancel: &CancellationToken,
    ) -> Result<ReasonerHandle, ConsistencyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyKind {
    NothingMember,
    DisjointClasses,
    SameAndDifferent,
    FunctionalPropertyConflict,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Inconsistency {
    pub kind: InconsistencyKind,
    pub subject: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InconsistencyReport {
    pub violations: Vec<Inconsistency>,
}

impl InconsistencyReport {
    pub fn summary(&self) -> String {
        match self.violations.as_slice() {
            [] => "no contradictions".to_string(),
            [only] => only.detail.clone(),
            [first, rest @ ..] => format!("{} (and {} more)", first.detail, rest.len()),
        }
    }
}

/// Default engine: profile check, then a rule closure, then contradiction
/// rules over the closure.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleConsistencyEngine;

impl ConsistencyEngine for RuleConsistencyEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn check(
        &self,
        request: &CheckRequest,
        cancel: &CancellationToken,
    ) -> Result<ReasonerHandle, ConsistencyError> {
        let started = Instant::now();
        let result = self.run(request, cancel);
        let outcome = match &result {
            Ok(_) => "consistent",
            Err(error) => error.outcome(),
        };
        observability::record_reasoning_check(request.profile.name(), outcome, started.elapsed());

        match &result {
            Ok(handle) => tracing::debug!(
                document = %request.document.identity(),
                profile = %request.profile,
                asserted = handle.closure.asserted_count(),
                entailed = handle.closure.entailed_count(),
                rounds = handle.closure.rounds(),
                "Document is consistent"
            ),
            Err(error) => tracing::debug!(
                document = %request.document.identity(),
                profile = %request.profile,
                error = %error,
                "Consistency check rejected document"
            ),
        }
        result
    }
}

impl RuleConsistencyEngine {
    fn run(
        &self,
        request: &CheckRequest,
        cancel: &CancellationToken,
    ) -> Result<ReasonerHandle, ConsistencyError> {
        let imports = request.import_statements();
        let report = check_profile(
            request.profile,
            request.document.statements(),
            &imports,
            &request.unresolved_imports,
        );
        if !report.is_satisfied() {
            return Err(ConsistencyError::ProfileViolation(report));
        }

        let mut asserted = imports;
        asserted.extend(request.document.statements().iter().cloned());

        let closure = Closure::compute(asserted.iter().cloned(), cancel)?;
        observability::record_reasoning_closure_size(
            closure.asserted_count(),
            closure.entailed_count(),
            closure.rounds(),
        );

        if cancel.is_cancelled() {
            return Err(ConsistencyError::Cancelled);
        }
        let report = find_contradictions(&closure);
        if !report.violations.is_empty() {
            return Err(ConsistencyError::Inconsistent(report));
        }

        Ok(ReasonerHandle {
            identity: request.document.identity().clone(),
            profile: request.profile,
            asserted,
            closure,
        })
    }
}

fn find_contradictions(closure: &Closure) -> InconsistencyReport {
    let mut violations = BTreeSet::new();

    let mut types: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (instance, class) in closure.pairs(vocab::RDF_TYPE) {
        if let Term::NamedNode(class) = class {
            types
                .entry(instance.to_string())
                .or_default()
                .insert(class.as_str().to_string());
        }
    }

    for (instance, classes) in &types {
        if classes.contains(vocab::OWL_NOTHING) {
            violations.insert(Inconsistency {
                kind: InconsistencyKind::NothingMember,
                subject: instance.clone(),
                detail: format!("{instance} is an instance of owl:Nothing"),
            });
        }
    }

    for (a, b) in closure.pairs(vocab::OWL_DISJOINT_WITH) {
        let (Term::NamedNode(a), Term::NamedNode(b)) = (&a, b) else {
            continue;
        };
        // disjointWith is symmetric in the closure; report each pair once
        if a.as_str() > b.as_str() {
            continue;
        }
        for (instance, classes) in &types {
            if classes.contains(a.as_str()) && classes.contains(b.as_str()) {
                violations.insert(Inconsistency {
                    kind: InconsistencyKind::DisjointClasses,
                    subject: instance.clone(),
                    detail: format!("{instance} is an instance of disjoint classes {a} and {b}"),
                });
            }
        }
    }

    let same: HashSet<(String, String)> = closure
        .pairs(vocab::OWL_SAME_AS)
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    for (a, b) in closure.pairs(vocab::OWL_DIFFERENT_FROM) {
        let pair = (a.to_string(), b.to_string());
        if pair.0 == pair.1 || same.contains(&pair) {
            violations.insert(Inconsistency {
                kind: InconsistencyKind::SameAndDifferent,
                subject: pair.0.clone(),
                detail: format!("{} is both the same as and different from {}", pair.0, pair.1),
            });
        }
    }

    for property in closure
        .pairs(vocab::RDF_TYPE)
        .filter(|(_, class)| matches!(class, Term::NamedNode(c) if c.as_str() == vocab::OWL_FUNCTIONAL_PROPERTY))
        .filter_map(|(property, _)| match property {
            Term::NamedNode(property) => Some(property),
            _ => None,
        })
    {
        let mut values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (subject, value) in closure.pairs(property.as_str()) {
            if let Term::Literal(literal) = value {
                values
                    .entry(subject.to_string())
                    .or_default()
                    .insert(literal.to_string());
            }
        }
        for (subject, literals) in values {
            if literals.len() > 1 {
                let listed = literals.into_iter().collect::<Vec<_>>().join(", ");
                violations.insert(Inconsistency {
                    kind: InconsistencyKind::FunctionalPropertyConflict,
                    subject: subject.clone(),
                    detail: format!(
                        "Functional property {property} has several values for {subject}: {listed}"
                    ),
                });
            }
        }
    }

    InconsistencyReport {
        violations: violations.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use oxigraph::model::{Literal, NamedNode};

    use super::*;
    use crate::ViolationKind;

    fn node(value: &str) -> NamedNode {
        NamedNode::new(value).unwrap()
    }

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(node(s), node(p), node(o))
    }

    fn request(statements: Vec<Triple>, profile: Profile) -> CheckRequest {
        let identity = DocumentIdentity::new("http://ex.org/doc", "http://ex.org/doc:version:1").unwrap();
        CheckRequest {
            document: GraphDocument::new(identity, statements.into_iter().collect()),
            imports: Vec::new(),
            unresolved_imports: Vec::new(),
            profile,
        }
    }

    fn check(request: &CheckRequest) -> Result<ReasonerHandle, ConsistencyError> {
        RuleConsistencyEngine.check(request, &CancellationToken::new())
    }

    fn inconsistency_kinds(result: Result<ReasonerHandle, ConsistencyError>) -> Vec<InconsistencyKind> {
        match result {
            Err(ConsistencyError::Inconsistent(report)) => {
                report.violations.into_iter().map(|v| v.kind).collect()
            }
            other => panic!("expected inconsistency, got {other:?}"),
        }
    }

    #[test]
    fn consistent_document_yields_handle() {
        let handle = check(&request(
            vec![
                triple("http://ex.org/A", vocab::RDFS_SUB_CLASS_OF, "http://ex.org/B"),
                triple("http://ex.org/x", vocab::RDF_TYPE, "http://ex.org/A"),
            ],
            Profile::Dl,
        ))
        .unwrap();
        assert_eq!(handle.asserted().len(), 2);
        assert!(handle.closure().contains(&triple("http://ex.org/x", vocab::RDF_TYPE, "http://ex.org/B")));
    }

    #[test]
    fn disjoint_membership_is_inconsistent() {
        let result = check(&request(
            vec![
                triple("http://ex.org/Cat", vocab::OWL_DISJOINT_WITH, "http://ex.org/Dog"),
                triple("http://ex.org/Kitten", vocab::RDFS_SUB_CLASS_OF, "http://ex.org/Cat"),
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Kitten"),
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Dog"),
            ],
            Profile::Dl,
        ));
        assert_eq!(inconsistency_kinds(result), vec![InconsistencyKind::DisjointClasses]);
    }

    #[test]
    fn nothing_membership_is_inconsistent() {
        let result = check(&request(
            vec![
                triple("http://ex.org/Empty", vocab::RDFS_SUB_CLASS_OF, vocab::OWL_NOTHING),
                triple("http://ex.org/x", vocab::RDF_TYPE, "http://ex.org/Empty"),
            ],
            Profile::Dl,
        ));
        assert_eq!(inconsistency_kinds(result), vec![InconsistencyKind::NothingMember]);
    }

    #[test]
    fn same_and_different_is_inconsistent() {
        let result = check(&request(
            vec![
                triple("http://ex.org/a", vocab::OWL_SAME_AS, "http://ex.org/b"),
                triple("http://ex.org/b", vocab::OWL_DIFFERENT_FROM, "http://ex.org/a"),
            ],
            Profile::Dl,
        ));
        assert!(inconsistency_kinds(result).contains(&InconsistencyKind::SameAndDifferent));
    }

    #[test]
    fn functional_property_with_two_values_is_inconsistent() {
        let result = check(&request(
            vec![
                triple("http://ex.org/age", vocab::RDF_TYPE, vocab::OWL_FUNCTIONAL_PROPERTY),
                Triple::new(node("http://ex.org/a"), node("http://ex.org/age"), Literal::new_simple_literal("3")),
                Triple::new(node("http://ex.org/a"), node("http://ex.org/age"), Literal::new_simple_literal("4")),
            ],
            Profile::Dl,
        ));
        assert_eq!(inconsistency_kinds(result), vec![InconsistencyKind::FunctionalPropertyConflict]);
    }

    #[test]
    fn profile_violation_short_circuits_reasoning() {
        let mut request = request(
            vec![
                triple("http://ex.org/Cat", vocab::OWL_DISJOINT_WITH, "http://ex.org/Dog"),
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Cat"),
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Dog"),
            ],
            Profile::Dl,
        );
        request.unresolved_imports.push("http://ex.org/missing".to_string());
        match check(&request) {
            Err(ConsistencyError::ProfileViolation(report)) => {
                assert_eq!(report.violations[0].kind, ViolationKind::UnresolvedImport);
            }
            other => panic!("expected profile violation, got {other:?}"),
        }
    }

    #[test]
    fn imports_contribute_axioms() {
        let schema_identity =
            DocumentIdentity::new("http://ex.org/schema", "http://ex.org/schema:version:1").unwrap();
        let mut request = request(
            vec![
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Cat"),
                triple("http://ex.org/rex", vocab::RDF_TYPE, "http://ex.org/Dog"),
            ],
            Profile::Dl,
        );
        request.imports.push(GraphDocument::new(
            schema_identity,
            [triple("http://ex.org/Cat", vocab::OWL_DISJOINT_WITH, "http://ex.org/Dog")]
                .into_iter()
                .collect(),
        ));
        assert_eq!(inconsistency_kinds(check(&request)), vec![InconsistencyKind::DisjointClasses]);
    }

    #[test]
    fn cancelled_check_reports_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = RuleConsistencyEngine.check(&request(Vec::new(), Profile::Full), &token);
        assert!(matches!(result, Err(ConsistencyError::Cancelled)));
    }
}
