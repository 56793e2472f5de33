//! Structural OWL profile checks, run before any reasoning.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
    str::FromStr,
};

use oxigraph::model::{Term, Triple};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vgraph_domain::{document::subject_iri, vocab};

use crate::UnknownProfile;

const PROFILE_NS: &str = "http://www.w3.org/ns/owl-profile/";

/// Required OWL profile, identified by its W3C profile IRI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    #[default]
    Dl,
    El,
    Full,
}

impl Profile {
    pub fn iri(&self) -> &'static str {
        match self {
            Profile::Dl => "http://www.w3.org/ns/owl-profile/DL",
            Profile::El => "http://www.w3.org/ns/owl-profile/EL",
            Profile::Full => "http://www.w3.org/ns/owl-profile/Full",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Dl => "DL",
            Profile::El => "EL",
            Profile::Full => "Full",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = UnknownProfile;

    /// Accepts the full profile IRI or its local name.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let local = value.strip_prefix(PROFILE_NS).unwrap_or(value);
        match local {
            "DL" => Ok(Profile::Dl),
            "EL" => Ok(Profile::El),
            "Full" => Ok(Profile::Full),
            _ => Err(UnknownProfile(value.to_string())),
        }
    }
}

impl Serialize for Profile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.iri())
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnresolvedImport,
    NonIriImport,
    LiteralType,
    MultipleOntologyHeaders,
    MultipleVersionIris,
    ObjectPropertyWithLiteral,
    DataPropertyWithResource,
    UnsupportedConstruct,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ProfileViolation {
    pub kind: ViolationKind,
    /// Offending entity, when it has an IRI.
    pub subject: Option<String>,
    pub detail: String,
}

/// Every violation found by one profile check, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileReport {
    pub profile: Profile,
    pub violations: Vec<ProfileViolation>,
}

impl ProfileReport {
    pub fn is_satisfied(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary(&self) -> String {
        match self.violations.as_slice() {
            [] => "no violations".to_string(),
            [only] => only.detail.clone(),
            [first, rest @ ..] => format!("{} (and {} more)", first.detail, rest.len()),
        }
    }
}

struct Collector {
    violations: BTreeSet<ProfileViolation>,
}

impl Collector {
    fn push(&mut self, kind: ViolationKind, subject: Option<&str>, detail: String) {
        self.violations.insert(ProfileViolation {
            kind,
            subject: subject.map(str::to_string),
            detail,
        });
    }
}

/// Check a document against a profile.
///
/// `document` holds the document's own statements and `import_closure` the
/// statements of everything it imports; declarations are looked up in both,
/// while header and construct rules apply to the document alone.
pub fn check_profile(
    profile: Profile,
    document: &HashSet<Triple>,
    import_closure: &HashSet<Triple>,
    unresolved_imports: &[String],
) -> ProfileReport {
    let mut collector = Collector {
        violations: BTreeSet::new(),
    };

    for target in unresolved_imports {
        collector.push(
            ViolationKind::UnresolvedImport,
            Some(target),
            format!("Imported document {target} is not loaded"),
        );
    }

    for triple in document.iter().filter(|t| t.predicate.as_str() == vocab::OWL_IMPORTS) {
        if !matches!(triple.object, Term::NamedNode(_)) {
            collector.push(
                ViolationKind::NonIriImport,
                subject_iri(&triple.subject),
                format!("Import target {} is not an IRI", triple.object),
            );
        }
    }

    if profile != Profile::Full {
        check_structure(&mut collector, document, import_closure);
    }
    if profile == Profile::El {
        check_el_constructs(&mut collector, document);
    }

    ProfileReport {
        profile,
        violations: collector.violations.into_iter().collect(),
    }
}

fn check_structure(
    collector: &mut Collector,
    document: &HashSet<Triple>,
    import_closure: &HashSet<Triple>,
) {
    let mut headers = BTreeSet::new();
    let mut version_iris: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut object_properties = HashSet::new();
    let mut data_properties = HashSet::new();

    for triple in document.iter().chain(import_closure.iter()) {
        if triple.predicate.as_str() != vocab::RDF_TYPE {
            continue;
        }
        match &triple.object {
            Term::NamedNode(class) if class.as_str() == vocab::OWL_OBJECT_PROPERTY => {
                object_properties.extend(subject_iri(&triple.subject).map(str::to_string));
            }
            Term::NamedNode(class) if class.as_str() == vocab::OWL_DATATYPE_PROPERTY => {
                data_properties.extend(subject_iri(&triple.subject).map(str::to_string));
            }
            _ => {}
        }
    }

    for triple in document {
        let subject = subject_iri(&triple.subject);
        let predicate = triple.predicate.as_str();

        if predicate == vocab::RDF_TYPE {
            match &triple.object {
                Term::Literal(literal) => collector.push(
                    ViolationKind::LiteralType,
                    subject,
                    format!("{} is typed with the literal {literal}", triple.subject),
                ),
                Term::NamedNode(class) if class.as_str() == vocab::OWL_ONTOLOGY => {
                    headers.insert(triple.subject.to_string());
                }
                _ => {}
            }
        }

        if predicate == vocab::OWL_VERSION_IRI {
            version_iris
                .entry(triple.subject.to_string())
                .or_default()
                .insert(triple.object.to_string());
        }

        match &triple.object {
            Term::Literal(literal) if object_properties.contains(predicate) => collector.push(
                ViolationKind::ObjectPropertyWithLiteral,
                Some(predicate),
                format!("Object property {predicate} used with literal {literal}"),
            ),
            Term::NamedNode(_) | Term::BlankNode(_) if data_properties.contains(predicate) => {
                collector.push(
                    ViolationKind::DataPropertyWithResource,
                    Some(predicate),
                    format!("Data property {predicate} used with resource {}", triple.object),
                )
            }
            _ => {}
        }
    }

    if headers.len() > 1 {
        let listed = headers.iter().cloned().collect::<Vec<_>>().join(", ");
        collector.push(
            ViolationKind::MultipleOntologyHeaders,
            None,
            format!("Document declares {} ontology headers: {listed}", headers.len()),
        );
    }
    for (header, versions) in version_iris {
        if versions.len() > 1 {
            collector.push(
                ViolationKind::MultipleVersionIris,
                None,
                format!("{header} declares {} version IRIs", versions.len()),
            );
        }
    }
}

const EL_FORBIDDEN_PREDICATES: &[&str] = &[
    vocab::OWL_UNION_OF,
    vocab::OWL_COMPLEMENT_OF,
    vocab::OWL_ALL_VALUES_FROM,
    vocab::OWL_CARDINALITY,
    vocab::OWL_MIN_CARDINALITY,
    vocab::OWL_MAX_CARDINALITY,
    vocab::OWL_QUALIFIED_CARDINALITY,
    vocab::OWL_MIN_QUALIFIED_CARDINALITY,
    vocab::OWL_MAX_QUALIFIED_CARDINALITY,
    vocab::OWL_INVERSE_OF,
];

const EL_FORBIDDEN_TYPES: &[&str] = &[
    vocab::OWL_SYMMETRIC_PROPERTY,
    vocab::OWL_INVERSE_FUNCTIONAL_PROPERTY,
];

fn check_el_constructs(collector: &mut Collector, document: &HashSet<Triple>) {
    for triple in document {
        let predicate = triple.predicate.as_str();
        if EL_FORBIDDEN_PREDICATES.contains(&predicate) {
            collector.push(
                ViolationKind::UnsupportedConstruct,
                subject_iri(&triple.subject),
                format!("{predicate} is not allowed in OWL EL"),
            );
        }
        if predicate == vocab::RDF_TYPE
            && let Term::NamedNode(class) = &triple.object
            && EL_FORBIDDEN_TYPES.contains(&class.as_str())
        {
            collector.push(
                ViolationKind::UnsupportedConstruct,
                subject_iri(&triple.subject),
                format!("{} declarations are not allowed in OWL EL", class.as_str()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use oxigraph::model::{Literal, NamedNode};

    use super::*;

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(value).unwrap()
    }

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(iri(s), iri(p), iri(o))
    }

    fn kinds(report: &ProfileReport) -> Vec<ViolationKind> {
        report.violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn parses_profile_iris_and_names() {
        assert_eq!("http://www.w3.org/ns/owl-profile/EL".parse::<Profile>().unwrap(), Profile::El);
        assert_eq!("DL".parse::<Profile>().unwrap(), Profile::Dl);
        assert!("http://www.w3.org/ns/owl-profile/QL".parse::<Profile>().is_err());
        assert_eq!(
            serde_json::to_string(&Profile::Full).unwrap(),
            "\"http://www.w3.org/ns/owl-profile/Full\""
        );
    }

    #[test]
    fn clean_document_satisfies_dl() {
        let document: HashSet<Triple> = [
            triple("http://ex.org/o", vocab::RDF_TYPE, vocab::OWL_ONTOLOGY),
            triple("http://ex.org/A", vocab::RDFS_SUB_CLASS_OF, "http://ex.org/B"),
        ]
        .into_iter()
        .collect();
        let report = check_profile(Profile::Dl, &document, &HashSet::new(), &[]);
        assert!(report.is_satisfied(), "{report:?}");
    }

    #[test]
    fn unresolved_imports_fail_every_profile() {
        for profile in [Profile::Dl, Profile::El, Profile::Full] {
            let report = check_profile(
                profile,
                &HashSet::new(),
                &HashSet::new(),
                &["http://ex.org/missing".to_string()],
            );
            assert_eq!(kinds(&report), vec![ViolationKind::UnresolvedImport]);
        }
    }

    #[test]
    fn property_kinds_are_checked_against_import_declarations() {
        let imports: HashSet<Triple> = [
            triple("http://ex.org/knows", vocab::RDF_TYPE, vocab::OWL_OBJECT_PROPERTY),
            triple("http://ex.org/age", vocab::RDF_TYPE, vocab::OWL_DATATYPE_PROPERTY),
        ]
        .into_iter()
        .collect();
        let document: HashSet<Triple> = [
            Triple::new(iri("http://ex.org/a"), iri("http://ex.org/knows"), Literal::new_simple_literal("bob")),
            triple("http://ex.org/a", "http://ex.org/age", "http://ex.org/b"),
        ]
        .into_iter()
        .collect();

        let report = check_profile(Profile::Dl, &document, &imports, &[]);
        assert_eq!(
            kinds(&report),
            vec![ViolationKind::ObjectPropertyWithLiteral, ViolationKind::DataPropertyWithResource]
        );
        assert!(check_profile(Profile::Full, &document, &imports, &[]).is_satisfied());
    }

    #[test]
    fn multiple_headers_and_versions_are_flagged() {
        let document: HashSet<Triple> = [
            triple("http://ex.org/o1", vocab::RDF_TYPE, vocab::OWL_ONTOLOGY),
            triple("http://ex.org/o2", vocab::RDF_TYPE, vocab::OWL_ONTOLOGY),
            triple("http://ex.org/o1", vocab::OWL_VERSION_IRI, "http://ex.org/o1:v1"),
            triple("http://ex.org/o1", vocab::OWL_VERSION_IRI, "http://ex.org/o1:v2"),
        ]
        .into_iter()
        .collect();
        let report = check_profile(Profile::Dl, &document, &HashSet::new(), &[]);
        assert_eq!(
            kinds(&report),
            vec![ViolationKind::MultipleOntologyHeaders, ViolationKind::MultipleVersionIris]
        );
    }

    #[test]
    fn el_rejects_disjunction_and_symmetry() {
        let document: HashSet<Triple> = [
            triple("http://ex.org/C", vocab::OWL_UNION_OF, vocab::RDF_TYPE),
            triple("http://ex.org/p", vocab::RDF_TYPE, vocab::OWL_SYMMETRIC_PROPERTY),
        ]
        .into_iter()
        .collect();
        let el = check_profile(Profile::El, &document, &HashSet::new(), &[]);
        assert_eq!(el.violations.len(), 2);
        assert!(check_profile(Profile::Dl, &document, &HashSet::new(), &[]).is_satisfied());
    }
}
