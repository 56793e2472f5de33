use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use oxigraph::model::{NamedNode, NamedOrBlankNode, Term, Triple};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use vgraph_domain::{
    DocumentIdentity, GraphDocument,
    document::{object_iri, subject_iri},
    vocab,
};
use vgraph_triple_store::{
    ManagementGraph, RdfFormat, TripleStoreManager, error::TripleStoreError, rdf,
};

const SCRATCH_PREFIX: &str = "urn:vgraph:scratch:";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// IRI prefixes marking client-side identifiers that get promoted on load.
    pub temporary_prefixes: Vec<String>,
    /// Namespace of promoted identifiers (`{namespace}{uuid}`).
    pub artifact_namespace: String,
    /// Prefix of inferred graph IRIs (`{prefix}{version_iri}`).
    pub inferred_prefix: String,
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("{0}")]
    Parse(String),

    #[error("Unsupported serialization format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Promotion(String),

    #[error("{0}")]
    Empty(String),

    #[error(transparent)]
    Store(#[from] TripleStoreError),
}

/// An import that resolved to the current version of a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedImport {
    /// Import target as written before resolution.
    pub target: String,
    pub graph: ManagementGraph,
    /// Current identity of the imported document, inferred IRI included.
    pub identity: DocumentIdentity,
}

/// Outcome of [`DocumentLoader::load`]: a promoted, restamped document with
/// its imports resolved against the management graphs.
#[derive(Debug, Clone)]
pub(crate) struct LoadedDocument {
    pub document: GraphDocument,
    pub imports: Vec<ResolvedImport>,
    pub unresolved_imports: Vec<String>,
    pub promoted: usize,
}

/// Isolated scratch graph a payload is parsed into before promotion.
#[derive(Debug)]
struct Workspace {
    id: String,
    statements: HashSet<Triple>,
}

impl Workspace {
    fn new(statements: HashSet<Triple>) -> Self {
        Self {
            id: format!("{SCRATCH_PREFIX}{}", Uuid::new_v4()),
            statements,
        }
    }
}

pub(crate) struct DocumentLoader {
    triple_store: Arc<TripleStoreManager>,
    config: LoaderConfig,
}

impl DocumentLoader {
    pub(crate) fn new(triple_store: Arc<TripleStoreManager>, config: LoaderConfig) -> Self {
        Self {
            triple_store,
            config,
        }
    }

    /// Parses a payload into a workspace, promotes temporary identifiers,
    /// settles the document identity and resolves imports.
    ///
    /// A `supplied` identity wins over the document's own header.
    pub(crate) async fn load(
        &self,
        data: &[u8],
        format: &str,
        supplied: Option<DocumentIdentity>,
    ) -> Result<LoadedDocument, LoaderError> {
        let mut workspace = self.parse_into_workspace(data, format)?;
        let promoted = self.promote(&mut workspace)?;

        let identity = match supplied {
            Some(identity) => identity.asserted(),
            None => header_identity(&workspace.statements)?,
        };
        let mut statements = workspace.statements;
        restamp(&mut statements, &identity)?;

        let (imports, unresolved_imports) = self.resolve_imports(&mut statements).await?;

        tracing::debug!(
            workspace = %workspace.id,
            document = %identity,
            statements = statements.len(),
            promoted,
            imports = imports.len(),
            unresolved = unresolved_imports.len(),
            "Document loaded"
        );

        Ok(LoadedDocument {
            document: GraphDocument::new(identity, statements),
            imports,
            unresolved_imports,
            promoted,
        })
    }

    /// Parses and promotes an edit fragment. No identity handling.
    pub(crate) fn parse_fragment(
        &self,
        data: &[u8],
        format: &str,
    ) -> Result<HashSet<Triple>, LoaderError> {
        let mut workspace = self.parse_into_workspace(data, format)?;
        self.promote(&mut workspace)?;
        Ok(workspace.statements)
    }

    /// Points every `owl:imports` target at the current version of the
    /// imported document. Targets with no current version stay as written
    /// and are returned as unresolved.
    pub(crate) async fn resolve_imports(
        &self,
        statements: &mut HashSet<Triple>,
    ) -> Result<(Vec<ResolvedImport>, Vec<String>), LoaderError> {
        let import_statements: Vec<Triple> = statements
            .iter()
            .filter(|triple| triple.predicate.as_str() == vocab::OWL_IMPORTS)
            .cloned()
            .collect();

        let mut resolved: BTreeMap<String, ResolvedImport> = BTreeMap::new();
        let mut unresolved = BTreeSet::new();

        for statement in import_statements {
            let Some(target) = object_iri(&statement.object).map(str::to_string) else {
                continue;
            };

            let import = match resolved.get(&target) {
                Some(import) => import.clone(),
                None => match self.triple_store.resolve_import_target(&target).await? {
                    Some((graph, identity)) => {
                        let import = ResolvedImport {
                            target: target.clone(),
                            graph,
                            identity,
                        };
                        resolved.insert(target.clone(), import.clone());
                        import
                    }
                    None => {
                        unresolved.insert(target);
                        continue;
                    }
                },
            };

            let current = import.identity.version_iri();
            if current != target {
                let rewritten = Triple::new(
                    statement.subject.clone(),
                    statement.predicate.clone(),
                    named(current)?,
                );
                statements.remove(&statement);
                statements.insert(rewritten);
            }
        }

        Ok((resolved.into_values().collect(), unresolved.into_iter().collect()))
    }

    fn parse_into_workspace(&self, data: &[u8], format: &str) -> Result<Workspace, LoaderError> {
        let format = parse_format(format)?;
        let statements: HashSet<Triple> = rdf::parse_triples(data, format)
            .map_err(LoaderError::Parse)?
            .into_iter()
            .collect();
        if statements.is_empty() {
            return Err(LoaderError::Empty(
                "no statements found in payload".to_string(),
            ));
        }
        Ok(Workspace::new(statements))
    }

    /// Rewrites every temporary IRI to `{artifact_namespace}{uuid}`.
    ///
    /// The full old-to-new mapping is built and validated first; the
    /// workspace is replaced only once every statement has been rewritten.
    fn promote(&self, workspace: &mut Workspace) -> Result<usize, LoaderError> {
        let temporary: BTreeSet<&str> = workspace
            .statements
            .iter()
            .flat_map(statement_iris)
            .filter(|iri| self.is_temporary(iri))
            .collect();
        if temporary.is_empty() {
            return Ok(0);
        }

        let mut mapping: BTreeMap<String, NamedNode> = BTreeMap::new();
        let mut issued = HashSet::new();
        for old in temporary {
            let new = NamedNode::new(format!("{}{}", self.config.artifact_namespace, Uuid::new_v4()))
                .map_err(|error| {
                    LoaderError::Promotion(format!("cannot mint identifier for <{old}>: {error}"))
                })?;
            if !issued.insert(new.clone()) {
                return Err(LoaderError::Promotion(format!(
                    "identifier collision while promoting <{old}>"
                )));
            }
            mapping.insert(old.to_string(), new);
        }

        let rewritten: HashSet<Triple> = workspace
            .statements
            .iter()
            .map(|triple| rewrite(triple, &mapping))
            .collect();
        if rewritten.len() != workspace.statements.len() {
            return Err(LoaderError::Promotion(
                "promotion merged distinct statements".to_string(),
            ));
        }

        tracing::trace!(
            workspace = %workspace.id,
            promoted = mapping.len(),
            "Promoted temporary identifiers"
        );
        workspace.statements = rewritten;
        Ok(mapping.len())
    }

    fn is_temporary(&self, iri: &str) -> bool {
        self.config
            .temporary_prefixes
            .iter()
            .any(|prefix| iri.starts_with(prefix.as_str()))
    }
}

pub(crate) fn parse_format(format: &str) -> Result<RdfFormat, LoaderError> {
    rdf::resolve_format(format).map_err(|_| LoaderError::UnsupportedFormat(format.to_string()))
}

/// Makes the header of `identity` the one carrying the version: exactly one
/// `owl:versionIRI` on the document IRI, typed `owl:Ontology`.
pub(crate) fn restamp(
    statements: &mut HashSet<Triple>,
    identity: &DocumentIdentity,
) -> Result<(), LoaderError> {
    let document = named(identity.document_iri())?;
    let version = named(identity.version_iri())?;

    statements.retain(|triple| {
        !(triple.predicate.as_str() == vocab::OWL_VERSION_IRI
            && subject_iri(&triple.subject) == Some(document.as_str()))
    });
    statements.insert(Triple::new(
        document.clone(),
        named(vocab::RDF_TYPE)?,
        named(vocab::OWL_ONTOLOGY)?,
    ));
    statements.insert(Triple::new(document, named(vocab::OWL_VERSION_IRI)?, version));
    Ok(())
}

/// Identity declared by the document itself. Several headers resolve to the
/// lexicographically first; a missing version IRI defaults to
/// `{document}:version:1`.
fn header_identity(statements: &HashSet<Triple>) -> Result<DocumentIdentity, LoaderError> {
    let document_iri = statements
        .iter()
        .filter(|triple| {
            triple.predicate.as_str() == vocab::RDF_TYPE
                && object_iri(&triple.object) == Some(vocab::OWL_ONTOLOGY)
        })
        .filter_map(|triple| subject_iri(&triple.subject))
        .min()
        .ok_or_else(|| {
            LoaderError::Empty("document has no owl:Ontology header naming its IRI".to_string())
        })?;

    let version_iri = statements
        .iter()
        .filter(|triple| {
            triple.predicate.as_str() == vocab::OWL_VERSION_IRI
                && subject_iri(&triple.subject) == Some(document_iri)
        })
        .filter_map(|triple| object_iri(&triple.object))
        .min()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{document_iri}:version:1"));

    DocumentIdentity::new(document_iri, version_iri)
        .map_err(|error| LoaderError::Empty(error.to_string()))
}

fn statement_iris(triple: &Triple) -> impl Iterator<Item = &str> {
    [
        subject_iri(&triple.subject),
        Some(triple.predicate.as_str()),
        object_iri(&triple.object),
    ]
    .into_iter()
    .flatten()
}

fn rewrite(triple: &Triple, mapping: &BTreeMap<String, NamedNode>) -> Triple {
    let subject = match &triple.subject {
        NamedOrBlankNode::NamedNode(node) => mapping
            .get(node.as_str())
            .cloned()
            .map_or_else(|| triple.subject.clone(), NamedOrBlankNode::from),
        NamedOrBlankNode::BlankNode(_) => triple.subject.clone(),
    };
    let predicate = mapping
        .get(triple.predicate.as_str())
        .cloned()
        .unwrap_or_else(|| triple.predicate.clone());
    let object = match &triple.object {
        Term::NamedNode(node) => mapping
            .get(node.as_str())
            .cloned()
            .map_or_else(|| triple.object.clone(), Term::from),
        _ => triple.object.clone(),
    };
    Triple::new(subject, predicate, object)
}

fn named(iri: &str) -> Result<NamedNode, LoaderError> {
    Ok(rdf::named_node(iri)?)
}
