//! Per-document bookkeeping in the schema and artifact management graphs.
//!
//! A record holds the document's type assertion, one `owl:versionIRI` link
//! per published version, exactly one `currentVersion` and
//! `currentInferredVersion` marker, and an `inferredVersion` link from each
//! asserted version to its inferred graph.

use std::{collections::BTreeSet, fmt};

use oxigraph::model::Term;
use serde::{Deserialize, Serialize};
use vgraph_domain::{DocumentIdentity, vocab};

use crate::{
    StoreTransaction, TripleStoreManager,
    error::{Result, TripleStoreError},
    query::named_graphs,
    rdf::named_node,
    sparql,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagementGraph {
    Schema,
    Artifact,
}

impl ManagementGraph {
    /// Lookup order for import resolution.
    pub const ALL: [ManagementGraph; 2] = [ManagementGraph::Schema, ManagementGraph::Artifact];

    pub fn iri(&self) -> &'static str {
        match self {
            ManagementGraph::Schema => named_graphs::SCHEMA_MANAGEMENT,
            ManagementGraph::Artifact => named_graphs::ARTIFACT_MANAGEMENT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManagementGraph::Schema => "schema",
            ManagementGraph::Artifact => "artifact",
        }
    }
}

impl fmt::Display for ManagementGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the management graph knows about one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementRecord {
    /// Current version, with its current inferred graph when present.
    pub identity: DocumentIdentity,
    /// Every recorded version IRI, sorted.
    pub versions: Vec<String>,
    /// Every inferred graph linked to any version, sorted.
    pub inferred_graphs: Vec<String>,
}

impl ManagementRecord {
    /// Every context holding this document's content.
    pub fn contexts(&self) -> Vec<&str> {
        let mut contexts: BTreeSet<&str> = self.versions.iter().map(String::as_str).collect();
        contexts.extend(self.inferred_graphs.iter().map(String::as_str));
        contexts.insert(self.identity.version_iri());
        if let Some(inferred) = self.identity.inferred_iri() {
            contexts.insert(inferred);
        }
        contexts.into_iter().collect()
    }
}

/// Update operations making up one publish, in application order.
pub(crate) fn publish_operations(graph: ManagementGraph, identity: &DocumentIdentity) -> Result<Vec<String>> {
    let mg = named_node(graph.iri())?;
    let doc = named_node(identity.document_iri())?;
    let ver = named_node(identity.version_iri())?;
    let inf = match identity.inferred_iri() {
        Some(inferred) => named_node(inferred)?,
        None => {
            return Err(TripleStoreError::InvalidQuery {
                reason: format!("Cannot publish {identity} without an inferred graph"),
            });
        }
    };

    let rdf_type = vocab::RDF_TYPE;
    let ontology = vocab::OWL_ONTOLOGY;
    let version_iri = vocab::OWL_VERSION_IRI;
    let current = vocab::CURRENT_VERSION;
    let current_inferred = vocab::CURRENT_INFERRED_VERSION;
    let inferred_version = vocab::INFERRED_VERSION;

    Ok(vec![
        // (a) type assertion and version link
        format!(
            "INSERT DATA {{ GRAPH {mg} {{ {doc} <{rdf_type}> <{ontology}> . {doc} <{version_iri}> {ver} . }} }}"
        ),
        // (b) current version marker
        format!("DELETE WHERE {{ GRAPH {mg} {{ {doc} <{current}> ?version . }} }}"),
        format!("INSERT DATA {{ GRAPH {mg} {{ {doc} <{current}> {ver} . }} }}"),
        // (c) inferred document type
        format!("INSERT DATA {{ GRAPH {mg} {{ {inf} <{rdf_type}> <{ontology}> . }} }}"),
        // (d) current inferred marker
        format!("DELETE WHERE {{ GRAPH {mg} {{ {doc} <{current_inferred}> ?inferred . }} }}"),
        format!("INSERT DATA {{ GRAPH {mg} {{ {doc} <{current_inferred}> {inf} . }} }}"),
        // (e) collect prior inferred graphs, then their links
        format!(
            "DELETE {{ GRAPH ?old {{ ?s ?p ?o }} }}\n\
             WHERE {{\n  GRAPH {mg} {{ {doc} <{version_iri}> ?version . ?version <{inferred_version}> ?old . FILTER(?old != {inf}) }}\n  GRAPH ?old {{ ?s ?p ?o }}\n}}"
        ),
        format!(
            "DELETE {{ GRAPH {mg} {{ ?version <{inferred_version}> ?old . ?old <{rdf_type}> <{ontology}> . }} }}\n\
             WHERE {{ GRAPH {mg} {{ {doc} <{version_iri}> ?version . ?version <{inferred_version}> ?old . FILTER(?old != {inf}) }} }}"
        ),
        // (f) link the new inferred graph
        format!("INSERT DATA {{ GRAPH {mg} {{ {ver} <{inferred_version}> {inf} . }} }}"),
    ])
}

impl StoreTransaction<'_> {
    /// Queue the management record update for a freshly written version.
    ///
    /// Prior inferred graphs of the document are emptied and unlinked; the
    /// asserted version graphs stay queryable by explicit version.
    pub fn publish(&mut self, graph: ManagementGraph, identity: &DocumentIdentity) -> Result<()> {
        for operation in publish_operations(graph, identity)? {
            self.push(operation);
        }
        Ok(())
    }

    /// Queue removal of every management statement about a document, its
    /// versions and its inferred graphs.
    pub fn remove_record(&mut self, graph: ManagementGraph, record: &ManagementRecord) -> Result<()> {
        let mg = named_node(graph.iri())?;
        let mut subjects = BTreeSet::new();
        subjects.insert(named_node(record.identity.document_iri())?.to_string());
        for context in record.contexts() {
            subjects.insert(named_node(context)?.to_string());
        }
        let values = subjects.into_iter().collect::<Vec<_>>().join(" ");
        self.push(format!(
            "DELETE {{ GRAPH {mg} {{ ?s ?p ?o }} }} WHERE {{ GRAPH {mg} {{ VALUES ?s {{ {values} }} ?s ?p ?o }} }}"
        ));
        Ok(())
    }
}

impl TripleStoreManager {
    /// Current version (and current inferred graph) of a document.
    pub async fn current_identity(
        &self,
        graph: ManagementGraph,
        document_iri: &str,
    ) -> Result<Option<DocumentIdentity>> {
        let mg = named_node(graph.iri())?;
        let doc = named_node(document_iri)?;
        let query = format!(
            "SELECT ?version ?inferred WHERE {{ GRAPH {mg} {{\n  {doc} <{}> ?version .\n  OPTIONAL {{ {doc} <{}> ?inferred }}\n}} }} ORDER BY ?version LIMIT 1",
            vocab::CURRENT_VERSION,
            vocab::CURRENT_INFERRED_VERSION,
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        let Some(row) = sparql::parse_select_rows(&response)?.into_iter().next() else {
            return Ok(None);
        };
        identity_from_row(document_iri, &row, "version").map(Some)
    }

    /// Identity of an explicitly named version, with its inferred graph if
    /// it has not been collected.
    pub async fn version_identity(
        &self,
        graph: ManagementGraph,
        document_iri: &str,
        version_iri: &str,
    ) -> Result<Option<DocumentIdentity>> {
        let mg = named_node(graph.iri())?;
        let doc = named_node(document_iri)?;
        let ver = named_node(version_iri)?;
        let query = format!(
            "SELECT ?inferred WHERE {{ GRAPH {mg} {{\n  {doc} <{}> {ver} .\n  OPTIONAL {{ {ver} <{}> ?inferred }}\n}} }} LIMIT 1",
            vocab::OWL_VERSION_IRI,
            vocab::INFERRED_VERSION,
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        let Some(row) = sparql::parse_select_rows(&response)?.into_iter().next() else {
            return Ok(None);
        };
        let identity = DocumentIdentity::new(document_iri, version_iri)
            .map_err(|e| TripleStoreError::Other(e.to_string()))?;
        Ok(Some(match row.get("inferred") {
            Some(Term::NamedNode(inferred)) => identity.with_inferred(inferred.as_str()),
            _ => identity,
        }))
    }

    /// Resolve an import target to the current identity of the document it
    /// names. The target may be the document IRI or any recorded version IRI.
    /// Schema bookkeeping is consulted before artifact bookkeeping.
    pub async fn resolve_import_target(
        &self,
        target: &str,
    ) -> Result<Option<(ManagementGraph, DocumentIdentity)>> {
        let target_node = named_node(target)?;
        let schema = named_node(ManagementGraph::Schema.iri())?;
        let artifact = named_node(ManagementGraph::Artifact.iri())?;
        let query = format!(
            "SELECT ?rank ?document ?version ?inferred WHERE {{\n  \
               VALUES (?mg ?rank) {{ ({schema} 0) ({artifact} 1) }}\n  \
               GRAPH ?mg {{\n    \
                 {{ {target_node} <{current}> ?version . BIND({target_node} AS ?document) }}\n    \
                 UNION\n    \
                 {{ ?document <{version_iri}> {target_node} . ?document <{current}> ?version . }}\n    \
                 OPTIONAL {{ ?document <{current_inferred}> ?inferred }}\n  \
               }}\n\
             }} ORDER BY ?rank ?document LIMIT 1",
            current = vocab::CURRENT_VERSION,
            version_iri = vocab::OWL_VERSION_IRI,
            current_inferred = vocab::CURRENT_INFERRED_VERSION,
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        let Some(row) = sparql::parse_select_rows(&response)?.into_iter().next() else {
            return Ok(None);
        };

        let graph = match row.get("rank") {
            Some(Term::Literal(rank)) if rank.value() == "0" => ManagementGraph::Schema,
            _ => ManagementGraph::Artifact,
        };
        let document = match row.get("document") {
            Some(Term::NamedNode(document)) => document.as_str().to_string(),
            _ => target.to_string(),
        };
        identity_from_row(&document, &row, "version").map(|identity| Some((graph, identity)))
    }

    /// Every recorded version of a document, sorted.
    pub async fn versions(&self, graph: ManagementGraph, document_iri: &str) -> Result<Vec<String>> {
        let mg = named_node(graph.iri())?;
        let doc = named_node(document_iri)?;
        let query = format!(
            "SELECT ?version WHERE {{ GRAPH {mg} {{ {doc} <{}> ?version }} }}",
            vocab::OWL_VERSION_IRI
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        let versions: BTreeSet<String> = sparql::parse_select_values(&response, "version")?
            .into_iter()
            .collect();
        Ok(versions.into_iter().collect())
    }

    /// Every inferred graph linked from any version of a document, plus the
    /// current inferred marker, sorted.
    pub async fn inferred_links(&self, graph: ManagementGraph, document_iri: &str) -> Result<Vec<String>> {
        let mg = named_node(graph.iri())?;
        let doc = named_node(document_iri)?;
        let query = format!(
            "SELECT DISTINCT ?inferred WHERE {{ GRAPH {mg} {{\n  \
               {{ {doc} <{version_iri}> ?version . ?version <{inferred_version}> ?inferred }}\n  \
               UNION\n  \
               {{ {doc} <{current_inferred}> ?inferred }}\n\
             }} }}",
            version_iri = vocab::OWL_VERSION_IRI,
            inferred_version = vocab::INFERRED_VERSION,
            current_inferred = vocab::CURRENT_INFERRED_VERSION,
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        let links: BTreeSet<String> = sparql::parse_select_values(&response, "inferred")?
            .into_iter()
            .collect();
        Ok(links.into_iter().collect())
    }

    /// Whether an IRI is already in use as a recorded version or as a
    /// non-empty context.
    pub async fn version_exists(&self, version_iri: &str) -> Result<bool> {
        let ver = named_node(version_iri)?;
        let schema = named_node(ManagementGraph::Schema.iri())?;
        let artifact = named_node(ManagementGraph::Artifact.iri())?;
        let query = format!(
            "ASK {{\n  \
               {{ VALUES ?mg {{ {schema} {artifact} }} GRAPH ?mg {{ ?document <{}> {ver} }} }}\n  \
               UNION\n  \
               {{ GRAPH {ver} {{ ?s ?p ?o }} }}\n\
             }}",
            vocab::OWL_VERSION_IRI
        );
        self.backend_ask(&query, self.config.timeouts.ask_timeout())
            .await
    }

    /// Current identities of every document in a management graph, sorted by
    /// document IRI.
    pub async fn list_current(&self, graph: ManagementGraph) -> Result<Vec<DocumentIdentity>> {
        let mg = named_node(graph.iri())?;
        let query = format!(
            "SELECT ?document ?version ?inferred WHERE {{ GRAPH {mg} {{\n  \
               ?document <{}> ?version .\n  \
               OPTIONAL {{ ?document <{}> ?inferred }}\n\
             }} }} ORDER BY ?document",
            vocab::CURRENT_VERSION,
            vocab::CURRENT_INFERRED_VERSION,
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        sparql::parse_select_rows(&response)?
            .into_iter()
            .filter_map(|row| match row.get("document") {
                Some(Term::NamedNode(document)) => {
                    Some(identity_from_row(document.as_str(), &row, "version"))
                }
                _ => None,
            })
            .collect()
    }

    /// Full record of a document, or `None` when it has no current version.
    pub async fn management_record(
        &self,
        graph: ManagementGraph,
        document_iri: &str,
    ) -> Result<Option<ManagementRecord>> {
        let Some(identity) = self.current_identity(graph, document_iri).await? else {
            return Ok(None);
        };
        let versions = self.versions(graph, document_iri).await?;
        let inferred_graphs = self.inferred_links(graph, document_iri).await?;
        Ok(Some(ManagementRecord {
            identity,
            versions,
            inferred_graphs,
        }))
    }

    /// Number of `currentVersion` markers recorded for a document.
    pub async fn current_marker_count(
        &self,
        graph: ManagementGraph,
        document_iri: &str,
    ) -> Result<usize> {
        let mg = named_node(graph.iri())?;
        let doc = named_node(document_iri)?;
        let query = format!(
            "SELECT (COUNT(?version) AS ?count) WHERE {{ GRAPH {mg} {{ {doc} <{}> ?version }} }}",
            vocab::CURRENT_VERSION
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        sparql::parse_select_count(&response, "count")
    }
}

fn identity_from_row(
    document_iri: &str,
    row: &std::collections::HashMap<String, Term>,
    version_var: &str,
) -> Result<DocumentIdentity> {
    let version = match row.get(version_var) {
        Some(Term::NamedNode(version)) => version.as_str(),
        other => {
            return Err(TripleStoreError::ParseError {
                reason: format!("Unexpected ?{version_var} binding for {document_iri}: {other:?}"),
            });
        }
    };
    let identity = DocumentIdentity::new(document_iri, version)
        .map_err(|e| TripleStoreError::Other(e.to_string()))?;
    Ok(match row.get("inferred") {
        Some(Term::NamedNode(inferred)) => identity.with_inferred(inferred.as_str()),
        _ => identity,
    })
}
