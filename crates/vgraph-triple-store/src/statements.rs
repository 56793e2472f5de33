use std::collections::HashSet;

use oxigraph::{
    io::RdfFormat,
    model::{GraphName, NamedNode, NamedOrBlankNode, Quad, Term, Triple},
};

use crate::{
    TripleStoreManager,
    error::{Result, TripleStoreError},
    rdf::{self, named_node},
    sparql,
};

/// Statement lookup pattern; `None` positions match anything.
///
/// Blank nodes cannot be used as bound positions since their labels are
/// local to the store.
#[derive(Debug, Clone, Default)]
pub struct StatementPattern {
    pub subject: Option<NamedOrBlankNode>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
    pub context: Option<NamedNode>,
}

impl StatementPattern {
    pub fn in_context(context: NamedNode) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    fn position(term: Option<String>, var: &str) -> String {
        term.unwrap_or_else(|| format!("?{var}"))
    }

    fn to_select(&self) -> Result<String> {
        if matches!(self.subject, Some(NamedOrBlankNode::BlankNode(_)))
            || matches!(self.object, Some(Term::BlankNode(_)))
        {
            return Err(TripleStoreError::InvalidQuery {
                reason: "Blank nodes cannot be bound in a statement pattern".to_string(),
            });
        }

        let subject = Self::position(self.subject.as_ref().map(ToString::to_string), "s");
        let predicate = Self::position(self.predicate.as_ref().map(ToString::to_string), "p");
        let object = Self::position(self.object.as_ref().map(ToString::to_string), "o");
        let graph = Self::position(self.context.as_ref().map(ToString::to_string), "g");

        Ok(format!(
            "SELECT * WHERE {{ GRAPH {graph} {{ {subject} {predicate} {object} }} }}"
        ))
    }
}

impl TripleStoreManager {
    /// Statements matching a pattern, across named graphs.
    pub async fn get_statements(&self, pattern: &StatementPattern) -> Result<Vec<Quad>> {
        let query = pattern.to_select()?;
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;

        sparql::parse_select_rows(&response)?
            .into_iter()
            .map(|mut row| {
                let subject = match pattern.subject.clone() {
                    Some(subject) => subject,
                    None => match row.remove("s") {
                        Some(Term::NamedNode(node)) => node.into(),
                        Some(Term::BlankNode(node)) => node.into(),
                        other => return Err(unexpected_binding("s", other)),
                    },
                };
                let predicate = match pattern.predicate.clone() {
                    Some(predicate) => predicate,
                    None => match row.remove("p") {
                        Some(Term::NamedNode(node)) => node,
                        other => return Err(unexpected_binding("p", other)),
                    },
                };
                let object = match pattern.object.clone() {
                    Some(object) => object,
                    None => row.remove("o").ok_or_else(|| unexpected_binding("o", None))?,
                };
                let graph = match pattern.context.clone() {
                    Some(context) => context,
                    None => match row.remove("g") {
                        Some(Term::NamedNode(node)) => node,
                        other => return Err(unexpected_binding("g", other)),
                    },
                };
                Ok(Quad::new(subject, predicate, object, GraphName::NamedNode(graph)))
            })
            .collect()
    }

    /// Every statement of one context.
    pub async fn graph_statements(&self, context: &str) -> Result<Vec<Triple>> {
        let graph = named_node(context)?;
        let query = format!("CONSTRUCT {{ ?s ?p ?o }} WHERE {{ GRAPH {graph} {{ ?s ?p ?o }} }}");
        let body = self
            .backend_construct(&query, self.config.timeouts.query_timeout())
            .await?;
        rdf::parse_ntriples_lines(&body)
    }

    /// Number of statements in a context.
    pub async fn size(&self, context: &str) -> Result<usize> {
        let graph = named_node(context)?;
        let query = format!(
            "SELECT (COUNT(*) AS ?count) WHERE {{ GRAPH {graph} {{ ?s ?p ?o }} }}"
        );
        let response = self
            .backend_select(&query, self.config.timeouts.query_timeout())
            .await?;
        sparql::parse_select_count(&response, "count")
    }

    /// Whether a context holds at least one statement.
    pub async fn graph_exists(&self, context: &str) -> Result<bool> {
        let graph = named_node(context)?;
        let query = format!("ASK {{ GRAPH {graph} {{ ?s ?p ?o }} }}");
        self.backend_ask(&query, self.config.timeouts.ask_timeout())
            .await
    }

    /// Serialize one or more contexts.
    ///
    /// Dataset formats keep each context as a named graph. Triple formats get
    /// the duplicate-free union of all contexts.
    pub async fn export(&self, contexts: &[&str], format: RdfFormat) -> Result<Vec<u8>> {
        if format.supports_datasets() {
            let mut quads = Vec::new();
            for context in contexts {
                let graph = named_node(context)?;
                let mut triples = self.graph_statements(context).await?;
                sort_triples(&mut triples);
                quads.extend(triples.into_iter().map(|triple| {
                    Quad::new(
                        triple.subject,
                        triple.predicate,
                        triple.object,
                        GraphName::NamedNode(graph.clone()),
                    )
                }));
            }
            return rdf::serialize_quads(&quads, format);
        }

        let mut seen = HashSet::new();
        let mut union = Vec::new();
        for context in contexts {
            for triple in self.graph_statements(context).await? {
                if seen.insert(triple.clone()) {
                    union.push(triple);
                }
            }
        }
        sort_triples(&mut union);
        rdf::serialize_triples(&union, format)
    }

    /// Parse a payload and add its statements to a context in one
    /// transaction. Returns how many statements were added.
    pub async fn import(&self, context: &str, data: &[u8], format: RdfFormat) -> Result<usize> {
        let triples = rdf::parse_triples(data, format)
            .map_err(|reason| TripleStoreError::ParseError { reason })?;
        let unique: HashSet<Triple> = triples.into_iter().collect();

        let mut transaction = self.begin();
        let added = transaction.add(context, &unique)?;
        transaction.commit().await?;
        Ok(added)
    }

    /// Add statements to a context in their own transaction.
    pub async fn add(&self, context: &str, triples: &[Triple]) -> Result<usize> {
        let mut transaction = self.begin();
        let added = transaction.add(context, triples)?;
        transaction.commit().await?;
        Ok(added)
    }

    /// Remove statements from a context in their own transaction.
    pub async fn remove(&self, context: &str, triples: &[Triple]) -> Result<usize> {
        let mut transaction = self.begin();
        let removed = transaction.remove(context, triples)?;
        transaction.commit().await?;
        Ok(removed)
    }
}

fn sort_triples(triples: &mut [Triple]) {
    triples.sort_by_cached_key(|triple| triple.to_string());
}

fn unexpected_binding(var: &str, term: Option<Term>) -> TripleStoreError {
    TripleStoreError::ParseError {
        reason: match term {
            Some(term) => format!("Unexpected term {term} bound to ?{var}"),
            None => format!("Missing binding for ?{var}"),
        },
    }
}
