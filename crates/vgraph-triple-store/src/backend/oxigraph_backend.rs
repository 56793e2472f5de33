use std::{path::Path, time::Duration};

use async_trait::async_trait;
use oxigraph::{
    model::Term,
    sparql::{QueryResults, SparqlEvaluator},
    store::Store,
};
use serde_json::{Map, Value, json};

use super::TripleStoreBackend;
use crate::error::{Result, TripleStoreError};

/// Oxigraph embedded triple store backend
///
/// SPARQL updates run inside a single oxigraph transaction, which gives the
/// all-or-nothing semantics `StoreTransaction::commit` relies on.
pub struct OxigraphBackend {
    store: Store,
}

impl OxigraphBackend {
    /// Create a new Oxigraph backend with persistent storage
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Store::open(&path).map_err(|e| {
            TripleStoreError::Other(format!("Failed to open Oxigraph store: {}", e))
        })?;

        tracing::info!(
            path = %path.as_ref().display(),
            "Opened Oxigraph persistent store"
        );

        Ok(Self { store })
    }

    /// Create a new in-memory Oxigraph backend
    pub fn in_memory() -> Result<Self> {
        let store = Store::new().map_err(|e| {
            TripleStoreError::Other(format!("Failed to create in-memory Oxigraph store: {}", e))
        })?;

        tracing::debug!("Created in-memory Oxigraph store");

        Ok(Self { store })
    }

    async fn run_query<T, F>(
        &self,
        op: &'static str,
        query: &str,
        timeout: Duration,
        handle: F,
    ) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(QueryResults) -> Result<T> + Send + 'static,
    {
        let prepared =
            SparqlEvaluator::new()
                .parse_query(query)
                .map_err(|e| TripleStoreError::InvalidQuery {
                    reason: format!("Failed to parse SPARQL {op}: {e}"),
                })?;

        // Execute on blocking thread pool since evaluation may touch disk
        let store = self.store.clone();
        let task = tokio::task::spawn_blocking(move || {
            let results = prepared
                .on_store(&store)
                .execute()
                .map_err(|e| TripleStoreError::Backend {
                    op,
                    message: e.to_string(),
                })?;
            handle(results)
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => {
                joined.map_err(|e| TripleStoreError::Other(format!("Task join error: {}", e)))?
            }
            Err(_) => Err(TripleStoreError::Timeout {
                op,
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[async_trait]
impl TripleStoreBackend for OxigraphBackend {
    fn name(&self) -> &'static str {
        "oxigraph"
    }

    async fn health_check(&self) -> Result<bool> {
        let result = self
            .run_query(
                "ASK",
                "ASK { ?s ?p ?o }",
                Duration::from_secs(5),
                |results| Ok(matches!(results, QueryResults::Boolean(_))),
            )
            .await?;
        Ok(result)
    }

    async fn update(&self, query: &str) -> Result<()> {
        // Parse the request first (CPU-bound, but fast)
        let prepared = SparqlEvaluator::new().parse_update(query).map_err(|e| {
            TripleStoreError::InvalidQuery {
                reason: format!("Failed to parse SPARQL UPDATE: {}", e),
            }
        })?;

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            prepared
                .on_store(&store)
                .execute()
                .map_err(|e| TripleStoreError::Backend {
                    op: "UPDATE",
                    message: e.to_string(),
                })
        })
        .await
        .map_err(|e| TripleStoreError::Other(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn construct(&self, query: &str, timeout: Duration) -> Result<String> {
        self.run_query("CONSTRUCT", query, timeout, |results| match results {
            QueryResults::Graph(triples) => {
                let mut output = Vec::new();
                for triple_result in triples {
                    let triple = triple_result.map_err(|e| TripleStoreError::Backend {
                        op: "CONSTRUCT",
                        message: format!("Failed to read triple: {}", e),
                    })?;

                    // Serialize to N-Triples format
                    output.push(format!(
                        "{} {} {} .",
                        triple.subject, triple.predicate, triple.object
                    ));
                }
                Ok(output.join("\n"))
            }
            _ => Err(TripleStoreError::Other(
                "Expected CONSTRUCT to return graph results".to_string(),
            )),
        })
        .await
    }

    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool> {
        self.run_query("ASK", query, timeout, |results| match results {
            QueryResults::Boolean(value) => Ok(value),
            _ => Err(TripleStoreError::Other(
                "Expected ASK to return boolean result".to_string(),
            )),
        })
        .await
    }

    async fn select(&self, query: &str, timeout: Duration) -> Result<String> {
        self.run_query("SELECT", query, timeout, |results| match results {
            QueryResults::Solutions(solutions) => {
                let vars: Vec<String> = solutions
                    .variables()
                    .iter()
                    .map(|variable| variable.as_str().to_string())
                    .collect();

                let mut bindings = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| TripleStoreError::Backend {
                        op: "SELECT",
                        message: format!("Failed to read solution: {}", e),
                    })?;
                    let mut row = Map::new();
                    for (variable, term) in solution.iter() {
                        row.insert(variable.as_str().to_string(), term_to_json(term));
                    }
                    bindings.push(Value::Object(row));
                }

                Ok(json!({
                    "head": { "vars": vars },
                    "results": { "bindings": bindings }
                })
                .to_string())
            }
            _ => Err(TripleStoreError::Other(
                "Expected SELECT to return solutions".to_string(),
            )),
        })
        .await
    }
}

/// SPARQL 1.1 Query Results JSON encoding of a single term.
fn term_to_json(term: &Term) -> Value {
    match term {
        Term::NamedNode(node) => json!({ "type": "uri", "value": node.as_str() }),
        Term::BlankNode(node) => json!({ "type": "bnode", "value": node.as_str() }),
        Term::Literal(literal) => match literal.language() {
            Some(language) => json!({
                "type": "literal",
                "value": literal.value(),
                "xml:lang": language,
            }),
            None => json!({
                "type": "literal",
                "value": literal.value(),
                "datatype": literal.datatype().as_str(),
            }),
        },
        #[allow(unreachable_patterns)]
        other => json!({ "type": "literal", "value": other.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let backend = OxigraphBackend::in_memory().unwrap();
        assert!(backend.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_and_select() {
        let backend = OxigraphBackend::in_memory().unwrap();

        let insert_query = r#"
            PREFIX ex: <http://example.org/>
            INSERT DATA {
                GRAPH <http://example.org/graph1> {
                    ex:subject1 ex:predicate1 "object1" .
                    ex:subject2 ex:predicate2 "object2"@en .
                }
            }
        "#;
        backend.update(insert_query).await.unwrap();

        let json = backend
            .select(
                "SELECT ?s ?o WHERE { GRAPH <http://example.org/graph1> { ?s ?p ?o } } ORDER BY ?s",
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        let bindings = parsed["results"]["bindings"].as_array().unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0]["s"]["type"], "uri");
        assert_eq!(bindings[0]["o"]["value"], "object1");
        assert_eq!(bindings[1]["o"]["xml:lang"], "en");
    }

    #[tokio::test]
    async fn test_malformed_update_leaves_store_untouched() {
        let backend = OxigraphBackend::in_memory().unwrap();

        backend
            .update("INSERT DATA { GRAPH <g:1> { <s:1> <p:1> <o:1> . } }")
            .await
            .unwrap();

        // The request fails to parse, so the leading CLEAR never runs.
        let failed = backend
            .update("CLEAR GRAPH <g:1> ; INSERT DATA { GRAPH <g:1> { <s:2> <p:2> . } }")
            .await;
        assert!(matches!(failed, Err(TripleStoreError::InvalidQuery { .. })));

        let still_there = backend
            .ask(
                "ASK { GRAPH <g:1> { <s:1> <p:1> <o:1> } }",
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        assert!(still_there);
    }

    #[tokio::test]
    async fn test_construct_returns_ntriples_lines() {
        let backend = OxigraphBackend::in_memory().unwrap();
        backend
            .update("INSERT DATA { GRAPH <g:1> { <s:1> <p:1> \"o\" . <s:1> <p:2> <o:2> . } }")
            .await
            .unwrap();

        let body = backend
            .construct(
                "CONSTRUCT { ?s ?p ?o } WHERE { GRAPH <g:1> { ?s ?p ?o } }",
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.ends_with(" .")));
    }
}
