use std::time::Instant;

use oxigraph::model::{NamedOrBlankNode, Term, Triple};
use uuid::Uuid;

use crate::{
    TripleStoreManager,
    error::{Result, TripleStoreError},
    metrics,
    rdf::{named_node, statement_line},
};

/// Buffered write transaction.
///
/// Operations are collected in order and submitted as a single SPARQL update
/// request on [`commit`](Self::commit), which the backend applies atomically.
/// Rolling back (explicitly, or by dropping the transaction, e.g. when the
/// owning future is cancelled) discards the buffer without touching the store.
pub struct StoreTransaction<'a> {
    manager: &'a TripleStoreManager,
    id: Uuid,
    operations: Vec<String>,
    finished: bool,
}

impl<'a> StoreTransaction<'a> {
    pub(crate) fn new(manager: &'a TripleStoreManager) -> Self {
        let id = Uuid::new_v4();
        tracing::trace!(transaction_id = %id, "Transaction started");
        Self {
            manager,
            id,
            operations: Vec::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of buffered update operations.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Add statements to a context. Returns how many statements were queued.
    pub fn add<'t>(
        &mut self,
        context: &str,
        triples: impl IntoIterator<Item = &'t Triple>,
    ) -> Result<usize> {
        let graph = named_node(context)?;
        let mut body = String::new();
        let mut count = 0;
        for triple in triples {
            body.push_str("    ");
            body.push_str(&statement_line(triple));
            body.push('\n');
            count += 1;
        }
        if count > 0 {
            self.push(format!("INSERT DATA {{\n  GRAPH {graph} {{\n{body}  }}\n}}"));
        }
        Ok(count)
    }

    /// Remove statements from a context.
    ///
    /// Statements containing blank nodes cannot be addressed individually;
    /// clear the whole graph instead.
    pub fn remove<'t>(
        &mut self,
        context: &str,
        triples: impl IntoIterator<Item = &'t Triple>,
    ) -> Result<usize> {
        let graph = named_node(context)?;
        let mut body = String::new();
        let mut count = 0;
        for triple in triples {
            if matches!(triple.subject, NamedOrBlankNode::BlankNode(_))
                || matches!(triple.object, Term::BlankNode(_))
            {
                return Err(TripleStoreError::InvalidQuery {
                    reason: format!(
                        "Cannot remove statement with blank node: {}",
                        statement_line(triple)
                    ),
                });
            }
            body.push_str("    ");
            body.push_str(&statement_line(triple));
            body.push('\n');
            count += 1;
        }
        if count > 0 {
            self.push(format!("DELETE DATA {{\n  GRAPH {graph} {{\n{body}  }}\n}}"));
        }
        Ok(count)
    }

    /// Remove every statement of a context.
    pub fn clear_graph(&mut self, context: &str) -> Result<()> {
        let graph = named_node(context)?;
        self.push(format!("CLEAR SILENT GRAPH {graph}"));
        Ok(())
    }

    pub(crate) fn push(&mut self, operation: String) {
        self.operations.push(operation);
    }

    /// Apply every buffered operation atomically.
    pub async fn commit(mut self) -> Result<()> {
        self.finished = true;
        if self.operations.is_empty() {
            tracing::trace!(transaction_id = %self.id, "Empty transaction committed");
            return Ok(());
        }

        let started = Instant::now();
        let operations = std::mem::take(&mut self.operations);
        let request = operations.join(" ;\n");

        let result = self.manager.backend_update(&request).await;
        metrics::record_transaction(
            self.manager.backend.name(),
            result.as_ref().err(),
            operations.len(),
            started.elapsed(),
        );

        match &result {
            Ok(()) => tracing::debug!(
                transaction_id = %self.id,
                operations = operations.len(),
                "Transaction committed"
            ),
            Err(error) => tracing::warn!(
                transaction_id = %self.id,
                operations = operations.len(),
                error = %error,
                "Transaction failed; store left unchanged"
            ),
        }
        result
    }

    /// Discard every buffered operation.
    pub fn rollback(mut self) {
        self.finished = true;
        tracing::debug!(
            transaction_id = %self.id,
            operations = self.operations.len(),
            "Transaction rolled back"
        );
        self.operations.clear();
    }
}

impl Drop for StoreTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.operations.is_empty() {
            tracing::debug!(
                transaction_id = %self.id,
                operations = self.operations.len(),
                "Transaction dropped before commit; rolled back"
            );
        }
    }
}
