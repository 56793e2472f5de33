use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_lifecycle_operation(operation: &str, status: &str, kind: &str, duration: Duration) {
    counter!(
        "vgraph_lifecycle_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
    histogram!(
        "vgraph_lifecycle_operation_duration_seconds",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_published_statements(graph: &str, asserted: usize, inferred: usize) {
    histogram!(
        "vgraph_published_asserted_statements",
        "management_graph" => graph.to_string()
    )
    .record(asserted as f64);
    histogram!(
        "vgraph_published_inferred_statements",
        "management_graph" => graph.to_string()
    )
    .record(inferred as f64);
}

pub fn record_dangling_objects(count: usize, forced: bool) {
    counter!(
        "vgraph_dangling_objects_total",
        "forced" => forced.to_string()
    )
    .increment(count as u64);
}

pub fn record_document_scope_eviction(operation: &str, cached_documents: usize, on_drop: bool) {
    counter!(
        "vgraph_document_scope_evictions_total",
        "operation" => operation.to_string(),
        "on_drop" => on_drop.to_string()
    )
    .increment(1);
    histogram!(
        "vgraph_document_scope_cached_documents",
        "operation" => operation.to_string()
    )
    .record(cached_documents as f64);
}

pub fn record_identity_locks_held(held: usize) {
    gauge!("vgraph_identity_locks_held").set(held as f64);
}

pub fn record_identity_lock_wait(operation: &str, wait: Duration) {
    histogram!(
        "vgraph_identity_lock_wait_seconds",
        "operation" => operation.to_string()
    )
    .record(wait.as_secs_f64());
}
