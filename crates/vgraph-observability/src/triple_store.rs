use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_triple_store_backend_operation(
    backend: &str,
    op: &str,
    status: &str,
    error_class: &str,
    duration: Duration,
) {
    counter!(
        "vgraph_triple_store_backend_operations_total",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string(),
        "error_class" => error_class.to_string()
    )
    .increment(1);
    histogram!(
        "vgraph_triple_store_backend_operation_duration_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_triple_store_backend_query_bytes_total(backend: &str, op: &str, bytes: usize) {
    counter!(
        "vgraph_triple_store_backend_query_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub fn record_triple_store_backend_result_bytes_total(backend: &str, op: &str, bytes: usize) {
    counter!(
        "vgraph_triple_store_backend_result_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub fn record_triple_store_backend_permit_wait(backend: &str, op: &str, wait: Duration) {
    histogram!(
        "vgraph_triple_store_backend_permit_wait_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .record(wait.as_secs_f64());
}

pub fn record_triple_store_backend_permit_snapshot(backend: &str, max: usize, available: usize) {
    gauge!(
        "vgraph_triple_store_backend_permits_max",
        "backend" => backend.to_string()
    )
    .set(max as f64);
    gauge!(
        "vgraph_triple_store_backend_permits_in_use",
        "backend" => backend.to_string()
    )
    .set(max.saturating_sub(available) as f64);
}

pub fn record_triple_store_transaction(
    backend: &str,
    status: &str,
    operations: usize,
    duration: Duration,
) {
    counter!(
        "vgraph_triple_store_transactions_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "vgraph_triple_store_transaction_operations",
        "backend" => backend.to_string()
    )
    .record(operations as f64);
    histogram!(
        "vgraph_triple_store_transaction_duration_seconds",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_triple_store_inferred_graphs_collected(graph: &str, collected: usize) {
    counter!(
        "vgraph_triple_store_inferred_graphs_collected_total",
        "management_graph" => graph.to_string()
    )
    .increment(collected as u64);
}
