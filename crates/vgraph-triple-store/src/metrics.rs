use std::time::Duration;

use vgraph_observability as observability;

use crate::error::TripleStoreError;

pub(crate) fn record_backend_query_bytes_total(backend: &str, op: &str, bytes: usize) {
    observability::record_triple_store_backend_query_bytes_total(backend, op, bytes);
}

pub(crate) fn record_backend_result_bytes_total(backend: &str, op: &str, bytes: usize) {
    observability::record_triple_store_backend_result_bytes_total(backend, op, bytes);
}

pub(crate) fn record_backend_permit_wait(backend: &str, op: &str, wait: Duration) {
    observability::record_triple_store_backend_permit_wait(backend, op, wait);
}

pub(crate) fn record_backend_permit_snapshot(backend: &str, max: usize, available: usize) {
    observability::record_triple_store_backend_permit_snapshot(backend, max, available);
}

pub(crate) fn record_backend_operation(
    backend: &str,
    op: &str,
    error: Option<&TripleStoreError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_error);

    observability::record_triple_store_backend_operation(
        backend,
        op,
        status,
        error_class,
        duration,
    );
}

pub(crate) fn record_transaction(
    backend: &str,
    error: Option<&TripleStoreError>,
    operations: usize,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    observability::record_triple_store_transaction(backend, status, operations, duration);
}

fn classify_error(error: &TripleStoreError) -> &'static str {
    match error {
        TripleStoreError::SemaphoreClosed => "semaphore_closed",
        TripleStoreError::Io(_) => "io",
        TripleStoreError::Backend { .. } => "backend",
        TripleStoreError::Timeout { .. } => "timeout",
        TripleStoreError::ParseError { .. } => "parse_error",
        TripleStoreError::InvalidQuery { .. } => "invalid_query",
        TripleStoreError::UnsupportedFormat(_) => "unsupported_format",
        TripleStoreError::Other(_) => "other",
    }
}
