use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_reasoning_check(profile: &str, outcome: &str, duration: Duration) {
    counter!(
        "vgraph_reasoning_checks_total",
        "profile" => profile.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "vgraph_reasoning_check_duration_seconds",
        "profile" => profile.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_reasoning_closure_size(asserted: usize, entailed: usize, rounds: usize) {
    histogram!("vgraph_reasoning_asserted_statements").record(asserted as f64);
    histogram!("vgraph_reasoning_entailed_statements").record(entailed as f64);
    histogram!("vgraph_reasoning_fixpoint_rounds").record(rounds as f64);
}

pub fn record_inferred_statements(category: &str, count: usize) {
    counter!(
        "vgraph_inferred_statements_total",
        "category" => category.to_string()
    )
    .increment(count as u64);
}
