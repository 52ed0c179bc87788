//! Helpers shared by the scenario tests.

#![allow(dead_code)]

use bracket_core::graph::BracketGraph;
use bracket_core::id::MatchId;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness. Filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ref ids occupying both sides of `id`, sorted, ignoring placeholders.
pub fn pairing(graph: &BracketGraph, id: MatchId) -> Vec<String> {
    let mut refs: Vec<String> = graph
        .get(id)
        .into_iter()
        .flat_map(|m| m.opponents.iter())
        .filter_map(|o| o.slot.entrant().map(|e| e.ref_id.clone()))
        .collect();
    refs.sort();
    refs
}
