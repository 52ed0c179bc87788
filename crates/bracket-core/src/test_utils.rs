//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::config::BracketOptions;
use crate::engine::generate_with_options;
use crate::graph::BracketGraph;
use crate::id::{MatchId, Side};
use crate::matches::Match;
use crate::seed::SeedingMethod;
use crate::slot::Participant;
use crate::topology::BracketFormat;

// ===========================================================================
// Rosters
// ===========================================================================

/// `t1..=tn`, labelled `Team n`.
pub fn teams(n: usize) -> Vec<Participant> {
    (1..=n)
        .map(|i| Participant::team(format!("t{i}"), format!("Team {i}")))
        .collect()
}

/// `p1..=pn`, labelled `Player n`.
pub fn players(n: usize) -> Vec<Participant> {
    (1..=n)
        .map(|i| Participant::player(format!("p{i}"), format!("Player {i}")))
        .collect()
}

// ===========================================================================
// Bracket constructors
// ===========================================================================

/// Single elimination, registration-order seeding, teams `t1..=tn`.
pub fn single(n: usize) -> BracketGraph {
    generate_with_options(
        &teams(n),
        &BracketOptions::new(BracketFormat::SingleElimination, SeedingMethod::RegistrationOrder),
    )
    .expect("generate single elimination")
}

/// Double elimination, registration-order seeding, teams `t1..=tn`.
pub fn double(n: usize) -> BracketGraph {
    generate_with_options(
        &teams(n),
        &BracketOptions::new(BracketFormat::DoubleElimination, SeedingMethod::RegistrationOrder),
    )
    .expect("generate double elimination")
}

// ===========================================================================
// Result helpers
// ===========================================================================

/// Report a 1-0 win for `side`.
pub fn win(graph: &mut BracketGraph, id: MatchId, side: Side) {
    let (a, b) = match side {
        Side::A => (1, 0),
        Side::B => (0, 1),
    };
    graph
        .report_result(id, a, b)
        .unwrap_or_else(|e| panic!("reporting {id}: {e}"));
}

/// Keep reporting ready matches, letting `pick` choose each winner, until
/// nothing is left to play. Returns the number of results reported.
pub fn play_out(graph: &mut BracketGraph, mut pick: impl FnMut(&Match) -> Side) -> usize {
    let mut reported = 0;
    loop {
        let Some((id, side)) = graph.ready_matches().first().map(|m| (m.id, pick(m))) else {
            return reported;
        };
        win(graph, id, side);
        reported += 1;
    }
}

/// Ref id of the entrant sitting in `side` of `id`, if any.
pub fn ref_at(graph: &BracketGraph, id: MatchId, side: Side) -> Option<String> {
    graph
        .get(id)
        .and_then(|m| m.slot(side).entrant())
        .map(|e| e.ref_id.clone())
}

/// Numeric part of a `t<n>` / `p<n>` ref id; lower is the better seed.
pub fn seed_number(m: &Match, side: Side) -> usize {
    m.slot(side)
        .entrant()
        .and_then(|e| e.ref_id.get(1..)?.parse().ok())
        .unwrap_or(usize::MAX)
}

/// Picks the better (lower-numbered) seed.
pub fn favourite(m: &Match) -> Side {
    if seed_number(m, Side::A) <= seed_number(m, Side::B) {
        Side::A
    } else {
        Side::B
    }
}
