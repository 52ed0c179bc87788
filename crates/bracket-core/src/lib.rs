//! Bracket Core -- the bracket generation and match-propagation engine.
//!
//! Given a format and an ordered roster, the engine synthesizes a complete
//! single- or double-elimination match graph, wires every match's winner and
//! loser to the right downstream slot, resolves byes introduced by padding
//! the draw to a power of two, and re-propagates outcomes as results are
//! reported or corrected.
//!
//! # Pipeline
//!
//! 1. **Seed** -- [`seed::plan`] orders the roster and pads it with byes.
//! 2. **Build** -- [`topology::build`] creates every match and link.
//! 3. **Resolve byes** -- [`bye::resolve_byes`] finishes bye matches to a
//!    fixed point.
//! 4. **Propagate** -- [`graph::BracketGraph::report_result`] records a score
//!    and pushes the outcome downstream, retracting stale results when a
//!    correction flips a winner.
//!
//! ```rust,ignore
//! let mut graph = engine::generate_bracket(&roster, BracketFormat::DoubleElimination,
//!     SeedingMethod::RegistrationOrder)?;
//! engine::report_result(&mut graph, "W1-2", 3, 1)?;
//! if engine::is_complete(&graph) {
//!     let winner = engine::champion(&graph);
//! }
//! ```
//!
//! # Key Types
//!
//! - [`graph::BracketGraph`] -- Arena of matches keyed by [`id::MatchId`].
//! - [`matches::Match`] -- Two [`slot::Opponent`]s, scores, and destinations.
//! - [`slot::Slot`] -- Team, player, placeholder or bye.
//! - [`error::BracketError`] -- Validation versus consistency failures.
//! - [`serialize`] -- JSON documents and binary snapshots.
//!
//! The engine is synchronous and does no I/O. Callers serialize concurrent
//! writes to the same graph.

pub mod bye;
pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod engine;
pub mod error;
pub mod graph;
pub mod id;
pub mod matches;
pub mod propagate;
pub mod seed;
pub mod serialize;
pub mod slot;
pub mod topology;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
