//! Automatic resolution of matches that involve a bye.

use crate::error::BracketError;
use crate::graph::BracketGraph;
use crate::id::MatchId;
use crate::propagate::on_match_finished;
use tracing::trace;

/// Finish every ready match that has a bye in it and propagate the result,
/// repeating until no such match is left. Returns how many matches this
/// call resolved directly (cascades resolved during propagation are not
/// counted). Running it again on the result resolves nothing.
pub fn resolve_byes(graph: &mut BracketGraph) -> Result<usize, BracketError> {
    let mut resolved = 0;

    loop {
        let pending: Vec<MatchId> = graph
            .matches()
            .filter(|m| !m.finished && m.is_ready() && m.involves_bye())
            .map(|m| m.id)
            .collect();
        if pending.is_empty() {
            return Ok(resolved);
        }

        for id in pending {
            let m = graph.require_mut(id)?;
            // An earlier cascade in this pass may have got here first.
            if m.finished {
                continue;
            }
            m.winner_side = m.forced_winner();
            trace!(match_id = %id, winner = ?m.winner_side, "resolving bye");
            on_match_finished(graph, id)?;
            resolved += 1;
        }
    }
}
