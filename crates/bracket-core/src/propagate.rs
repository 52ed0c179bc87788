//! Forward propagation of match outcomes, and retraction when a finished
//! result is corrected.
//!
//! Both directions walk the graph with an explicit worklist rather than
//! recursion. Forward propagation stops at the first match that still needs
//! a real score; retraction stops at matches that had not finished.

use crate::config::GrandFinal;
use crate::error::{BracketError, ConsistencyError, ValidationError};
use crate::graph::BracketGraph;
use crate::id::{MatchId, Outcome, Side};
use crate::matches::{Destination, Match};
use crate::slot::{Opponent, Slot};
use crate::topology::BracketFormat;
use std::collections::VecDeque;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Forward propagation
// ---------------------------------------------------------------------------

/// Mark `id` finished and push its winner and loser into their destination
/// slots. Any destination that becomes a completed bye match is resolved
/// and propagated in turn.
pub(crate) fn on_match_finished(graph: &mut BracketGraph, id: MatchId) -> Result<(), BracketError> {
    let mut queue = VecDeque::from([id]);

    while let Some(current) = queue.pop_front() {
        let side = {
            let m = graph.require_mut(current)?;
            let side = match m.winner_side {
                Some(side) => side,
                None => m.decide_winner()?,
            };
            m.winner_side = Some(side);
            m.finished = true;
            side
        };

        if needs_reset(graph, current, side) {
            create_reset(graph)?;
        }

        let m = graph.require(current)?;
        let forwards = [
            (m.winner_destination, m.slot(side).clone()),
            (m.loser_destination, m.slot(side.other()).clone()),
        ];
        for (dest, slot) in forwards {
            let Some(dest) = dest else {
                continue;
            };
            if let Some(next) = fill_slot(graph, current, dest, slot)? {
                queue.push_back(next);
            }
        }
    }
    Ok(())
}

/// Write `incoming` into an empty destination slot. Returns the destination
/// id if that completed a bye match which must now propagate itself.
fn fill_slot(
    graph: &mut BracketGraph,
    from: MatchId,
    dest: Destination,
    incoming: Slot,
) -> Result<Option<MatchId>, BracketError> {
    let target = graph
        .get_mut(dest.match_id)
        .ok_or(ConsistencyError::DanglingDestination {
            from,
            to: dest.match_id,
        })?;

    let current = &mut target.opponent_mut(dest.side).slot;
    if current.is_placeholder() {
        trace!(from = %from, to = %dest.match_id, side = ?dest.side, slot = ?incoming, "filling slot");
        *current = incoming;
    } else if *current != incoming {
        return Err(ConsistencyError::SlotConflict {
            match_id: dest.match_id,
            side: dest.side,
            existing: current.clone(),
            incoming,
        }
        .into());
    }

    if !target.finished && target.is_ready() && target.involves_bye() {
        target.winner_side = target.forced_winner();
        return Ok(Some(target.id));
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Grand-final reset
// ---------------------------------------------------------------------------

/// The Losers-section finalist just took the first grand final in a true
/// double-elimination bracket, and no reset exists yet.
fn needs_reset(graph: &BracketGraph, id: MatchId, winner: Side) -> bool {
    graph.format() == BracketFormat::DoubleElimination
        && graph.grand_final() == GrandFinal::Reset
        && id == MatchId::grand_final()
        && winner == Side::B
        && !graph.contains(MatchId::grand_final_reset())
}

/// Create the second grand final between the same pair, keeping sides:
/// the Winners-section entrant stays on A.
fn create_reset(graph: &mut BracketGraph) -> Result<(), BracketError> {
    let first = MatchId::grand_final();
    let reset = MatchId::grand_final_reset();
    graph.insert(Match::new(
        reset,
        Opponent::awaiting(first, Outcome::Loser),
        Opponent::awaiting(first, Outcome::Winner),
    ))?;

    let gf = graph.require_mut(first)?;
    gf.winner_destination = Some(Destination {
        match_id: reset,
        side: Side::B,
    });
    gf.loser_destination = Some(Destination {
        match_id: reset,
        side: Side::A,
    });
    debug!(match_id = %reset, "grand final reset created");
    Ok(())
}

/// Undo [`create_reset`] once the first grand final no longer has a
/// Losers-section winner.
fn drop_reset(graph: &mut BracketGraph) -> Result<(), BracketError> {
    let reset = MatchId::grand_final_reset();
    graph.remove(reset);
    let gf = graph.require_mut(MatchId::grand_final())?;
    gf.winner_destination = None;
    gf.loser_destination = None;
    debug!(match_id = %reset, "grand final reset retracted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Retraction
// ---------------------------------------------------------------------------

/// Clear every downstream slot filled by the outcome of `id`. A downstream
/// match that had already finished loses its result and is retracted too,
/// so the whole affected sub-tree returns to its unplayed state.
///
/// A destination slot is only cleared if it still holds exactly what the
/// retracted match sent there; anything else is a [`ConsistencyError::SlotConflict`].
fn retract(graph: &mut BracketGraph, id: MatchId) -> Result<(), BracketError> {
    let mut queue = VecDeque::from([(id, sent_slots(graph.require(id)?))]);

    while let Some((current, sent)) = queue.pop_front() {
        let Some(m) = graph.get(current) else {
            continue;
        };
        let links = [
            (m.winner_destination, sent[0].clone()),
            (m.loser_destination, sent[1].clone()),
        ];

        for (dest, expected) in links {
            let (Some(dest), Some(expected)) = (dest, expected) else {
                continue;
            };
            let target = graph
                .get_mut(dest.match_id)
                .ok_or(ConsistencyError::DanglingDestination {
                    from: current,
                    to: dest.match_id,
                })?;
            let downstream = sent_slots(target);

            let slot = &mut target.opponent_mut(dest.side).slot;
            if *slot != expected {
                return Err(ConsistencyError::SlotConflict {
                    match_id: dest.match_id,
                    side: dest.side,
                    existing: slot.clone(),
                    incoming: Slot::Placeholder,
                }
                .into());
            }
            *slot = Slot::Placeholder;

            if target.finished || target.winner_side.is_some() {
                trace!(match_id = %dest.match_id, "clearing downstream result");
                target.clear_result();
                queue.push_back((dest.match_id, downstream));
            }
        }

        if current == MatchId::grand_final() && graph.contains(MatchId::grand_final_reset()) {
            drop_reset(graph)?;
        }
    }
    Ok(())
}

/// What a finished match forwarded: `[winner, loser]`.
fn sent_slots(m: &Match) -> [Option<Slot>; 2] {
    [m.winner().cloned(), m.loser().cloned()]
}

// ---------------------------------------------------------------------------
// Result reporting
// ---------------------------------------------------------------------------

impl BracketGraph {
    /// Record (or correct) the score of a match and propagate the outcome.
    ///
    /// A correction that keeps the same winner only updates the scores. One
    /// that flips the winner first retracts everything the old outcome
    /// reached, then propagates the new one.
    ///
    /// The graph is left untouched if this returns an error.
    pub fn report_result(
        &mut self,
        id: MatchId,
        score_a: u32,
        score_b: u32,
    ) -> Result<(), BracketError> {
        self.validate()?;
        let mut working = self.clone();
        record_result(&mut working, id, [Some(score_a), Some(score_b)])?;
        *self = working;
        Ok(())
    }
}

fn record_result(
    graph: &mut BracketGraph,
    id: MatchId,
    scores: [Option<u32>; 2],
) -> Result<(), BracketError> {
    let m = graph.require(id)?;
    if !m.is_ready() {
        return Err(ValidationError::MatchNotReady(id).into());
    }
    if m.involves_bye() {
        return Err(ValidationError::ByeMatch(id).into());
    }

    let mut scored = m.clone();
    scored.scores = scores;
    let side = scored.decide_winner()?;
    let previous = if m.finished { m.winner_side } else { None };

    match previous {
        Some(prev) if prev == side => {
            debug!(match_id = %id, ?scores, "score corrected, winner unchanged");
            graph.require_mut(id)?.scores = scores;
            return Ok(());
        }
        Some(prev) => {
            debug!(match_id = %id, from = ?prev, to = ?side, "winner corrected, retracting downstream");
            retract(graph, id)?;
        }
        None => debug!(match_id = %id, ?scores, winner = ?side, "result recorded"),
    }

    let m = graph.require_mut(id)?;
    m.scores = scores;
    m.winner_side = Some(side);
    m.finished = true;
    on_match_finished(graph, id)
}
