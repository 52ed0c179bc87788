//! Error taxonomy: bad input from the caller versus a corrupted graph.

use crate::id::{MatchId, Section, Side};
use crate::slot::Slot;

/// The caller asked for something the engine cannot do. Fatal to the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("at least 2 participants are required, got {0}")]
    TooFewParticipants(usize),
    #[error("unsupported bracket format: {0:?}")]
    UnsupportedFormat(String),
    #[error("unsupported seeding method: {0:?}")]
    UnsupportedSeeding(String),
    #[error("participant {0:?} appears more than once")]
    DuplicateParticipant(String),
    #[error("invalid match id: {0:?}")]
    InvalidMatchId(String),
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),
    #[error("match {0} is still waiting for an opponent")]
    MatchNotReady(MatchId),
    #[error("match {0} cannot end in a draw")]
    DrawNotAllowed(MatchId),
    #[error("match {0} has no complete score")]
    MissingScore(MatchId),
    #[error("match {0} involves a bye and is decided without a score")]
    ByeMatch(MatchId),
}

/// The graph violates a structural invariant. Indicates a corrupted or
/// hand-edited bracket; never auto-corrected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsistencyError {
    #[error("slot {side:?} of {match_id} already holds {existing:?}, refusing to write {incoming:?}")]
    SlotConflict {
        match_id: MatchId,
        side: Side,
        existing: Slot,
        incoming: Slot,
    },
    #[error("cycle detected in match destinations")]
    CycleDetected,
    #[error("match {0} feeds into itself")]
    SelfDestination(MatchId),
    #[error("match {from} points at missing match {to}")]
    DanglingDestination { from: MatchId, to: MatchId },
    #[error("slot {side:?} of {to} does not record {from} as its source")]
    FeedMismatch {
        from: MatchId,
        to: MatchId,
        side: Side,
    },
    #[error("bye found in {0} beyond the round it was introduced")]
    ByeOutOfRound(MatchId),
    #[error("{0:?} section rounds are not contiguous from 1")]
    NonContiguousRounds(Section),
    #[error("duplicate match id: {0}")]
    DuplicateMatch(MatchId),
    #[error("match {0} is finished but has no winner")]
    FinishedWithoutWinner(MatchId),
    #[error("slot {side:?} of {match_id} holds {found:?} but its source sent {expected:?}")]
    UnexpectedOccupant {
        match_id: MatchId,
        side: Side,
        expected: Slot,
        found: Slot,
    },
    #[error("invalid draw size {0}")]
    InvalidDrawSize(usize),
    #[error("match {0} is missing from the layout")]
    MissingMatch(MatchId),
    #[error("match {0} does not belong to the layout")]
    UnexpectedMatch(MatchId),
    #[error("links of {0} differ from the layout")]
    LinkMismatch(MatchId),
    #[error("{found} byes seeded, expected {expected}")]
    ByeCountMismatch { expected: usize, found: usize },
}

/// Any error surfaced by the bracket engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BracketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

impl BracketError {
    pub fn is_validation(&self) -> bool {
        matches!(self, BracketError::Validation(_))
    }

    pub fn is_consistency(&self) -> bool {
        matches!(self, BracketError::Consistency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ValidationError::TooFewParticipants(1);
        assert_eq!(e.to_string(), "at least 2 participants are required, got 1");

        let e = ValidationError::DrawNotAllowed(MatchId::winners(2, 1));
        assert_eq!(e.to_string(), "match W2-1 cannot end in a draw");

        let e = ValidationError::ByeMatch(MatchId::losers(1, 2));
        assert_eq!(
            e.to_string(),
            "match L1-2 involves a bye and is decided without a score"
        );

        let e = ConsistencyError::DanglingDestination {
            from: MatchId::winners(1, 1),
            to: MatchId::winners(9, 1),
        };
        assert_eq!(e.to_string(), "match W1-1 points at missing match W9-1");
    }

    #[test]
    fn categories_are_distinguishable() {
        let v: BracketError = ValidationError::UnsupportedFormat("swiss".into()).into();
        assert!(v.is_validation());
        assert!(!v.is_consistency());

        let c: BracketError = ConsistencyError::CycleDetected.into();
        assert!(c.is_consistency());
        assert_eq!(c.to_string(), "cycle detected in match destinations");
    }
}
