//! The match node: two opponent slots, a result, and outgoing links.

use crate::error::ValidationError;
use crate::id::{MatchId, Outcome, Section, Side};
use crate::slot::{Opponent, Slot};
use serde::{Deserialize, Serialize};

/// Where a match's winner or loser goes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    pub match_id: MatchId,
    pub side: Side,
}

/// A single match in the bracket graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub id: MatchId,
    /// Indexed by [`Side`]: `[A, B]`.
    pub opponents: [Opponent; 2],
    /// Indexed by [`Side`]: `[A, B]`.
    pub scores: [Option<u32>; 2],
    pub winner_side: Option<Side>,
    pub finished: bool,
    pub winner_destination: Option<Destination>,
    /// Only set on Winners-section matches of a double-elimination bracket
    /// (and on the first grand final once a reset exists).
    pub loser_destination: Option<Destination>,
}

impl Match {
    /// A fresh, unplayed match with no outgoing links.
    pub fn new(id: MatchId, a: Opponent, b: Opponent) -> Self {
        Self {
            id,
            opponents: [a, b],
            scores: [None, None],
            winner_side: None,
            finished: false,
            winner_destination: None,
            loser_destination: None,
        }
    }

    pub fn section(&self) -> Section {
        self.id.section()
    }

    pub fn round(&self) -> u32 {
        self.id.round()
    }

    pub fn position(&self) -> u32 {
        self.id.position()
    }

    pub fn opponent(&self, side: Side) -> &Opponent {
        &self.opponents[side.index()]
    }

    pub fn opponent_mut(&mut self, side: Side) -> &mut Opponent {
        &mut self.opponents[side.index()]
    }

    pub fn slot(&self, side: Side) -> &Slot {
        &self.opponent(side).slot
    }

    pub fn score(&self, side: Side) -> Option<u32> {
        self.scores[side.index()]
    }

    pub fn destination(&self, outcome: Outcome) -> Option<Destination> {
        match outcome {
            Outcome::Winner => self.winner_destination,
            Outcome::Loser => self.loser_destination,
        }
    }

    pub(crate) fn destination_mut(&mut self, outcome: Outcome) -> &mut Option<Destination> {
        match outcome {
            Outcome::Winner => &mut self.winner_destination,
            Outcome::Loser => &mut self.loser_destination,
        }
    }

    pub fn involves_bye(&self) -> bool {
        self.opponents.iter().any(|o| o.slot.is_bye())
    }

    /// Both slots are decided (no placeholder left).
    pub fn is_ready(&self) -> bool {
        self.opponents.iter().all(|o| !o.slot.is_placeholder())
    }

    /// Ready, unfinished and between two real entrants: waiting on a score.
    pub fn awaits_result(&self) -> bool {
        !self.finished && self.is_ready() && !self.involves_bye()
    }

    /// The side that wins without playing. A bye loses to anything; two
    /// byes resolve to side A.
    pub fn forced_winner(&self) -> Option<Side> {
        match (self.slot(Side::A).is_bye(), self.slot(Side::B).is_bye()) {
            (true, true) => Some(Side::A),
            (true, false) => Some(Side::B),
            (false, true) => Some(Side::A),
            (false, false) => None,
        }
    }

    /// Work out the winning side from byes or scores.
    pub fn decide_winner(&self) -> Result<Side, ValidationError> {
        if let Some(side) = self.forced_winner() {
            return Ok(side);
        }
        match self.scores {
            [Some(a), Some(b)] if a > b => Ok(Side::A),
            [Some(a), Some(b)] if a < b => Ok(Side::B),
            [Some(_), Some(_)] => Err(ValidationError::DrawNotAllowed(self.id)),
            _ => Err(ValidationError::MissingScore(self.id)),
        }
    }

    pub fn winner(&self) -> Option<&Slot> {
        self.winner_side.filter(|_| self.finished).map(|s| self.slot(s))
    }

    pub fn loser(&self) -> Option<&Slot> {
        self.winner_side
            .filter(|_| self.finished)
            .map(|s| self.slot(s.other()))
    }

    /// Forget the result, returning the match to its unplayed state.
    pub(crate) fn clear_result(&mut self) {
        self.scores = [None, None];
        self.winner_side = None;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{Entrant, Slot};

    fn team(id: &str) -> Opponent {
        Opponent::seeded(Slot::Team(Entrant::new(id, id.to_uppercase())))
    }

    #[test]
    fn forced_winner_prefers_non_bye() {
        let m = Match::new(MatchId::winners(1, 1), Opponent::seeded(Slot::Bye), team("a"));
        assert_eq!(m.forced_winner(), Some(Side::B));
        let m = Match::new(MatchId::winners(1, 1), team("a"), Opponent::seeded(Slot::Bye));
        assert_eq!(m.forced_winner(), Some(Side::A));
        let m = Match::new(
            MatchId::losers(1, 1),
            Opponent::seeded(Slot::Bye),
            Opponent::seeded(Slot::Bye),
        );
        assert_eq!(m.forced_winner(), Some(Side::A));
    }

    #[test]
    fn decide_winner_from_scores() {
        let mut m = Match::new(MatchId::winners(1, 1), team("a"), team("b"));
        assert!(matches!(m.decide_winner(), Err(ValidationError::MissingScore(_))));

        m.scores = [Some(1), Some(3)];
        assert_eq!(m.decide_winner().unwrap(), Side::B);

        m.scores = [Some(2), Some(2)];
        assert!(matches!(m.decide_winner(), Err(ValidationError::DrawNotAllowed(_))));
    }

    #[test]
    fn bye_overrides_scores() {
        let mut m = Match::new(MatchId::winners(1, 1), Opponent::seeded(Slot::Bye), team("b"));
        m.scores = [Some(0), Some(0)];
        assert_eq!(m.decide_winner().unwrap(), Side::B);
    }

    #[test]
    fn readiness() {
        let mut m = Match::new(
            MatchId::winners(2, 1),
            team("a"),
            Opponent::awaiting(MatchId::winners(1, 2), Outcome::Winner),
        );
        assert!(!m.is_ready());
        assert!(!m.awaits_result());
        m.opponent_mut(Side::B).slot = Slot::Team(Entrant::new("b", "B"));
        assert!(m.is_ready());
        assert!(m.awaits_result());
        assert!(m.winner().is_none());
    }
}
