use crate::config::GrandFinal;
use crate::error::{ConsistencyError, ValidationError};
use crate::id::{MatchId, MatchKey, Outcome, Section, Side};
use crate::matches::Match;
use crate::slot::{Feed, Participant, Slot};
use crate::topology::BracketFormat;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// ---------------------------------------------------------------------------
// BracketGraph
// ---------------------------------------------------------------------------

/// The match graph: an arena of matches plus an index from the stable
/// [`MatchId`] to the arena key. Links between matches are stored as ids
/// (`winner_destination` / `loser_destination` / `propagated_from`), never
/// as references.
///
/// Iteration through [`matches`](Self::matches) is in id order, so two
/// graphs generated from the same inputs iterate identically.
#[derive(Debug, Clone)]
pub struct BracketGraph {
    format: BracketFormat,
    grand_final: GrandFinal,
    bracket_size: usize,
    participant_count: usize,
    matches: SlotMap<MatchKey, Match>,
    index: BTreeMap<MatchId, MatchKey>,
}

impl PartialEq for BracketGraph {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.grand_final == other.grand_final
            && self.bracket_size == other.bracket_size
            && self.participant_count == other.participant_count
            && self.matches().eq(other.matches())
    }
}

impl Eq for BracketGraph {}

impl BracketGraph {
    /// An empty graph. Matches are added by the topology builder or when
    /// loading a stored document.
    pub(crate) fn new(
        format: BracketFormat,
        grand_final: GrandFinal,
        bracket_size: usize,
        participant_count: usize,
    ) -> Self {
        Self {
            format,
            grand_final,
            bracket_size,
            participant_count,
            matches: SlotMap::with_key(),
            index: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, m: Match) -> Result<MatchKey, ConsistencyError> {
        if self.index.contains_key(&m.id) {
            return Err(ConsistencyError::DuplicateMatch(m.id));
        }
        let id = m.id;
        let key = self.matches.insert(m);
        self.index.insert(id, key);
        Ok(key)
    }

    pub(crate) fn remove(&mut self, id: MatchId) -> Option<Match> {
        let key = self.index.remove(&id)?;
        self.matches.remove(key)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn format(&self) -> BracketFormat {
        self.format
    }

    pub fn grand_final(&self) -> GrandFinal {
        self.grand_final
    }

    /// Draw size including byes.
    pub fn bracket_size(&self) -> usize {
        self.bracket_size
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    pub fn bye_count(&self) -> usize {
        self.bracket_size - self.participant_count
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.index.get(&id).and_then(|&k| self.matches.get(k))
    }

    pub(crate) fn get_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        let key = *self.index.get(&id)?;
        self.matches.get_mut(key)
    }

    /// Like [`get`](Self::get), but a missing match is a caller error.
    pub fn require(&self, id: MatchId) -> Result<&Match, ValidationError> {
        self.get(id).ok_or(ValidationError::MatchNotFound(id))
    }

    pub(crate) fn require_mut(&mut self, id: MatchId) -> Result<&mut Match, ValidationError> {
        self.get_mut(id).ok_or(ValidationError::MatchNotFound(id))
    }

    pub fn contains(&self, id: MatchId) -> bool {
        self.index.contains_key(&id)
    }

    /// All matches in id order.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.index.values().filter_map(|&k| self.matches.get(k))
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Matches of one round, by position.
    pub fn round(&self, section: Section, round: u32) -> Vec<&Match> {
        if round == 0 {
            return Vec::new();
        }
        let start = MatchId::new(section, round, 1);
        let end = MatchId::new(section, round, u32::MAX);
        self.index
            .range(start..=end)
            .filter_map(|(_, &k)| self.matches.get(k))
            .collect()
    }

    /// Highest round number present in a section (0 if the section is empty).
    pub fn round_count(&self, section: Section) -> u32 {
        self.index
            .keys()
            .filter(|id| id.section() == section)
            .map(|id| id.round())
            .max()
            .unwrap_or(0)
    }

    /// Matches between two real entrants that are waiting for a score.
    pub fn ready_matches(&self) -> Vec<&Match> {
        self.matches().filter(|m| m.awaits_result()).collect()
    }

    /// The match whose winner is the champion: the Winners final in single
    /// elimination, otherwise the grand final (or its reset, once created).
    pub fn deciding_match(&self) -> Option<&Match> {
        match self.format {
            BracketFormat::SingleElimination => {
                let rounds = self.bracket_size.trailing_zeros();
                self.get(MatchId::winners(rounds, 1))
            }
            BracketFormat::DoubleElimination => self
                .get(MatchId::grand_final_reset())
                .or_else(|| self.get(MatchId::grand_final())),
        }
    }

    /// The bracket winner, once decided.
    pub fn champion(&self) -> Option<Participant> {
        self.deciding_match()
            .and_then(Match::winner)
            .and_then(|slot| slot.participant())
    }

    /// Whether every match between real entrants has been played and a
    /// champion exists. Matches involving a bye never hold this up.
    pub fn is_complete(&self) -> bool {
        self.champion().is_some() && self.matches().all(|m| m.finished || m.involves_bye())
    }

    // -----------------------------------------------------------------------
    // Consistency checks
    // -----------------------------------------------------------------------

    /// Check every structural invariant of the graph.
    pub fn validate(&self) -> Result<(), ConsistencyError> {
        for m in self.matches() {
            if m.finished && m.winner_side.is_none() {
                return Err(ConsistencyError::FinishedWithoutWinner(m.id));
            }
            for side in [Side::A, Side::B] {
                if m.slot(side).is_bye() && m.round() > max_bye_round(m.section()) {
                    return Err(ConsistencyError::ByeOutOfRound(m.id));
                }
            }
            self.check_links(m)?;
        }
        self.check_rounds_contiguous()?;
        self.topological_order()?;
        self.check_layout()?;
        Ok(())
    }

    /// Outgoing destinations and incoming feeds must name each other.
    fn check_links(&self, m: &Match) -> Result<(), ConsistencyError> {
        for outcome in [Outcome::Winner, Outcome::Loser] {
            let Some(dest) = m.destination(outcome) else {
                continue;
            };
            if dest.match_id == m.id {
                return Err(ConsistencyError::SelfDestination(m.id));
            }
            let target = self
                .get(dest.match_id)
                .ok_or(ConsistencyError::DanglingDestination {
                    from: m.id,
                    to: dest.match_id,
                })?;
            let expected = Feed {
                match_id: m.id,
                outcome,
            };
            if target.opponent(dest.side).propagated_from != Some(expected) {
                return Err(ConsistencyError::FeedMismatch {
                    from: m.id,
                    to: dest.match_id,
                    side: dest.side,
                });
            }
        }

        for side in [Side::A, Side::B] {
            let Some(feed) = m.opponent(side).propagated_from else {
                continue;
            };
            let source = self.get(feed.match_id);
            let points_back = source
                .and_then(|source| source.destination(feed.outcome))
                .is_some_and(|d| d.match_id == m.id && d.side == side);
            let Some(source) = source.filter(|_| points_back) else {
                return Err(ConsistencyError::FeedMismatch {
                    from: feed.match_id,
                    to: m.id,
                    side,
                });
            };

            // A fed slot holds the source's outcome once it is finished and
            // stays a placeholder until then.
            let sent = match feed.outcome {
                Outcome::Winner => source.winner(),
                Outcome::Loser => source.loser(),
            };
            let found = m.slot(side);
            let holds_outcome = match sent {
                Some(slot) => found == slot,
                None => found.is_placeholder(),
            };
            if !holds_outcome {
                return Err(ConsistencyError::UnexpectedOccupant {
                    match_id: m.id,
                    side,
                    expected: sent.cloned().unwrap_or(Slot::Placeholder),
                    found: found.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_rounds_contiguous(&self) -> Result<(), ConsistencyError> {
        for section in [Section::Winners, Section::Losers, Section::Final] {
            let rounds: BTreeSet<u32> = self
                .index
                .keys()
                .filter(|id| id.section() == section)
                .map(|id| id.round())
                .collect();
            if rounds.iter().copied().ne(1..=rounds.len() as u32) {
                return Err(ConsistencyError::NonContiguousRounds(section));
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Topological sort (Kahn's algorithm)
    // -----------------------------------------------------------------------

    /// Matches ordered so every match precedes the matches it feeds.
    /// Errors if the destination links contain a cycle.
    pub fn topological_order(&self) -> Result<Vec<MatchId>, ConsistencyError> {
        let mut in_degree: SecondaryMap<MatchKey, usize> = SecondaryMap::new();
        for (key, _) in &self.matches {
            in_degree.insert(key, 0);
        }
        for (_, m) in &self.matches {
            for dest in [m.winner_destination, m.loser_destination].into_iter().flatten() {
                if let Some(deg) = self.index.get(&dest.match_id).and_then(|&k| in_degree.get_mut(k)) {
                    *deg += 1;
                }
            }
        }

        // Seed from the index so ties break in id order.
        let mut queue: VecDeque<MatchKey> = self
            .index
            .values()
            .copied()
            .filter(|&k| in_degree.get(k) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(self.matches.len());
        while let Some(key) = queue.pop_front() {
            let m = &self.matches[key];
            order.push(m.id);
            for dest in [m.winner_destination, m.loser_destination].into_iter().flatten() {
                let Some(&next) = self.index.get(&dest.match_id) else {
                    continue;
                };
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if order.len() != self.matches.len() {
            return Err(ConsistencyError::CycleDetected);
        }
        Ok(order)
    }
}

/// Last round of a section in which a bye may legitimately sit. Winners
/// byes only appear in round one; their losing byes drop into Losers round
/// one, and a bye-vs-bye there forwards one bye into Losers round two.
fn max_bye_round(section: Section) -> u32 {
    match section {
        Section::Winners => 1,
        Section::Losers => 2,
        Section::Final => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::Destination;
    use crate::slot::{Entrant, Opponent, Slot};

    fn player(id: &str) -> Opponent {
        Opponent::seeded(Slot::Player(Entrant::new(id, id)))
    }

    /// W1-1 and W1-2 feeding W2-1, built by hand.
    fn tiny_graph() -> BracketGraph {
        let mut graph =
            BracketGraph::new(BracketFormat::SingleElimination, GrandFinal::Reset, 4, 4);
        let mut m1 = Match::new(MatchId::winners(1, 1), player("a"), player("d"));
        let mut m2 = Match::new(MatchId::winners(1, 2), player("b"), player("c"));
        m1.winner_destination = Some(Destination {
            match_id: MatchId::winners(2, 1),
            side: Side::A,
        });
        m2.winner_destination = Some(Destination {
            match_id: MatchId::winners(2, 1),
            side: Side::B,
        });
        let fin = Match::new(
            MatchId::winners(2, 1),
            Opponent::awaiting(MatchId::winners(1, 1), Outcome::Winner),
            Opponent::awaiting(MatchId::winners(1, 2), Outcome::Winner),
        );
        graph.insert(fin).unwrap();
        graph.insert(m2).unwrap();
        graph.insert(m1).unwrap();
        graph
    }

    #[test]
    fn matches_iterate_in_id_order() {
        let graph = tiny_graph();
        let ids: Vec<String> = graph.matches().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["W1-1", "W1-2", "W2-1"]);
        assert_eq!(graph.round(Section::Winners, 1).len(), 2);
        assert_eq!(graph.round(Section::Winners, 0).len(), 0);
        assert_eq!(graph.round_count(Section::Winners), 2);
        assert_eq!(graph.round_count(Section::Losers), 0);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut graph = tiny_graph();
        let dup = Match::new(MatchId::winners(1, 1), player("x"), player("y"));
        assert_eq!(
            graph.insert(dup),
            Err(ConsistencyError::DuplicateMatch(MatchId::winners(1, 1)))
        );
    }

    #[test]
    fn hand_built_graph_validates() {
        let graph = tiny_graph();
        graph.validate().unwrap();
        let order = graph.topological_order().unwrap();
        assert_eq!(order.last(), Some(&MatchId::winners(2, 1)));
        assert_eq!(graph.ready_matches().len(), 2);
    }

    #[test]
    fn cycle_detection() {
        let mut graph = tiny_graph();
        let fin = graph.get_mut(MatchId::winners(2, 1)).unwrap();
        fin.winner_destination = Some(Destination {
            match_id: MatchId::winners(1, 1),
            side: Side::A,
        });
        // Keep the feed consistent so only the cycle is wrong.
        let first = graph.get_mut(MatchId::winners(1, 1)).unwrap();
        first.opponents[0] = Opponent::awaiting(MatchId::winners(2, 1), Outcome::Winner);
        assert_eq!(graph.topological_order(), Err(ConsistencyError::CycleDetected));
        assert_eq!(graph.validate(), Err(ConsistencyError::CycleDetected));
    }

    #[test]
    fn self_destination_detected() {
        let mut graph = tiny_graph();
        let m = graph.get_mut(MatchId::winners(1, 2)).unwrap();
        m.loser_destination = Some(Destination {
            match_id: MatchId::winners(1, 2),
            side: Side::A,
        });
        assert_eq!(
            graph.validate(),
            Err(ConsistencyError::SelfDestination(MatchId::winners(1, 2)))
        );
    }

    #[test]
    fn dangling_destination_detected() {
        let mut graph = tiny_graph();
        graph.get_mut(MatchId::winners(1, 1)).unwrap().winner_destination = Some(Destination {
            match_id: MatchId::winners(3, 1),
            side: Side::A,
        });
        assert!(matches!(
            graph.validate(),
            Err(ConsistencyError::DanglingDestination { .. })
        ));
    }

    #[test]
    fn bye_beyond_first_round_detected() {
        let mut graph = tiny_graph();
        graph.get_mut(MatchId::winners(2, 1)).unwrap().opponents[0].slot = Slot::Bye;
        assert_eq!(
            graph.validate(),
            Err(ConsistencyError::ByeOutOfRound(MatchId::winners(2, 1)))
        );
    }

    #[test]
    fn gap_in_rounds_detected() {
        let mut graph = tiny_graph();
        graph
            .insert(Match::new(MatchId::losers(2, 1), player("q"), player("r")))
            .unwrap();
        assert_eq!(
            graph.validate(),
            Err(ConsistencyError::NonContiguousRounds(Section::Losers))
        );
    }

    #[test]
    fn finished_without_winner_detected() {
        let mut graph = tiny_graph();
        graph.get_mut(MatchId::winners(1, 1)).unwrap().finished = true;
        assert_eq!(
            graph.validate(),
            Err(ConsistencyError::FinishedWithoutWinner(MatchId::winners(1, 1)))
        );
    }

    #[test]
    fn champion_requires_finished_final() {
        let mut graph = tiny_graph();
        assert!(graph.champion().is_none());
        assert!(!graph.is_complete());

        let fin = graph.get_mut(MatchId::winners(2, 1)).unwrap();
        fin.opponents[0].slot = Slot::Player(Entrant::new("a", "a"));
        fin.opponents[1].slot = Slot::Player(Entrant::new("b", "b"));
        fin.scores = [Some(3), Some(1)];
        fin.winner_side = Some(Side::A);
        fin.finished = true;
        assert_eq!(graph.champion(), Some(Participant::player("a", "a")));
        // Round one is still unplayed.
        assert!(!graph.is_complete());
    }

    #[test]
    fn remove_drops_from_index() {
        let mut graph = tiny_graph();
        assert!(graph.remove(MatchId::winners(1, 2)).is_some());
        assert!(!graph.contains(MatchId::winners(1, 2)));
        assert_eq!(graph.match_count(), 2);
        assert!(graph.remove(MatchId::winners(1, 2)).is_none());
    }
}
