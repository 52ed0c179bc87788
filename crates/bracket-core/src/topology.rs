//! Match-graph construction for single and double elimination.
//!
//! # Double-elimination layout
//!
//! For a draw of `size = 2^k` the Winners section has `k` rounds and the
//! Losers section `2(k - 1)`. Losers round 1 pairs the Winners round-1
//! losers against each other. Every even Losers round `2m` is a drop-in
//! round: survivors of round `2m - 1` meet the losers of Winners round
//! `m + 1`. Every odd Losers round after the first halves the field of
//! survivors. Losers round `j` therefore holds `size >> ((j + 1) / 2 + 1)`
//! matches and the last one is the Losers final, where the Winners-final
//! loser lands.
//!
//! Drop-ins from even-numbered Winners rounds are placed in reverse order so
//! that entrants who met early are kept apart for as long as possible.

use crate::config::GrandFinal;
use crate::error::{BracketError, ConsistencyError, ValidationError};
use crate::graph::BracketGraph;
use crate::id::{MatchId, Outcome, Section, Side};
use crate::matches::{Destination, Match};
use crate::seed::SeedPlan;
use crate::slot::{Feed, Opponent};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Elimination formats the engine can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    #[default]
    SingleElimination,
    DoubleElimination,
}

impl FromStr for BracketFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_elimination" => Ok(BracketFormat::SingleElimination),
            "double_elimination" => Ok(BracketFormat::DoubleElimination),
            other => Err(ValidationError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for BracketFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BracketFormat::SingleElimination => "single_elimination",
            BracketFormat::DoubleElimination => "double_elimination",
        })
    }
}

/// Number of matches in Losers round `round` for a draw of `size`.
pub fn losers_round_size(size: usize, round: u32) -> usize {
    size >> ((round + 1) / 2 + 1)
}

/// Build the full match graph for a seed plan. Byes are placed but not yet
/// resolved.
pub fn build(
    plan: &SeedPlan,
    format: BracketFormat,
    grand_final: GrandFinal,
) -> Result<BracketGraph, BracketError> {
    let mut graph = layout(format, grand_final, plan.size(), plan.participant_count())?;
    seed_first_round(&mut graph, plan)?;
    Ok(graph)
}

/// Every match and link of a draw of `size`, with no entrant seeded.
fn layout(
    format: BracketFormat,
    grand_final: GrandFinal,
    size: usize,
    participant_count: usize,
) -> Result<BracketGraph, BracketError> {
    if size < 2 || !size.is_power_of_two() {
        return Err(ValidationError::TooFewParticipants(participant_count).into());
    }

    let mut graph = BracketGraph::new(format, grand_final, size, participant_count);
    let rounds = build_winners(&mut graph, size)?;

    if format == BracketFormat::DoubleElimination {
        let losers_rounds = build_losers(&mut graph, size, rounds)?;
        build_final(&mut graph, rounds, losers_rounds)?;
    }
    Ok(graph)
}

/// Insert an empty match shell.
fn shell(graph: &mut BracketGraph, id: MatchId) -> Result<(), ConsistencyError> {
    graph.insert(Match::new(id, Opponent::default(), Opponent::default()))?;
    Ok(())
}

/// Route `outcome` of `from` into `side` of `to`, recording both ends.
fn link(
    graph: &mut BracketGraph,
    from: MatchId,
    outcome: Outcome,
    to: MatchId,
    side: Side,
) -> Result<(), BracketError> {
    *graph.require_mut(from)?.destination_mut(outcome) = Some(Destination { match_id: to, side });
    *graph.require_mut(to)?.opponent_mut(side) = Opponent::awaiting(from, outcome);
    Ok(())
}

/// Winners section (the whole bracket for single elimination). Returns the
/// number of rounds.
fn build_winners(graph: &mut BracketGraph, size: usize) -> Result<u32, BracketError> {
    let rounds = size.trailing_zeros();

    for round in 1..=rounds {
        for position in 1..=(size >> round) as u32 {
            shell(graph, MatchId::winners(round, position))?;
        }
    }

    for round in 1..rounds {
        for position in 1..=(size >> round) as u32 {
            link(
                graph,
                MatchId::winners(round, position),
                Outcome::Winner,
                MatchId::winners(round + 1, position.div_ceil(2)),
                Side::for_position(position),
            )?;
        }
    }
    Ok(rounds)
}

/// Place each seed pair into its round-one match.
fn seed_first_round(graph: &mut BracketGraph, plan: &SeedPlan) -> Result<(), BracketError> {
    for (i, (high, low)) in plan.first_round_pairs().into_iter().enumerate() {
        let m = graph.require_mut(MatchId::winners(1, i as u32 + 1))?;
        for (side, seed) in [(Side::A, high), (Side::B, low)] {
            let slot = plan
                .seed(seed)
                .cloned()
                .ok_or(ValidationError::TooFewParticipants(plan.participant_count()))?;
            *m.opponent_mut(side) = Opponent::seeded(slot);
        }
    }
    Ok(())
}

/// Losers section. Returns the number of Losers rounds (0 for a two-entrant
/// draw, whose Winners-final loser goes straight to the grand final).
fn build_losers(
    graph: &mut BracketGraph,
    size: usize,
    winners_rounds: u32,
) -> Result<u32, BracketError> {
    let rounds = 2 * (winners_rounds - 1);

    for round in 1..=rounds {
        for position in 1..=losers_round_size(size, round) as u32 {
            shell(graph, MatchId::losers(round, position))?;
        }
    }
    if rounds == 0 {
        return Ok(0);
    }

    // Winners round 1 losers pair off.
    for position in 1..=(size >> 1) as u32 {
        link(
            graph,
            MatchId::winners(1, position),
            Outcome::Loser,
            MatchId::losers(1, position.div_ceil(2)),
            Side::for_position(position),
        )?;
    }

    // Later Winners losers drop into the even Losers rounds, side B.
    for winners_round in 2..=winners_rounds {
        let count = (size >> winners_round) as u32;
        let reversed = winners_round % 2 == 0;
        for position in 1..=count {
            let target = if reversed { count + 1 - position } else { position };
            link(
                graph,
                MatchId::winners(winners_round, position),
                Outcome::Loser,
                MatchId::losers(2 * (winners_round - 1), target),
                Side::B,
            )?;
        }
    }

    // Survivors advance through the Losers section.
    for round in 1..rounds {
        for position in 1..=losers_round_size(size, round) as u32 {
            let from = MatchId::losers(round, position);
            if round % 2 == 1 {
                // Into the drop-in round: same position, side A.
                link(graph, from, Outcome::Winner, MatchId::losers(round + 1, position), Side::A)?;
            } else {
                link(
                    graph,
                    from,
                    Outcome::Winner,
                    MatchId::losers(round + 1, position.div_ceil(2)),
                    Side::for_position(position),
                )?;
            }
        }
    }
    Ok(rounds)
}

/// The grand final. The reset match is created later, on demand.
fn build_final(
    graph: &mut BracketGraph,
    winners_rounds: u32,
    losers_rounds: u32,
) -> Result<(), BracketError> {
    let grand_final = MatchId::grand_final();
    let winners_final = MatchId::winners(winners_rounds, 1);
    shell(graph, grand_final)?;

    link(graph, winners_final, Outcome::Winner, grand_final, Side::A)?;
    if losers_rounds == 0 {
        link(graph, winners_final, Outcome::Loser, grand_final, Side::B)?;
    } else {
        link(graph, MatchId::losers(losers_rounds, 1), Outcome::Winner, grand_final, Side::B)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Layout check
// ---------------------------------------------------------------------------

impl BracketGraph {
    /// Check that the graph holds exactly the matches and links its format
    /// and draw size call for, that the seeded byes make up the gap between
    /// draw size and participant count, and that the grand-final reset
    /// exists exactly when the first grand final went to the Losers side.
    pub fn check_layout(&self) -> Result<(), ConsistencyError> {
        let size = self.bracket_size();
        let expected = layout(self.format(), self.grand_final(), size, self.participant_count())
            .map_err(|_| ConsistencyError::InvalidDrawSize(size))?;

        let reset = MatchId::grand_final_reset();
        let has_reset = self.contains(reset);
        for want in expected.matches() {
            let got = self
                .get(want.id)
                .ok_or(ConsistencyError::MissingMatch(want.id))?;
            // Creating the reset rewires the first grand final.
            let relinked = has_reset && want.id == MatchId::grand_final();
            let outgoing = relinked
                || (got.winner_destination == want.winner_destination
                    && got.loser_destination == want.loser_destination);
            let incoming = [Side::A, Side::B]
                .into_iter()
                .all(|side| got.opponent(side).propagated_from == want.opponent(side).propagated_from);
            if !(outgoing && incoming) {
                return Err(ConsistencyError::LinkMismatch(want.id));
            }
        }
        if let Some(extra) = self
            .matches()
            .find(|m| m.id != reset && !expected.contains(m.id))
        {
            return Err(ConsistencyError::UnexpectedMatch(extra.id));
        }
        self.check_reset()?;

        let found = self
            .round(Section::Winners, 1)
            .iter()
            .flat_map(|m| m.opponents.iter())
            .filter(|o| o.slot.is_bye())
            .count();
        let expected_byes = size.saturating_sub(self.participant_count());
        if found != expected_byes {
            return Err(ConsistencyError::ByeCountMismatch {
                expected: expected_byes,
                found,
            });
        }
        Ok(())
    }

    fn check_reset(&self) -> Result<(), ConsistencyError> {
        let first = MatchId::grand_final();
        let reset = MatchId::grand_final_reset();
        let due = self.format() == BracketFormat::DoubleElimination
            && self.grand_final() == GrandFinal::Reset
            && self
                .get(first)
                .is_some_and(|m| m.finished && m.winner_side == Some(Side::B));

        match (self.get(reset), due) {
            (None, false) => Ok(()),
            (None, true) => Err(ConsistencyError::MissingMatch(reset)),
            (Some(_), false) => Err(ConsistencyError::UnexpectedMatch(reset)),
            (Some(m), true) => {
                let fed_by = |side: Side, outcome: Outcome| {
                    m.opponent(side).propagated_from
                        == Some(Feed {
                            match_id: first,
                            outcome,
                        })
                };
                let terminal = m.winner_destination.is_none() && m.loser_destination.is_none();
                if fed_by(Side::A, Outcome::Loser) && fed_by(Side::B, Outcome::Winner) && terminal {
                    Ok(())
                } else {
                    Err(ConsistencyError::LinkMismatch(reset))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Section;
    use crate::seed::{SeedingMethod, plan};
    use crate::slot::{Participant, Slot};

    fn roster(n: usize) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant::team(format!("t{i}"), format!("Team {i}")))
            .collect()
    }

    fn built(n: usize, format: BracketFormat) -> BracketGraph {
        let plan = plan(&roster(n), SeedingMethod::RegistrationOrder).unwrap();
        build(&plan, format, GrandFinal::Reset).unwrap()
    }

    fn ref_id(slot: &Slot) -> &str {
        &slot.entrant().unwrap().ref_id
    }

    #[test]
    fn single_elimination_shape() {
        for n in [2, 3, 4, 5, 8, 9, 16, 31, 64] {
            let graph = built(n, BracketFormat::SingleElimination);
            let size = n.next_power_of_two();
            assert_eq!(graph.match_count(), size - 1, "n = {n}");
            assert_eq!(graph.round_count(Section::Winners), size.trailing_zeros());
            assert_eq!(graph.round_count(Section::Losers), 0);
            graph.validate().unwrap();
        }
    }

    #[test]
    fn single_elimination_final_is_terminal() {
        let graph = built(8, BracketFormat::SingleElimination);
        let fin = graph.get(MatchId::winners(3, 1)).unwrap();
        assert!(fin.winner_destination.is_none());
        assert!(fin.loser_destination.is_none());
        assert!(graph.matches().all(|m| m.loser_destination.is_none()));
    }

    #[test]
    fn first_round_uses_standard_seeding() {
        let graph = built(8, BracketFormat::SingleElimination);
        let pairs: Vec<(&str, &str)> = graph
            .round(Section::Winners, 1)
            .into_iter()
            .map(|m| (ref_id(m.slot(Side::A)), ref_id(m.slot(Side::B))))
            .collect();
        assert_eq!(
            pairs,
            vec![("t1", "t8"), ("t4", "t5"), ("t2", "t7"), ("t3", "t6")]
        );
    }

    #[test]
    fn winners_links_pair_adjacent_matches() {
        let graph = built(8, BracketFormat::SingleElimination);
        let w13 = graph.get(MatchId::winners(1, 3)).unwrap();
        assert_eq!(
            w13.winner_destination,
            Some(Destination {
                match_id: MatchId::winners(2, 2),
                side: Side::A
            })
        );
        let w22 = graph.get(MatchId::winners(2, 2)).unwrap();
        assert_eq!(
            w22.opponent(Side::B).propagated_from.map(|f| f.match_id),
            Some(MatchId::winners(1, 4))
        );
    }

    #[test]
    fn double_elimination_shape() {
        for n in [3, 4, 6, 8, 13, 16, 32] {
            let graph = built(n, BracketFormat::DoubleElimination);
            let size = n.next_power_of_two();
            let k = size.trailing_zeros();
            assert_eq!(graph.round(Section::Winners, 1).len(), size / 2);
            assert_eq!(graph.round_count(Section::Losers), 2 * (k - 1), "n = {n}");
            let losers = graph.matches().filter(|m| m.section() == Section::Losers).count();
            assert_eq!(losers, size - 2);
            assert_eq!(graph.round(Section::Final, 1).len(), 1);
            assert_eq!(graph.match_count(), 2 * size - 2);
            graph.validate().unwrap();
        }
    }

    #[test]
    fn losers_round_sizes_alternate() {
        let sizes: Vec<usize> = (1..=6).map(|r| losers_round_size(16, r)).collect();
        assert_eq!(sizes, vec![4, 4, 2, 2, 1, 1]);
    }

    #[test]
    fn every_winners_match_drops_its_loser() {
        let graph = built(16, BracketFormat::DoubleElimination);
        for m in graph.matches().filter(|m| m.section() == Section::Winners) {
            let dest = m.loser_destination.expect("winners match without loser link");
            assert_eq!(dest.match_id.section(), Section::Losers);
        }
        // Winners final loser lands in the Losers final.
        let wf = graph.get(MatchId::winners(4, 1)).unwrap();
        assert_eq!(wf.loser_destination.unwrap().match_id, MatchId::losers(6, 1));
        assert_eq!(
            wf.winner_destination.unwrap(),
            Destination {
                match_id: MatchId::grand_final(),
                side: Side::A
            }
        );
        let lf = graph.get(MatchId::losers(6, 1)).unwrap();
        assert!(lf.loser_destination.is_none());
        assert_eq!(
            lf.winner_destination.unwrap(),
            Destination {
                match_id: MatchId::grand_final(),
                side: Side::B
            }
        );
        let gf = graph.get(MatchId::grand_final()).unwrap();
        assert!(gf.winner_destination.is_none());
    }

    #[test]
    fn drop_ins_reverse_on_alternate_rounds() {
        let graph = built(8, BracketFormat::DoubleElimination);
        // Winners round 2 has two matches; their losers land crosswise.
        let w21 = graph.get(MatchId::winners(2, 1)).unwrap();
        let w22 = graph.get(MatchId::winners(2, 2)).unwrap();
        assert_eq!(w21.loser_destination.unwrap().match_id, MatchId::losers(2, 2));
        assert_eq!(w22.loser_destination.unwrap().match_id, MatchId::losers(2, 1));
        assert!(
            [w21, w22]
                .iter()
                .all(|m| m.loser_destination.unwrap().side == Side::B)
        );
    }

    #[test]
    fn two_entrant_double_elimination() {
        let graph = built(2, BracketFormat::DoubleElimination);
        assert_eq!(graph.match_count(), 2);
        let w = graph.get(MatchId::winners(1, 1)).unwrap();
        assert_eq!(w.winner_destination.unwrap().side, Side::A);
        assert_eq!(
            w.loser_destination.unwrap(),
            Destination {
                match_id: MatchId::grand_final(),
                side: Side::B
            }
        );
        graph.validate().unwrap();
    }

    #[test]
    fn format_parses() {
        assert_eq!(
            "double_elimination".parse::<BracketFormat>().unwrap(),
            BracketFormat::DoubleElimination
        );
        assert_eq!(
            "swiss".parse::<BracketFormat>(),
            Err(ValidationError::UnsupportedFormat("swiss".into()))
        );
        assert_eq!(BracketFormat::SingleElimination.to_string(), "single_elimination");
    }
}
