//! The operations the surrounding application calls: generate a bracket,
//! report a result, and ask whether the bracket has a champion.

use crate::bye::resolve_byes;
use crate::config::BracketOptions;
use crate::error::{BracketError, ValidationError};
use crate::graph::BracketGraph;
use crate::id::MatchId;
use crate::seed::{SeedingMethod, plan_with_rng};
use crate::slot::Participant;
use crate::topology::{BracketFormat, build};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

/// Generate a bracket with default options for the given format and seeding.
pub fn generate_bracket(
    participants: &[Participant],
    format: BracketFormat,
    seeding: SeedingMethod,
) -> Result<BracketGraph, BracketError> {
    generate_with_options(participants, &BracketOptions::new(format, seeding))
}

/// Generate a bracket: plan seeds, build the topology, and resolve every
/// bye so the result is ready for its first real score.
pub fn generate_with_options(
    participants: &[Participant],
    options: &BracketOptions,
) -> Result<BracketGraph, BracketError> {
    match options.rng_seed {
        Some(seed) => generate_with_rng(participants, options, &mut StdRng::seed_from_u64(seed)),
        None => generate_with_rng(participants, options, &mut rand::thread_rng()),
    }
}

/// Like [`generate_with_options`] with a caller-supplied RNG. The RNG is
/// only used for random seeding; `options.rng_seed` is ignored.
pub fn generate_with_rng<R: rand::Rng + ?Sized>(
    participants: &[Participant],
    options: &BracketOptions,
    rng: &mut R,
) -> Result<BracketGraph, BracketError> {
    let plan = plan_with_rng(participants, options.seeding, rng)?;
    let mut graph = build(&plan, options.format, options.grand_final)?;
    let byes = resolve_byes(&mut graph)?;
    graph.validate()?;

    info!(
        format = %options.format,
        seeding = %options.seeding,
        participants = plan.participant_count(),
        size = plan.size(),
        byes = plan.bye_count(),
        resolved = byes,
        matches = graph.match_count(),
        "bracket generated"
    );
    Ok(graph)
}

/// Record or correct a match score, addressed by its textual id.
pub fn report_result(
    graph: &mut BracketGraph,
    match_id: &str,
    score_a: u32,
    score_b: u32,
) -> Result<(), BracketError> {
    let id: MatchId = match_id
        .parse()
        .map_err(|_| ValidationError::InvalidMatchId(match_id.to_string()))?;
    graph.report_result(id, score_a, score_b)
}

/// Whether every required match is played and a champion is known.
pub fn is_complete(graph: &BracketGraph) -> bool {
    graph.is_complete()
}

/// The bracket winner, if decided.
pub fn champion(graph: &BracketGraph) -> Option<Participant> {
    graph.champion()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrandFinal;
    use crate::id::Section;

    fn roster(n: usize) -> Vec<Participant> {
        (1..=n)
            .map(|i| Participant::team(format!("t{i}"), format!("Team {i}")))
            .collect()
    }

    #[test]
    fn generation_rejects_tiny_rosters() {
        let err = generate_bracket(
            &roster(1),
            BracketFormat::SingleElimination,
            SeedingMethod::RegistrationOrder,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::TooFewParticipants(1).into());
        assert!(
            generate_bracket(&[], BracketFormat::DoubleElimination, SeedingMethod::Random)
                .is_err()
        );
    }

    #[test]
    fn seeded_random_generation_is_reproducible() {
        let opts = BracketOptions::new(BracketFormat::DoubleElimination, SeedingMethod::Random)
            .with_rng_seed(1234);
        let a = generate_with_options(&roster(12), &opts).unwrap();
        let b = generate_with_options(&roster(12), &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn textual_ids() {
        let mut graph = generate_bracket(
            &roster(4),
            BracketFormat::SingleElimination,
            SeedingMethod::RegistrationOrder,
        )
        .unwrap();
        assert_eq!(
            report_result(&mut graph, "round-one", 1, 0),
            Err(ValidationError::InvalidMatchId("round-one".into()).into())
        );
        assert_eq!(
            report_result(&mut graph, "L1-1", 1, 0),
            Err(ValidationError::MatchNotFound(MatchId::losers(1, 1)).into())
        );
        report_result(&mut graph, "W1-1", 1, 0).unwrap();
        report_result(&mut graph, "W1-2", 1, 0).unwrap();
        assert!(!is_complete(&graph));
        report_result(&mut graph, "W2-1", 0, 1).unwrap();
        assert!(is_complete(&graph));
        assert_eq!(champion(&graph).unwrap().ref_id(), "t2");
    }

    #[test]
    fn single_match_grand_final_never_resets() {
        let opts = BracketOptions::new(
            BracketFormat::DoubleElimination,
            SeedingMethod::RegistrationOrder,
        )
        .with_grand_final(GrandFinal::SingleMatch);
        let mut graph = generate_with_options(&roster(2), &opts).unwrap();
        graph.report_result(MatchId::winners(1, 1), 2, 0).unwrap();
        graph.report_result(MatchId::grand_final(), 0, 2).unwrap();
        assert_eq!(graph.round_count(Section::Final), 1);
        assert_eq!(champion(&graph).unwrap().ref_id(), "t2");
        assert!(is_complete(&graph));
    }
}
