//! Seed planning: order the roster, pad it to a power of two with byes, and
//! map seeds onto first-round positions.
//!
//! First-round placement follows the standard bracket order, so seed 1 and
//! seed 2 sit in opposite halves, byes go to the top seeds, and two byes can
//! never meet in round one.

use crate::error::ValidationError;
use crate::slot::{Participant, Slot};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// How the roster order turns into seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMethod {
    /// Seed 1 is the first registrant, and so on.
    #[default]
    RegistrationOrder,
    /// Uniformly random permutation of the roster.
    Random,
}

impl FromStr for SeedingMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration_order" => Ok(SeedingMethod::RegistrationOrder),
            "random" => Ok(SeedingMethod::Random),
            other => Err(ValidationError::UnsupportedSeeding(other.to_string())),
        }
    }
}

impl fmt::Display for SeedingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeedingMethod::RegistrationOrder => "registration_order",
            SeedingMethod::Random => "random",
        })
    }
}

/// Smallest power of two that holds `n` participants. Fewer than two
/// participants is not a bracket.
pub fn next_power_of_two(n: usize) -> Result<usize, ValidationError> {
    if n < 2 {
        return Err(ValidationError::TooFewParticipants(n));
    }
    Ok(n.next_power_of_two())
}

/// Seeds (1-based) in first-round slot order for a bracket of `size`.
/// Consecutive pairs are the round-one matches: `[1, 8, 4, 5, 2, 7, 3, 6]`
/// for eight. Every pair sums to `size + 1`.
pub fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let next = order.len() * 2;
        order = order.iter().flat_map(|&s| [s, next + 1 - s]).collect();
    }
    order
}

/// The seed list: index `i` holds seed `i + 1`, padded with byes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    slots: Vec<Slot>,
    participant_count: usize,
}

impl SeedPlan {
    /// Draw size (always a power of two, at least 2).
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count
    }

    pub fn bye_count(&self) -> usize {
        self.slots.len() - self.participant_count
    }

    /// Slot holding the given 1-based seed.
    pub fn seed(&self, seed: usize) -> Option<&Slot> {
        seed.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Seed pairs for each first-round position, in position order.
    pub fn first_round_pairs(&self) -> Vec<(usize, usize)> {
        bracket_order(self.size())
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}

/// Plan seeds using the thread-local RNG for random seeding.
pub fn plan(
    participants: &[Participant],
    method: SeedingMethod,
) -> Result<SeedPlan, ValidationError> {
    plan_with_rng(participants, method, &mut rand::thread_rng())
}

/// Plan seeds with a caller-supplied RNG (only consulted for
/// [`SeedingMethod::Random`]).
pub fn plan_with_rng<R: Rng + ?Sized>(
    participants: &[Participant],
    method: SeedingMethod,
    rng: &mut R,
) -> Result<SeedPlan, ValidationError> {
    let size = next_power_of_two(participants.len())?;

    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if !seen.insert(p.ref_id()) {
            return Err(ValidationError::DuplicateParticipant(p.ref_id().to_string()));
        }
    }

    let mut ordered = participants.to_vec();
    if method == SeedingMethod::Random {
        ordered.shuffle(rng);
    }

    let mut slots: Vec<Slot> = ordered.into_iter().map(Slot::from).collect();
    slots.resize(size, Slot::Bye);

    Ok(SeedPlan {
        slots,
        participant_count: participants.len(),
    })
}
