//! Generation options.

use crate::seed::SeedingMethod;
use crate::topology::BracketFormat;
use serde::{Deserialize, Serialize};

/// How a double-elimination grand final is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrandFinal {
    /// True double elimination: if the Losers-section finalist wins the
    /// first Final match, a second one is created between the same pair.
    #[default]
    Reset,
    /// The first Final match always decides the champion.
    SingleMatch,
}

/// Everything that shapes a generated bracket apart from the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketOptions {
    pub format: BracketFormat,
    pub seeding: SeedingMethod,
    /// Seed for [`SeedingMethod::Random`]; `None` draws from the thread RNG.
    pub rng_seed: Option<u64>,
    /// Ignored for single elimination.
    pub grand_final: GrandFinal,
}

impl BracketOptions {
    pub fn new(format: BracketFormat, seeding: SeedingMethod) -> Self {
        Self {
            format,
            seeding,
            ..Self::default()
        }
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_grand_final(mut self, grand_final: GrandFinal) -> Self {
        self.grand_final = grand_final;
        self
    }
}
