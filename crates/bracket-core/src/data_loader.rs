//! Roster and option loading from JSON or TOML.
//!
//! Feature-gated behind `data-loader`. A roster file carries the generation
//! options and the ordered participant list:
//!
//! ```toml
//! [options]
//! format = "double_elimination"
//! seeding = "random"
//! rng_seed = 7
//!
//! [[participants]]
//! type = "team"
//! ref_id = "t-1"
//! label = "Otters"
//! ```

use crate::config::BracketOptions;
use crate::engine::generate_with_options;
use crate::error::{BracketError, ValidationError};
use crate::graph::BracketGraph;
use crate::seed::{SeedingMethod, plan};
use crate::slot::Participant;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during roster loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid roster: {0}")]
    Validation(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// Roster data
// ---------------------------------------------------------------------------

/// A finalized roster plus the options to generate its bracket with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterData {
    #[serde(default)]
    pub options: BracketOptions,
    pub participants: Vec<Participant>,
}

impl RosterData {
    /// Generate the bracket this roster describes.
    pub fn generate(&self) -> Result<BracketGraph, BracketError> {
        generate_with_options(&self.participants, &self.options)
    }

    fn checked(self) -> Result<Self, DataLoadError> {
        // Same size and duplicate checks generation applies, surfaced at load.
        plan(&self.participants, SeedingMethod::RegistrationOrder)?;
        Ok(self)
    }
}

/// Load a roster from JSON.
pub fn load_roster_json(json: &str) -> Result<RosterData, DataLoadError> {
    let data: RosterData = serde_json::from_str(json)?;
    data.checked()
}

/// Load a roster from TOML.
pub fn load_roster_toml(text: &str) -> Result<RosterData, DataLoadError> {
    let data: RosterData = toml::from_str(text)?;
    data.checked()
}
