//! Participant slots: who (or what) occupies one side of a match.

use crate::id::{MatchId, Outcome};
use serde::{Deserialize, Serialize};

/// A real competitor's identity as known to the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entrant {
    /// Stable reference id (roster row, team id, ...).
    pub ref_id: String,
    /// Display label.
    pub label: String,
}

impl Entrant {
    pub fn new(ref_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            label: label.into(),
        }
    }
}

/// A roster entry handed to the engine. Only real competitors can be
/// participants; byes and placeholders are synthesized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Participant {
    Team(Entrant),
    Player(Entrant),
}

impl Participant {
    pub fn team(ref_id: impl Into<String>, label: impl Into<String>) -> Self {
        Participant::Team(Entrant::new(ref_id, label))
    }

    pub fn player(ref_id: impl Into<String>, label: impl Into<String>) -> Self {
        Participant::Player(Entrant::new(ref_id, label))
    }

    pub fn entrant(&self) -> &Entrant {
        match self {
            Participant::Team(e) | Participant::Player(e) => e,
        }
    }

    pub fn ref_id(&self) -> &str {
        &self.entrant().ref_id
    }
}

/// The occupant of one opponent slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Slot {
    Team(Entrant),
    Player(Entrant),
    /// Waiting for an upstream match to finish.
    Placeholder,
    /// Synthetic filler that loses its only match.
    Bye,
}

impl Slot {
    pub fn entrant(&self) -> Option<&Entrant> {
        match self {
            Slot::Team(e) | Slot::Player(e) => Some(e),
            Slot::Placeholder | Slot::Bye => None,
        }
    }

    /// The slot as a participant, if it holds a real competitor.
    pub fn participant(&self) -> Option<Participant> {
        match self {
            Slot::Team(e) => Some(Participant::Team(e.clone())),
            Slot::Player(e) => Some(Participant::Player(e.clone())),
            Slot::Placeholder | Slot::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Slot::Placeholder)
    }
}

impl From<Participant> for Slot {
    fn from(p: Participant) -> Self {
        match p {
            Participant::Team(e) => Slot::Team(e),
            Participant::Player(e) => Slot::Player(e),
        }
    }
}

/// Upstream link recorded on an opponent slot: the match whose winner or
/// loser fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feed {
    pub match_id: MatchId,
    pub outcome: Outcome,
}

/// One side of a match: its occupant plus where that occupant comes from.
/// Seeded first-round slots have no feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opponent {
    pub slot: Slot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagated_from: Option<Feed>,
}

impl Opponent {
    pub fn seeded(slot: Slot) -> Self {
        Self {
            slot,
            propagated_from: None,
        }
    }

    pub fn awaiting(match_id: MatchId, outcome: Outcome) -> Self {
        Self {
            slot: Slot::Placeholder,
            propagated_from: Some(Feed { match_id, outcome }),
        }
    }
}

impl Default for Opponent {
    fn default() -> Self {
        Self::seeded(Slot::Placeholder)
    }
}
