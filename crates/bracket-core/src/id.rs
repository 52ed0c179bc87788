use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;
use std::str::FromStr;

new_key_type! {
    /// Arena key for a match stored in a bracket graph. Never persisted;
    /// [`MatchId`] is the stable identity.
    pub struct MatchKey;
}

// ---------------------------------------------------------------------------
// Section / Side / Outcome
// ---------------------------------------------------------------------------

/// Which part of the bracket a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Winners,
    Losers,
    Final,
}

impl Section {
    /// Single-letter prefix used in match ids.
    pub fn prefix(self) -> char {
        match self {
            Section::Winners => 'W',
            Section::Losers => 'L',
            Section::Final => 'F',
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'W' => Some(Section::Winners),
            'L' => Some(Section::Losers),
            'F' => Some(Section::Final),
            _ => None,
        }
    }
}

/// One of the two opponent slots of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// Side a match at 1-based `position` occupies when two adjacent
    /// matches feed a single match of the next round.
    pub(crate) fn for_position(position: u32) -> Side {
        if position % 2 == 1 { Side::A } else { Side::B }
    }
}

/// Which entrant of a finished match is forwarded along a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner,
    Loser,
}

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Errors produced when parsing a [`MatchId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid match id {0:?}: expected <W|L|F><round>-<position>")]
pub struct MatchIdParseError(pub String);

/// Deterministic, human-addressable match identity, rendered as
/// `<section><round>-<position>` (e.g. `W1-3`, `L4-1`, `F2-1`).
///
/// Ordering is section, then round, then position, which is also the
/// order matches are played in within a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchId {
    section: Section,
    round: u32,
    position: u32,
}

impl MatchId {
    /// Build an id. Round and position are 1-based.
    pub fn new(section: Section, round: u32, position: u32) -> Self {
        debug_assert!(round >= 1 && position >= 1);
        Self {
            section,
            round,
            position,
        }
    }

    pub fn winners(round: u32, position: u32) -> Self {
        Self::new(Section::Winners, round, position)
    }

    pub fn losers(round: u32, position: u32) -> Self {
        Self::new(Section::Losers, round, position)
    }

    /// The first grand-final match.
    pub fn grand_final() -> Self {
        Self::new(Section::Final, 1, 1)
    }

    /// The lazily created grand-final reset match.
    pub fn grand_final_reset() -> Self {
        Self::new(Section::Final, 2, 1)
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn position(&self) -> u32 {
        self.position
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", self.section.prefix(), self.round, self.position)
    }
}

impl FromStr for MatchId {
    type Err = MatchIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MatchIdParseError(s.to_string());
        let mut chars = s.chars();
        let section = chars.next().and_then(Section::from_prefix).ok_or_else(err)?;
        let (round, position) = chars.as_str().split_once('-').ok_or_else(err)?;
        let round: u32 = round.parse().map_err(|_| err())?;
        let position: u32 = position.parse().map_err(|_| err())?;
        if round == 0 || position == 0 {
            return Err(err());
        }
        // Only the canonical spelling is accepted: no sign, no leading zeros.
        let id = Self::new(section, round, position);
        if id.to_string() != s {
            return Err(err());
        }
        Ok(id)
    }
}

impl TryFrom<String> for MatchId {
    type Error = MatchIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchId> for String {
    fn from(id: MatchId) -> Self {
        id.to_string()
    }
}
