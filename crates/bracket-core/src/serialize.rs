//! Storage round-trips for a bracket graph.
//!
//! Two encodings share one validation path:
//!
//! - [`BracketDocument`] -- the persisted JSON shape, one flat
//!   [`MatchRecord`] per match.
//! - A compact binary snapshot via `bitcode`, with a magic number and a
//!   format version checked before the graph is rebuilt.
//!
//! Loading always rebuilds the arena from records and runs
//! [`BracketGraph::validate`], so a hand-edited document cannot slip a
//! broken graph into the engine.

use crate::config::GrandFinal;
use crate::error::ConsistencyError;
use crate::graph::BracketGraph;
use crate::id::{MatchId, MatchIdParseError, Outcome, Section, Side};
use crate::matches::{Destination, Match};
use crate::slot::{Entrant, Feed, Opponent, Slot};
use crate::topology::BracketFormat;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current JSON document version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Magic number identifying a binary bracket snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xB4AC_0001;

/// Current binary snapshot version. Increment when breaking the layout.
pub const SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading a stored bracket.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),
    #[error("stored bracket is from a newer format version {0}")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid draw size {bracket_size} for {participant_count} participants")]
    InvalidSize {
        bracket_size: usize,
        participant_count: usize,
    },
    #[error("record {0} disagrees with its id about section, round or position")]
    RecordMismatch(MatchId),
    #[error("stored bracket is inconsistent: {0}")]
    Inconsistent(#[from] ConsistencyError),
}

fn check_version(version: u32, current: u32) -> Result<(), DeserializeError> {
    if version > current {
        return Err(DeserializeError::FutureVersion(version));
    }
    if version < current {
        return Err(DeserializeError::UnsupportedVersion(version));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Document shape
// ---------------------------------------------------------------------------

/// One match as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub section: Section,
    pub round: u32,
    pub position: u32,
    pub opponent_a: Opponent,
    pub opponent_b: Opponent,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub winner_side: Option<Side>,
    pub finished: bool,
    pub winner_destination: Option<Destination>,
    pub loser_destination: Option<Destination>,
}

impl From<&Match> for MatchRecord {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id,
            section: m.section(),
            round: m.round(),
            position: m.position(),
            opponent_a: m.opponent(Side::A).clone(),
            opponent_b: m.opponent(Side::B).clone(),
            score_a: m.score(Side::A),
            score_b: m.score(Side::B),
            winner_side: m.winner_side,
            finished: m.finished,
            winner_destination: m.winner_destination,
            loser_destination: m.loser_destination,
        }
    }
}

impl TryFrom<MatchRecord> for Match {
    type Error = DeserializeError;

    fn try_from(r: MatchRecord) -> Result<Self, Self::Error> {
        if r.section != r.id.section() || r.round != r.id.round() || r.position != r.id.position() {
            return Err(DeserializeError::RecordMismatch(r.id));
        }
        Ok(Match {
            id: r.id,
            opponents: [r.opponent_a, r.opponent_b],
            scores: [r.score_a, r.score_b],
            winner_side: r.winner_side,
            finished: r.finished,
            winner_destination: r.winner_destination,
            loser_destination: r.loser_destination,
        })
    }
}

/// A whole bracket as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketDocument {
    pub version: u32,
    pub format: BracketFormat,
    #[serde(default)]
    pub grand_final: GrandFinal,
    pub bracket_size: usize,
    pub participant_count: usize,
    pub matches: Vec<MatchRecord>,
}

impl BracketGraph {
    pub fn to_document(&self) -> BracketDocument {
        BracketDocument {
            version: DOCUMENT_VERSION,
            format: self.format(),
            grand_final: self.grand_final(),
            bracket_size: self.bracket_size(),
            participant_count: self.participant_count(),
            matches: self.matches().map(MatchRecord::from).collect(),
        }
    }

    /// Rebuild a graph from a stored document and validate it.
    pub fn from_document(doc: BracketDocument) -> Result<Self, DeserializeError> {
        check_version(doc.version, DOCUMENT_VERSION)?;
        if doc.bracket_size < 2
            || !doc.bracket_size.is_power_of_two()
            || doc.participant_count < 2
            || doc.participant_count > doc.bracket_size
        {
            return Err(DeserializeError::InvalidSize {
                bracket_size: doc.bracket_size,
                participant_count: doc.participant_count,
            });
        }

        let mut graph = BracketGraph::new(
            doc.format,
            doc.grand_final,
            doc.bracket_size,
            doc.participant_count,
        );
        for record in doc.matches {
            graph.insert(Match::try_from(record)?)?;
        }
        graph.validate()?;
        Ok(graph)
    }
}

/// Encode a graph as a JSON document.
pub fn to_json(graph: &BracketGraph) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(&graph.to_document())?)
}

/// Decode and validate a JSON document.
pub fn from_json(json: &str) -> Result<BracketGraph, DeserializeError> {
    let doc: BracketDocument = serde_json::from_str(json)?;
    BracketGraph::from_document(doc)
}

// ---------------------------------------------------------------------------
// Binary snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, bitcode::Encode, bitcode::Decode)]
enum SnapshotSlot {
    Team { ref_id: String, label: String },
    Player { ref_id: String, label: String },
    Placeholder,
    Bye,
}

#[derive(Debug, bitcode::Encode, bitcode::Decode)]
struct SnapshotLink {
    match_id: String,
    /// Side B for destinations, loser for feeds.
    flag: bool,
}

#[derive(Debug, bitcode::Encode, bitcode::Decode)]
struct SnapshotOpponent {
    slot: SnapshotSlot,
    feed: Option<SnapshotLink>,
}

#[derive(Debug, bitcode::Encode, bitcode::Decode)]
struct SnapshotMatch {
    id: String,
    a: SnapshotOpponent,
    b: SnapshotOpponent,
    score_a: Option<u32>,
    score_b: Option<u32>,
    /// `Some(false)` is side A, `Some(true)` side B.
    winner_b: Option<bool>,
    finished: bool,
    winner_destination: Option<SnapshotLink>,
    loser_destination: Option<SnapshotLink>,
}

#[derive(Debug, bitcode::Encode, bitcode::Decode)]
struct Snapshot {
    magic: u32,
    version: u32,
    double_elimination: bool,
    single_match_final: bool,
    bracket_size: u64,
    participant_count: u64,
    matches: Vec<SnapshotMatch>,
}

impl From<&Slot> for SnapshotSlot {
    fn from(slot: &Slot) -> Self {
        match slot {
            Slot::Team(e) => SnapshotSlot::Team {
                ref_id: e.ref_id.clone(),
                label: e.label.clone(),
            },
            Slot::Player(e) => SnapshotSlot::Player {
                ref_id: e.ref_id.clone(),
                label: e.label.clone(),
            },
            Slot::Placeholder => SnapshotSlot::Placeholder,
            Slot::Bye => SnapshotSlot::Bye,
        }
    }
}

impl From<SnapshotSlot> for Slot {
    fn from(slot: SnapshotSlot) -> Self {
        match slot {
            SnapshotSlot::Team { ref_id, label } => Slot::Team(Entrant { ref_id, label }),
            SnapshotSlot::Player { ref_id, label } => Slot::Player(Entrant { ref_id, label }),
            SnapshotSlot::Placeholder => Slot::Placeholder,
            SnapshotSlot::Bye => Slot::Bye,
        }
    }
}

fn parse_id(text: &str) -> Result<MatchId, DeserializeError> {
    text.parse()
        .map_err(|e: MatchIdParseError| DeserializeError::Decode(e.to_string()))
}

fn encode_opponent(o: &Opponent) -> SnapshotOpponent {
    SnapshotOpponent {
        slot: SnapshotSlot::from(&o.slot),
        feed: o.propagated_from.map(|f| SnapshotLink {
            match_id: f.match_id.to_string(),
            flag: f.outcome == Outcome::Loser,
        }),
    }
}

fn decode_opponent(o: SnapshotOpponent) -> Result<Opponent, DeserializeError> {
    let propagated_from = match o.feed {
        Some(link) => Some(Feed {
            match_id: parse_id(&link.match_id)?,
            outcome: if link.flag { Outcome::Loser } else { Outcome::Winner },
        }),
        None => None,
    };
    Ok(Opponent {
        slot: o.slot.into(),
        propagated_from,
    })
}

fn encode_destination(d: Option<Destination>) -> Option<SnapshotLink> {
    d.map(|d| SnapshotLink {
        match_id: d.match_id.to_string(),
        flag: d.side == Side::B,
    })
}

fn decode_destination(link: Option<SnapshotLink>) -> Result<Option<Destination>, DeserializeError> {
    link.map(|link| {
        Ok(Destination {
            match_id: parse_id(&link.match_id)?,
            side: if link.flag { Side::B } else { Side::A },
        })
    })
    .transpose()
}

/// Encode a graph into a versioned binary snapshot.
pub fn encode_snapshot(graph: &BracketGraph) -> Vec<u8> {
    let snapshot = Snapshot {
        magic: SNAPSHOT_MAGIC,
        version: SNAPSHOT_VERSION,
        double_elimination: graph.format() == BracketFormat::DoubleElimination,
        single_match_final: graph.grand_final() == GrandFinal::SingleMatch,
        bracket_size: graph.bracket_size() as u64,
        participant_count: graph.participant_count() as u64,
        matches: graph
            .matches()
            .map(|m| SnapshotMatch {
                id: m.id.to_string(),
                a: encode_opponent(m.opponent(Side::A)),
                b: encode_opponent(m.opponent(Side::B)),
                score_a: m.score(Side::A),
                score_b: m.score(Side::B),
                winner_b: m.winner_side.map(|s| s == Side::B),
                finished: m.finished,
                winner_destination: encode_destination(m.winner_destination),
                loser_destination: encode_destination(m.loser_destination),
            })
            .collect(),
    };
    bitcode::encode(&snapshot)
}

/// Decode a binary snapshot, check its header, and validate the graph.
pub fn decode_snapshot(data: &[u8]) -> Result<BracketGraph, DeserializeError> {
    let snapshot: Snapshot =
        bitcode::decode(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    if snapshot.magic != SNAPSHOT_MAGIC {
        return Err(DeserializeError::InvalidMagic(snapshot.magic));
    }
    check_version(snapshot.version, SNAPSHOT_VERSION)?;

    let mut matches = Vec::with_capacity(snapshot.matches.len());
    for m in snapshot.matches {
        let id = parse_id(&m.id)?;
        matches.push(MatchRecord {
            id,
            section: id.section(),
            round: id.round(),
            position: id.position(),
            opponent_a: decode_opponent(m.a)?,
            opponent_b: decode_opponent(m.b)?,
            score_a: m.score_a,
            score_b: m.score_b,
            winner_side: m.winner_b.map(|b| if b { Side::B } else { Side::A }),
            finished: m.finished,
            winner_destination: decode_destination(m.winner_destination)?,
            loser_destination: decode_destination(m.loser_destination)?,
        });
    }

    BracketGraph::from_document(BracketDocument {
        version: DOCUMENT_VERSION,
        format: if snapshot.double_elimination {
            BracketFormat::DoubleElimination
        } else {
            BracketFormat::SingleElimination
        },
        grand_final: if snapshot.single_match_final {
            GrandFinal::SingleMatch
        } else {
            GrandFinal::Reset
        },
        bracket_size: snapshot.bracket_size as usize,
        participant_count: snapshot.participant_count as usize,
        matches,
    })
}
