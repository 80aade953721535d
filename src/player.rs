// Candidate player model, position tags, and slot eligibility.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position tag groups
// ---------------------------------------------------------------------------

/// Tags that mark a player as a pitcher. A pitcher-tagged player may only
/// occupy a "P" slot, never a field slot.
pub const PITCHER_TAGS: &[&str] = &["P", "SP", "RP"];

/// Tags that all satisfy an "OF" slot.
pub const OUTFIELD_TAGS: &[&str] = &["OF", "LF", "CF", "RF"];

/// Canonical slot order for lineup presentation: P, C, then around the
/// infield, then OF. Unknown labels sort after these, alphabetically.
const CANONICAL_SLOT_ORDER: &[&str] = &["P", "C", "1B", "2B", "3B", "SS", "OF"];

/// Deterministic ordering index for a slot label.
///
/// Known labels use their canonical position; anything else sorts after
/// them so custom labels still produce a stable lineup order.
pub fn slot_sort_key(label: &str) -> (usize, String) {
    match CANONICAL_SLOT_ORDER.iter().position(|&s| s == label) {
        Some(idx) => (idx, String::new()),
        None => (CANONICAL_SLOT_ORDER.len(), label.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Player status
// ---------------------------------------------------------------------------

/// Roster status as reported by the slate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    Active,
    Out,
}

impl PlayerStatus {
    /// Parse a provider status string. Anything other than an explicit
    /// out/inactive marker is treated as active.
    pub fn from_str_status(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "OUT" | "O" | "INACTIVE" | "NA" => PlayerStatus::Out,
            _ => PlayerStatus::Active,
        }
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerStatus::Active => write!(f, "ACTIVE"),
            PlayerStatus::Out => write!(f, "OUT"),
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate player
// ---------------------------------------------------------------------------

/// A player eligible for lineup selection. Immutable once fetched for a
/// given optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePlayer {
    /// Provider player id, unique within a draft group.
    pub id: i64,
    pub name: String,
    /// Real-world team abbreviation (e.g. "NYY").
    pub team: String,
    /// Position tags parsed from the raw position string (e.g. "SP/RP" ->
    /// ["SP", "RP"]).
    pub positions: Vec<String>,
    /// Salary in the slate's currency units.
    pub salary: u32,
    /// Projected fantasy points per game. None when the provider supplied
    /// no projection; treated as 0.0 by every value criterion.
    pub projection: Option<f64>,
    pub status: PlayerStatus,
}

impl CandidatePlayer {
    /// Split a raw provider position string into tags.
    /// "SP/RP" -> ["SP", "RP"]; "OF" -> ["OF"].
    pub fn parse_positions(raw: &str) -> Vec<String> {
        raw.split('/')
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Whether any of this player's tags is a pitcher tag.
    pub fn is_pitcher(&self) -> bool {
        self.positions
            .iter()
            .any(|tag| PITCHER_TAGS.contains(&tag.as_str()))
    }

    /// Whether this player can fill a slot with the given label.
    ///
    /// Rules:
    /// - "P" is satisfied by any pitcher tag (P, SP, RP).
    /// - Pitchers fill only "P" slots, regardless of other tags.
    /// - "OF" is satisfied by any outfield tag (OF, LF, CF, RF).
    /// - Any other label requires an exact tag match.
    pub fn eligible_for(&self, slot_label: &str) -> bool {
        if slot_label == "P" {
            return self.is_pitcher();
        }
        if self.is_pitcher() {
            return false;
        }
        if slot_label == "OF" {
            return self
                .positions
                .iter()
                .any(|tag| OUTFIELD_TAGS.contains(&tag.as_str()));
        }
        self.positions.iter().any(|tag| tag == slot_label)
    }

    /// Projection with missing values coalesced to zero.
    pub fn projection_or_zero(&self) -> f64 {
        self.projection.unwrap_or(0.0)
    }
}
