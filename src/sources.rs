// Collaborator interfaces consumed by the optimizer.
//
// The optimizer never talks to SQLite or the strategy tables directly; it
// takes these traits so the boundary can wire in the real stores and tests
// can wire in in-memory fakes.

use anyhow::Result;

use crate::player::CandidatePlayer;

/// Read-only source of candidate players for a draft group.
pub trait PlayerPoolSource {
    /// All candidates in a draft group, including OUT players (the pool
    /// builder filters status itself).
    fn fetch_pool(&self, draft_group: &str) -> Result<Vec<CandidatePlayer>>;

    /// Candidates in a draft group restricted to one team, optionally
    /// excluding pitchers. Used to pull in full stack-team rosters.
    fn fetch_pool_for_team(
        &self,
        draft_group: &str,
        team: &str,
        exclude_pitchers: bool,
    ) -> Result<Vec<CandidatePlayer>>;

    /// A single candidate by id, or None if not in the draft group.
    fn fetch_by_id(&self, draft_group: &str, player_id: i64) -> Result<Option<CandidatePlayer>>;
}

/// Read-only slate metadata.
pub trait SlateMetadataSource {
    /// Number of games on the slate, or None if the slate is unknown.
    fn total_games_for_slate(&self, draft_group: &str) -> Result<Option<u32>>;
}

/// A recommended stacking strategy for a slate size.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRecommendation {
    /// Canonical strategy label, e.g. "5-3".
    pub label: String,
    /// Human-readable rationale for the recommendation.
    pub rationale: String,
}

/// Stack strategy lookup tables.
pub trait StrategyRecommendationSource {
    /// Recommend a strategy label for a slate with the given game count.
    fn recommend(&self, total_games: u32) -> Option<StrategyRecommendation>;

    /// The (primary, secondary) stack sizes for a strategy label, or None
    /// if the label is unknown.
    fn requirements_for(&self, label: &str) -> Option<(usize, usize)>;
}
