// Player pool assembly: base filter, watch-list narrowing, exclusions, and
// the stack-team union.

use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use crate::optimizer::OptimizationParameters;
use crate::player::{CandidatePlayer, PlayerStatus};
use crate::sources::PlayerPoolSource;

/// Assemble the candidate pool for one optimization run.
///
/// Starts from the draft group minus OUT players, narrows to the watch-list
/// when one is given, strips exclusions, then unions in every non-pitcher
/// from each stack team so stacking always sees a full team roster (watch-
/// list notwithstanding). Exclusions and OUT status apply to the unioned
/// players too. The pool is deduplicated by player id and returned in id
/// order so downstream tie-breaks are deterministic.
///
/// An empty pool is not an error here; the caller reports it as an
/// unsuccessful result.
pub fn build_pool(
    params: &OptimizationParameters,
    stack_teams: &[String],
    source: &dyn PlayerPoolSource,
) -> Result<Vec<CandidatePlayer>> {
    let watch: HashSet<i64> = params.watch_list.iter().copied().collect();
    let excluded: HashSet<i64> = params.exclusions.iter().copied().collect();

    let mut pool: Vec<CandidatePlayer> = source
        .fetch_pool(&params.draft_group)?
        .into_iter()
        .filter(|p| p.status != PlayerStatus::Out)
        .filter(|p| watch.is_empty() || watch.contains(&p.id))
        .filter(|p| !excluded.contains(&p.id))
        .collect();

    let mut seen: HashSet<i64> = pool.iter().map(|p| p.id).collect();
    for team in stack_teams {
        for p in source.fetch_pool_for_team(&params.draft_group, team, true)? {
            if p.status == PlayerStatus::Out || excluded.contains(&p.id) {
                continue;
            }
            if seen.insert(p.id) {
                pool.push(p);
            }
        }
    }

    pool.sort_by_key(|p| p.id);
    debug!(
        "pool for {}: {} candidates ({} stack teams)",
        params.draft_group,
        pool.len(),
        stack_teams.len()
    );
    Ok(pool)
}
