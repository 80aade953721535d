// Core allocation search: constrained greedy slot filling.
//
// Three passes over the open slots, in order:
// 1. Quota pass: satisfy exact-count team stack quotas with each team's
//    best-ranked hitters.
// 2. Value-density pass: fill remaining slots by value/salary ratio, with
//    a bonus for teams still short of a non-exact quota and a hard ceiling
//    on teams at an exact quota.
// 3. Fallback pass: guarantee every slot is filled if any affordable
//    eligible candidate exists, ignoring stack preferences entirely.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::optimizer::Criterion;
use crate::player::{slot_sort_key, CandidatePlayer};

/// Flat value multiplier applied to candidates from a team that still has an
/// unmet non-exact stack shortfall. Heuristic, not tuned: it only has to
/// nudge the density ranking toward completing the stack cheaply.
pub const STACK_NEED_BONUS: f64 = 1.5;

/// One filled slot in a lineup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub slot: String,
    pub player: CandidatePlayer,
}

/// A per-team stack requirement. `exact` quotas are a ceiling as well as a
/// target: the team never contributes more than `count` hitters. Non-exact
/// quotas are a floor the density pass favors but never enforces.
///
/// Counts cover non-pitcher players only, including pre-assigned must-starts.
#[derive(Debug, Clone)]
pub struct TeamQuota {
    pub team: String,
    pub count: usize,
    pub exact: bool,
}

/// Result of one allocation run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Final lineup in canonical slot order, pre-assigned players included.
    pub lineup: Vec<Assignment>,
    pub remaining_budget: u32,
    /// Slot labels that could not be filled even by the fallback pass.
    pub unfilled: Vec<String>,
}

impl SearchOutcome {
    /// Total lineup value under the given criterion.
    pub fn total_value(&self, criterion: Criterion) -> f64 {
        self.lineup
            .iter()
            .map(|a| criterion.value_of(&a.player))
            .sum()
    }
}

/// Non-pitcher lineup count per team. Pitchers never count toward a stack.
fn team_stack_counts(lineup: &[Assignment]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for a in lineup {
        if !a.player.is_pitcher() {
            *counts.entry(a.player.team.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Fill `slots` from `pool` under `budget`, honoring `quotas`.
///
/// `pre_assigned` players (must-starts) are carried into the lineup, count
/// toward stack quotas, and are never reconsidered. Slots are consumed in
/// their current list order; candidate ranking ties break by player id
/// ascending so identical inputs always produce identical lineups.
pub fn allocate(
    pool: &[CandidatePlayer],
    slots: &[String],
    budget: u32,
    criterion: Criterion,
    pre_assigned: &[Assignment],
    quotas: &[TeamQuota],
) -> SearchOutcome {
    let mut lineup: Vec<Assignment> = pre_assigned.to_vec();
    let mut open: Vec<String> = slots.to_vec();
    let mut budget = budget;
    let mut used: HashSet<i64> = lineup.iter().map(|a| a.player.id).collect();

    // ---- Pass 1: exact-count quota filling ----

    for quota in quotas {
        let placed = team_stack_counts(&lineup)
            .get(&quota.team)
            .copied()
            .unwrap_or(0);
        let mut needed = quota.count.saturating_sub(placed);
        if needed == 0 {
            continue;
        }

        let mut ranked: Vec<&CandidatePlayer> = pool
            .iter()
            .filter(|p| p.team == quota.team && !p.is_pitcher() && !used.contains(&p.id))
            .collect();
        ranked.sort_by(|a, b| {
            criterion
                .value_of(b)
                .partial_cmp(&criterion.value_of(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        for cand in ranked {
            if needed == 0 {
                break;
            }
            if cand.salary > budget {
                continue;
            }
            if let Some(idx) = open.iter().position(|s| cand.eligible_for(s)) {
                budget -= cand.salary;
                used.insert(cand.id);
                lineup.push(Assignment {
                    slot: open.remove(idx),
                    player: cand.clone(),
                });
                needed -= 1;
            }
        }

        // A shortfall is not a hard failure: the arrangement proceeds and
        // the gap surfaces as lower total value and a result message.
        if needed > 0 {
            warn!(
                "stack quota shortfall: team {} short {} of {}",
                quota.team, needed, quota.count
            );
        }
    }

    // ---- Pass 2: value-density filling ----

    loop {
        if open.is_empty() {
            break;
        }
        let counts = team_stack_counts(&lineup);

        let mut best: Option<(usize, &CandidatePlayer)> = None;
        let mut best_ratio = f64::NEG_INFINITY;

        for (slot_idx, slot) in open.iter().enumerate() {
            for cand in pool {
                if used.contains(&cand.id) || cand.salary > budget || !cand.eligible_for(slot) {
                    continue;
                }
                let team_count = counts.get(&cand.team).copied().unwrap_or(0);
                if !cand.is_pitcher() {
                    // Exact quotas are a ceiling: never exceed.
                    if quotas
                        .iter()
                        .any(|q| q.exact && q.team == cand.team && team_count >= q.count)
                    {
                        continue;
                    }
                }
                let mut value = criterion.value_of(cand);
                if !cand.is_pitcher()
                    && quotas
                        .iter()
                        .any(|q| !q.exact && q.team == cand.team && team_count < q.count)
                {
                    value *= STACK_NEED_BONUS;
                }
                // Salary ranks on raw value: dividing salary by salary
                // would cancel to 1.0 for every candidate.
                let ratio = match criterion {
                    Criterion::Salary => value,
                    _ => value / cand.salary.max(1) as f64,
                };
                // Strict comparison keeps the first encountered on ties:
                // earliest slot, then lowest player id (pool is id-ordered).
                if ratio > best_ratio {
                    best_ratio = ratio;
                    best = Some((slot_idx, cand));
                }
            }
        }

        match best {
            Some((slot_idx, cand)) => {
                budget -= cand.salary;
                used.insert(cand.id);
                lineup.push(Assignment {
                    slot: open.remove(slot_idx),
                    player: cand.clone(),
                });
            }
            None => break,
        }
    }

    // ---- Pass 3: fallback guarantee ----

    let mut unfilled = Vec::new();
    while !open.is_empty() {
        let slot = open.remove(0);

        let mut best: Option<&CandidatePlayer> = None;
        let mut best_value = f64::NEG_INFINITY;
        for cand in pool {
            if used.contains(&cand.id) || cand.salary > budget || !cand.eligible_for(&slot) {
                continue;
            }
            let value = criterion.value_of(cand);
            if value > best_value {
                best_value = value;
                best = Some(cand);
            }
        }

        match best {
            Some(cand) => {
                debug!("fallback fill: {} -> {}", cand.name, slot);
                budget -= cand.salary;
                used.insert(cand.id);
                lineup.push(Assignment {
                    slot,
                    player: cand.clone(),
                });
            }
            None => unfilled.push(slot),
        }
    }

    // ---- Presentation sort ----

    // Stable, so players within the same slot label keep assignment order.
    lineup.sort_by_key(|a| slot_sort_key(&a.slot));

    SearchOutcome {
        lineup,
        remaining_budget: budget,
        unfilled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerStatus;

    fn player(id: i64, team: &str, positions: &str, salary: u32, points: f64) -> CandidatePlayer {
        CandidatePlayer {
            id,
            name: format!("Player {id}"),
            team: team.to_string(),
            positions: CandidatePlayer::parse_positions(positions),
            salary,
            projection: Some(points),
            status: PlayerStatus::Active,
        }
    }

    fn slots(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn lineup_ids(outcome: &SearchOutcome) -> Vec<i64> {
        outcome.lineup.iter().map(|a| a.player.id).collect()
    }

    #[test]
    fn fills_simple_lineup_within_cap() {
        let pool = vec![
            player(1, "NYY", "SP", 9000, 20.0),
            player(2, "BOS", "C", 4000, 8.0),
            player(3, "LAD", "1B", 2000, 5.0),
        ];
        let outcome = allocate(
            &pool,
            &slots(&["P", "C", "1B"]),
            15000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        assert!(outcome.unfilled.is_empty());
        assert_eq!(outcome.lineup.len(), 3);
        assert_eq!(outcome.remaining_budget, 0);
        assert_eq!(outcome.total_value(Criterion::PointsPerGame), 33.0);
    }

    #[test]
    fn presentation_order_is_canonical() {
        let pool = vec![
            player(1, "NYY", "OF", 3000, 9.0),
            player(2, "BOS", "C", 3000, 8.0),
            player(3, "LAD", "SP", 3000, 15.0),
        ];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "C", "P"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        let labels: Vec<&str> = outcome.lineup.iter().map(|a| a.slot.as_str()).collect();
        assert_eq!(labels, vec!["P", "C", "OF"]);
    }

    #[test]
    fn exact_quota_is_filled_with_best_players() {
        let pool = vec![
            player(1, "NYY", "OF", 4000, 12.0),
            player(2, "NYY", "OF", 4000, 10.0),
            player(3, "NYY", "1B", 4000, 8.0),
            player(4, "BOS", "OF", 4000, 20.0),
            player(5, "BOS", "1B", 4000, 20.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 2,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF", "1B"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        // The two best NYY hitters fill the quota before value ranking runs.
        let nyy: Vec<i64> = outcome
            .lineup
            .iter()
            .filter(|a| a.player.team == "NYY")
            .map(|a| a.player.id)
            .collect();
        assert_eq!(nyy, vec![1, 2]);
    }

    #[test]
    fn exact_quota_never_exceeded() {
        // Every NYY player dominates on value; the quota ceiling must still
        // hold the team to exactly two hitters.
        let pool = vec![
            player(1, "NYY", "OF", 3000, 50.0),
            player(2, "NYY", "OF", 3000, 50.0),
            player(3, "NYY", "OF", 3000, 50.0),
            player(4, "BOS", "OF", 3000, 1.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 2,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        let counts = team_stack_counts(&outcome.lineup);
        assert_eq!(counts.get("NYY"), Some(&2));
        assert_eq!(counts.get("BOS"), Some(&1));
    }

    #[test]
    fn quota_shortfall_degrades_without_failing() {
        // Quota of 5 but only 2 eligible NYY hitters exist.
        let pool = vec![
            player(1, "NYY", "OF", 3000, 10.0),
            player(2, "NYY", "OF", 3000, 9.0),
            player(3, "BOS", "OF", 3000, 8.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 5,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        assert!(outcome.unfilled.is_empty());
        let counts = team_stack_counts(&outcome.lineup);
        assert_eq!(counts.get("NYY"), Some(&2));
    }

    #[test]
    fn quota_counts_pre_assigned_must_starts() {
        let pre = vec![Assignment {
            slot: "OF".to_string(),
            player: player(1, "NYY", "OF", 5000, 10.0),
        }];
        let pool = vec![
            player(2, "NYY", "OF", 4000, 9.0),
            player(3, "NYY", "OF", 4000, 8.0),
            player(4, "BOS", "OF", 4000, 7.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 2,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            45000,
            Criterion::PointsPerGame,
            &pre,
            &quotas,
        );
        // Must-start counts as 1 of 2; quota pass adds only player 2.
        let counts = team_stack_counts(&outcome.lineup);
        assert_eq!(counts.get("NYY"), Some(&2));
        assert!(lineup_ids(&outcome).contains(&4));
    }

    #[test]
    fn pitchers_do_not_count_toward_stacks() {
        let pre = vec![Assignment {
            slot: "P".to_string(),
            player: player(1, "NYY", "SP", 8000, 20.0),
        }];
        let pool = vec![
            player(2, "NYY", "OF", 4000, 9.0),
            player(3, "NYY", "OF", 4000, 8.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 2,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            42000,
            Criterion::PointsPerGame,
            &pre,
            &quotas,
        );
        // The NYY pitcher does not satisfy the quota; both hitters are taken.
        let counts = team_stack_counts(&outcome.lineup);
        assert_eq!(counts.get("NYY"), Some(&2));
        assert_eq!(outcome.lineup.len(), 3);
    }

    #[test]
    fn non_exact_shortfall_bonus_prefers_stack_team() {
        // BOS has slightly better raw density, but NYY carries a non-exact
        // quota shortfall, and the 1.5x bonus outweighs the gap.
        let pool = vec![
            player(1, "BOS", "OF", 4000, 10.0),
            player(2, "NYY", "OF", 4000, 8.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 1,
            exact: false,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        assert_eq!(lineup_ids(&outcome), vec![2]);
    }

    #[test]
    fn non_exact_quota_is_not_a_ceiling() {
        let pool = vec![
            player(1, "NYY", "OF", 4000, 10.0),
            player(2, "NYY", "OF", 4000, 9.0),
            player(3, "BOS", "OF", 4000, 1.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 1,
            exact: false,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        // Once the floor is met, NYY players still win on raw density.
        let counts = team_stack_counts(&outcome.lineup);
        assert_eq!(counts.get("NYY"), Some(&2));
    }

    #[test]
    fn tight_cap_still_fills_with_cheap_player() {
        // The stud consumes most of the cap; the second slot falls to the
        // only player still affordable.
        let pool = vec![
            player(1, "NYY", "OF", 9000, 30.0),
            player(2, "BOS", "OF", 9000, 20.0),
            player(3, "LAD", "OF", 1000, 1.0),
        ];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            10000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        assert!(outcome.unfilled.is_empty());
        assert_eq!(outcome.lineup.len(), 2);
        let salary: u32 = outcome.lineup.iter().map(|a| a.player.salary).sum();
        assert!(salary <= 10000);
    }

    #[test]
    fn fallback_ignores_exact_quota_ceiling() {
        // Only NYY hitters remain for the second slot; the guarantee wins
        // over the stack ceiling.
        let pool = vec![
            player(1, "NYY", "OF", 3000, 10.0),
            player(2, "NYY", "OF", 3000, 9.0),
        ];
        let quotas = vec![TeamQuota {
            team: "NYY".to_string(),
            count: 1,
            exact: true,
        }];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &quotas,
        );
        assert!(outcome.unfilled.is_empty());
        assert_eq!(outcome.lineup.len(), 2);
    }

    #[test]
    fn unfillable_slot_is_reported() {
        let pool = vec![player(1, "NYY", "OF", 3000, 10.0)];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "SS"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        assert_eq!(outcome.unfilled, vec!["SS"]);
        assert_eq!(outcome.lineup.len(), 1);
    }

    #[test]
    fn no_player_double_booked() {
        // One eligible player, two slots: he fills exactly one.
        let pool = vec![player(1, "NYY", "OF", 3000, 10.0)];
        let outcome = allocate(
            &pool,
            &slots(&["OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        assert_eq!(outcome.lineup.len(), 1);
        assert_eq!(outcome.unfilled, vec!["OF"]);
    }

    #[test]
    fn salary_criterion_maximizes_spend() {
        let pool = vec![
            player(1, "NYY", "OF", 3000, 50.0),
            player(2, "BOS", "OF", 8000, 1.0),
        ];
        let outcome = allocate(
            &pool,
            &slots(&["OF"]),
            50000,
            Criterion::Salary,
            &[],
            &[],
        );
        assert_eq!(lineup_ids(&outcome), vec![2]);
    }

    #[test]
    fn allocation_is_deterministic() {
        // Equal value and salary everywhere; ties must break by id.
        let pool: Vec<CandidatePlayer> = (1..=6)
            .map(|id| player(id, "NYY", "OF", 4000, 10.0))
            .collect();
        let first = allocate(
            &pool,
            &slots(&["OF", "OF", "OF"]),
            50000,
            Criterion::PointsPerGame,
            &[],
            &[],
        );
        for _ in 0..5 {
            let again = allocate(
                &pool,
                &slots(&["OF", "OF", "OF"]),
                50000,
                Criterion::PointsPerGame,
                &[],
                &[],
            );
            assert_eq!(lineup_ids(&first), lineup_ids(&again));
        }
        assert_eq!(lineup_ids(&first), vec![1, 2, 3]);
    }
}
