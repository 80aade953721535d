// Stack strategy resolution and arrangement evaluation.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::optimizer::must_start::MustStartState;
use crate::optimizer::search::{allocate, SearchOutcome, TeamQuota};
use crate::optimizer::{Criterion, OptimizationParameters};
use crate::player::CandidatePlayer;
use crate::sources::{SlateMetadataSource, StrategyRecommendationSource};

// ---------------------------------------------------------------------------
// Stack definition
// ---------------------------------------------------------------------------

/// A resolved stack requirement, derived once per run and never mutated.
/// Invalid definitions carry a rationale explaining why the run proceeds
/// without stacking.
#[derive(Debug, Clone)]
pub struct StackDefinition {
    pub valid: bool,
    pub primary_size: usize,
    pub secondary_size: usize,
    pub rationale: String,
}

impl StackDefinition {
    fn invalid(rationale: impl Into<String>) -> Self {
        Self {
            valid: false,
            primary_size: 0,
            secondary_size: 0,
            rationale: rationale.into(),
        }
    }
}

/// A concrete (team, size) pairing under evaluation. Two of these exist per
/// stacked run: original team order and swapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackArrangement {
    pub primary_team: String,
    pub primary_size: usize,
    pub secondary_team: String,
    pub secondary_size: usize,
}

impl StackArrangement {
    fn quotas(&self) -> Vec<TeamQuota> {
        vec![
            TeamQuota {
                team: self.primary_team.clone(),
                count: self.primary_size,
                exact: true,
            },
            TeamQuota {
                team: self.secondary_team.clone(),
                count: self.secondary_size,
                exact: true,
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// Strategy resolution
// ---------------------------------------------------------------------------

/// Turn the request's stack settings into a concrete size pair.
///
/// "suggested" consults the slate's game count and the strategy book; any
/// explicit strategy must be a "X-Y" pair of positive integers. Fewer than
/// two named teams makes the definition invalid regardless of mode.
pub fn resolve(
    params: &OptimizationParameters,
    slate_source: &dyn SlateMetadataSource,
    strategy_source: &dyn StrategyRecommendationSource,
) -> Result<StackDefinition> {
    let Some(stack) = &params.stack else {
        return Ok(StackDefinition::invalid("no stack requested"));
    };

    if stack.teams.len() < 2 {
        return Ok(StackDefinition::invalid(
            "fewer than two strategy teams supplied",
        ));
    }

    if stack.strategy.eq_ignore_ascii_case("suggested") {
        let Some(total_games) = slate_source.total_games_for_slate(&params.draft_group)? else {
            return Ok(StackDefinition::invalid(
                "slate has no recorded game count",
            ));
        };
        let Some(rec) = strategy_source.recommend(total_games) else {
            return Ok(StackDefinition::invalid(format!(
                "no strategy suggestion for a {total_games}-game slate"
            )));
        };
        let Some((primary, secondary)) = strategy_source.requirements_for(&rec.label) else {
            return Ok(StackDefinition::invalid(format!(
                "no stack requirements for strategy {}",
                rec.label
            )));
        };
        debug!("suggested stack {} for {total_games} games", rec.label);
        return Ok(StackDefinition {
            valid: true,
            primary_size: primary,
            secondary_size: secondary,
            rationale: rec.rationale,
        });
    }

    match parse_explicit(&stack.strategy) {
        Some((primary, secondary)) => Ok(StackDefinition {
            valid: true,
            primary_size: primary,
            secondary_size: secondary,
            rationale: format!("explicit {primary}-{secondary} strategy requested"),
        }),
        None => Ok(StackDefinition::invalid(format!(
            "invalid stack strategy `{}`",
            stack.strategy
        ))),
    }
}

/// Parse an explicit "X-Y" strategy string into positive sizes.
fn parse_explicit(strategy: &str) -> Option<(usize, usize)> {
    let (left, right) = strategy.split_once('-')?;
    let primary: usize = left.trim().parse().ok()?;
    let secondary: usize = right.trim().parse().ok()?;
    if primary == 0 || secondary == 0 {
        return None;
    }
    Some((primary, secondary))
}

// ---------------------------------------------------------------------------
// Arrangement evaluation
// ---------------------------------------------------------------------------

/// Run the allocation search for both team orderings and keep the higher
/// total value. Each arrangement gets its own copy of the must-start state;
/// a tie keeps the original order.
pub fn evaluate_arrangements(
    def: &StackDefinition,
    teams: (&str, &str),
    pool: &[CandidatePlayer],
    must_state: &MustStartState,
    criterion: Criterion,
) -> (SearchOutcome, StackArrangement) {
    let original = StackArrangement {
        primary_team: teams.0.to_string(),
        primary_size: def.primary_size,
        secondary_team: teams.1.to_string(),
        secondary_size: def.secondary_size,
    };
    let swapped = StackArrangement {
        primary_team: teams.1.to_string(),
        primary_size: def.primary_size,
        secondary_team: teams.0.to_string(),
        secondary_size: def.secondary_size,
    };

    let run = |arr: &StackArrangement| {
        allocate(
            pool,
            &must_state.remaining_slots,
            must_state.remaining_budget,
            criterion,
            &must_state.assigned,
            &arr.quotas(),
        )
    };

    let first = run(&original);
    let second = run(&swapped);

    let first_value = first.total_value(criterion);
    let second_value = second.total_value(criterion);
    debug!(
        "arrangement values: {}={first_value:.2} {}={second_value:.2}",
        original.primary_team, swapped.primary_team
    );

    if second_value > first_value {
        (second, swapped)
    } else {
        (first, original)
    }
}
