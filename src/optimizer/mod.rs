// Lineup optimization pipeline.
//
// `optimize()` wires the stages together: stack resolution, pool assembly,
// must-start placement, arrangement evaluation (or a single unconstrained
// search), and result assembly. Every failure other than invalid parameters
// comes back as an unsuccessful OptimizationResult, not an Err.

pub mod must_start;
pub mod pool;
pub mod result;
pub mod search;
pub mod stacking;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::player::CandidatePlayer;
use crate::sources::{PlayerPoolSource, SlateMetadataSource, StrategyRecommendationSource};

pub use result::OptimizationResult;
pub use search::STACK_NEED_BONUS;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OptimizerError {
    /// Parameters that fail the very first validation step. The only error
    /// path that does not produce an OptimizationResult.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A collaborator (player pool, slate metadata) failed.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Ranking criterion for candidate players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    #[default]
    PointsPerGame,
    Salary,
    ValueDensity,
    /// Accepted at the boundary for clients that request a weighted metric;
    /// not locally computable, so it scores as points-per-game.
    Weighted,
}

impl Criterion {
    /// The ranking value of a player under this criterion. Missing
    /// projections count as zero.
    pub fn value_of(&self, player: &CandidatePlayer) -> f64 {
        match self {
            Criterion::PointsPerGame | Criterion::Weighted => player.projection_or_zero(),
            Criterion::Salary => player.salary as f64,
            Criterion::ValueDensity => {
                if player.salary == 0 {
                    0.0
                } else {
                    player.projection_or_zero() / (player.salary as f64 / 1000.0)
                }
            }
        }
    }
}

/// Stack settings on a request: the named strategy teams plus either
/// "suggested" or an explicit "X-Y" strategy string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRequest {
    #[serde(default)]
    pub teams: Vec<String>,
    pub strategy: String,
}

/// Everything one optimization run needs. Constructed fresh per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationParameters {
    pub draft_group: String,
    /// Slot labels to fill; same-label slots are interchangeable.
    #[serde(default)]
    pub slots: Vec<String>,
    #[serde(default)]
    pub salary_cap: u32,
    /// Optional narrowing: when non-empty, only these player ids are
    /// considered (stack teams excepted).
    #[serde(default)]
    pub watch_list: Vec<i64>,
    /// Always removed from the pool.
    #[serde(default)]
    pub exclusions: Vec<i64>,
    /// Placed before the search runs, in this order.
    #[serde(default)]
    pub must_starts: Vec<i64>,
    #[serde(default)]
    pub criterion: Criterion,
    #[serde(default)]
    pub stack: Option<StackRequest>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run one full optimization.
pub fn optimize(
    params: &OptimizationParameters,
    pool_source: &dyn PlayerPoolSource,
    slate_source: &dyn SlateMetadataSource,
    strategy_source: &dyn StrategyRecommendationSource,
) -> Result<OptimizationResult, OptimizerError> {
    validate(params)?;

    let definition = stacking::resolve(params, slate_source, strategy_source)?;
    let stack_teams: Vec<String> = if definition.valid {
        params
            .stack
            .as_ref()
            .map(|s| s.teams.clone())
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    if !definition.valid && params.stack.is_some() {
        info!("proceeding without stack: {}", definition.rationale);
    }

    let pool = pool::build_pool(params, &stack_teams, pool_source)?;
    if pool.is_empty() {
        return Ok(OptimizationResult::failure(format!(
            "no candidate players found for draft group {}",
            params.draft_group
        )));
    }

    let must_state = must_start::resolve(&pool, params, pool_source)?;
    if !must_state.errors.is_empty() {
        return Ok(OptimizationResult::failure(format!(
            "must-start errors: {}",
            must_state.errors.join("; ")
        )));
    }

    let result = if definition.valid {
        let teams = &params.stack.as_ref().expect("stack checked above").teams;
        let (outcome, arrangement) = stacking::evaluate_arrangements(
            &definition,
            (&teams[0], &teams[1]),
            &pool,
            &must_state,
            params.criterion,
        );
        result::assemble(
            &outcome,
            params.criterion,
            Some(&arrangement),
            Some(&definition.rationale),
        )
    } else {
        let outcome = search::allocate(
            &pool,
            &must_state.remaining_slots,
            must_state.remaining_budget,
            params.criterion,
            &must_state.assigned,
            &[],
        );
        result::assemble(&outcome, params.criterion, None, None)
    };

    info!(
        "optimization for {} finished: success={} salary={} value={:.2}",
        params.draft_group, result.success, result.total_salary, result.total_value
    );
    Ok(result)
}

fn validate(params: &OptimizationParameters) -> Result<(), OptimizerError> {
    if params.draft_group.trim().is_empty() {
        return Err(OptimizerError::InvalidParameters(
            "draft_group must not be empty".to_string(),
        ));
    }
    if params.slots.is_empty() {
        return Err(OptimizerError::InvalidParameters(
            "slots must not be empty".to_string(),
        ));
    }
    if params.salary_cap == 0 {
        return Err(OptimizerError::InvalidParameters(
            "salary_cap must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared test fakes
// ---------------------------------------------------------------------------
