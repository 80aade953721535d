// Optimization result assembly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::optimizer::search::SearchOutcome;
use crate::optimizer::stacking::StackArrangement;
use crate::optimizer::Criterion;

/// One lineup row in the boundary response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupSlot {
    pub slot: String,
    pub player_id: i64,
    pub name: String,
    pub team: String,
    pub salary: u32,
    /// This player's contribution under the active criterion.
    pub value: f64,
}

/// Stack metadata for the winning arrangement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackMetadata {
    pub primary_team: String,
    pub primary_size: usize,
    pub secondary_team: String,
    pub secondary_size: usize,
    pub rationale: String,
}

/// The full outcome of an optimization run. All failure modes other than
/// invalid parameters are expressed here via `success` and `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub message: String,
    pub lineup: Vec<LineupSlot>,
    pub total_salary: u32,
    pub total_value: f64,
    /// Team -> players in the final lineup (pitchers included). BTreeMap so
    /// serialized output is deterministic.
    pub team_breakdown: BTreeMap<String, usize>,
    pub unfilled_slots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<StackMetadata>,
}

impl OptimizationResult {
    /// An unsuccessful result with no lineup (empty pool, must-start
    /// failure, and so on).
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            lineup: Vec::new(),
            total_salary: 0,
            total_value: 0.0,
            team_breakdown: BTreeMap::new(),
            unfilled_slots: Vec::new(),
            stack: None,
        }
    }
}

/// Build the final result from a search outcome.
///
/// Success means every requested slot was filled. The message carries any
/// unfilled slots and any exact stack quota the search could not reach.
pub fn assemble(
    outcome: &SearchOutcome,
    criterion: Criterion,
    arrangement: Option<&StackArrangement>,
    rationale: Option<&str>,
) -> OptimizationResult {
    let lineup: Vec<LineupSlot> = outcome
        .lineup
        .iter()
        .map(|a| LineupSlot {
            slot: a.slot.clone(),
            player_id: a.player.id,
            name: a.player.name.clone(),
            team: a.player.team.clone(),
            salary: a.player.salary,
            value: criterion.value_of(&a.player),
        })
        .collect();

    let total_salary: u32 = lineup.iter().map(|s| s.salary).sum();
    let total_value: f64 = lineup.iter().map(|s| s.value).sum();

    let mut team_breakdown: BTreeMap<String, usize> = BTreeMap::new();
    for slot in &lineup {
        *team_breakdown.entry(slot.team.clone()).or_insert(0) += 1;
    }

    let success = outcome.unfilled.is_empty();
    let mut message = if success {
        format!("Optimized lineup with {} players", lineup.len())
    } else {
        format!(
            "Could not fill all positions; unfilled: {}",
            outcome.unfilled.join(", ")
        )
    };

    let stack = arrangement.map(|arr| {
        // Note any exact quota that fell short (stack counts exclude
        // pitchers, so recount from the raw outcome).
        for (team, want) in [
            (&arr.primary_team, arr.primary_size),
            (&arr.secondary_team, arr.secondary_size),
        ] {
            let got = outcome
                .lineup
                .iter()
                .filter(|a| !a.player.is_pitcher() && &a.player.team == team)
                .count();
            if got < want {
                message.push_str(&format!("; {team} stack {got}/{want}"));
            }
        }
        StackMetadata {
            primary_team: arr.primary_team.clone(),
            primary_size: arr.primary_size,
            secondary_team: arr.secondary_team.clone(),
            secondary_size: arr.secondary_size,
            rationale: rationale.unwrap_or_default().to_string(),
        }
    });

    OptimizationResult {
        success,
        message,
        lineup,
        total_salary,
        total_value,
        team_breakdown,
        unfilled_slots: outcome.unfilled.clone(),
        stack,
    }
}
