// Stack strategy book: config-backed strategy recommendation tables.

use crate::config::StackingConfig;
use crate::sources::{StrategyRecommendation, StrategyRecommendationSource};

/// Strategy lookup tables loaded from `[stacking]` in optimizer.toml.
///
/// `recommend` walks the suggestion list in config order and returns the
/// first entry whose `max_games` covers the slate. `requirements_for` is a
/// straight map lookup on the strategy label.
#[derive(Debug, Clone)]
pub struct StrategyBook {
    stacking: StackingConfig,
}

impl StrategyBook {
    pub fn new(stacking: StackingConfig) -> Self {
        Self { stacking }
    }
}

impl StrategyRecommendationSource for StrategyBook {
    fn recommend(&self, total_games: u32) -> Option<StrategyRecommendation> {
        self.stacking
            .suggestions
            .iter()
            .find(|s| total_games <= s.max_games)
            .map(|s| StrategyRecommendation {
                label: s.label.clone(),
                rationale: s.rationale.clone(),
            })
    }

    fn requirements_for(&self, label: &str) -> Option<(usize, usize)> {
        self.stacking
            .requirements
            .get(label)
            .map(|sizes| (sizes[0], sizes[1]))
    }
}
