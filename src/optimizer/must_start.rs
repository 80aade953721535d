// Must-start resolution: place mandatory players before the search runs.

use anyhow::Result;
use tracing::debug;

use crate::optimizer::search::Assignment;
use crate::optimizer::OptimizationParameters;
use crate::player::CandidatePlayer;
use crate::sources::PlayerPoolSource;

/// Must-start placement outcome. `errors` is non-empty when any mandatory
/// player could not be placed; the caller aborts the run in that case with
/// every failure listed, never a partial drop.
#[derive(Debug, Clone)]
pub struct MustStartState {
    /// Pre-assigned lineup rows, in must-start list order.
    pub assigned: Vec<Assignment>,
    /// Slots still open after the must-starts consumed theirs.
    pub remaining_slots: Vec<String>,
    pub remaining_budget: u32,
    /// One message per unplaceable must-start player.
    pub errors: Vec<String>,
}

/// Place each must-start player, in list order, into the first open slot it
/// is eligible for. Pitchers may only take a "P" slot. Players absent from
/// the working pool (e.g. a stack-team member outside the watch-list) are
/// fetched from the backing store directly.
pub fn resolve(
    pool: &[CandidatePlayer],
    params: &OptimizationParameters,
    source: &dyn PlayerPoolSource,
) -> Result<MustStartState> {
    let mut state = MustStartState {
        assigned: Vec::new(),
        remaining_slots: params.slots.clone(),
        remaining_budget: params.salary_cap,
        errors: Vec::new(),
    };

    for &player_id in &params.must_starts {
        if state.assigned.iter().any(|a| a.player.id == player_id) {
            state
                .errors
                .push(format!("player {player_id} listed as must-start more than once"));
            continue;
        }

        // The pool builder strips exclusions, but the backing-store fetch
        // below would bring an excluded player back in.
        if params.exclusions.contains(&player_id) {
            state.errors.push(format!(
                "player {player_id} listed as both must-start and excluded"
            ));
            continue;
        }

        let player = match pool.iter().find(|p| p.id == player_id) {
            Some(p) => Some(p.clone()),
            None => source.fetch_by_id(&params.draft_group, player_id)?,
        };
        let Some(player) = player else {
            state
                .errors
                .push(format!("must-start player {player_id} not found in draft group"));
            continue;
        };

        if player.status == crate::player::PlayerStatus::Out {
            state.errors.push(format!(
                "must-start player {} ({player_id}) is ruled out",
                player.name
            ));
            continue;
        }

        let slot_idx = state
            .remaining_slots
            .iter()
            .position(|s| player.eligible_for(s));
        let Some(slot_idx) = slot_idx else {
            state.errors.push(format!(
                "no open slot for must-start player {} ({})",
                player.name,
                player.positions.join("/")
            ));
            continue;
        };

        if player.salary > state.remaining_budget {
            state.errors.push(format!(
                "must-start player {} does not fit under the salary cap",
                player.name
            ));
            continue;
        }

        let slot = state.remaining_slots.remove(slot_idx);
        state.remaining_budget -= player.salary;
        debug!("must-start {} -> {}", player.name, slot);
        state.assigned.push(Assignment { slot, player });
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::tests::FakePoolSource;
    use crate::optimizer::Criterion;
    use crate::player::PlayerStatus;

    fn player(id: i64, team: &str, positions: &str, salary: u32) -> CandidatePlayer {
        CandidatePlayer {
            id,
            name: format!("Player {id}"),
            team: team.to_string(),
            positions: CandidatePlayer::parse_positions(positions),
            salary,
            projection: Some(10.0),
            status: PlayerStatus::Active,
        }
    }

    fn params(slots: &[&str], cap: u32, must_starts: Vec<i64>) -> OptimizationParameters {
        OptimizationParameters {
            draft_group: "dg1".to_string(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
            salary_cap: cap,
            watch_list: vec![],
            exclusions: vec![],
            must_starts,
            criterion: Criterion::PointsPerGame,
            stack: None,
        }
    }

    #[test]
    fn places_players_and_shrinks_state() {
        let pool = vec![player(1, "NYY", "SP", 9000), player(2, "BOS", "OF", 4000)];
        let source = FakePoolSource::new(pool.clone());
        let params = params(&["P", "OF", "OF"], 50000, vec![1, 2]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert!(state.errors.is_empty());
        assert_eq!(state.assigned.len(), 2);
        assert_eq!(state.assigned[0].slot, "P");
        assert_eq!(state.assigned[1].slot, "OF");
        assert_eq!(state.remaining_slots, vec!["OF"]);
        assert_eq!(state.remaining_budget, 37000);
    }

    #[test]
    fn pitcher_only_takes_p_slot() {
        // A pitcher must-start with no P slot available is an error, even
        // with other slots open.
        let pool = vec![player(1, "NYY", "SP", 9000)];
        let source = FakePoolSource::new(pool.clone());
        let params = params(&["OF", "C"], 50000, vec![1]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("no open slot"));
        assert!(state.assigned.is_empty());
    }

    #[test]
    fn missing_slot_for_position_is_error() {
        let pool = vec![player(1, "NYY", "SS", 4000)];
        let source = FakePoolSource::new(pool.clone());
        let params = params(&["P", "C", "1B"], 50000, vec![1]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("Player 1"));
    }

    #[test]
    fn absent_from_pool_fetches_backing_store() {
        // Player 2 is in the store but not the working pool (e.g. outside
        // the watch-list).
        let pool = vec![player(1, "NYY", "SP", 9000)];
        let source = FakePoolSource::new(vec![player(1, "NYY", "SP", 9000), player(2, "BOS", "OF", 4000)]);
        let params = params(&["P", "OF"], 50000, vec![2]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert!(state.errors.is_empty());
        assert_eq!(state.assigned[0].player.id, 2);
    }

    #[test]
    fn unknown_player_is_error() {
        let pool = vec![];
        let source = FakePoolSource::new(vec![]);
        let params = params(&["P"], 50000, vec![99]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("99"));
    }

    #[test]
    fn every_failure_is_collected() {
        let pool = vec![player(1, "NYY", "SS", 4000)];
        let source = FakePoolSource::new(pool.clone());
        // 1 has no SS slot; 99 does not exist. Both must be reported.
        let params = params(&["P", "C"], 50000, vec![1, 99]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 2);
    }

    #[test]
    fn over_cap_must_start_is_error() {
        let pool = vec![player(1, "NYY", "SP", 9000), player(2, "BOS", "OF", 4000)];
        let source = FakePoolSource::new(pool.clone());
        let params = params(&["P", "OF"], 10000, vec![1, 2]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("salary cap"));
        // Player 1 still placed; the failure belongs to player 2 alone.
        assert_eq!(state.assigned.len(), 1);
    }

    #[test]
    fn duplicate_must_start_is_error() {
        let pool = vec![player(1, "NYY", "SP", 9000)];
        let source = FakePoolSource::new(pool.clone());
        let params = params(&["P", "P"], 50000, vec![1, 1]);

        let state = resolve(&pool, &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("more than once"));
    }

    #[test]
    fn excluded_must_start_is_error() {
        let source = FakePoolSource::new(vec![player(1, "NYY", "OF", 4000)]);
        // Exclusions strip the player from the working pool, so only the
        // backing store still knows it; the conflict must be an error, not
        // a silent re-fetch.
        let mut params = params(&["OF"], 50000, vec![1]);
        params.exclusions = vec![1];

        let state = resolve(&[], &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("excluded"));
        assert!(state.assigned.is_empty());
    }

    #[test]
    fn out_player_is_error() {
        let mut p = player(1, "NYY", "OF", 4000);
        p.status = PlayerStatus::Out;
        let source = FakePoolSource::new(vec![p]);
        // Not in the working pool (OUT players are filtered), so the
        // backing-store fetch finds it and the status check rejects it.
        let params = params(&["OF"], 50000, vec![1]);

        let state = resolve(&[], &params, &source).unwrap();
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains("ruled out"));
    }
}
