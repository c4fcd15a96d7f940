//! Game phase machine and stage flow
//!
//! `Title -> Playing <-> Paused -> ... -> GameOver -> Playing`. Stage
//! sub-flow (`Normal -> BossTriggered -> BossFight -> BossDefeated`) only
//! advances while playing; acknowledging a stage clear moves to the next
//! stage.

use super::spawn::SpawnDirector;
use super::state::{
    BossPhase, GameEvent, GamePhase, GameState, PauseReason, Player, StagePhase, World,
};

/// Begin a fresh run from stage 1.
///
/// Only valid from the title screen or after a game over.
pub fn start(state: &mut GameState, seed: u64) -> bool {
    if !matches!(state.phase, GamePhase::Title | GamePhase::GameOver) {
        return false;
    }
    reset_run(state, seed, 1, 0);
    state.phase = GamePhase::Playing;
    log::info!("Run started (seed {})", seed);
    true
}

/// Flip between playing and a user pause; never leaves a stage-clear pause
pub fn toggle_pause(state: &mut GameState) -> bool {
    match state.phase {
        GamePhase::Playing => {
            state.phase = GamePhase::Paused(PauseReason::User);
            true
        }
        GamePhase::Paused(PauseReason::User) => {
            state.phase = GamePhase::Playing;
            true
        }
        _ => false,
    }
}

/// Continue into the next stage after a boss kill
pub fn acknowledge_stage_clear(state: &mut GameState) -> bool {
    if state.phase != GamePhase::Paused(PauseReason::StageClear) {
        return false;
    }
    state.world.stage += 1;
    state.world.stage_baseline_score = state.world.score;
    state.stage_phase = StagePhase::Normal;
    state.spawn = SpawnDirector::default();
    state.player_bullets.clear();
    state.enemy_bullets.clear();
    state.player.invulnerable = state.tuning.start_invulnerability;
    state.phase = GamePhase::Playing;
    log::info!(
        "Stage {} begins (baseline score {})",
        state.world.stage,
        state.world.stage_baseline_score
    );
    true
}

/// Boss down: pause and wait for acknowledgment. Fires at most once per stage.
pub fn stage_cleared(state: &mut GameState, stage: u32) {
    if state.stage_phase == StagePhase::BossDefeated {
        return;
    }
    state.stage_phase = StagePhase::BossDefeated;
    state.phase = GamePhase::Paused(PauseReason::StageClear);
    state.emit(GameEvent::StageCleared { stage });
    log::info!("Stage {} cleared with score {}", stage, state.world.score);
}

/// End the run; the event is raised once
pub fn game_over(state: &mut GameState) {
    if state.phase == GamePhase::GameOver {
        return;
    }
    state.phase = GamePhase::GameOver;
    state.player.alive = false;
    let score = state.world.score;
    let stage = state.world.stage;
    state.emit(GameEvent::GameOver { score, stage });
    log::info!("Game over at stage {} with score {}", stage, score);
}

/// Start again after a game over.
///
/// With `resume`, the run restarts at the stage it ended on with the score
/// that stage began with; otherwise from stage 1 and zero.
pub fn restart(state: &mut GameState, seed: u64, resume: bool) -> bool {
    if state.phase != GamePhase::GameOver {
        return false;
    }
    let (stage, score) = if resume {
        (state.world.stage, state.world.stage_baseline_score)
    } else {
        (1, 0)
    };
    reset_run(state, seed, stage, score);
    state.phase = GamePhase::Playing;
    log::info!("Run restarted at stage {} with score {}", stage, score);
    true
}

/// Abandon the run and go back to the title screen
pub fn return_to_title(state: &mut GameState) {
    let seed = state.rng.seed();
    reset_run(state, seed, 1, 0);
    state.phase = GamePhase::Title;
}

/// Advance the boss sub-flow once the boss is on station
pub fn update_stage_flow(state: &mut GameState) {
    if state.stage_phase == StagePhase::BossTriggered
        && state.boss.as_ref().is_some_and(|b| b.phase == BossPhase::Fight)
    {
        state.stage_phase = StagePhase::BossFight;
        log::debug!("Boss fight on stage {}", state.world.stage);
    }
}

/// Clear the field and rebuild the player for a run starting at `stage`
fn reset_run(state: &mut GameState, seed: u64, stage: u32, score: u64) {
    state.rng.reseed(seed);

    let bosses_spawned = std::mem::take(&mut state.world.bosses_spawned);
    state.world = World::new(state.tuning.scroll_speed);
    state.world.stage = stage.max(1);
    state.world.score = score;
    state.world.stage_baseline_score = score;
    state.world.bosses_spawned = bosses_spawned.into_iter().filter(|&s| s < stage).collect();

    state.player = Player::new(&state.tuning);
    state.companions.clear();
    state.player_bullets.clear();
    state.enemy_bullets.clear();
    state.enemies.clear();
    state.boss = None;
    state.pickups.clear();
    state.particles.clear();
    state.spawn = SpawnDirector::default();
    state.stage_phase = StagePhase::Normal;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn running() -> GameState {
        let mut state = GameState::new(1, Tuning::default());
        assert!(start(&mut state, 1));
        state
    }

    #[test]
    fn test_start_only_from_title_or_game_over() {
        let mut state = running();
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(!start(&mut state, 2));
        game_over(&mut state);
        assert!(start(&mut state, 2));
        assert_eq!(state.rng.seed(), 2);
    }

    #[test]
    fn test_user_pause_round_trip() {
        let mut state = running();
        assert!(toggle_pause(&mut state));
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::User));
        assert!(toggle_pause(&mut state));
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_stage_clear_needs_acknowledgment() {
        let mut state = running();
        state.world.score = 2500;
        stage_cleared(&mut state, 1);
        assert!(!toggle_pause(&mut state));
        assert_eq!(state.phase, GamePhase::Paused(PauseReason::StageClear));

        assert!(acknowledge_stage_clear(&mut state));
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.world.stage, 2);
        assert_eq!(state.world.stage_baseline_score, 2500);
        assert_eq!(state.stage_phase, StagePhase::Normal);
        assert!(!acknowledge_stage_clear(&mut state));
    }

    #[test]
    fn test_stage_cleared_once() {
        let mut state = running();
        stage_cleared(&mut state, 1);
        stage_cleared(&mut state, 1);
        assert_eq!(state.drain_events(), vec![GameEvent::StageCleared { stage: 1 }]);
    }

    #[test]
    fn test_game_over_once() {
        let mut state = running();
        state.world.score = 420;
        game_over(&mut state);
        game_over(&mut state);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::GameOver { score: 420, stage: 1 }]
        );
    }

    #[test]
    fn test_restart_resume_restores_baseline() {
        let mut state = running();
        state.world.score = 2000;
        state.world.bosses_spawned.insert(1);
        stage_cleared(&mut state, 1);
        acknowledge_stage_clear(&mut state);
        state.world.score = 4100;
        state.world.bosses_spawned.insert(2);
        game_over(&mut state);

        assert!(restart(&mut state, 9, true));
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.world.stage, 2);
        assert_eq!(state.world.score, 2000);
        // The stage-2 boss can appear again
        assert!(!state.world.bosses_spawned.contains(&2));
        assert!(state.world.bosses_spawned.contains(&1));
        assert!(state.player.alive);
    }

    #[test]
    fn test_restart_fresh() {
        let mut state = running();
        state.world.stage = 3;
        state.world.score = 9000;
        game_over(&mut state);
        assert!(restart(&mut state, 9, false));
        assert_eq!(state.world.stage, 1);
        assert_eq!(state.world.score, 0);
        assert!(state.world.bosses_spawned.is_empty());
    }

    #[test]
    fn test_restart_requires_game_over() {
        let mut state = running();
        assert!(!restart(&mut state, 9, true));
    }

    #[test]
    fn test_return_to_title() {
        let mut state = running();
        state.world.score = 100;
        return_to_title(&mut state);
        assert_eq!(state.phase, GamePhase::Title);
        assert_eq!(state.world.score, 0);
    }
}
