//! Frame-loop owner
//!
//! Wraps a [`GameState`] with its collaborators: the persisted high score and
//! settings. Front ends call [`Session::frame`] once per rendered frame and
//! react to the returned events.

use crate::highscores::HighScores;
use crate::persistence::{KeyValueStore, Persistence};
use crate::platform;
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, RenderSnapshot, TickInput, progression, tick};
use crate::tuning::Tuning;

pub struct Session<S: KeyValueStore> {
    state: GameState,
    persistence: Persistence<S>,
    settings: Settings,
    high_scores: HighScores,
    frames: u64,
}

impl<S: KeyValueStore> Session<S> {
    /// Load the stored records and park on the title screen
    pub fn new(store: S, tuning: Tuning, seed: u64) -> Self {
        let persistence = Persistence::new(store);
        let settings = persistence.load_settings();
        let high_scores = persistence.load_high_scores();
        log::info!("Session ready (seed {}, best {})", seed, high_scores.top_score());
        let mut session = Self {
            state: GameState::new(seed, tuning),
            persistence,
            settings,
            high_scores,
            frames: 0,
        };
        session.apply_settings();
        session
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_score(&self) -> u64 {
        self.high_scores.top_score()
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn start(&mut self, seed: u64) -> bool {
        let started = progression::start(&mut self.state, seed);
        self.apply_settings();
        started
    }

    /// Restart after a game over, resuming from the stage baseline when the
    /// settings ask for it
    pub fn restart(&mut self, seed: u64) -> bool {
        let resume = self.settings.resume_from_stage;
        let restarted = progression::restart(&mut self.state, seed, resume);
        self.apply_settings();
        restarted
    }

    pub fn toggle_pause(&mut self) -> bool {
        progression::toggle_pause(&mut self.state)
    }

    pub fn acknowledge_stage_clear(&mut self) -> bool {
        progression::acknowledge_stage_clear(&mut self.state)
    }

    pub fn return_to_title(&mut self) {
        progression::return_to_title(&mut self.state);
    }

    /// Advance one frame and hand back the events it raised
    pub fn frame(&mut self, input: &TickInput, dt: f32) -> Vec<GameEvent> {
        tick(&mut self.state, input, dt);
        self.frames += 1;

        let events = self.state.drain_events();
        for event in &events {
            if let GameEvent::GameOver { score, stage } = *event {
                self.record_run(score, stage);
            }
        }
        events
    }

    /// Persist the run only when it beats the stored best
    fn record_run(&mut self, score: u64, stage: u32) {
        if !self.high_scores.is_new_best(score) {
            return;
        }
        log::info!("New high score {} (was {})", score, self.high_scores.top_score());
        let timestamp = platform::now_millis();
        self.high_scores.add_score(score, stage, timestamp);
        self.persistence.save_high_score(score, stage, timestamp);
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.persistence.save_settings(&self.settings);
        self.apply_settings();
    }

    fn apply_settings(&mut self) {
        self.state.max_particles = self.settings.max_particles().min(self.state.tuning.max_particles);
        let cap = self.state.max_particles;
        if self.state.particles.len() > cap {
            let excess = self.state.particles.len() - cap;
            self.state.particles.drain(..excess);
        }
    }

    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, SETTINGS_KEY};
    use crate::settings::QualityPreset;
    use crate::sim::{GamePhase, PauseReason};

    fn session() -> Session<MemoryStore> {
        Session::new(MemoryStore::new(), Tuning::default(), 5)
    }

    fn end_run(session: &mut Session<MemoryStore>, score: u64) -> Vec<GameEvent> {
        session.state_mut().world.score = score;
        progression::game_over(session.state_mut());
        session.frame(&TickInput::default(), 1.0 / 60.0)
    }

    #[test]
    fn test_starts_on_title() {
        let mut s = session();
        assert_eq!(s.state().phase, GamePhase::Title);
        assert!(s.start(7));
        assert_eq!(s.state().phase, GamePhase::Playing);
    }

    #[test]
    fn test_high_score_persisted_only_when_beaten() {
        let mut s = session();
        s.start(1);
        let events = end_run(&mut s, 1200);
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { score: 1200, .. })));
        assert_eq!(s.high_score(), 1200);
        assert_eq!(s.persistence().load_high_score(), 1200);

        s.restart(2);
        end_run(&mut s, 700);
        assert_eq!(s.high_score(), 1200);
        assert_eq!(s.persistence().load_high_scores().entries.len(), 1);

        s.restart(3);
        end_run(&mut s, 1500);
        assert_eq!(s.persistence().load_high_score(), 1500);
        assert_eq!(s.high_scores(), &s.persistence().load_high_scores());
    }

    #[test]
    fn test_high_score_loaded_from_store() {
        let mut first = session();
        first.start(1);
        end_run(&mut first, 900);

        let store = first.persistence().store().clone();
        let second = Session::new(store, Tuning::default(), 2);
        assert_eq!(second.high_score(), 900);
    }

    #[test]
    fn test_restart_follows_resume_setting() {
        let mut s = session();
        s.start(1);
        s.state_mut().world.stage = 3;
        s.state_mut().world.stage_baseline_score = 8000;
        end_run(&mut s, 9000);
        assert!(s.restart(2));
        assert_eq!(s.state().world.stage, 3);
        assert_eq!(s.state().world.score, 8000);

        s.update_settings(Settings {
            resume_from_stage: false,
            ..Settings::default()
        });
        end_run(&mut s, 8100);
        assert!(s.restart(3));
        assert_eq!(s.state().world.stage, 1);
        assert_eq!(s.state().world.score, 0);
    }

    #[test]
    fn test_settings_cap_particles_and_persist() {
        let mut s = session();
        s.update_settings(Settings::from_preset(QualityPreset::Low));
        assert_eq!(s.state().max_particles, QualityPreset::Low.max_particles());
        assert!(s.persistence().store().load(SETTINGS_KEY).ok().flatten().is_some());
        assert_eq!(s.persistence().load_settings().quality, QualityPreset::Low);
    }

    #[test]
    fn test_pause_and_stage_clear_controls() {
        let mut s = session();
        s.start(1);
        assert!(s.toggle_pause());
        assert_eq!(s.state().phase, GamePhase::Paused(PauseReason::User));
        assert!(!s.acknowledge_stage_clear());
        assert!(s.toggle_pause());

        progression::stage_cleared(s.state_mut(), 1);
        let events = s.frame(&TickInput::default(), 1.0 / 60.0);
        assert_eq!(events, vec![GameEvent::StageCleared { stage: 1 }]);
        assert!(s.acknowledge_stage_clear());
        assert_eq!(s.state().world.stage, 2);
    }
}
