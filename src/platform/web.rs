//! JS-facing session handle
//!
//! The page owns the canvas, input listeners and the animation frame loop;
//! it feeds input here once per frame and draws the returned snapshot.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::persistence::{LocalStore, MemoryStore};
use crate::session::Session;
use crate::settings::QualityPreset;
use crate::sim::{GameEvent, RenderSnapshot, TickInput};
use crate::tuning::Tuning;

enum Backend {
    Local(Session<LocalStore>),
    Memory(Session<MemoryStore>),
}

macro_rules! with_session {
    ($backend:expr, $s:ident => $body:expr) => {
        match $backend {
            Backend::Local($s) => $body,
            Backend::Memory($s) => $body,
        }
    };
}

#[derive(Serialize)]
struct FramePayload<'a> {
    snapshot: &'a RenderSnapshot,
    events: &'a [GameEvent],
}

#[wasm_bindgen]
pub struct WebSession {
    backend: Backend,
    last_time: f64,
}

#[wasm_bindgen]
impl WebSession {
    /// Open a session backed by LocalStorage (in-memory if unavailable).
    /// `tuning_json` may be empty for the built-in balance.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: &str) -> Result<WebSession, JsValue> {
        super::init_logging();
        let tuning = if tuning_json.trim().is_empty() {
            Tuning::default()
        } else {
            Tuning::from_json(tuning_json).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let seed = super::session_seed();
        let backend = match LocalStore::open() {
            Ok(store) => Backend::Local(Session::new(store, tuning, seed)),
            Err(e) => {
                log::warn!("{}; scores will not persist", e);
                Backend::Memory(Session::new(MemoryStore::new(), tuning, seed))
            }
        };
        Ok(WebSession {
            backend,
            last_time: 0.0,
        })
    }

    pub fn start(&mut self) -> bool {
        let seed = super::session_seed();
        with_session!(&mut self.backend, s => s.start(seed))
    }

    pub fn restart(&mut self) -> bool {
        let seed = super::session_seed();
        with_session!(&mut self.backend, s => s.restart(seed))
    }

    #[wasm_bindgen(js_name = acknowledgeStageClear)]
    pub fn acknowledge_stage_clear(&mut self) -> bool {
        with_session!(&mut self.backend, s => s.acknowledge_stage_clear())
    }

    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&mut self, preset: &str) -> bool {
        let Ok(quality) = preset.parse::<QualityPreset>() else {
            return false;
        };
        with_session!(&mut self.backend, s => {
            let mut settings = s.settings().clone();
            settings.quality = quality;
            s.update_settings(settings);
        });
        true
    }

    #[wasm_bindgen(js_name = highScore)]
    pub fn high_score(&self) -> f64 {
        with_session!(&self.backend, s => s.high_score() as f64)
    }

    /// Run one frame at timestamp `now_ms` and return the snapshot and the
    /// frame's events as JSON
    pub fn frame(&mut self, now_ms: f64, move_x: f32, move_y: f32, fire: bool, pause: bool) -> String {
        let dt = if self.last_time > 0.0 {
            ((now_ms - self.last_time) / 1000.0) as f32
        } else {
            0.0
        };
        self.last_time = now_ms;

        let input = TickInput {
            move_x,
            move_y,
            fire,
            pause,
        };
        let (snapshot, events) = with_session!(&mut self.backend, s => {
            let events = s.frame(&input, dt);
            (s.snapshot(), events)
        });
        let payload = FramePayload {
            snapshot: &snapshot,
            events: &events,
        };
        serde_json::to_string(&payload).unwrap_or_else(|e| {
            log::error!("Snapshot serialization failed: {}", e);
            String::new()
        })
    }
}
