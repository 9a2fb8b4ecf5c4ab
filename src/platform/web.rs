//! Browser bindings
//!
//! The JS engine owns rendering and the XR session. It forwards controller
//! poses and select events, calls `frame(dt)` once per render-loop callback,
//! then reads ball positions back.

use glam::{Quat, Vec3};
use wasm_bindgen::prelude::*;

use super::parse_hand;
use crate::analytics::{EventSink, GameEvent};
use crate::sim::{FrameInput, Game, InputEvent, Pose};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Already set when the module is instantiated twice
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Hoop Shot core loaded");
}

/// Forwards events to a JS callback as `(name, json)`
#[derive(Default)]
struct JsSink {
    callback: Option<js_sys::Function>,
}

impl EventSink for JsSink {
    fn emit(&mut self, event: &GameEvent) {
        let Some(callback) = &self.callback else {
            return;
        };
        let Ok(json) = serde_json::to_string(event) else {
            return;
        };
        // Fire-and-forget: analytics failures stay on the JS side
        if let Err(e) = callback.call2(
            &JsValue::NULL,
            &JsValue::from_str(event.name()),
            &JsValue::from_str(&json),
        ) {
            log::warn!("Analytics callback threw: {e:?}");
        }
    }
}

/// Game handle exported to JS
#[wasm_bindgen]
pub struct WebGame {
    game: Game<JsSink>,
    /// Input gathered since the last frame
    input: FrameInput,
}

#[wasm_bindgen]
impl WebGame {
    /// Create a game; `tuning_json` may override any default constant
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<WebGame, JsValue> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => Tuning::default(),
        };
        Ok(Self {
            game: Game::new(tuning, JsSink::default()),
            input: FrameInput::default(),
        })
    }

    /// Register `callback(name, json)` for analytics events
    pub fn set_analytics(&mut self, callback: js_sys::Function) {
        self.game.sink_mut().callback = Some(callback);
    }

    pub fn begin_session(&mut self) {
        self.game.begin_session();
    }

    pub fn end_session(&mut self) {
        self.game.end_session();
        self.input = FrameInput::default();
    }

    pub fn controller_connected(&mut self, handedness: &str) {
        if let Some(hand) = parse_hand(handedness) {
            self.input.events.push(InputEvent::Connected(hand));
        }
    }

    pub fn controller_disconnected(&mut self, handedness: &str) {
        if let Some(hand) = parse_hand(handedness) {
            self.input.events.push(InputEvent::Disconnected(hand));
        }
    }

    pub fn select_start(&mut self, handedness: &str) {
        if let Some(hand) = parse_hand(handedness) {
            self.input.events.push(InputEvent::SelectStart(hand));
        }
    }

    pub fn select_end(&mut self, handedness: &str) {
        if let Some(hand) = parse_hand(handedness) {
            self.input.events.push(InputEvent::SelectEnd(hand));
        }
    }

    /// World pose of a controller for the upcoming frame
    #[allow(clippy::too_many_arguments)]
    pub fn set_controller_pose(
        &mut self,
        handedness: &str,
        px: f32,
        py: f32,
        pz: f32,
        qx: f32,
        qy: f32,
        qz: f32,
        qw: f32,
    ) {
        if let Some(hand) = parse_hand(handedness) {
            let orientation = Quat::from_xyzw(qx, qy, qz, qw).normalize();
            self.input.poses[hand.index()] = Some(Pose::new(Vec3::new(px, py, pz), orientation));
        }
    }

    /// Advance one rendered frame (`dt` in seconds)
    pub fn frame(&mut self, dt: f32) {
        let mut input = std::mem::take(&mut self.input);
        input.dt = dt;
        self.game.tick(&input);
    }

    pub fn reset_rack(&mut self) {
        self.game.reset_rack();
    }

    /// Ball centers as a flat `[x, y, z, ...]` array, ordered by ball id
    pub fn ball_positions(&self) -> Vec<f32> {
        self.game
            .state()
            .balls
            .iter()
            .flat_map(|b| b.position.to_array())
            .collect()
    }

    pub fn ball_count(&self) -> usize {
        self.game.state().balls.len()
    }

    pub fn attempts(&self) -> u32 {
        self.game.state().stats.attempts
    }

    pub fn score(&self) -> u32 {
        self.game.state().stats.score
    }

    /// Full state as JSON
    pub fn snapshot(&self) -> String {
        self.game.snapshot_json()
    }
}
