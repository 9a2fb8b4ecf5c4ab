//! Platform abstraction layer
//!
//! The simulation is host-agnostic; this module adapts it to a host:
//! - `web` (wasm32): wasm-bindgen surface for a JS WebXR engine
//! - Handedness parsing shared by every host

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::sim::Hand;

/// Parse a host handedness string, logging unknown values
pub fn parse_hand(handedness: &str) -> Option<Hand> {
    let hand = Hand::from_handedness(handedness);
    if hand.is_none() {
        log::warn!("Ignoring input from controller with handedness {handedness:?}");
    }
    hand
}
