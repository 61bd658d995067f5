//! Shared fixtures for engine integration tests.

mod interleaving;
mod motion_properties;
mod reference_run;

use std::sync::Arc;
use std::time::Duration;

use relay_cover_common::channel::RecordingChannel;
use relay_cover_common::prelude::*;
use relay_cover_engine::{Clock, CoverEngine, ManualClock};

/// 20 s to open, 10 s to close.
pub fn blind_config() -> CoverConfig {
    CoverConfig {
        object_id: "bedroom".to_string(),
        unique_id: "bedroom_blind".to_string(),
        name: "Bedroom blind".to_string(),
        opening_time: Duration::from_secs(20),
        closing_time: Duration::from_secs(10),
        relay: RelayPayloads {
            topic: "home/relay/bedroom/set".to_string(),
            open: "ON_UP".to_string(),
            close: "ON_DOWN".to_string(),
            stop: "OFF".to_string(),
        },
        state_topic: None,
        initial_position: Position::CLOSED,
        stop_at_travel_end: true,
        reference_overtravel: Duration::from_secs(1),
    }
}

pub struct Rig {
    pub engine: CoverEngine<ManualClock>,
    pub clock: ManualClock,
    pub relay: RecordingChannel,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(blind_config())
    }

    pub fn with_config(config: CoverConfig) -> Self {
        let clock = ManualClock::new();
        let relay = RecordingChannel::new();
        let engine = CoverEngine::new(config, clock.clone(), Arc::new(relay.clone()));
        Self { engine, clock, relay }
    }

    /// Calibrated rig with an empty relay log.
    pub fn at(position: f64) -> Self {
        let mut rig = Self::new();
        rig.engine.calibrate(position).unwrap();
        rig
    }

    /// Advance the clock and fire any due timer.
    pub fn wait(&mut self, step: Duration) {
        self.clock.advance(step);
        self.engine.poll(self.clock.now());
    }

    /// Jump to the pending deadline and fire it.
    pub fn run_to_completion(&mut self) {
        if let Some(handle) = self.engine.pending_timer() {
            self.clock.advance_to(handle.deadline());
            self.engine.poll(self.clock.now());
        }
    }

    pub fn payloads(&self) -> Vec<String> {
        self.relay.payloads()
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
