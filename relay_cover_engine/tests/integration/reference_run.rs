//! Reference run against the closed end stop.

use std::time::Duration;

use relay_cover_common::cover::{Motion, Position};
use relay_cover_engine::command::reference::ReferencePhase;
use relay_cover_engine::Clock;

use super::{Rig, blind_config};

#[test]
fn reference_from_drifted_estimate() {
    // Estimate says closed, cover is physically somewhere else.
    let mut rig = Rig::at(0.0);
    rig.engine.reference();
    assert_eq!(rig.engine.motion(), Motion::Closing);
    assert_eq!(rig.payloads(), vec!["ON_DOWN"]);

    rig.wait(Duration::from_secs(10));
    assert!(rig.engine.is_referencing(), "overtravel still running");
    rig.wait(Duration::from_secs(1));
    assert!(!rig.engine.is_referencing());
    assert_eq!(rig.engine.position(), Position::CLOSED);
    assert_eq!(
        rig.engine.reference_supervisor().phase(),
        ReferencePhase::Complete
    );
    assert_eq!(rig.payloads(), vec!["ON_DOWN", "OFF"]);
}

#[test]
fn reference_while_opening_stops_first() {
    let mut rig = Rig::at(0.0);
    rig.engine.open();
    rig.clock.advance(Duration::from_secs(10));
    rig.engine.reference();
    assert_eq!(rig.payloads(), vec!["ON_UP", "OFF", "ON_DOWN"]);
    let handle = rig.engine.pending_timer().unwrap();
    assert_eq!(handle.deadline() - rig.clock.now(), Duration::from_secs(11));
}

#[test]
fn reference_is_idempotent_while_active() {
    let mut rig = Rig::at(0.4);
    rig.engine.reference();
    let handle = rig.engine.pending_timer();
    rig.clock.advance(Duration::from_secs(2));
    rig.engine.reference();
    assert_eq!(rig.engine.pending_timer(), handle);
    assert_eq!(rig.relay.len(), 1);
}

#[test]
fn reference_interrupted_by_open() {
    let mut rig = Rig::at(1.0);
    rig.engine.reference();
    rig.clock.advance(Duration::from_secs(3));
    rig.engine.open();
    assert_eq!(
        rig.engine.reference_supervisor().phase(),
        ReferencePhase::Aborted
    );
    assert!((rig.engine.position().value() - 0.7).abs() < 1e-9);
    assert_eq!(rig.engine.motion(), Motion::Opening);
}

#[test]
fn reference_honours_self_stopping_relay() {
    let mut config = blind_config();
    config.stop_at_travel_end = false;
    let mut rig = Rig::with_config(config);
    rig.engine.reference();
    rig.run_to_completion();
    assert_eq!(rig.engine.position(), Position::CLOSED);
    assert_eq!(rig.payloads(), vec!["ON_DOWN"]);
}
