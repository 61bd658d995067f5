//! Motion sequences: full travel, interruption, reversal, targets and
//! calibration.

use std::time::Duration;

use relay_cover_common::cover::{CoverState, Motion, Position};
use relay_cover_engine::{Clock, TimerOutcome};

use super::{Rig, assert_close};

#[test]
fn full_open_then_stop_is_fully_open() {
    let mut rig = Rig::at(0.0);
    rig.engine.open();
    rig.clock.advance(Duration::from_secs(20));
    rig.engine.stop();
    assert_eq!(rig.engine.position(), Position::OPEN);
    assert_eq!(rig.engine.motion(), Motion::Idle);
}

#[test]
fn full_close_then_stop_is_fully_closed() {
    let mut rig = Rig::at(1.0);
    rig.engine.close();
    rig.clock.advance(Duration::from_secs(10));
    rig.engine.stop();
    assert_eq!(rig.engine.position(), Position::CLOSED);
}

#[test]
fn full_open_completes_on_timer() {
    let mut rig = Rig::at(0.0);
    rig.engine.open();
    rig.wait(Duration::from_secs(20));
    assert_eq!(rig.engine.position(), Position::OPEN);
    assert_eq!(rig.engine.status().state(), CoverState::Open);
    assert!(rig.engine.pending_timer().is_none());
    assert_eq!(rig.payloads(), vec!["ON_UP", "OFF"]);
}

#[test]
fn half_close_then_stop_is_half() {
    let mut rig = Rig::at(1.0);
    rig.engine.close();
    rig.clock.advance(Duration::from_secs(5));
    rig.engine.stop();
    assert_close(rig.engine.position().value(), 0.5);
    assert_eq!(rig.payloads(), vec!["ON_DOWN", "OFF"]);
}

#[test]
fn stop_twice_equals_stop_once() {
    let mut rig = Rig::at(1.0);
    rig.engine.close();
    rig.clock.advance(Duration::from_secs(3));
    rig.engine.stop();
    let once = rig.engine.status();
    let published = rig.relay.len();
    rig.engine.stop();
    assert_eq!(rig.engine.status(), once);
    assert_eq!(rig.relay.len(), published);
}

#[test]
fn reversal_settles_before_opening() {
    let mut rig = Rig::at(1.0);
    rig.engine.close();
    rig.clock.advance(Duration::from_millis(2500));
    rig.engine.open();

    assert_close(rig.engine.position().value(), 0.75);
    assert_eq!(rig.engine.motion(), Motion::Opening);
    assert_eq!(rig.payloads(), vec!["ON_DOWN", "OFF", "ON_UP"]);

    // 0.25 left at 20 s per full travel.
    let handle = rig.engine.pending_timer().unwrap();
    assert_eq!(handle.deadline() - rig.clock.now(), Duration::from_secs(5));
    rig.run_to_completion();
    assert_eq!(rig.engine.position(), Position::OPEN);
}

#[test]
fn set_position_from_open_closes_for_seventy_percent() {
    let mut rig = Rig::at(1.0);
    rig.engine.set_position(0.3).unwrap();
    assert_eq!(rig.engine.motion(), Motion::Closing);
    assert_eq!(rig.engine.target(), Some(Position::new(0.3).unwrap()));

    let handle = rig.engine.pending_timer().unwrap();
    let armed = handle.deadline() - rig.clock.now();
    let expected = Duration::from_secs(7);
    assert!(
        armed.abs_diff(expected) < Duration::from_micros(1),
        "armed {armed:?}"
    );

    rig.run_to_completion();
    assert_eq!(rig.engine.position().value(), 0.3);
    assert_eq!(rig.engine.target(), None);
    assert_eq!(rig.payloads(), vec!["ON_DOWN", "OFF"]);
}

#[test]
fn set_position_equal_is_noop() {
    let mut rig = Rig::at(0.6);
    rig.engine.set_position(0.6).unwrap();
    assert_eq!(rig.engine.motion(), Motion::Idle);
    assert!(rig.relay.is_empty());
}

#[test]
fn set_position_upwards_opens() {
    let mut rig = Rig::at(0.2);
    rig.engine.set_position(0.7).unwrap();
    assert_eq!(rig.engine.motion(), Motion::Opening);
    rig.clock.advance(Duration::from_secs(5));
    assert_close(rig.engine.current_position().value(), 0.45);
    rig.run_to_completion();
    assert_eq!(rig.engine.position().value(), 0.7);
}

#[test]
fn set_position_reverses_in_flight_motion() {
    let mut rig = Rig::at(0.0);
    rig.engine.open();
    rig.clock.advance(Duration::from_secs(16));
    rig.engine.set_position(0.5).unwrap();
    assert_close(rig.engine.position().value(), 0.8);
    assert_eq!(rig.engine.motion(), Motion::Closing);
    assert_eq!(rig.payloads(), vec!["ON_UP", "OFF", "ON_DOWN"]);
    rig.run_to_completion();
    assert_eq!(rig.engine.position().value(), 0.5);
}

#[test]
fn calibrate_idle_publishes_nothing() {
    let mut rig = Rig::new();
    rig.engine.calibrate(0.5).unwrap();
    assert_eq!(rig.engine.position().value(), 0.5);
    assert!(rig.relay.is_empty());
    assert_eq!(rig.engine.status().state(), CoverState::Stopped);
}

#[test]
fn command_after_due_deadline_wins_over_fire() {
    let mut rig = Rig::at(0.0);
    rig.engine.set_position(0.5).unwrap();
    let handle = rig.engine.pending_timer().unwrap();
    // Deadline passed but the fire has not been delivered yet.
    rig.clock.advance(Duration::from_secs(15));
    rig.engine.stop();
    assert_eq!(rig.engine.on_timer(handle), TimerOutcome::Stale);
    assert_close(rig.engine.position().value(), 0.5);
    assert_eq!(rig.payloads(), vec!["ON_UP", "OFF"]);
}

#[test]
fn open_from_closing_keeps_single_timer() {
    let mut rig = Rig::at(0.5);
    rig.engine.close();
    let first = rig.engine.pending_timer().unwrap();
    rig.clock.advance(Duration::from_secs(1));
    rig.engine.open();
    let second = rig.engine.pending_timer().unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(rig.engine.on_timer(first), TimerOutcome::Stale);
    assert_eq!(rig.engine.pending_timer(), Some(second));
}
