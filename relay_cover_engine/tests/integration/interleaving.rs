//! Arbitrary command/time interleavings.
//!
//! After every step: the estimate is in range, idle ⇔ no pending timer, and
//! a timer exists only while the relay is energized.

use std::time::Duration;

use proptest::prelude::*;
use relay_cover_engine::{CoverCommand, TimerOutcome};

use super::Rig;

#[derive(Debug, Clone)]
enum Step {
    Command(CoverCommand),
    Advance(u64),
    /// Deliver the currently armed fire, if any, immediately.
    FireNow,
    /// Re-deliver the last observed handle, possibly stale by now.
    FireStale,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Command(CoverCommand::Open)),
        Just(Step::Command(CoverCommand::Close)),
        Just(Step::Command(CoverCommand::Stop)),
        Just(Step::Command(CoverCommand::Reference)),
        (0u8..=100).prop_map(|p| Step::Command(CoverCommand::SetPosition(f64::from(p) / 100.0))),
        (0u8..=100).prop_map(|p| Step::Command(CoverCommand::Calibrate(f64::from(p) / 100.0))),
        (-0.5f64..1.5).prop_map(|p| Step::Command(CoverCommand::SetPosition(p))),
        (0u64..25_000).prop_map(Step::Advance),
        Just(Step::FireNow),
        Just(Step::FireStale),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(steps in prop::collection::vec(step(), 1..60)) {
        let mut rig = Rig::new();
        let mut last_handle = None;

        for step in steps {
            match step {
                Step::Command(cmd) => {
                    let before = rig.engine.status();
                    let timer_before = rig.engine.pending_timer();
                    if cmd.apply(&mut rig.engine).is_err() {
                        // Refused commands never mutate state.
                        prop_assert_eq!(rig.engine.status(), before);
                        prop_assert_eq!(rig.engine.pending_timer(), timer_before);
                    }
                }
                Step::Advance(ms) => {
                    rig.wait(Duration::from_millis(ms));
                }
                Step::FireNow => {
                    if let Some(h) = rig.engine.pending_timer() {
                        prop_assert_eq!(rig.engine.on_timer(h), TimerOutcome::Settled);
                    }
                }
                Step::FireStale => {
                    if let Some(h) = last_handle {
                        if rig.engine.pending_timer() != Some(h) {
                            prop_assert_eq!(rig.engine.on_timer(h), TimerOutcome::Stale);
                        }
                    }
                }
            }

            if let Some(h) = rig.engine.pending_timer() {
                last_handle = Some(h);
            }

            let position = rig.engine.current_position().value();
            prop_assert!((0.0..=1.0).contains(&position), "position {}", position);
            prop_assert!((0.0..=1.0).contains(&rig.engine.position().value()));
            prop_assert!(rig.engine.is_consistent());
            prop_assert_eq!(
                rig.engine.motion().is_moving(),
                rig.engine.pending_timer().is_some()
            );
        }
    }

    #[test]
    fn settled_target_is_exact(start in 0u8..=100, target in 0u8..=100) {
        let mut rig = Rig::at(f64::from(start) / 100.0);
        let goal = f64::from(target) / 100.0;
        rig.engine.set_position(goal).unwrap();
        rig.run_to_completion();
        prop_assert!(!rig.engine.motion().is_moving());
        prop_assert!((rig.engine.position().value() - goal).abs() < 1e-9);
    }
}
