//! End-to-end scenarios and quantified invariants for the gesture engine.

use libtouch_rs::{Engine, MoveMask, PinchMask, RotateMask, TouchMask};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use test_case::test_case;

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "expected {a} ~= {b}");
}

// S1 -- two-finger tap. Gesture: Touch{Down, threshold=2}, Touch{Up, threshold=2}.
#[test]
fn s1_two_finger_tap() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let down = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(down, 2).unwrap();
    let up = engine.add_touch(gesture, TouchMask::UP).unwrap();
    engine.set_threshold(up, 2).unwrap();

    engine.register_touch(0, 0, true, 100, 100);
    let after_first = engine.gesture_progress(gesture).unwrap();
    assert!(after_first > 0.0 && after_first < 0.5, "got {after_first}");

    engine.register_touch(5, 1, true, 200, 100);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    engine.register_touch(50, 0, false, 100, 100);
    approx(engine.gesture_progress(gesture).unwrap(), 0.75);

    engine.register_touch(55, 1, false, 200, 100);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);

    assert_eq!(engine.handle_finished_gesture(), Some(gesture));
    approx(engine.gesture_progress(gesture).unwrap(), 0.0);
}

// S2 -- horizontal swipe with tolerance.
#[test]
fn s2_horizontal_swipe_with_tolerance() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 1).unwrap();
    let mv = engine.add_move(gesture, MoveMask::POSITIVE_X).unwrap();
    engine.set_threshold(mv, 100).unwrap();
    engine.set_action_move_tolerance(mv, 5).unwrap();

    engine.register_touch(0, 0, true, 0, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    engine.register_move(1, 0, MoveMask::POSITIVE_X, 3, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    engine.register_move(2, 0, MoveMask::POSITIVE_X, 50, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.75);

    engine.register_move(3, 0, MoveMask::POSITIVE_X, 60, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
    assert_eq!(engine.handle_finished_gesture(), Some(gesture));
}

// S3 -- pinch-out.
#[test]
fn s3_pinch_out() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 2).unwrap();
    let pinch = engine.add_pinch(gesture, PinchMask::OUT).unwrap();
    engine.set_threshold(pinch, 50).unwrap();

    engine.register_touch(0, 0, true, 100, 100);
    engine.register_touch(1, 1, true, 200, 100);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    engine.register_move(2, 1, MoveMask::empty(), 100, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
    assert_eq!(engine.handle_finished_gesture(), Some(gesture));
}

// S4 -- rotate CW 90 degrees. Exercises the per-slot-delta rotation
// computation rather than the (degenerate, for two antipodal slots) mean
// angle difference between events.
#[test]
fn s4_rotate_cw_90() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 2).unwrap();
    let rotate = engine.add_rotate(gesture, RotateMask::CW).unwrap();
    engine.set_threshold(rotate, 90).unwrap();

    engine.register_touch(0, 0, true, 100, 0);
    engine.register_touch(0, 1, true, -100, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    let mut pos0 = (100.0_f64, 0.0_f64);
    let mut pos1 = (-100.0_f64, 0.0_f64);
    let mut ts = 1u32;
    for _ in 0..20 {
        if engine.current_action(gesture).unwrap().is_none() {
            break;
        }
        let theta = 10f64.to_radians();
        let (c, s) = (theta.cos(), theta.sin());
        let rot = |x: f64, y: f64| (x * c - y * s, x * s + y * c);
        let new0 = rot(pos0.0, pos0.1);
        let new1 = rot(pos1.0, pos1.1);
        engine.register_move(ts, 0, MoveMask::empty(), (new0.0 - pos0.0).round() as i32, (new0.1 - pos0.1).round() as i32);
        engine.register_move(ts, 1, MoveMask::empty(), (new1.0 - pos1.0).round() as i32, (new1.1 - pos1.1).round() as i32);
        pos0 = new0;
        pos1 = new1;
        ts += 1;
    }

    assert_eq!(engine.handle_finished_gesture(), Some(gesture));
}

// S5 -- long press.
#[test]
fn s5_long_press() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 1).unwrap();
    let delay = engine.add_delay(gesture, 500).unwrap();

    engine.register_touch(0, 0, true, 0, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.5);

    // Synthetic no-op: same slot, same position, not pressed/released.
    engine.register_move(499, 0, MoveMask::empty(), 0, 0);
    let progress = engine.gesture_progress(gesture).unwrap();
    approx(progress, 0.5 + 0.5 * (499.0 / 500.0));
    let _ = delay;

    engine.register_move(500, 0, MoveMask::empty(), 0, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
    assert_eq!(engine.handle_finished_gesture(), Some(gesture));
}

// S6 -- reset on incompatible event. A Move-only gesture should ignore a
// disallowed direction without resetting, since there's no later action for
// it to match instead.
#[test]
fn s6_disallowed_direction_does_not_reset_single_action_gesture() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let mv = engine.add_move(gesture, MoveMask::POSITIVE_X).unwrap();
    engine.set_threshold(mv, 100).unwrap();

    engine.register_touch(0, 0, true, 0, 0);
    engine.register_move(1, 0, MoveMask::POSITIVE_X, 40, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.4);

    engine.register_move(2, 0, MoveMask::NEGATIVE_X, -50, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 0.4);

    engine.register_move(3, 0, MoveMask::POSITIVE_X, 60, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
}

// Invariant 1: progress is always in [0, 1].
proptest! {
    #[test]
    fn invariant_progress_is_bounded(deltas in prop::collection::vec(-20i32..=20, 1..40)) {
        let mut engine = Engine::new();
        let gesture = engine.add_gesture();
        let mv = engine.add_move(gesture, MoveMask::POSITIVE_X | MoveMask::NEGATIVE_X).unwrap();
        engine.set_threshold(mv, 200).unwrap();
        engine.register_touch(0, 0, true, 0, 0);
        let mut ts = 1u32;
        for dx in deltas {
            engine.register_move(ts, 0, MoveMask::empty(), dx, 0);
            let p = engine.gesture_progress(gesture).unwrap();
            prop_assert!((0.0..=1.0).contains(&p));
            ts += 1;
        }
    }
}

// Invariant 2: progress is monotonically non-decreasing between resets, for
// a gesture whose single action's mask permits every generated direction (so
// no disallowed-event reset is possible).
proptest! {
    #[test]
    fn invariant_progress_monotonic_without_reset(steps in prop::collection::vec(1i32..=10, 1..30)) {
        let mut engine = Engine::new();
        let gesture = engine.add_gesture();
        let mv = engine.add_move(gesture, MoveMask::all()).unwrap();
        engine.set_threshold(mv, 1000).unwrap();
        engine.register_touch(0, 0, true, 0, 0);
        let mut last = engine.gesture_progress(gesture).unwrap();
        let mut ts = 1u32;
        for dx in steps {
            engine.register_move(ts, 0, MoveMask::empty(), dx, 0);
            let p = engine.gesture_progress(gesture).unwrap();
            prop_assert!(p + 1e-9 >= last);
            last = p;
            ts += 1;
        }
    }
}

// Invariant 3 & 4: completion FIFO order and post-drain reset.
#[test]
fn invariant_completion_fifo_and_drain_resets_progress() {
    let mut engine = Engine::new();
    let fast = engine.add_gesture();
    let ft = engine.add_touch(fast, TouchMask::DOWN).unwrap();
    engine.set_threshold(ft, 1).unwrap();

    let slow = engine.add_gesture();
    let st = engine.add_touch(slow, TouchMask::DOWN).unwrap();
    engine.set_threshold(st, 2).unwrap();

    engine.register_touch(0, 0, true, 0, 0);
    // `fast` completes on this single event; `slow` needs one more.
    assert_eq!(engine.handle_finished_gesture(), Some(fast));
    assert_eq!(engine.handle_finished_gesture(), None);

    engine.register_touch(1, 1, true, 0, 0);
    assert_eq!(engine.handle_finished_gesture(), Some(slow));
    approx(engine.gesture_progress(slow).unwrap(), 0.0);
}

// Invariant 5: fill_progress_array sorts by progress descending, tiebroken
// by declaration order.
#[test]
fn invariant_fill_progress_array_is_sorted() {
    let mut engine = Engine::new();
    let g0 = engine.add_gesture();
    let a0 = engine.add_touch(g0, TouchMask::DOWN).unwrap();
    engine.set_threshold(a0, 10).unwrap();

    let g1 = engine.add_gesture();
    let a1 = engine.add_touch(g1, TouchMask::DOWN).unwrap();
    engine.set_threshold(a1, 2).unwrap();

    let g2 = engine.add_gesture();
    let a2 = engine.add_touch(g2, TouchMask::DOWN).unwrap();
    engine.set_threshold(a2, 10).unwrap();

    // g1 reaches terminal (progress 1); g0 and g2 tie at 0.2.
    for slot in 0..2 {
        engine.register_touch(slot as u32, slot, true, 0, 0);
    }

    let mut out = vec![(g0, 0.0); 3];
    let top = engine.fill_progress_array(&mut out);
    assert_eq!(out[0].0, g1);
    approx(top, out[0].1);
    assert!(out[1].1 <= out[0].1 && out[2].1 <= out[1].1);
    // Tie between g0 and g2 breaks by declaration order.
    assert_eq!(out[1].0, g0);
    assert_eq!(out[2].0, g2);
}

// Invariant 6: a Touch action with threshold N and no target completes
// exactly when N matching finger-state changes have registered.
#[rstest]
#[case(1)]
#[case(3)]
#[case(5)]
fn invariant_touch_threshold_completes_exactly_at_n(#[case] n: i32) {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, n).unwrap();

    for i in 0..n - 1 {
        engine.register_touch(i as u32, i, true, 0, 0);
        assert!(engine.current_action(gesture).unwrap().is_some(), "completed early at {i}");
    }
    engine.register_touch(n as u32, n, true, 0, 0);
    assert!(engine.current_action(gesture).unwrap().is_none());
}

// Invariant 7: a Move action with target completes on first entry and stays
// completed thereafter.
#[test]
fn invariant_move_target_completes_on_first_entry_and_stays() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let target = engine.add_target(100, 100, 50, 50);
    let mv = engine.add_move(gesture, MoveMask::all()).unwrap();
    engine.set_target(mv, target).unwrap();

    engine.register_touch(0, 0, true, 0, 0);
    engine.register_move(1, 0, MoveMask::empty(), 50, 50);
    assert!(engine.current_action(gesture).unwrap().is_some());

    engine.register_move(2, 0, MoveMask::empty(), 70, 70);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);

    engine.register_move(3, 0, MoveMask::empty(), 5, 5);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
}

// reset_progress is idempotent.
#[test]
fn reset_progress_is_idempotent() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 3).unwrap();
    engine.register_touch(0, 0, true, 0, 0);
    assert!(engine.gesture_progress(gesture).unwrap() > 0.0);

    engine.reset_progress(gesture).unwrap();
    let once = engine.gesture_progress(gesture).unwrap();
    engine.reset_progress(gesture).unwrap();
    let twice = engine.gesture_progress(gesture).unwrap();
    approx(once, twice);
    approx(once, 0.0);
}

// Unknown-slot move creates a pressed slot silently rather than erroring.
#[test]
fn register_move_on_unknown_slot_creates_it() {
    let mut engine = Engine::new();
    engine.register_move(0, 9, MoveMask::empty(), 10, 20);
    assert_eq!(engine.touch_state().geometry().count_pressed, 1);
}

// A zero threshold pre-completes an action immediately regardless of kind,
// avoiding the division-by-zero the naive `accumulated / threshold` formula
// would otherwise hit.
#[test_case(TouchMask::DOWN; "touch")]
#[test_case(TouchMask::UP; "touch_up")]
fn zero_threshold_touch_precompletes(mode_mask: TouchMask) {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    engine.add_touch(gesture, mode_mask).unwrap();
    // No event delivered at all; a zero threshold still resolves on the
    // very first input event observed, which also happens to build the
    // touch state needed for anything downstream.
    engine.register_touch(0, 0, true, 0, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
}

#[test_case(0, 0.0 ; "below start")]
#[test_case(250, 0.5 ; "midway")]
#[test_case(500, 1.0 ; "complete")]
fn delay_progress_scales_linearly_with_elapsed_time(elapsed_ms: u32, expected: f64) {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    engine.add_delay(gesture, 500).unwrap();
    engine.register_touch(0, 0, true, 0, 0);
    if elapsed_ms > 0 {
        engine.register_move(elapsed_ms, 0, MoveMask::empty(), 0, 0);
    }
    approx(engine.gesture_progress(gesture).unwrap(), expected);
}

// Timestamp regression clamps rather than panicking or resetting gestures.
#[test]
fn timestamp_regression_does_not_panic_or_reset() {
    let mut engine = Engine::new();
    let gesture = engine.add_gesture();
    let touch = engine.add_touch(gesture, TouchMask::DOWN).unwrap();
    engine.set_threshold(touch, 1).unwrap();
    engine.register_touch(100, 0, true, 0, 0);
    approx(engine.gesture_progress(gesture).unwrap(), 1.0);
    // A later event with an earlier timestamp must not panic.
    engine.register_touch(50, 1, true, 10, 10);
}
