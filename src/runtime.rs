//! Per-gesture evaluation state: the action-advancement state machine.
//!
//! This is the only part of the engine that mutates on every input event;
//! [`crate::Target`], [`crate::Gesture`] and [`crate::Action`] stay immutable
//! once configured, so a reset only ever touches state in this module.

use crate::action::{Action, ActionKind};
use crate::gesture::Gesture;
use crate::mask::{MoveMask, PinchMask, RotateMask, TouchMask};
use crate::target::{Target, TargetId};
use crate::touch_state::Geometry;

/// The input event a single `advance` call is reacting to. `dir_mask` on
/// `register_move` is advisory per the source header; signs are derived from
/// the geometry delta instead, so only the slot/count-change shape of the
/// event needs to be carried here.
#[derive(Debug, Clone, Copy)]
pub(crate) enum LiveEvent {
    Touch { x: i32, y: i32, delta_count: i32 },
    Move,
}

struct StepCtx<'a> {
    ts: u32,
    event: &'a LiveEvent,
    prev: Geometry,
    new: Geometry,
    targets: &'a [Target],
    tolerance: i32,
}

#[derive(Debug)]
enum Outcome {
    Completed,
    Progressed,
    Unchanged,
    /// The event contradicts the current action's mask and cannot be simply
    /// ignored; see `matches_later_action` for what happens next.
    Inconsistent,
}

#[derive(Debug, Clone, Copy)]
enum Accumulator {
    Touch { count: i32 },
    MoveThreshold { accumulated: f64 },
    MoveTarget { entered: bool },
    Rotate { accumulated: f64 },
    Pinch { accumulated: f64 },
    Delay,
}

fn fresh_accumulator(kind: &ActionKind) -> Accumulator {
    match kind {
        ActionKind::Touch { .. } => Accumulator::Touch { count: 0 },
        ActionKind::Move { target: Some(_), .. } => Accumulator::MoveTarget { entered: false },
        ActionKind::Move { .. } => Accumulator::MoveThreshold { accumulated: 0.0 },
        ActionKind::Rotate { .. } => Accumulator::Rotate { accumulated: 0.0 },
        ActionKind::Pinch { .. } => Accumulator::Pinch { accumulated: 0.0 },
        ActionKind::Delay { .. } => Accumulator::Delay,
    }
}

fn resolve_tolerance(action: &Action, gesture: &Gesture, engine_tolerance: i32) -> i32 {
    action
        .move_tolerance_override()
        .unwrap_or_else(|| gesture.move_tolerance.unwrap_or(engine_tolerance))
}

fn direction_allowed_move(dx: f64, dy: f64, mask: MoveMask) -> bool {
    (dx <= 0.0 || mask.contains(MoveMask::POSITIVE_X))
        && (dx >= 0.0 || mask.contains(MoveMask::NEGATIVE_X))
        && (dy <= 0.0 || mask.contains(MoveMask::POSITIVE_Y))
        && (dy >= 0.0 || mask.contains(MoveMask::NEGATIVE_Y))
}

fn step_touch(count: &mut i32, mode_mask: TouchMask, target: Option<TargetId>, threshold: i32, ctx: &StepCtx) -> Outcome {
    if threshold <= 0 {
        return Outcome::Completed;
    }
    let LiveEvent::Touch { x, y, delta_count } = *ctx.event else {
        return Outcome::Unchanged;
    };
    if delta_count == 0 {
        return Outcome::Unchanged;
    }
    let mask_ok = if delta_count > 0 { mode_mask.contains(TouchMask::DOWN) } else { mode_mask.contains(TouchMask::UP) };
    if !mask_ok {
        return Outcome::Inconsistent;
    }
    if let Some(tid) = target {
        if !ctx.targets[tid.0].contains(x, y) {
            return Outcome::Unchanged;
        }
    }
    *count += delta_count.abs();
    if *count >= threshold {
        Outcome::Completed
    } else {
        Outcome::Progressed
    }
}

fn step_move_target(entered: &mut bool, target: TargetId, ctx: &StepCtx) -> Outcome {
    if *entered {
        return Outcome::Completed;
    }
    if ctx.new.count_pressed == 0 {
        return Outcome::Unchanged;
    }
    let t = &ctx.targets[target.0];
    if t.contains(ctx.new.center_x.round() as i32, ctx.new.center_y.round() as i32) {
        *entered = true;
        Outcome::Completed
    } else {
        Outcome::Unchanged
    }
}

fn step_move_threshold(accumulated: &mut f64, dir_mask: MoveMask, threshold: i32, ctx: &StepCtx) -> Outcome {
    if threshold <= 0 {
        return Outcome::Completed;
    }
    if !matches!(ctx.event, LiveEvent::Move) {
        return Outcome::Unchanged;
    }
    let dx = ctx.new.center_x - ctx.prev.center_x;
    let dy = ctx.new.center_y - ctx.prev.center_y;
    let magnitude = (dx * dx + dy * dy).sqrt();
    if magnitude <= ctx.tolerance as f64 {
        return Outcome::Unchanged;
    }
    if !direction_allowed_move(dx, dy, dir_mask) {
        return Outcome::Inconsistent;
    }
    *accumulated += magnitude;
    if *accumulated >= threshold as f64 {
        Outcome::Completed
    } else {
        Outcome::Progressed
    }
}

fn step_rotate(accumulated: &mut f64, dir_mask: RotateMask, threshold: i32, ctx: &StepCtx) -> Outcome {
    if threshold <= 0 {
        return Outcome::Completed;
    }
    if !matches!(ctx.event, LiveEvent::Move) || ctx.prev.count_pressed < 2 || ctx.new.count_pressed < 2 {
        return Outcome::Unchanged;
    }
    // Per-slot angular change relative to center, averaged across slots
    // pressed both before and after. Diffing the two events' aggregate
    // `mean_angle` instead would cancel to zero whenever exactly two slots
    // are pressed, since they sit antipodal about their own centroid.
    let degrees = ctx.new.rotation_delta_deg;
    if degrees.abs() <= ctx.tolerance as f64 {
        return Outcome::Unchanged;
    }
    // Screen-space atan2 with Y increasing downward: an increasing angle
    // sweeps clockwise.
    let allowed = if degrees > 0.0 { dir_mask.contains(RotateMask::CW) } else { dir_mask.contains(RotateMask::CCW) };
    if !allowed {
        return Outcome::Inconsistent;
    }
    *accumulated += degrees.abs();
    if *accumulated >= threshold as f64 {
        Outcome::Completed
    } else {
        Outcome::Progressed
    }
}

fn step_pinch(accumulated: &mut f64, dir_mask: PinchMask, threshold: i32, ctx: &StepCtx) -> Outcome {
    if threshold <= 0 {
        return Outcome::Completed;
    }
    if !matches!(ctx.event, LiveEvent::Move) || ctx.prev.count_pressed < 2 || ctx.new.count_pressed < 2 {
        return Outcome::Unchanged;
    }
    let delta = ctx.new.mean_radius - ctx.prev.mean_radius;
    if delta.abs() <= ctx.tolerance as f64 {
        return Outcome::Unchanged;
    }
    let allowed = if delta > 0.0 { dir_mask.contains(PinchMask::OUT) } else { dir_mask.contains(PinchMask::IN) };
    if !allowed {
        return Outcome::Inconsistent;
    }
    *accumulated += delta.abs();
    if *accumulated >= threshold as f64 {
        Outcome::Completed
    } else {
        Outcome::Progressed
    }
}

/// Any change that isn't pure elapsed time. A `Delay` action's mask is
/// implicitly empty: no directional change is ever permitted during it.
fn is_disruptive(event: &LiveEvent, prev: Geometry, new: Geometry, tolerance: i32) -> bool {
    match *event {
        LiveEvent::Touch { delta_count, .. } => delta_count != 0,
        LiveEvent::Move => {
            let dx = new.center_x - prev.center_x;
            let dy = new.center_y - prev.center_y;
            (dx * dx + dy * dy).sqrt() > tolerance as f64
        }
    }
}

fn step_delay(ts: u32, action_start_ts: u32, duration_ms: u32, disruptive: bool) -> Outcome {
    if duration_ms == 0 {
        return Outcome::Completed;
    }
    if disruptive {
        return Outcome::Inconsistent;
    }
    let elapsed = ts.saturating_sub(action_start_ts);
    if elapsed >= duration_ms {
        Outcome::Completed
    } else {
        Outcome::Progressed
    }
}

/// Whether `action` would itself match the live event right now, used by the
/// reset policy to decide if a disallowed event should drop the gesture back
/// to its first action instead of being silently ignored.
fn action_matches_live(action: &Action, targets: &[Target], event: &LiveEvent, new: Geometry) -> bool {
    match (action.kind(), *event) {
        (ActionKind::Touch { mode_mask, target }, LiveEvent::Touch { x, y, delta_count }) => {
            if delta_count == 0 {
                return false;
            }
            let mask_ok = if delta_count > 0 { mode_mask.contains(TouchMask::DOWN) } else { mode_mask.contains(TouchMask::UP) };
            mask_ok && target.map_or(true, |tid| targets[tid.0].contains(x, y))
        }
        (ActionKind::Move { target: Some(tid), .. }, _) => {
            new.count_pressed > 0 && targets[tid.0].contains(new.center_x.round() as i32, new.center_y.round() as i32)
        }
        (ActionKind::Move { dir_mask, target: None }, LiveEvent::Move) => {
            new.count_pressed > 0 && !dir_mask.is_empty()
        }
        (ActionKind::Rotate { dir_mask }, LiveEvent::Move) => new.count_pressed >= 2 && !dir_mask.is_empty(),
        (ActionKind::Pinch { dir_mask }, LiveEvent::Move) => new.count_pressed >= 2 && !dir_mask.is_empty(),
        _ => false,
    }
}

/// Per-gesture evaluation state: current-action index, per-action
/// accumulators, and derived progress.
#[derive(Debug, Clone)]
pub(crate) struct GestureRuntime {
    action_index: usize,
    accumulator: Accumulator,
    action_start_ts: u32,
    action_progress: f64,
    terminal: bool,
    started: bool,
}

impl GestureRuntime {
    pub(crate) fn new(gesture: &Gesture) -> Self {
        if gesture.is_empty() {
            return Self {
                action_index: 0,
                accumulator: Accumulator::Delay,
                action_start_ts: 0,
                action_progress: 1.0,
                terminal: true,
                started: false,
            };
        }
        Self {
            action_index: 0,
            accumulator: fresh_accumulator(gesture.actions()[0].kind()),
            action_start_ts: 0,
            action_progress: 0.0,
            terminal: false,
            started: false,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub(crate) fn action_index(&self) -> usize {
        self.action_index
    }

    pub(crate) fn action_progress(&self) -> f64 {
        self.action_progress
    }

    pub(crate) fn reset(&mut self, gesture: &Gesture) {
        *self = Self::new(gesture);
    }

    /// Advance this runtime against one input event, chaining through any
    /// number of actions that complete with no further event (e.g. a
    /// zero-threshold `Touch` immediately followed by a `Delay` becoming
    /// current) within this same call.
    pub(crate) fn advance(
        &mut self,
        gesture: &Gesture,
        targets: &[Target],
        engine_tolerance: i32,
        ts: u32,
        event: &LiveEvent,
        prev: Geometry,
        new: Geometry,
    ) {
        if self.terminal || gesture.is_empty() {
            return;
        }
        if !self.started {
            self.started = true;
            self.action_start_ts = ts;
        }

        loop {
            if self.action_index >= gesture.len() {
                self.terminal = true;
                self.action_progress = 1.0;
                return;
            }
            let action = &gesture.actions()[self.action_index];
            let tolerance = resolve_tolerance(action, gesture, engine_tolerance);
            let ctx = StepCtx { ts, event, prev, new, targets, tolerance };
            let outcome = self.step_current(action, &ctx);

            match outcome {
                Outcome::Inconsistent => {
                    if gesture.actions()[self.action_index + 1..]
                        .iter()
                        .any(|a| action_matches_live(a, targets, event, new))
                    {
                        log::trace!("gesture reset: disallowed event matches a later action");
                        self.action_index = 0;
                        self.action_start_ts = ts;
                        self.action_progress = 0.0;
                        self.accumulator = fresh_accumulator(gesture.actions()[0].kind());
                    }
                    return;
                }
                Outcome::Unchanged => {
                    self.action_progress = self.progress_for(action, ts);
                    return;
                }
                Outcome::Progressed => {
                    self.action_progress = self.progress_for(action, ts);
                    return;
                }
                Outcome::Completed => {
                    let elapsed = ts.saturating_sub(self.action_start_ts);
                    if elapsed < action.min_duration_ms() {
                        self.action_progress = 0.999_999;
                        return;
                    }
                    self.action_index += 1;
                    self.action_start_ts = ts;
                    self.action_progress = 0.0;
                    if self.action_index >= gesture.len() {
                        self.terminal = true;
                        self.action_progress = 1.0;
                        return;
                    }
                    self.accumulator = fresh_accumulator(gesture.actions()[self.action_index].kind());
                    log::trace!("action {} -> {} within one event", self.action_index - 1, self.action_index);
                    continue;
                }
            }
        }
    }

    fn step_current(&mut self, action: &Action, ctx: &StepCtx) -> Outcome {
        match (action.kind(), &mut self.accumulator) {
            (ActionKind::Touch { mode_mask, target }, Accumulator::Touch { count }) => {
                step_touch(count, *mode_mask, *target, action.threshold(), ctx)
            }
            (ActionKind::Move { target: Some(t), .. }, Accumulator::MoveTarget { entered }) => {
                step_move_target(entered, *t, ctx)
            }
            (ActionKind::Move { dir_mask, target: None }, Accumulator::MoveThreshold { accumulated }) => {
                step_move_threshold(accumulated, *dir_mask, action.threshold(), ctx)
            }
            (ActionKind::Rotate { dir_mask }, Accumulator::Rotate { accumulated }) => {
                step_rotate(accumulated, *dir_mask, action.threshold(), ctx)
            }
            (ActionKind::Pinch { dir_mask }, Accumulator::Pinch { accumulated }) => {
                step_pinch(accumulated, *dir_mask, action.threshold(), ctx)
            }
            (ActionKind::Delay { duration_ms }, Accumulator::Delay) => {
                let duration = if action.threshold() > 0 { action.threshold() as u32 } else { *duration_ms };
                let disruptive = is_disruptive(ctx.event, ctx.prev, ctx.new, ctx.tolerance);
                step_delay(ctx.ts, self.action_start_ts, duration, disruptive)
            }
            _ => Outcome::Unchanged,
        }
    }

    fn progress_for(&self, action: &Action, ts: u32) -> f64 {
        match (action.kind(), &self.accumulator) {
            (ActionKind::Touch { .. }, Accumulator::Touch { count }) => {
                if action.threshold() <= 0 { 1.0 } else { (*count as f64 / action.threshold() as f64).clamp(0.0, 1.0) }
            }
            (ActionKind::Move { target: Some(_), .. }, Accumulator::MoveTarget { entered }) => {
                if *entered { 1.0 } else { 0.0 }
            }
            (ActionKind::Move { .. }, Accumulator::MoveThreshold { accumulated }) => {
                if action.threshold() <= 0 { 1.0 } else { (*accumulated / action.threshold() as f64).clamp(0.0, 1.0) }
            }
            (ActionKind::Rotate { .. }, Accumulator::Rotate { accumulated }) => {
                if action.threshold() <= 0 { 1.0 } else { (*accumulated / action.threshold() as f64).clamp(0.0, 1.0) }
            }
            (ActionKind::Pinch { .. }, Accumulator::Pinch { accumulated }) => {
                if action.threshold() <= 0 { 1.0 } else { (*accumulated / action.threshold() as f64).clamp(0.0, 1.0) }
            }
            (ActionKind::Delay { duration_ms }, Accumulator::Delay) => {
                let duration = if action.threshold() > 0 { action.threshold() as u32 } else { *duration_ms };
                if duration == 0 {
                    1.0
                } else {
                    let elapsed = ts.saturating_sub(self.action_start_ts);
                    (elapsed as f64 / duration as f64).clamp(0.0, 1.0)
                }
            }
            _ => 0.0,
        }
    }
}
