//! Owner of every [`crate::Target`], [`crate::Gesture`], and their runtimes;
//! dispatches input events, ranks progress, and queues completions.

use std::collections::VecDeque;

use crate::action::{Action, ActionId, ActionKind};
use crate::error::EngineError;
use crate::gesture::{Gesture, GestureId};
use crate::mask::{MoveMask, PinchMask, RotateMask, TouchMask};
use crate::runtime::{GestureRuntime, LiveEvent};
use crate::target::{Target, TargetId};
use crate::touch_state::TouchState;

/// Owner of all [`Target`]s, [`Gesture`]s, and their runtimes for its
/// lifetime. Every `TargetId`/`GestureId`/`ActionId` handed out by an engine
/// is only valid for that engine; indexing with a handle from a different or
/// exhausted engine returns an `EngineError::Unknown*` rather than panicking.
///
/// Single-threaded and cooperative: every method here runs to completion
/// before returning, and the host is expected to serialize calls from one
/// thread. There is no internal clock; `Delay` and `min_duration_ms` only
/// advance when the host feeds another event, synthetic or otherwise.
#[derive(Debug)]
pub struct Engine {
    targets: Vec<Target>,
    gestures: Vec<Gesture>,
    runtimes: Vec<GestureRuntime>,
    touch: TouchState,
    move_tolerance: i32,
    completed: VecDeque<GestureId>,
    clock: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an empty engine with no targets or gestures.
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            gestures: Vec::new(),
            runtimes: Vec::new(),
            touch: TouchState::new(),
            move_tolerance: 0,
            completed: VecDeque::new(),
            clock: 0,
        }
    }

    // ---- construction -----------------------------------------------

    /// Register a rectangular spatial precondition usable by `Touch` and
    /// `Move` actions.
    pub fn add_target(&mut self, x: i32, y: i32, width: i32, height: i32) -> TargetId {
        self.targets.push(Target::new(x, y, width, height));
        TargetId(self.targets.len() - 1)
    }

    /// Register a new, empty gesture. Append actions to it with
    /// `add_touch`/`add_move`/`add_rotate`/`add_pinch`/`add_delay`.
    pub fn add_gesture(&mut self) -> GestureId {
        let gesture = Gesture::new();
        let runtime = GestureRuntime::new(&gesture);
        self.gestures.push(gesture);
        self.runtimes.push(runtime);
        GestureId(self.gestures.len() - 1)
    }

    fn check_gesture(&self, gesture: GestureId) -> Result<usize, EngineError> {
        if gesture.0 < self.gestures.len() {
            Ok(gesture.0)
        } else {
            Err(EngineError::UnknownGesture(gesture))
        }
    }

    fn check_action(&self, action: ActionId) -> Result<(usize, usize), EngineError> {
        let gidx = self.check_gesture(action.gesture())?;
        if action.index() < self.gestures[gidx].len() {
            Ok((gidx, action.index()))
        } else {
            Err(EngineError::UnknownAction(action))
        }
    }

    fn check_target(&self, target: TargetId) -> Result<(), EngineError> {
        if target.0 < self.targets.len() {
            Ok(())
        } else {
            Err(EngineError::UnknownTarget(target))
        }
    }

    fn push_action(&mut self, gesture: GestureId, kind: ActionKind) -> Result<ActionId, EngineError> {
        let gidx = self.check_gesture(gesture)?;
        self.gestures[gidx].actions.push(Action::new(kind));
        let index = self.gestures[gidx].len() - 1;
        // A gesture that hasn't started yet always has an up-to-date runtime
        // shape; a gesture appended to mid-recognition keeps its runtime as-is,
        // since the new action only affects evaluation once reached.
        Ok(ActionId { gesture, index })
    }

    /// Append a `Touch` action: a change in pressed-finger count matching
    /// `mode_mask`.
    pub fn add_touch(&mut self, gesture: GestureId, mode_mask: TouchMask) -> Result<ActionId, EngineError> {
        self.push_action(gesture, ActionKind::Touch { mode_mask, target: None })
    }

    /// Append a `Move` action: displacement of the touch group's center in a
    /// direction permitted by `dir_mask`.
    pub fn add_move(&mut self, gesture: GestureId, dir_mask: MoveMask) -> Result<ActionId, EngineError> {
        self.push_action(gesture, ActionKind::Move { dir_mask, target: None })
    }

    /// Append a `Rotate` action: rotation of the touch group permitted by
    /// `dir_mask`.
    pub fn add_rotate(&mut self, gesture: GestureId, dir_mask: RotateMask) -> Result<ActionId, EngineError> {
        self.push_action(gesture, ActionKind::Rotate { dir_mask })
    }

    /// Append a `Pinch` action: change in the touch group's spread permitted
    /// by `dir_mask`.
    pub fn add_pinch(&mut self, gesture: GestureId, dir_mask: PinchMask) -> Result<ActionId, EngineError> {
        self.push_action(gesture, ActionKind::Pinch { dir_mask })
    }

    /// Append a `Delay` action requiring `duration_ms` of undisturbed time.
    /// `duration_ms` must be greater than zero.
    pub fn add_delay(&mut self, gesture: GestureId, duration_ms: u32) -> Result<ActionId, EngineError> {
        if duration_ms == 0 {
            return Err(EngineError::NonPositiveDelayDuration { duration_ms: 0 });
        }
        self.push_action(gesture, ActionKind::Delay { duration_ms })
    }

    // ---- configuration ------------------------------------------------

    /// Set the threshold of change required for `action` to complete. Units
    /// depend on kind: touch-point changes, pixels, degrees, pixels, or
    /// milliseconds.
    pub fn set_threshold(&mut self, action: ActionId, threshold: i32) -> Result<(), EngineError> {
        let (gidx, aidx) = self.check_action(action)?;
        self.gestures[gidx].actions_mut()[aidx].set_threshold(threshold, action)
    }

    /// Set the target `action` must reach (`Move`) or occur within
    /// (`Touch`). Rejected for `Rotate`, `Pinch`, and `Delay`, and conflicts
    /// with a `Move` threshold already set.
    pub fn set_target(&mut self, action: ActionId, target: TargetId) -> Result<(), EngineError> {
        self.check_target(target)?;
        let (gidx, aidx) = self.check_action(action)?;
        self.gestures[gidx].actions_mut()[aidx].set_target(target, action)
    }

    /// Set the minimum time `action` must remain current before it can
    /// complete, even if its threshold was already reached.
    pub fn set_duration(&mut self, action: ActionId, duration_ms: u32) -> Result<(), EngineError> {
        let (gidx, aidx) = self.check_action(action)?;
        self.gestures[gidx].actions_mut()[aidx].set_duration(duration_ms);
        Ok(())
    }

    /// Override the move tolerance for this action only.
    pub fn set_action_move_tolerance(&mut self, action: ActionId, tolerance: i32) -> Result<(), EngineError> {
        let (gidx, aidx) = self.check_action(action)?;
        self.gestures[gidx].actions_mut()[aidx].set_move_tolerance(tolerance);
        Ok(())
    }

    /// Set the default move tolerance for all actions of `gesture` that
    /// don't override it themselves.
    pub fn set_gesture_move_tolerance(&mut self, gesture: GestureId, tolerance: i32) -> Result<(), EngineError> {
        let gidx = self.check_gesture(gesture)?;
        self.gestures[gidx].move_tolerance = Some(tolerance);
        Ok(())
    }

    /// Set the engine-wide default move tolerance, used when neither an
    /// action nor its gesture overrides it.
    pub fn set_engine_move_tolerance(&mut self, tolerance: i32) {
        self.move_tolerance = tolerance;
    }

    // ---- input ----------------------------------------------------------

    fn clamp_ts(&mut self, ts: u32) -> u32 {
        if ts < self.clock {
            log::trace!("timestamp regression: {ts} < {}; clamping deltas to 0", self.clock);
            self.clock
        } else {
            self.clock = ts;
            ts
        }
    }

    /// Inform the engine of a touch press or release.
    ///
    /// `timestamp_ms` is milliseconds from an arbitrary monotonic epoch.
    /// `slot` identifies which finger caused the event.
    pub fn register_touch(&mut self, timestamp_ms: u32, slot: i32, down: bool, x: i32, y: i32) {
        let ts = self.clamp_ts(timestamp_ms);
        let prev = *self.touch.geometry();
        let was_pressed = self.touch.is_pressed(slot);
        self.touch.register_touch(ts, slot, down, x, y);
        let new = *self.touch.geometry();
        let delta_count = match (was_pressed, down) {
            (false, true) => 1,
            (true, false) => -1,
            _ => 0,
        };
        let event = LiveEvent::Touch { x, y, delta_count };
        self.advance_all(ts, &event, prev, new);
        self.touch.prune_released();
    }

    /// Inform the engine of a touch movement. `dir_mask` is advisory only;
    /// signs are derived from `(dx, dy)` for threshold accounting, per the
    /// engine's resolution of the direction-mask-vs-signed-delta redundancy
    /// in the original C header.
    pub fn register_move(&mut self, timestamp_ms: u32, slot: i32, _dir_mask: MoveMask, dx: i32, dy: i32) {
        let ts = self.clamp_ts(timestamp_ms);
        if !self.touch.contains_slot(slot) {
            log::warn!("register_move for unknown slot {slot}; creating it pressed at the moved-to position");
        }
        let prev = *self.touch.geometry();
        self.touch.register_move(ts, slot, dx, dy);
        let new = *self.touch.geometry();
        self.advance_all(ts, &LiveEvent::Move, prev, new);
    }

    fn advance_all(&mut self, ts: u32, event: &LiveEvent, prev: crate::touch_state::Geometry, new: crate::touch_state::Geometry) {
        let tolerance = self.move_tolerance;
        for i in 0..self.gestures.len() {
            if self.runtimes[i].is_terminal() {
                continue;
            }
            self.runtimes[i].advance(&self.gestures[i], &self.targets, tolerance, ts, event, prev, new);
            if self.runtimes[i].is_terminal() {
                log::debug!("gesture {i} reached terminal state");
                self.completed.push_back(GestureId(i));
            }
        }
    }

    // ---- progress API -----------------------------------------------------

    /// Progress of a single action: 1 if already completed (including when
    /// its gesture has moved past it or finished), the in-flight value if
    /// it's the current action, or 0 if it hasn't become current yet.
    pub fn action_progress(&self, action: ActionId) -> Result<f64, EngineError> {
        let (gidx, aidx) = self.check_action(action)?;
        let runtime = &self.runtimes[gidx];
        if runtime.is_terminal() || runtime.action_index() > aidx {
            Ok(1.0)
        } else if runtime.action_index() < aidx {
            Ok(0.0)
        } else {
            Ok(runtime.action_progress())
        }
    }

    /// `(action_index + current_action_progress) / len(actions)`; 1 for a
    /// terminal (completed, undrained) runtime.
    pub fn gesture_progress(&self, gesture: GestureId) -> Result<f64, EngineError> {
        let gidx = self.check_gesture(gesture)?;
        let g = &self.gestures[gidx];
        let runtime = &self.runtimes[gidx];
        if runtime.is_terminal() || g.is_empty() {
            return Ok(1.0);
        }
        Ok((runtime.action_index() as f64 + runtime.action_progress()) / g.len() as f64)
    }

    /// Reset `gesture`'s runtime to its initial state. Idempotent.
    pub fn reset_progress(&mut self, gesture: GestureId) -> Result<(), EngineError> {
        let gidx = self.check_gesture(gesture)?;
        self.runtimes[gidx].reset(&self.gestures[gidx]);
        Ok(())
    }

    /// The action a gesture's runtime is currently evaluating, or `None` if
    /// it has reached its terminal state.
    pub fn current_action(&self, gesture: GestureId) -> Result<Option<&Action>, EngineError> {
        let gidx = self.check_gesture(gesture)?;
        let g = &self.gestures[gidx];
        let runtime = &self.runtimes[gidx];
        if runtime.is_terminal() || runtime.action_index() >= g.len() {
            Ok(None)
        } else {
            Ok(Some(&g.actions()[runtime.action_index()]))
        }
    }

    /// Write up to `out.len()` `(gesture, progress)` pairs, sorted by
    /// progress descending and tiebroken by declaration order. Returns the
    /// highest progress value written, or 0 if there are no gestures.
    pub fn fill_progress_array(&self, out: &mut [(GestureId, f64)]) -> f64 {
        let mut all: Vec<(GestureId, f64)> = (0..self.gestures.len())
            .map(|i| (GestureId(i), self.gesture_progress(GestureId(i)).unwrap_or(0.0)))
            .collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0 .0.cmp(&b.0 .0)));
        let n = out.len().min(all.len());
        out[..n].copy_from_slice(&all[..n]);
        all.first().map(|x| x.1).unwrap_or(0.0)
    }

    /// Pop the oldest completed gesture from the completion FIFO, resetting
    /// its runtime. `None` if no gesture is waiting.
    pub fn handle_finished_gesture(&mut self) -> Option<GestureId> {
        let gid = self.completed.pop_front()?;
        self.runtimes[gid.0].reset(&self.gestures[gid.0]);
        Some(gid)
    }

    /// The live touch state, for hosts that want to inspect raw geometry.
    pub fn touch_state(&self) -> &TouchState {
        &self.touch
    }
}
