//! Optional in-memory declarative configuration surface, gated behind the
//! `serde` feature. This does not parse any file format itself — spec.md's
//! "no CLI or configuration file parsing" non-goal is about that, not about
//! an in-memory description a host can deserialize however it likes and feed
//! to [`Engine::build_gesture`].

use serde::{Deserialize, Serialize};

use crate::action::ActionId;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::gesture::GestureId;
use crate::mask::{MoveMask, PinchMask, RotateMask, TouchMask};
use crate::target::TargetId;

/// Declarative description of one [`crate::Action`], independent of any
/// engine instance. Target indices refer to positions in the `targets` slice
/// passed to [`Engine::build_gesture`], not live [`TargetId`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// See [`crate::ActionKind::Touch`].
    Touch {
        /// Bits of [`TouchMask`] this action matches.
        mode_mask: TouchMask,
        /// Index into the `targets` slice given to `build_gesture`.
        target: Option<usize>,
        /// See [`crate::Action::threshold`].
        #[serde(default)]
        threshold: i32,
        /// See [`crate::Action::min_duration_ms`].
        #[serde(default)]
        min_duration_ms: u32,
    },
    /// See [`crate::ActionKind::Move`].
    Move {
        /// Bits of [`MoveMask`] this action matches.
        dir_mask: MoveMask,
        /// Index into the `targets` slice given to `build_gesture`.
        target: Option<usize>,
        /// See [`crate::Action::threshold`]. Ignored if `target` is set.
        #[serde(default)]
        threshold: i32,
        /// See [`crate::Action::min_duration_ms`].
        #[serde(default)]
        min_duration_ms: u32,
    },
    /// See [`crate::ActionKind::Rotate`].
    Rotate {
        /// Bits of [`RotateMask`] this action matches.
        dir_mask: RotateMask,
        /// See [`crate::Action::threshold`], in degrees.
        threshold: i32,
        /// See [`crate::Action::min_duration_ms`].
        #[serde(default)]
        min_duration_ms: u32,
    },
    /// See [`crate::ActionKind::Pinch`].
    Pinch {
        /// Bits of [`PinchMask`] this action matches.
        dir_mask: PinchMask,
        /// See [`crate::Action::threshold`], in pixels.
        threshold: i32,
        /// See [`crate::Action::min_duration_ms`].
        #[serde(default)]
        min_duration_ms: u32,
    },
    /// See [`crate::ActionKind::Delay`].
    Delay {
        /// How long the action must observe no disruptive change for, in
        /// milliseconds.
        duration_ms: u32,
    },
}

/// Declarative description of a [`crate::Gesture`], independent of any engine
/// instance. `targets` is a list of rectangles addressed by position from
/// each action's `target` index; `Engine::build_gesture` registers them with
/// the engine and rewrites those indices into live [`TargetId`]s internally.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GestureSpec {
    /// Target rectangles referenced by `actions[].target`, as `(x, y, width, height)`.
    #[serde(default)]
    pub targets: Vec<(i32, i32, i32, i32)>,
    /// The gesture's actions, in declaration order.
    pub actions: Vec<ActionSpec>,
    /// Default move tolerance for actions in this gesture that don't
    /// override it themselves.
    #[serde(default)]
    pub move_tolerance: Option<i32>,
}

impl Engine {
    /// Register a gesture described by `spec`, including any targets it
    /// references. Targets are deduplicated only within `spec.targets`
    /// itself, not against targets already registered on this engine.
    pub fn build_gesture(&mut self, spec: &GestureSpec) -> Result<GestureId, EngineError> {
        let target_ids: Vec<TargetId> = spec
            .targets
            .iter()
            .map(|&(x, y, w, h)| self.add_target(x, y, w, h))
            .collect();

        let gesture = self.add_gesture();
        if let Some(tolerance) = spec.move_tolerance {
            self.set_gesture_move_tolerance(gesture, tolerance)?;
        }

        for action_spec in &spec.actions {
            let resolve = |idx: usize, target_ids: &[TargetId]| -> Option<TargetId> {
                target_ids.get(idx).copied()
            };
            let (action_id, threshold, min_duration_ms, target): (ActionId, i32, u32, Option<TargetId>) = match action_spec {
                ActionSpec::Touch { mode_mask, target, threshold, min_duration_ms } => {
                    let id = self.add_touch(gesture, *mode_mask)?;
                    (id, *threshold, *min_duration_ms, target.and_then(|i| resolve(i, &target_ids)))
                }
                ActionSpec::Move { dir_mask, target, threshold, min_duration_ms } => {
                    let id = self.add_move(gesture, *dir_mask)?;
                    (id, *threshold, *min_duration_ms, target.and_then(|i| resolve(i, &target_ids)))
                }
                ActionSpec::Rotate { dir_mask, threshold, min_duration_ms } => {
                    let id = self.add_rotate(gesture, *dir_mask)?;
                    (id, *threshold, *min_duration_ms, None)
                }
                ActionSpec::Pinch { dir_mask, threshold, min_duration_ms } => {
                    let id = self.add_pinch(gesture, *dir_mask)?;
                    (id, *threshold, *min_duration_ms, None)
                }
                ActionSpec::Delay { duration_ms } => {
                    let id = self.add_delay(gesture, *duration_ms)?;
                    (id, 0, 0, None)
                }
            };

            if let Some(tid) = target {
                self.set_target(action_id, tid)?;
            } else if threshold > 0 && !matches!(action_spec, ActionSpec::Delay { .. }) {
                self.set_threshold(action_id, threshold)?;
            }
            if min_duration_ms > 0 {
                self.set_duration(action_id, min_duration_ms)?;
            }
        }

        Ok(gesture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::TouchMask;

    #[test]
    fn build_gesture_from_spec_wires_target_indices() {
        let spec = GestureSpec {
            targets: vec![(0, 0, 100, 100)],
            actions: vec![ActionSpec::Touch {
                mode_mask: TouchMask::DOWN,
                target: Some(0),
                threshold: 0,
                min_duration_ms: 0,
            }],
            move_tolerance: None,
        };
        let mut engine = Engine::new();
        let gesture = engine.build_gesture(&spec).unwrap();
        assert_eq!(engine.gesture_progress(gesture).unwrap(), 0.0);
        engine.register_touch(0, 0, true, 50, 50);
        assert_eq!(engine.gesture_progress(gesture).unwrap(), 1.0);
    }
}
