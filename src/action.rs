//! Declarative description of one primitive step in a gesture.

use crate::error::EngineError;
use crate::gesture::GestureId;
use crate::mask::{MoveMask, PinchMask, RotateMask, TouchMask};
use crate::target::TargetId;

/// Non-owning handle to an [`Action`] owned by an [`crate::Engine`]. Valid
/// only for the engine that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId {
    pub(crate) gesture: GestureId,
    pub(crate) index: usize,
}

impl ActionId {
    /// The gesture this action belongs to.
    pub fn gesture(&self) -> GestureId {
        self.gesture
    }

    /// The action's position within its gesture's declaration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// The closed set of primitive action kinds. A tagged variant representation
/// is used rather than dynamic dispatch, since the set of kinds is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// A change in the number of pressed fingers matching `mode_mask`,
    /// optionally constrained to occur within `target`.
    Touch {
        /// Which finger-state changes this action matches.
        mode_mask: TouchMask,
        /// Optional spatial precondition on the changing finger's position.
        target: Option<TargetId>,
    },
    /// Displacement of the touch group's center. Carries either a threshold
    /// (accumulated pixel displacement) or a target (binary entry), never
    /// both.
    Move {
        /// Which displacement directions accumulate toward the threshold.
        dir_mask: MoveMask,
        /// Optional binary-entry precondition; mutually exclusive with a
        /// nonzero threshold.
        target: Option<TargetId>,
    },
    /// Rotation of the touch group about its center, in degrees.
    Rotate {
        /// Which rotation directions accumulate toward the threshold.
        dir_mask: RotateMask,
    },
    /// Change in the touch group's mean radius (spread).
    Pinch {
        /// Which spread directions accumulate toward the threshold.
        dir_mask: PinchMask,
    },
    /// No disruptive change for `duration_ms`.
    Delay {
        /// How long the action must observe no disruptive change for.
        duration_ms: u32,
    },
}

impl ActionKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ActionKind::Touch { .. } => "touch",
            ActionKind::Move { .. } => "move",
            ActionKind::Rotate { .. } => "rotate",
            ActionKind::Pinch { .. } => "pinch",
            ActionKind::Delay { .. } => "delay",
        }
    }
}

/// One primitive step in a gesture's declarative sequence, plus its match
/// parameters. Deeply immutable once the engine is done configuring it;
/// evaluation state lives in `GestureRuntime`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub(crate) kind: ActionKind,
    pub(crate) threshold: i32,
    pub(crate) threshold_explicit: bool,
    pub(crate) min_duration_ms: u32,
    pub(crate) move_tolerance: Option<i32>,
}

impl Action {
    pub(crate) fn new(kind: ActionKind) -> Self {
        let threshold = match kind {
            ActionKind::Delay { duration_ms } => duration_ms as i32,
            _ => 0,
        };
        Self { kind, threshold, threshold_explicit: false, min_duration_ms: 0, move_tolerance: None }
    }

    /// This action's kind and match parameters.
    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The configured threshold. Units depend on kind: touch-point changes,
    /// pixels, degrees, pixels, or milliseconds.
    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Minimum elapsed time, since this action became current, before it may
    /// complete even if its threshold was already reached.
    pub fn min_duration_ms(&self) -> u32 {
        self.min_duration_ms
    }

    /// This action's own move-tolerance override, if any.
    pub fn move_tolerance_override(&self) -> Option<i32> {
        self.move_tolerance
    }

    pub(crate) fn set_threshold(&mut self, threshold: i32, id: ActionId) -> Result<(), EngineError> {
        match &self.kind {
            ActionKind::Move { target: Some(_), .. } => Err(EngineError::ThresholdTargetConflict { action: id }),
            ActionKind::Delay { .. } => {
                if threshold <= 0 {
                    Err(EngineError::NonPositiveDelayDuration { duration_ms: threshold.max(0) as u32 })
                } else {
                    self.threshold = threshold;
                    self.threshold_explicit = true;
                    Ok(())
                }
            }
            _ => {
                self.threshold = threshold;
                self.threshold_explicit = true;
                Ok(())
            }
        }
    }

    pub(crate) fn set_target(&mut self, target: TargetId, id: ActionId) -> Result<(), EngineError> {
        match &mut self.kind {
            ActionKind::Touch { target: t, .. } => {
                *t = Some(target);
                Ok(())
            }
            ActionKind::Move { target: t, .. } => {
                if self.threshold_explicit {
                    return Err(EngineError::ThresholdTargetConflict { action: id });
                }
                *t = Some(target);
                self.threshold = 0;
                Ok(())
            }
            ActionKind::Rotate { .. } | ActionKind::Pinch { .. } | ActionKind::Delay { .. } => {
                Err(EngineError::TargetNotApplicable { action: id, kind: self.kind.name() })
            }
        }
    }

    pub(crate) fn set_duration(&mut self, duration_ms: u32) {
        self.min_duration_ms = duration_ms;
    }

    pub(crate) fn set_move_tolerance(&mut self, tolerance: i32) {
        self.move_tolerance = Some(tolerance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::GestureId;

    fn id(index: usize) -> ActionId {
        ActionId { gesture: GestureId(0), index }
    }

    #[test]
    fn delay_defaults_threshold_to_duration() {
        let a = Action::new(ActionKind::Delay { duration_ms: 500 });
        assert_eq!(a.threshold(), 500);
    }

    #[test]
    fn move_rejects_target_after_threshold() {
        let mut a = Action::new(ActionKind::Move { dir_mask: MoveMask::POSITIVE_X, target: None });
        a.set_threshold(100, id(0)).unwrap();
        assert_eq!(a.set_target(TargetId(0), id(0)), Err(EngineError::ThresholdTargetConflict { action: id(0) }));
    }

    #[test]
    fn move_rejects_threshold_after_target() {
        let mut a = Action::new(ActionKind::Move { dir_mask: MoveMask::POSITIVE_X, target: None });
        a.set_target(TargetId(0), id(0)).unwrap();
        assert_eq!(a.set_threshold(100, id(0)), Err(EngineError::ThresholdTargetConflict { action: id(0) }));
    }

    #[test]
    fn rotate_rejects_target() {
        let mut a = Action::new(ActionKind::Rotate { dir_mask: RotateMask::CW });
        assert!(matches!(a.set_target(TargetId(0), id(0)), Err(EngineError::TargetNotApplicable { .. })));
    }

    #[test]
    fn nonpositive_delay_duration_rejected() {
        let mut a = Action::new(ActionKind::Delay { duration_ms: 500 });
        assert_eq!(
            a.set_threshold(0, id(0)),
            Err(EngineError::NonPositiveDelayDuration { duration_ms: 0 })
        );
    }
}
