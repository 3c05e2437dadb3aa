//! Configuration-time failures an [`crate::Engine`] builder method can return.

use thiserror::Error;

use crate::action::ActionId;
use crate::gesture::GestureId;
use crate::target::TargetId;

/// The closed set of configuration-time failures a builder or configurator
/// method on [`crate::Engine`] can return. Nothing in the recognition hot
/// path (`register_touch`/`register_move`/progress queries) is fallible; see
/// the crate-level docs for why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// `set_target` was called on a `Rotate`, `Pinch`, or `Delay` action.
    #[error("action {action:?} of kind {kind} cannot carry a target")]
    TargetNotApplicable {
        /// The action the call was made against.
        action: ActionId,
        /// The action kind's name, for the error message.
        kind: &'static str,
    },

    /// `set_threshold` was called on a `Move` action that already has a
    /// target, or `set_target` on a `Move` action that already has a
    /// threshold. A `Move` action may specify a threshold or a target, never
    /// both.
    #[error("action {action:?} cannot set both a threshold and a target")]
    ThresholdTargetConflict {
        /// The action the call was made against.
        action: ActionId,
    },

    /// A `Delay` action was configured with a duration that resolves to zero
    /// or less.
    #[error("delay duration must be greater than zero, got {duration_ms}")]
    NonPositiveDelayDuration {
        /// The rejected duration.
        duration_ms: u32,
    },

    /// The gesture handle does not belong to this engine.
    #[error("gesture {0:?} does not belong to this engine")]
    UnknownGesture(GestureId),

    /// The action handle does not belong to this engine, or indexes past the
    /// end of its gesture's action list.
    #[error("action {0:?} does not belong to this engine")]
    UnknownAction(ActionId),

    /// The target handle does not belong to this engine.
    #[error("target {0:?} does not belong to this engine")]
    UnknownTarget(TargetId),
}
