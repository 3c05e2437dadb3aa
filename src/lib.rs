//! `libtouch-rs` is a declarative multi-touch gesture recognition engine.
//!
//! Gestures are described as ordered sequences of primitive [`Action`]s —
//! `Touch`, `Move`, `Rotate`, `Pinch`, `Delay` — each with a threshold,
//! optional target region, and optional minimum duration. An [`Engine`] owns
//! any number of [`Gesture`]s and [`Target`]s, consumes a stream of touch
//! events through [`Engine::register_touch`]/[`Engine::register_move`], and
//! tracks each gesture's progress through its action sequence independently.
//!
//! No action is taken on recognition beyond queuing the gesture's id for
//! [`Engine::handle_finished_gesture`]; dispatching to application behavior is
//! left entirely to the host.
#![warn(missing_docs)]
#![warn(clippy::all)]

mod action;
mod engine;
mod error;
mod gesture;
mod mask;
mod runtime;
mod target;
mod touch_state;

#[cfg(feature = "serde")]
mod spec;

pub use action::{Action, ActionId, ActionKind};
pub use engine::Engine;
pub use error::EngineError;
pub use gesture::{Gesture, GestureId};
pub use mask::{MoveMask, PinchMask, RotateMask, TouchMask};
pub use target::{Target, TargetId};
pub use touch_state::{Geometry, TouchState};

#[cfg(feature = "serde")]
pub use spec::{ActionSpec, GestureSpec};
