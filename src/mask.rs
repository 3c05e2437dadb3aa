//! Bitmask types for the directions and finger-state changes an action may match.
//!
//! These replace the raw `uint32_t` mode/direction parameters of the C engine
//! this crate reimplements; `bitflags` gives the same bit-packed representation
//! with a checked, typed API.

// bitflags expands each struct into a pile of std-trait-impl and accessor
// methods (`contains`, `bits`, `from_bits`, ...) that don't carry their own
// doc comments; missing_docs would otherwise flag every one of them.
#![allow(missing_docs)]

use bitflags::bitflags;

bitflags! {
    /// Finger-state changes a `Touch` action matches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TouchMask: u8 {
        /// A finger was lifted from the device.
        const UP = 1 << 0;
        /// A finger was pressed against the device.
        const DOWN = 1 << 1;
    }
}

bitflags! {
    /// Directions a `Move` action's center displacement is allowed to accumulate in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct MoveMask: u8 {
        /// Rightward motion.
        const POSITIVE_X = 1 << 0;
        /// Downward motion.
        const POSITIVE_Y = 1 << 1;
        /// Leftward motion.
        const NEGATIVE_X = 1 << 2;
        /// Upward motion.
        const NEGATIVE_Y = 1 << 3;
    }
}

bitflags! {
    /// Directions of rotation a `Rotate` action accumulates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RotateMask: u8 {
        /// Clockwise rotation.
        const CW = 1 << 0;
        /// Counter-clockwise rotation.
        const CCW = 1 << 1;
    }
}

bitflags! {
    /// Directions of spread change a `Pinch` action accumulates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PinchMask: u8 {
        /// Touch group contracting.
        const IN = 1 << 0;
        /// Touch group expanding.
        const OUT = 1 << 1;
    }
}
