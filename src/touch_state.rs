//! Live per-slot finger positions and the aggregate geometry derived from them.

use std::collections::HashMap;

/// A single tracked contact point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSlot {
    /// The device-reported slot identifier for this finger.
    pub slot_id: i32,
    /// Whether the finger is currently pressed.
    pub pressed: bool,
    /// Current X position, in device pixels.
    pub x: i32,
    /// Current Y position, in device pixels.
    pub y: i32,
    /// Timestamp of the most recent Down event for this slot.
    pub first_down_ts: u32,
    /// Timestamp of the most recent event touching this slot.
    pub last_event_ts: u32,
}

/// Aggregate geometry of the touch group, derived from all currently pressed
/// slots. Center is the arithmetic mean position; mean radius is the mean
/// Euclidean distance from each pressed slot to the center; mean angle is
/// the circular mean of each pressed slot's angle relative to the center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geometry {
    /// Mean X position of pressed slots.
    pub center_x: f64,
    /// Mean Y position of pressed slots.
    pub center_y: f64,
    /// Mean distance from each pressed slot to the center.
    pub mean_radius: f64,
    /// Circular mean angle, in radians, of pressed slots relative to the center.
    pub mean_angle: f64,
    /// Number of currently pressed slots.
    pub count_pressed: usize,
    /// Mean per-slot angular change relative to center since the previous
    /// event, in degrees, positive sweeping clockwise in screen space
    /// (Y increasing downward). Only slots pressed both before and after the
    /// event contribute; 0 when fewer than two such slots exist, since a
    /// single point has no angle relative to a center it also defines.
    pub rotation_delta_deg: f64,
}

/// Live per-slot touch state plus the geometry derived from it. Recomputed
/// after every input event.
#[derive(Debug, Clone, Default)]
pub struct TouchState {
    slots: HashMap<i32, TouchSlot>,
    geometry: Geometry,
    last_change_ts: u32,
}

fn normalize_angle(mut a: f64) -> f64 {
    while a > std::f64::consts::PI {
        a -= 2.0 * std::f64::consts::PI;
    }
    while a <= -std::f64::consts::PI {
        a += 2.0 * std::f64::consts::PI;
    }
    a
}

impl TouchState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The current derived aggregate geometry.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Timestamp of the most recent event that changed any slot.
    pub fn last_change_ts(&self) -> u32 {
        self.last_change_ts
    }

    pub(crate) fn is_pressed(&self, slot: i32) -> bool {
        self.slots.get(&slot).is_some_and(|s| s.pressed)
    }

    pub(crate) fn contains_slot(&self, slot: i32) -> bool {
        self.slots.contains_key(&slot)
    }

    pub(crate) fn register_touch(&mut self, ts: u32, slot: i32, down: bool, x: i32, y: i32) {
        let before: Vec<(i32, i32, i32)> = self.pressed_positions();
        if down {
            let entry = self.slots.entry(slot).or_insert(TouchSlot {
                slot_id: slot,
                pressed: false,
                x,
                y,
                first_down_ts: ts,
                last_event_ts: ts,
            });
            entry.pressed = true;
            entry.x = x;
            entry.y = y;
            entry.first_down_ts = ts;
            entry.last_event_ts = ts;
        } else if let Some(s) = self.slots.get_mut(&slot) {
            s.pressed = false;
            s.x = x;
            s.y = y;
            s.last_event_ts = ts;
        }
        self.last_change_ts = ts;
        self.recompute_geometry(&before);
    }

    pub(crate) fn register_move(&mut self, ts: u32, slot: i32, dx: i32, dy: i32) {
        let before: Vec<(i32, i32, i32)> = self.pressed_positions();
        let entry = self.slots.entry(slot).or_insert(TouchSlot {
            slot_id: slot,
            pressed: true,
            x: 0,
            y: 0,
            first_down_ts: ts,
            last_event_ts: ts,
        });
        entry.pressed = true;
        entry.x += dx;
        entry.y += dy;
        entry.last_event_ts = ts;
        self.last_change_ts = ts;
        self.recompute_geometry(&before);
    }

    /// Drop slots marked released. Called once per event dispatch, after
    /// runtimes have observed the release.
    pub(crate) fn prune_released(&mut self) {
        self.slots.retain(|_, s| s.pressed);
    }

    fn pressed_positions(&self) -> Vec<(i32, i32, i32)> {
        self.slots.values().filter(|s| s.pressed).map(|s| (s.slot_id, s.x, s.y)).collect()
    }

    fn recompute_geometry(&mut self, before: &[(i32, i32, i32)]) {
        let pressed: Vec<&TouchSlot> = self.slots.values().filter(|s| s.pressed).collect();
        let n = pressed.len();
        if n == 0 {
            self.geometry = Geometry::default();
            return;
        }
        let (sum_x, sum_y) = pressed
            .iter()
            .fold((0.0, 0.0), |(ax, ay), s| (ax + s.x as f64, ay + s.y as f64));
        let center_x = sum_x / n as f64;
        let center_y = sum_y / n as f64;

        let mut sum_r = 0.0;
        let mut sum_sin = 0.0;
        let mut sum_cos = 0.0;
        for s in &pressed {
            let dx = s.x as f64 - center_x;
            let dy = s.y as f64 - center_y;
            sum_r += (dx * dx + dy * dy).sqrt();
            let angle = dy.atan2(dx);
            sum_sin += angle.sin();
            sum_cos += angle.cos();
        }

        let before_center = if !before.is_empty() {
            let (bx, by) = before.iter().fold((0.0, 0.0), |(ax, ay), &(_, x, y)| (ax + x as f64, ay + y as f64));
            (bx / before.len() as f64, by / before.len() as f64)
        } else {
            (0.0, 0.0)
        };
        let mut delta_sum = 0.0;
        let mut delta_count = 0;
        if !before.is_empty() {
            for s in &pressed {
                if let Some(&(_, bx, by)) = before.iter().find(|&&(id, _, _)| id == s.slot_id) {
                    let prev_angle = (by as f64 - before_center.1).atan2(bx as f64 - before_center.0);
                    let new_angle = (s.y as f64 - center_y).atan2(s.x as f64 - center_x);
                    delta_sum += normalize_angle(new_angle - prev_angle);
                    delta_count += 1;
                }
            }
        }
        let rotation_delta_deg = if delta_count >= 2 { (delta_sum / delta_count as f64).to_degrees() } else { 0.0 };

        self.geometry = Geometry {
            center_x,
            center_y,
            mean_radius: sum_r / n as f64,
            mean_angle: sum_sin.atan2(sum_cos),
            count_pressed: n,
            rotation_delta_deg,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_undefined_with_no_pressed_slots() {
        let state = TouchState::new();
        assert_eq!(state.geometry().count_pressed, 0);
    }

    #[test]
    fn center_is_arithmetic_mean() {
        let mut state = TouchState::new();
        state.register_touch(0, 0, true, 100, 100);
        state.register_touch(1, 1, true, 200, 100);
        let g = state.geometry();
        assert_eq!(g.count_pressed, 2);
        assert!((g.center_x - 150.0).abs() < 1e-9);
        assert!((g.center_y - 100.0).abs() < 1e-9);
        assert!((g.mean_radius - 50.0).abs() < 1e-9);
    }

    #[test]
    fn release_is_retained_until_pruned() {
        let mut state = TouchState::new();
        state.register_touch(0, 0, true, 0, 0);
        state.register_touch(1, 0, false, 0, 0);
        assert!(state.contains_slot(0));
        assert_eq!(state.geometry().count_pressed, 0);
        state.prune_released();
        assert!(!state.contains_slot(0));
    }

    #[test]
    fn unknown_slot_move_creates_pressed_slot_at_delta() {
        let mut state = TouchState::new();
        state.register_move(5, 7, 10, -3);
        assert!(state.is_pressed(7));
        let g = state.geometry();
        assert_eq!(g.center_x, 10.0);
        assert_eq!(g.center_y, -3.0);
    }

    #[test]
    fn two_finger_rotation_is_detected_despite_antipodal_mean_angle() {
        let mut state = TouchState::new();
        state.register_touch(0, 0, true, 100, 0);
        state.register_touch(1, 1, true, -100, 0);
        // mean_angle is degenerate (antipodal slots cancel); rotation must
        // not depend on it.
        assert_eq!(state.geometry().mean_angle, 0.0);

        // Rotate both points 10 degrees clockwise (screen space, Y down)
        // about the shared center (0,0).
        let theta = 10f64.to_radians();
        let (c, s) = (theta.cos(), theta.sin());
        let rotate = |x: f64, y: f64| (x * c - y * s, x * s + y * c);
        let (nx0, ny0) = rotate(100.0, 0.0);
        let (nx1, ny1) = rotate(-100.0, 0.0);
        state.register_move(10, 0, (nx0.round() as i32) - 100, ny0.round() as i32);
        state.register_move(10, 1, (nx1.round() as i32) - (-100), ny1.round() as i32);

        let delta = state.geometry().rotation_delta_deg;
        assert!(delta.abs() > 1.0, "expected a detectable rotation delta, got {delta}");
    }
}
