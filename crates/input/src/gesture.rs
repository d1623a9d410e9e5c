//! Gesture outcomes and the recognizer interface

use crate::event::InputEvent;

/// Components below this fraction of the other axis are dropped
pub const AXIS_LOCK_RATIO: f32 = 0.5;

/// Double-tap window in milliseconds
pub const DOUBLE_TAP_TIME_MS: u64 = 500;

/// Outcome of a recognized gesture, applied by the viewport controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Finger touched down; stop any fling in progress
    ForceFinishScroll,

    /// Drag; scroll content by the given distance
    Scroll { dx: f32, dy: f32 },

    /// Finger released with velocity (pixels per second)
    Fling { vx: f32, vy: f32 },

    /// Two taps within the double-tap window
    DoubleTap { x: f32, y: f32 },

    /// A tap that was not followed by a second one
    SingleTap { x: f32, y: f32 },

    /// Pinch in progress; zoom relative to the value at gesture start
    ZoomScale { factor: f32 },

    /// Pinch finished
    ZoomCommit,
}

/// Snap near-axis motion onto the axis
///
/// A component whose magnitude is under half of the other one is zeroed, so
/// near-vertical drags do not leak a sideways component and vice versa.
pub fn axis_lock(x: f32, y: f32) -> (f32, f32) {
    let locked_x = if x.abs() < AXIS_LOCK_RATIO * y.abs() { 0.0 } else { x };
    let locked_y = if y.abs() < AXIS_LOCK_RATIO * x.abs() { 0.0 } else { y };
    (locked_x, locked_y)
}

/// A pluggable gesture recognizer
pub trait GestureRecognizer {
    /// Disabled recognizers are skipped during dispatch
    fn enabled(&self) -> bool;

    /// Process one event, appending recognized outcomes
    ///
    /// Returns `true` if the event was consumed; later recognizers do not see it.
    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<GestureAction>) -> bool;

    /// Emit outcomes that only become certain with the passage of time
    fn poll(&mut self, _now_ms: u64, _actions: &mut Vec<GestureAction>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_lock_vertical_drag() {
        assert_eq!(axis_lock(3.0, 20.0), (0.0, 20.0));
        assert_eq!(axis_lock(-3.0, -20.0), (0.0, -20.0));
    }

    #[test]
    fn test_axis_lock_horizontal_drag() {
        assert_eq!(axis_lock(20.0, 3.0), (20.0, 0.0));
    }

    #[test]
    fn test_axis_lock_keeps_diagonal() {
        assert_eq!(axis_lock(10.0, 12.0), (10.0, 12.0));
    }

    #[test]
    fn test_axis_lock_pure_axis() {
        assert_eq!(axis_lock(0.0, 7.0), (0.0, 7.0));
        assert_eq!(axis_lock(7.0, 0.0), (7.0, 0.0));
        assert_eq!(axis_lock(0.0, 0.0), (0.0, 0.0));
    }
}
