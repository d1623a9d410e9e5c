//! Two-finger pinch zoom

use crate::event::{InputEvent, TouchAction};
use crate::gesture::{GestureAction, GestureRecognizer};

/// Spans shorter than this are too noisy to scale against
const MIN_SPAN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PinchPhase {
    Idle,

    /// Two pointers down; scale is relative to `start_span`
    Scaling { start_span: f32, last_factor: f32 },

    /// Pinch committed; swallow the remaining pointer until it lifts
    Draining,
}

/// Recognizer for pinch-to-zoom
///
/// Emits [`GestureAction::ZoomScale`] with the ratio of the current pointer
/// span to the span at gesture start, and a single
/// [`GestureAction::ZoomCommit`] when a pointer lifts. Until every pointer has
/// lifted, events stay consumed so the leftover finger is not read as a drag.
#[derive(Debug, Clone)]
pub struct PinchZoomRecognizer {
    enabled: bool,
    phase: PinchPhase,
}

impl Default for PinchZoomRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PinchZoomRecognizer {
    pub fn new() -> Self {
        Self {
            enabled: true,
            phase: PinchPhase::Idle,
        }
    }

    /// Enable or disable the recognizer
    ///
    /// Disabling in the middle of a pinch ends it; the returned
    /// [`GestureAction::ZoomCommit`] must be applied like any other outcome.
    #[must_use]
    pub fn set_enabled(&mut self, enabled: bool) -> Option<GestureAction> {
        self.enabled = enabled;
        if enabled {
            return None;
        }
        let was_scaling = self.is_scaling();
        self.phase = PinchPhase::Idle;
        was_scaling.then_some(GestureAction::ZoomCommit)
    }

    /// Returns true while a pinch is scaling
    pub fn is_scaling(&self) -> bool {
        matches!(self.phase, PinchPhase::Scaling { .. })
    }

    /// Current scale factor, if a pinch is in progress
    pub fn factor(&self) -> Option<f32> {
        match self.phase {
            PinchPhase::Scaling { last_factor, .. } => Some(last_factor),
            _ => None,
        }
    }

    fn begin(&mut self, event: &InputEvent) -> bool {
        match event.span() {
            Some(span) if span >= MIN_SPAN => {
                self.phase = PinchPhase::Scaling {
                    start_span: span,
                    last_factor: 1.0,
                };
                true
            }
            _ => false,
        }
    }
}

impl GestureRecognizer for PinchZoomRecognizer {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<GestureAction>) -> bool {
        match (self.phase, event.action) {
            (PinchPhase::Idle, TouchAction::PointerDown) => self.begin(event),
            (PinchPhase::Idle, _) => false,

            (PinchPhase::Scaling { start_span, .. }, TouchAction::Move) => {
                if let Some(span) = event.span() {
                    let factor = span / start_span;
                    self.phase = PinchPhase::Scaling {
                        start_span,
                        last_factor: factor,
                    };
                    actions.push(GestureAction::ZoomScale { factor });
                }
                true
            }
            // A third finger does not restart the pinch
            (PinchPhase::Scaling { .. }, TouchAction::PointerDown) => true,
            (PinchPhase::Scaling { .. }, TouchAction::PointerUp) => {
                actions.push(GestureAction::ZoomCommit);
                self.phase = PinchPhase::Draining;
                true
            }
            (PinchPhase::Scaling { .. }, TouchAction::Up | TouchAction::Cancel) => {
                actions.push(GestureAction::ZoomCommit);
                self.phase = PinchPhase::Idle;
                true
            }
            // Lost the pointer-up: close the pinch and let the new touch through
            (PinchPhase::Scaling { .. }, TouchAction::Down) => {
                actions.push(GestureAction::ZoomCommit);
                self.phase = PinchPhase::Idle;
                false
            }

            (PinchPhase::Draining, TouchAction::Up | TouchAction::Cancel) => {
                self.phase = PinchPhase::Idle;
                true
            }
            (PinchPhase::Draining, TouchAction::PointerDown) => self.begin(event),
            (PinchPhase::Draining, TouchAction::Down) => {
                self.phase = PinchPhase::Idle;
                false
            }
            (PinchPhase::Draining, _) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Pointer;

    fn two(action: TouchAction, span: f32, time_ms: u64) -> InputEvent {
        InputEvent::new(
            action,
            vec![Pointer::new(0, 100.0, 100.0), Pointer::new(1, 100.0 + span, 100.0)],
            time_ms,
        )
    }

    #[test]
    fn test_pinch_scales_relative_to_start() {
        let mut pinch = PinchZoomRecognizer::new();
        let mut actions = Vec::new();

        assert!(pinch.handle(&two(TouchAction::PointerDown, 100.0, 0), &mut actions));
        assert!(pinch.is_scaling());
        assert!(pinch.handle(&two(TouchAction::Move, 150.0, 16), &mut actions));
        assert!(pinch.handle(&two(TouchAction::Move, 250.0, 32), &mut actions));

        assert_eq!(
            actions,
            vec![
                GestureAction::ZoomScale { factor: 1.5 },
                GestureAction::ZoomScale { factor: 2.5 },
            ]
        );
        assert_eq!(pinch.factor(), Some(2.5));
    }

    #[test]
    fn test_pointer_up_commits_and_drains() {
        let mut pinch = PinchZoomRecognizer::new();
        let mut actions = Vec::new();

        pinch.handle(&two(TouchAction::PointerDown, 100.0, 0), &mut actions);
        pinch.handle(&two(TouchAction::PointerUp, 120.0, 16), &mut actions);
        assert_eq!(actions, vec![GestureAction::ZoomCommit]);

        // Leftover finger is swallowed
        let leftover = InputEvent::single(TouchAction::Move, 300.0, 300.0, 32);
        assert!(pinch.handle(&leftover, &mut actions));
        let up = InputEvent::single(TouchAction::Up, 300.0, 300.0, 48);
        assert!(pinch.handle(&up, &mut actions));

        assert_eq!(actions, vec![GestureAction::ZoomCommit]);
        assert!(!pinch.is_scaling());

        // Idle again: single-finger events pass through
        let down = InputEvent::single(TouchAction::Down, 0.0, 0.0, 64);
        assert!(!pinch.handle(&down, &mut actions));
    }

    #[test]
    fn test_single_pointer_ignored() {
        let mut pinch = PinchZoomRecognizer::new();
        let mut actions = Vec::new();
        let down = InputEvent::single(TouchAction::Down, 10.0, 10.0, 0);
        let drag = InputEvent::single(TouchAction::Move, 10.0, 50.0, 16);
        assert!(!pinch.handle(&down, &mut actions));
        assert!(!pinch.handle(&drag, &mut actions));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_disable_mid_pinch_commits() {
        let mut pinch = PinchZoomRecognizer::new();
        let mut actions = Vec::new();
        pinch.handle(&two(TouchAction::PointerDown, 100.0, 0), &mut actions);
        assert_eq!(pinch.set_enabled(false), Some(GestureAction::ZoomCommit));
        assert!(!pinch.enabled());
        assert!(!pinch.is_scaling());

        // Nothing open any more
        assert_eq!(pinch.set_enabled(false), None);
        assert_eq!(pinch.set_enabled(true), None);
    }

    #[test]
    fn test_down_while_scaling_commits() {
        let mut pinch = PinchZoomRecognizer::new();
        let mut actions = Vec::new();
        pinch.handle(&two(TouchAction::PointerDown, 100.0, 0), &mut actions);
        pinch.handle(&two(TouchAction::Move, 200.0, 16), &mut actions);

        let down = InputEvent::single(TouchAction::Down, 50.0, 50.0, 40);
        assert!(!pinch.handle(&down, &mut actions));
        assert_eq!(
            actions,
            vec![
                GestureAction::ZoomScale { factor: 2.0 },
                GestureAction::ZoomCommit,
            ]
        );
        assert!(!pinch.is_scaling());
    }
}
