//! Ordered dispatch of touch events through gesture recognizers

use tracing::trace;

use crate::detector::DefaultGestureDetector;
use crate::event::InputEvent;
use crate::gesture::{GestureAction, GestureRecognizer};
use crate::pinch::PinchZoomRecognizer;

/// The recognizers a router can hold
#[derive(Debug, Clone)]
pub enum Recognizer {
    PinchZoom(PinchZoomRecognizer),
    Default(DefaultGestureDetector),
}

impl GestureRecognizer for Recognizer {
    fn enabled(&self) -> bool {
        match self {
            Recognizer::PinchZoom(r) => r.enabled(),
            Recognizer::Default(r) => r.enabled(),
        }
    }

    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<GestureAction>) -> bool {
        match self {
            Recognizer::PinchZoom(r) => r.handle(event, actions),
            Recognizer::Default(r) => r.handle(event, actions),
        }
    }

    fn poll(&mut self, now_ms: u64, actions: &mut Vec<GestureAction>) {
        match self {
            Recognizer::PinchZoom(r) => r.poll(now_ms, actions),
            Recognizer::Default(r) => r.poll(now_ms, actions),
        }
    }
}

/// Result of dispatching one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dispatch {
    /// Some enabled recognizer consumed the event
    pub consumed: bool,
    pub actions: Vec<GestureAction>,
}

/// Routes each event to the first enabled recognizer that consumes it
///
/// Pinch zoom is consulted before the single-pointer detector.
///
/// # Example
///
/// ```
/// use docview_input::{GestureAction, GestureRouter, InputEvent, TouchAction};
///
/// let mut router = GestureRouter::new();
/// let dispatch = router.dispatch(&InputEvent::single(TouchAction::Down, 5.0, 5.0, 0));
/// assert!(dispatch.consumed);
/// assert_eq!(dispatch.actions, vec![GestureAction::ForceFinishScroll]);
/// ```
#[derive(Debug, Clone)]
pub struct GestureRouter {
    recognizers: Vec<Recognizer>,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::with_recognizers(
            PinchZoomRecognizer::new(),
            DefaultGestureDetector::default(),
        )
    }

    pub fn with_recognizers(pinch: PinchZoomRecognizer, detector: DefaultGestureDetector) -> Self {
        Self {
            recognizers: vec![Recognizer::PinchZoom(pinch), Recognizer::Default(detector)],
        }
    }

    pub fn recognizers(&self) -> &[Recognizer] {
        &self.recognizers
    }

    pub fn pinch_zoom(&self) -> Option<&PinchZoomRecognizer> {
        self.recognizers.iter().find_map(|r| match r {
            Recognizer::PinchZoom(p) => Some(p),
            _ => None,
        })
    }

    pub fn pinch_zoom_mut(&mut self) -> Option<&mut PinchZoomRecognizer> {
        self.recognizers.iter_mut().find_map(|r| match r {
            Recognizer::PinchZoom(p) => Some(p),
            _ => None,
        })
    }

    pub fn default_detector_mut(&mut self) -> Option<&mut DefaultGestureDetector> {
        self.recognizers.iter_mut().find_map(|r| match r {
            Recognizer::Default(d) => Some(d),
            _ => None,
        })
    }

    /// Enable or disable pinch zoom; returns the commit of a pinch this ended
    #[must_use]
    pub fn set_pinch_enabled(&mut self, enabled: bool) -> Option<GestureAction> {
        self.pinch_zoom_mut()?.set_enabled(enabled)
    }

    pub fn dispatch(&mut self, event: &InputEvent) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for recognizer in self.recognizers.iter_mut().filter(|r| r.enabled()) {
            if recognizer.handle(event, &mut dispatch.actions) {
                dispatch.consumed = true;
                break;
            }
        }
        trace!(
            action = ?event.action,
            consumed = dispatch.consumed,
            outcomes = dispatch.actions.len(),
            "touch event dispatched"
        );
        dispatch
    }

    /// Collect time-driven outcomes such as confirmed single taps
    pub fn poll(&mut self, now_ms: u64) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        for recognizer in self.recognizers.iter_mut().filter(|r| r.enabled()) {
            recognizer.poll(now_ms, &mut actions);
        }
        actions
    }
}
