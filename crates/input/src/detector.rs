//! Single-pointer gestures: drag, fling, tap and double tap
//!
//! Drag and fling outcomes use viewport direction: a finger moving up
//! produces a positive `dy`, scrolling further into the document. Both are
//! axis-locked before they are emitted.
//!
//! A tap is not reported as [`GestureAction::SingleTap`] until the double-tap
//! window has passed without a second tap. Confirmation happens either in
//! [`GestureRecognizer::poll`] or on the next `Down` after the window closed.

use std::collections::VecDeque;

use crate::event::{InputEvent, TouchAction};
use crate::gesture::{axis_lock, GestureAction, GestureRecognizer, DOUBLE_TAP_TIME_MS};

/// Distance a finger must travel before a touch becomes a drag
pub const DEFAULT_TOUCH_SLOP: f32 = 8.0;

/// Maximum distance between two taps of a double tap
pub const DEFAULT_DOUBLE_TAP_SLOP: f32 = 100.0;

/// Release speed (pixels per second) below which a drag ends without a fling
pub const DEFAULT_MIN_FLING_VELOCITY: f32 = 50.0;

/// Samples older than this are ignored when estimating release velocity
const VELOCITY_WINDOW_MS: u64 = 100;

/// Tuning for [`DefaultGestureDetector`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    pub touch_slop: f32,
    pub double_tap_slop: f32,
    pub double_tap_time_ms: u64,
    pub min_fling_velocity: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            touch_slop: DEFAULT_TOUCH_SLOP,
            double_tap_slop: DEFAULT_DOUBLE_TAP_SLOP,
            double_tap_time_ms: DOUBLE_TAP_TIME_MS,
            min_fling_velocity: DEFAULT_MIN_FLING_VELOCITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f32,
    y: f32,
    time_ms: u64,
}

/// State of the pointer currently down
#[derive(Debug, Clone)]
struct Touch {
    down: Sample,
    last: Sample,

    /// Passed the touch slop
    dragging: bool,

    /// A second pointer joined; the touch can no longer be a tap
    multi: bool,

    /// This touch is the second tap of a double tap
    second_tap: bool,

    samples: VecDeque<Sample>,
}

/// Recognizer for single-pointer gestures
#[derive(Debug, Clone)]
pub struct DefaultGestureDetector {
    config: DetectorConfig,
    enabled: bool,
    touch: Option<Touch>,

    /// Tap waiting for the double-tap window to close
    pending_tap: Option<Sample>,
}

impl Default for DefaultGestureDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl DefaultGestureDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            enabled: true,
            touch: None,
            pending_tap: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.touch = None;
            self.pending_tap = None;
        }
    }

    /// Returns true while a drag is in progress
    pub fn is_dragging(&self) -> bool {
        self.touch.as_ref().is_some_and(|t| t.dragging)
    }

    /// Returns true if a tap is waiting for confirmation
    pub fn has_pending_tap(&self) -> bool {
        self.pending_tap.is_some()
    }

    fn on_down(&mut self, sample: Sample, actions: &mut Vec<GestureAction>) {
        actions.push(GestureAction::ForceFinishScroll);

        let mut second_tap = false;
        if let Some(pending) = self.pending_tap {
            let in_time =
                sample.time_ms.saturating_sub(pending.time_ms) <= self.config.double_tap_time_ms;
            if in_time && distance(&pending, &sample) <= self.config.double_tap_slop {
                second_tap = true;
            } else {
                actions.push(GestureAction::SingleTap {
                    x: pending.x,
                    y: pending.y,
                });
                self.pending_tap = None;
            }
        }

        let mut samples = VecDeque::new();
        samples.push_back(sample);
        self.touch = Some(Touch {
            down: sample,
            last: sample,
            dragging: false,
            multi: false,
            second_tap,
            samples,
        });
    }

    fn on_move(&mut self, sample: Sample, actions: &mut Vec<GestureAction>) -> bool {
        let slop = self.config.touch_slop;
        let Some(touch) = self.touch.as_mut() else {
            return false;
        };

        touch.samples.push_back(sample);
        while touch
            .samples
            .front()
            .is_some_and(|s| sample.time_ms.saturating_sub(s.time_ms) > VELOCITY_WINDOW_MS)
        {
            touch.samples.pop_front();
        }

        if !touch.dragging {
            if distance(&touch.down, &sample) <= slop {
                return true;
            }
            touch.dragging = true;
            touch.second_tap = false;
            self.pending_tap = None;
        }

        let (dx, dy) = axis_lock(touch.last.x - sample.x, touch.last.y - sample.y);
        touch.last = sample;
        if dx != 0.0 || dy != 0.0 {
            actions.push(GestureAction::Scroll { dx, dy });
        }
        true
    }

    fn on_up(&mut self, sample: Sample, actions: &mut Vec<GestureAction>) -> bool {
        let Some(touch) = self.touch.take() else {
            return false;
        };

        if touch.dragging {
            let (vx, vy) = release_velocity(&touch.samples, sample);
            let (vx, vy) = axis_lock(vx, vy);
            let min = self.config.min_fling_velocity;
            if vx.abs() >= min || vy.abs() >= min {
                actions.push(GestureAction::Fling { vx, vy });
            }
        } else if touch.multi {
            self.pending_tap = None;
        } else if touch.second_tap {
            self.pending_tap = None;
            actions.push(GestureAction::DoubleTap {
                x: touch.down.x,
                y: touch.down.y,
            });
        } else {
            self.pending_tap = Some(touch.down);
        }
        true
    }
}

impl GestureRecognizer for DefaultGestureDetector {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn handle(&mut self, event: &InputEvent, actions: &mut Vec<GestureAction>) -> bool {
        let Some((x, y)) = event.position() else {
            return false;
        };
        let sample = Sample {
            x,
            y,
            time_ms: event.time_ms,
        };

        match event.action {
            TouchAction::Down => {
                self.on_down(sample, actions);
                true
            }
            TouchAction::Move => self.on_move(sample, actions),
            TouchAction::Up => self.on_up(sample, actions),
            TouchAction::Cancel => {
                self.touch = None;
                self.pending_tap = None;
                true
            }
            TouchAction::PointerDown | TouchAction::PointerUp => match self.touch.as_mut() {
                Some(touch) => {
                    touch.multi = true;
                    touch.second_tap = false;
                    true
                }
                None => false,
            },
        }
    }

    fn poll(&mut self, now_ms: u64, actions: &mut Vec<GestureAction>) {
        // A second touch is in progress; its Up decides
        if self.touch.is_some() {
            return;
        }
        if let Some(pending) = self.pending_tap {
            if now_ms.saturating_sub(pending.time_ms) > self.config.double_tap_time_ms {
                self.pending_tap = None;
                actions.push(GestureAction::SingleTap {
                    x: pending.x,
                    y: pending.y,
                });
            }
        }
    }
}

fn distance(a: &Sample, b: &Sample) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Viewport velocity at release, pixels per second
fn release_velocity(samples: &VecDeque<Sample>, release: Sample) -> (f32, f32) {
    let Some(oldest) = samples
        .iter()
        .find(|s| release.time_ms.saturating_sub(s.time_ms) <= VELOCITY_WINDOW_MS)
    else {
        return (0.0, 0.0);
    };

    let elapsed_ms = release.time_ms.saturating_sub(oldest.time_ms);
    if elapsed_ms == 0 {
        return (0.0, 0.0);
    }
    let seconds = elapsed_ms as f32 / 1000.0;
    ((oldest.x - release.x) / seconds, (oldest.y - release.y) / seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: TouchAction, x: f32, y: f32, time_ms: u64) -> InputEvent {
        InputEvent::single(action, x, y, time_ms)
    }

    fn feed(detector: &mut DefaultGestureDetector, events: &[InputEvent]) -> Vec<GestureAction> {
        let mut actions = Vec::new();
        for e in events {
            detector.handle(e, &mut actions);
        }
        actions
    }

    #[test]
    fn test_down_finishes_scroll() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(&mut detector, &[event(TouchAction::Down, 10.0, 10.0, 0)]);
        assert_eq!(actions, vec![GestureAction::ForceFinishScroll]);
    }

    #[test]
    fn test_drag_emits_scroll_after_slop() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 100.0, 100.0, 0),
                event(TouchAction::Move, 100.0, 97.0, 10),
                event(TouchAction::Move, 100.0, 80.0, 20),
                event(TouchAction::Move, 100.0, 70.0, 30),
            ],
        );

        assert_eq!(
            actions,
            vec![
                GestureAction::ForceFinishScroll,
                GestureAction::Scroll { dx: 0.0, dy: 20.0 },
                GestureAction::Scroll { dx: 0.0, dy: 10.0 },
            ]
        );
        assert!(detector.is_dragging());
    }

    #[test]
    fn test_drag_is_axis_locked() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 100.0, 100.0, 0),
                event(TouchAction::Move, 103.0, 70.0, 10),
            ],
        );
        assert_eq!(actions[1], GestureAction::Scroll { dx: 0.0, dy: 30.0 });
    }

    #[test]
    fn test_fast_release_flings() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 100.0, 300.0, 0),
                event(TouchAction::Move, 100.0, 250.0, 20),
                event(TouchAction::Move, 100.0, 200.0, 40),
                event(TouchAction::Up, 100.0, 150.0, 60),
            ],
        );

        match actions.last() {
            Some(GestureAction::Fling { vx, vy }) => {
                assert_eq!(*vx, 0.0);
                assert!(*vy > 2000.0);
            }
            other => panic!("expected fling, got {other:?}"),
        }
    }

    #[test]
    fn test_slow_release_does_not_fling() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 100.0, 100.0, 0),
                event(TouchAction::Move, 100.0, 80.0, 50),
                event(TouchAction::Up, 100.0, 80.0, 400),
            ],
        );
        assert!(!actions
            .iter()
            .any(|a| matches!(a, GestureAction::Fling { .. })));
    }

    #[test]
    fn test_single_tap_confirmed_by_poll() {
        let mut detector = DefaultGestureDetector::default();
        let mut actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 50.0, 60.0, 0),
                event(TouchAction::Up, 50.0, 60.0, 80),
            ],
        );
        assert!(detector.has_pending_tap());

        detector.poll(300, &mut actions);
        assert!(detector.has_pending_tap());

        detector.poll(501, &mut actions);
        assert_eq!(
            actions.last(),
            Some(&GestureAction::SingleTap { x: 50.0, y: 60.0 })
        );
        assert!(!detector.has_pending_tap());
    }

    #[test]
    fn test_single_tap_confirmed_by_late_down() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 50.0, 60.0, 0),
                event(TouchAction::Up, 50.0, 60.0, 80),
                event(TouchAction::Down, 50.0, 60.0, 900),
            ],
        );
        assert!(actions.contains(&GestureAction::SingleTap { x: 50.0, y: 60.0 }));
    }

    #[test]
    fn test_double_tap() {
        let mut detector = DefaultGestureDetector::default();
        let mut actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 50.0, 60.0, 0),
                event(TouchAction::Up, 50.0, 60.0, 80),
                event(TouchAction::Down, 55.0, 62.0, 200),
                event(TouchAction::Up, 55.0, 62.0, 260),
            ],
        );

        assert_eq!(
            actions.last(),
            Some(&GestureAction::DoubleTap { x: 55.0, y: 62.0 })
        );

        detector.poll(2_000, &mut actions);
        assert!(!actions
            .iter()
            .any(|a| matches!(a, GestureAction::SingleTap { .. })));
    }

    #[test]
    fn test_far_second_tap_is_not_double() {
        let mut detector = DefaultGestureDetector::default();
        let actions = feed(
            &mut detector,
            &[
                event(TouchAction::Down, 50.0, 60.0, 0),
                event(TouchAction::Up, 50.0, 60.0, 80),
                event(TouchAction::Down, 400.0, 600.0, 200),
                event(TouchAction::Up, 400.0, 600.0, 260),
            ],
        );
        assert!(!actions
            .iter()
            .any(|a| matches!(a, GestureAction::DoubleTap { .. })));
    }

    #[test]
    fn test_move_without_down_not_consumed() {
        let mut detector = DefaultGestureDetector::default();
        let mut actions = Vec::new();
        assert!(!detector.handle(&event(TouchAction::Move, 1.0, 1.0, 0), &mut actions));
        assert!(actions.is_empty());
    }

    #[test]
    fn test_disable_drops_pending_tap() {
        let mut detector = DefaultGestureDetector::default();
        feed(
            &mut detector,
            &[
                event(TouchAction::Down, 50.0, 60.0, 0),
                event(TouchAction::Up, 50.0, 60.0, 80),
            ],
        );
        detector.set_enabled(false);
        assert!(!detector.enabled());
        assert!(!detector.has_pending_tap());
    }
}
