//! Document Viewer Input Library
//!
//! Touch gesture recognition for the viewport: drags, flings, taps, double
//! taps and pinch zoom, plus a throttle that coalesces high-rate move events.
//!
//! Recognizers translate raw [`InputEvent`]s into [`GestureAction`]s. They do
//! not touch the viewport themselves; the controller applies the outcomes.

mod detector;
mod event;
mod gesture;
mod pinch;
mod router;
mod throttle;

// Re-export public API
pub use detector::{
    DefaultGestureDetector, DetectorConfig, DEFAULT_DOUBLE_TAP_SLOP, DEFAULT_MIN_FLING_VELOCITY,
    DEFAULT_TOUCH_SLOP,
};
pub use event::{InputEvent, KeyAction, KeyCode, KeyEvent, Pointer, TouchAction};
pub use gesture::{axis_lock, GestureAction, GestureRecognizer, AXIS_LOCK_RATIO, DOUBLE_TAP_TIME_MS};
pub use pinch::PinchZoomRecognizer;
pub use router::{Dispatch, GestureRouter, Recognizer};
pub use throttle::{InputThrottle, INPUT_INTERVAL_60HZ};
