//! Zoom gesture state machine
//!
//! `Normal` until the first zoom delta of a gesture, `Zooming` until the
//! gesture commits. Only the commit may invalidate bitmaps, and only when the
//! zoom ended somewhere other than where the gesture started.

use docview_cache::{BitmapContext, Generation};
use tracing::debug;

/// Zoom values closer than this are treated as equal
pub const ZOOM_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ZoomPhase {
    Normal,
    Zooming { start_zoom: f32 },
}

/// Result of [`ZoomTransitionController::commit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCommit {
    /// Zoom in effect before the gesture
    pub start_zoom: f32,

    /// Zoom the gesture ended at, now the baseline
    pub zoom: f32,

    /// New generation if bitmaps were invalidated
    pub invalidated: Option<Generation>,
}

impl ZoomCommit {
    pub fn changed(&self) -> bool {
        self.invalidated.is_some()
    }
}

/// Two-state zoom transition controller
///
/// Owned by the control thread; every transition takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ZoomTransitionController {
    phase: ZoomPhase,

    /// Zoom of the last commit
    baseline: f32,
}

impl ZoomTransitionController {
    pub fn new(initial_zoom: f32) -> Self {
        Self {
            phase: ZoomPhase::Normal,
            baseline: initial_zoom,
        }
    }

    /// Enter `Zooming`, remembering `current_zoom` as the gesture start
    ///
    /// Returns `true` only for the call that starts the gesture.
    pub fn begin(&mut self, current_zoom: f32) -> bool {
        match self.phase {
            ZoomPhase::Normal => {
                self.phase = ZoomPhase::Zooming {
                    start_zoom: current_zoom,
                };
                debug!(start_zoom = current_zoom, "zoom gesture started");
                true
            }
            ZoomPhase::Zooming { .. } => false,
        }
    }

    pub fn is_zooming(&self) -> bool {
        matches!(self.phase, ZoomPhase::Zooming { .. })
    }

    /// Zoom at gesture start while zooming
    pub fn start_zoom(&self) -> Option<f32> {
        match self.phase {
            ZoomPhase::Zooming { start_zoom } => Some(start_zoom),
            ZoomPhase::Normal => None,
        }
    }

    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Force the next commit to compare against `zoom`
    ///
    /// A baseline of `0.0` makes the next commit always invalidate.
    pub fn reset_baseline(&mut self, zoom: f32) {
        self.phase = ZoomPhase::Normal;
        self.baseline = zoom;
    }

    /// Leave `Zooming` at `zoom`, bumping the generation if the zoom changed
    ///
    /// A commit without a preceding `begin` compares against the baseline.
    pub fn commit(&mut self, zoom: f32, context: &BitmapContext) -> ZoomCommit {
        let start_zoom = self.start_zoom().unwrap_or(self.baseline);
        let invalidated = ((zoom - start_zoom).abs() > ZOOM_EPSILON).then(|| context.invalidate());

        self.phase = ZoomPhase::Normal;
        self.baseline = zoom;

        debug!(
            start_zoom,
            zoom,
            invalidated = invalidated.is_some(),
            "zoom committed"
        );
        ZoomCommit {
            start_zoom,
            zoom,
            invalidated,
        }
    }
}
