//! Rendering surface interface

use docview_scheduler::{ViewRect, ViewState};

/// Scroll range a fling may travel within, in view coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollLimits {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl ScrollLimits {
    /// Limits for scrolling `content` through a viewport of
    /// `view_width` x `view_height`
    pub fn for_content(content: ViewRect, view_width: f32, view_height: f32) -> Self {
        Self {
            min_x: content.x,
            max_x: content.x + (content.width - view_width).max(0.0),
            min_y: content.y,
            max_y: content.y + (content.height - view_height).max(0.0),
        }
    }
}

/// The on-screen view the controller drives
///
/// The surface owns the scroll position. [`RenderSurface::viewport`] reports it
/// as a rectangle in view coordinates at the current zoom.
pub trait RenderSurface {
    /// Visible rectangle: scroll offset and viewport size
    fn viewport(&self) -> ViewRect;

    /// Draw the given state
    fn redraw(&mut self, view: &ViewState);

    /// Content size changed; re-clamp the scroll position
    fn invalidate_scroll(&mut self);

    /// Zoom changed; rescale the scroll position to keep the focus in place
    fn invalidate_scroll_for_zoom(&mut self, new_zoom: f32, old_zoom: f32);

    fn scroll_by(&mut self, dx: f32, dy: f32);

    fn scroll_to(&mut self, x: f32, y: f32);

    /// Start inertial scrolling
    fn start_fling(&mut self, vx: f32, vy: f32, limits: ScrollLimits);

    /// Stop inertial scrolling immediately
    fn force_finish_scroll(&mut self);

    fn toggle_zoom_controls(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_for_tall_content() {
        let limits = ScrollLimits::for_content(ViewRect::new(0.0, 0.0, 800.0, 5000.0), 800.0, 600.0);
        assert_eq!(limits.max_x, 0.0);
        assert_eq!(limits.max_y, 4400.0);
    }

    #[test]
    fn test_limits_for_small_content() {
        let limits = ScrollLimits::for_content(ViewRect::new(0.0, 0.0, 400.0, 300.0), 800.0, 600.0);
        assert_eq!(limits, ScrollLimits::default());
    }
}
