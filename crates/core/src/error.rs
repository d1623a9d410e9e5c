//! Viewport error types

use docview_scheduler::ScheduleError;
use thiserror::Error;

/// Errors reported at the viewport controller boundary
///
/// These are caller contract violations; benign states such as an empty
/// document or no visible page are not errors.
#[derive(Debug, Error)]
pub enum ViewportError {
    /// Page index outside the document
    #[error("Page index {index} out of range (page count: {page_count})")]
    PageOutOfRange { index: usize, page_count: usize },

    /// Zoom factor that is not finite and positive
    #[error("Invalid zoom factor: {0}")]
    InvalidZoom(f32),

    /// Decode scheduling failed
    #[error("Decode scheduling failed: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Result type for viewport operations
pub type ViewportResult<T> = Result<T, ViewportError>;

/// Reject zoom factors that are not finite and positive
pub(crate) fn check_zoom(zoom: f32) -> ViewportResult<f32> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(zoom)
    } else {
        Err(ViewportError::InvalidZoom(zoom))
    }
}

/// Reject page indices outside `0..page_count`
pub(crate) fn check_page(index: usize, page_count: usize) -> ViewportResult<usize> {
    if index < page_count {
        Ok(index)
    } else {
        Err(ViewportError::PageOutOfRange { index, page_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_zoom() {
        assert_eq!(check_zoom(2.5).unwrap(), 2.5);
        assert!(matches!(check_zoom(0.0), Err(ViewportError::InvalidZoom(_))));
        assert!(matches!(check_zoom(-1.0), Err(ViewportError::InvalidZoom(_))));
        assert!(check_zoom(f32::NAN).is_err());
        assert!(check_zoom(f32::INFINITY).is_err());
    }

    #[test]
    fn test_check_page() {
        assert_eq!(check_page(3, 4).unwrap(), 3);
        let err = check_page(4, 4).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Page index 4 out of range (page count: 4)"
        );
    }
}
