//! Visible page range search
//!
//! Visible pages always form one contiguous run in index order; the
//! visibility predicate guarantees this and the scanner relies on it. Given a
//! pivot the scanner grows the run outward from it. Given a scroll direction
//! and the previous range it re-anchors from the trailing edge, so a scroll
//! tick only tests the pages that entered or left the viewport.

use docview_scheduler::{PageRange, ViewState};
use tracing::trace;

use crate::error::{check_page, ViewportResult};
use crate::page::Page;

/// Page visibility test of a viewer mode
pub trait PageVisibility: Send + Sync {
    fn is_visible(&self, page: &Page, view: &ViewState) -> bool;

    fn name(&self) -> &'static str;
}

/// Continuous vertical scrolling: a page is visible when any part of it is
/// inside the viewport
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousScroll;

impl PageVisibility for ContinuousScroll {
    fn is_visible(&self, page: &Page, view: &ViewState) -> bool {
        page.bounds_at(view.zoom()).intersects(&view.viewport())
    }

    fn name(&self) -> &'static str {
        "continuous"
    }
}

/// One page at a time: the page under the viewport center is the visible one
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePage;

impl PageVisibility for SinglePage {
    fn is_visible(&self, page: &Page, view: &ViewState) -> bool {
        let (cx, cy) = view.viewport().center();
        page.bounds_at(view.zoom()).contains_point(cx, cy)
    }

    fn name(&self) -> &'static str {
        "single_page"
    }
}

/// Direction of the last scroll along the document axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    Backward,
    #[default]
    None,
    Forward,
}

impl ScrollDirection {
    pub fn from_sign(value: f32) -> Self {
        if value > 0.0 {
            ScrollDirection::Forward
        } else if value < 0.0 {
            ScrollDirection::Backward
        } else {
            ScrollDirection::None
        }
    }
}

/// Computes the contiguous visible page range
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityScanner;

impl VisibilityScanner {
    /// Visible range over `page_count` pages, `None` when nothing is visible
    ///
    /// # Errors
    /// [`ViewportError::PageOutOfRange`](crate::ViewportError::PageOutOfRange)
    /// if `pivot` is outside a non-empty document.
    pub fn scan<F>(
        &self,
        page_count: usize,
        pivot: Option<usize>,
        direction: ScrollDirection,
        previous: Option<PageRange>,
        is_visible: F,
    ) -> ViewportResult<Option<PageRange>>
    where
        F: Fn(usize) -> bool,
    {
        if page_count == 0 {
            return Ok(None);
        }

        if let Some(pivot) = pivot {
            let pivot = check_page(pivot, page_count)?;
            if is_visible(pivot) {
                return Ok(Some(expand(pivot, page_count, &is_visible)));
            }
            trace!(pivot, "pivot not visible, scanning all pages");
            return Ok(full_scan(page_count, &is_visible));
        }

        if let Some(previous) = previous {
            let anchor = match direction {
                ScrollDirection::Forward => {
                    let start = previous.first().min(page_count - 1);
                    (start..page_count).find(|&i| is_visible(i))
                }
                ScrollDirection::Backward => {
                    let start = previous.last().min(page_count - 1);
                    (0..=start).rev().find(|&i| is_visible(i))
                }
                ScrollDirection::None => None,
            };
            if let Some(anchor) = anchor {
                return Ok(Some(expand(anchor, page_count, &is_visible)));
            }
        }

        Ok(full_scan(page_count, &is_visible))
    }

    /// Visible range for pages under `view` using a viewer mode's predicate
    pub fn scan_pages(
        &self,
        pages: &[Page],
        visibility: &dyn PageVisibility,
        view: &ViewState,
        pivot: Option<usize>,
        direction: ScrollDirection,
        previous: Option<PageRange>,
    ) -> ViewportResult<Option<PageRange>> {
        self.scan(pages.len(), pivot, direction, previous, |index| {
            visibility.is_visible(&pages[index], view)
        })
    }
}

/// Grow a run outward from a visible page
fn expand<F: Fn(usize) -> bool>(anchor: usize, page_count: usize, is_visible: &F) -> PageRange {
    let mut first = anchor;
    while first > 0 && is_visible(first - 1) {
        first -= 1;
    }
    let mut last = anchor;
    while last + 1 < page_count && is_visible(last + 1) {
        last += 1;
    }
    PageRange::new(first, last).unwrap_or(PageRange::single(anchor))
}

/// First contiguous visible run, scanning from the start
fn full_scan<F: Fn(usize) -> bool>(page_count: usize, is_visible: &F) -> Option<PageRange> {
    let first = (0..page_count).find(|&i| is_visible(i))?;
    Some(expand(first, page_count, is_visible))
}
