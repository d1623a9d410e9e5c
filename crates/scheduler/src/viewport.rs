//! Viewport snapshot shared by visibility, decode and reclaim passes
//!
//! A [`ViewState`] captures zoom, viewport geometry, the visible page range
//! and the cached page range at one instant. It is never mutated in place;
//! every change produces a new value.

use std::ops::RangeInclusive;

use docview_cache::Generation;

/// Axis-aligned rectangle in view coordinates (pixels at the current zoom)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Unit rectangle, used for tile regions expressed as page fractions
    pub const fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Returns true if the rectangles overlap with non-zero area
    pub fn intersects(&self, other: &ViewRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Scale position and size by `factor`
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Map a region given in fractions of this rectangle (0.0 to 1.0) into
    /// this rectangle's coordinate space
    pub fn sub_region(&self, fraction: &ViewRect) -> Self {
        Self::new(
            self.x + fraction.x * self.width,
            self.y + fraction.y * self.height,
            fraction.width * self.width,
            fraction.height * self.height,
        )
    }

    /// Squared distance between the centers of two rectangles
    pub fn center_distance_sq(&self, other: &ViewRect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).powi(2) + (ay - by).powi(2)
    }
}

/// Non-empty inclusive range of page indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    first: usize,
    last: usize,
}

impl PageRange {
    /// Create a range; `None` if `first > last`
    pub fn new(first: usize, last: usize) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            last: index,
        }
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.first..=self.last).contains(&index)
    }

    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    /// Widen by `margin` pages on each side, clamped to the document
    pub fn expand(&self, margin: usize, page_count: usize) -> Self {
        let last_page = page_count.saturating_sub(1);
        Self {
            first: self.first.saturating_sub(margin),
            last: self.last.saturating_add(margin).min(last_page.max(self.last)),
        }
    }

    /// Smallest range covering both
    pub fn union(&self, other: &PageRange) -> Self {
        Self {
            first: self.first.min(other.first),
            last: self.last.max(other.last),
        }
    }
}

/// Smallest range covering every present range, `None` if all are absent
pub fn union_of(ranges: &[Option<PageRange>]) -> Option<PageRange> {
    ranges
        .iter()
        .flatten()
        .copied()
        .reduce(|acc, range| acc.union(&range))
}

/// Immutable snapshot of viewport parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    zoom: f32,
    viewport: ViewRect,
    visible: Option<PageRange>,
    cached: Option<PageRange>,
    generation: Generation,
}

impl ViewState {
    /// Snapshot with geometry only, used while the visible range is being
    /// computed
    pub fn probe(zoom: f32, viewport: ViewRect, generation: Generation) -> Self {
        Self {
            zoom,
            viewport,
            visible: None,
            cached: None,
            generation,
        }
    }

    /// New snapshot with the given visible range and a cached range widened by
    /// `pages_in_memory` on each side
    pub fn with_visible(
        &self,
        visible: Option<PageRange>,
        pages_in_memory: usize,
        page_count: usize,
    ) -> Self {
        Self {
            visible,
            cached: visible.map(|range| range.expand(pages_in_memory, page_count)),
            ..*self
        }
    }

    /// New snapshot stamped with another generation
    pub fn with_generation(&self, generation: Generation) -> Self {
        Self { generation, ..*self }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> ViewRect {
        self.viewport
    }

    pub fn visible(&self) -> Option<PageRange> {
        self.visible
    }

    pub fn cached(&self) -> Option<PageRange> {
        self.cached
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// First visible page, `-1` when nothing is visible
    pub fn first_visible(&self) -> isize {
        self.visible.map_or(-1, |r| r.first as isize)
    }

    /// Last visible page, `-1` when nothing is visible
    pub fn last_visible(&self) -> isize {
        self.visible.map_or(-1, |r| r.last as isize)
    }

    pub fn first_cached(&self) -> isize {
        self.cached.map_or(-1, |r| r.first as isize)
    }

    pub fn last_cached(&self) -> isize {
        self.cached.map_or(-1, |r| r.last as isize)
    }

    pub fn is_visible_index(&self, index: usize) -> bool {
        self.visible.is_some_and(|r| r.contains(index))
    }

    pub fn is_cached_index(&self, index: usize) -> bool {
        self.cached.is_some_and(|r| r.contains(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let a = ViewRect::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&ViewRect::new(50.0, 50.0, 100.0, 100.0)));
        // Touching edges do not count as overlap
        assert!(!a.intersects(&ViewRect::new(100.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&ViewRect::new(0.0, 200.0, 10.0, 10.0)));
    }

    #[test]
    fn test_rect_sub_region() {
        let page = ViewRect::new(100.0, 200.0, 400.0, 600.0);
        let quarter = page.sub_region(&ViewRect::new(0.5, 0.5, 0.5, 0.5));
        assert_eq!(quarter, ViewRect::new(300.0, 500.0, 200.0, 300.0));
    }

    #[test]
    fn test_rect_contains_point() {
        let rect = ViewRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains_point(5.0, 5.0));
        assert!(!rect.contains_point(10.0, 5.0));
    }

    #[test]
    fn test_page_range_rejects_inverted() {
        assert!(PageRange::new(3, 2).is_none());
        assert_eq!(PageRange::new(2, 4).unwrap().len(), 3);
    }

    #[test]
    fn test_page_range_expand_clamps() {
        let range = PageRange::new(1, 2).unwrap();
        let expanded = range.expand(2, 4);
        assert_eq!((expanded.first(), expanded.last()), (0, 3));
    }

    #[test]
    fn test_union_of_skips_missing() {
        let a = PageRange::new(2, 3);
        let b = PageRange::new(6, 8);
        let union = union_of(&[a, None, b]).unwrap();
        assert_eq!((union.first(), union.last()), (2, 8));
        assert!(union_of(&[None, None]).is_none());
    }

    #[test]
    fn test_view_state_sentinels_when_nothing_visible() {
        let state = ViewState::probe(1.0, ViewRect::default(), Generation::new(0)).with_visible(
            None,
            2,
            10,
        );
        assert_eq!(state.first_visible(), -1);
        assert_eq!(state.last_visible(), -1);
        assert_eq!(state.first_cached(), -1);
        assert_eq!(state.last_cached(), -1);
    }

    #[test]
    fn test_view_state_cached_range_is_superset() {
        let state = ViewState::probe(1.0, ViewRect::default(), Generation::new(0)).with_visible(
            PageRange::new(4, 5),
            2,
            10,
        );
        assert_eq!((state.first_cached(), state.last_cached()), (2, 7));
        assert!(state.is_cached_index(7));
        assert!(!state.is_visible_index(7));
    }

    #[test]
    fn test_view_state_is_a_value() {
        let probe = ViewState::probe(2.0, ViewRect::default(), Generation::new(1));
        let next = probe.with_visible(PageRange::new(0, 0), 1, 3);
        assert!(probe.visible().is_none());
        assert_eq!(next.visible(), PageRange::new(0, 0));
        assert_eq!(next.zoom(), 2.0);
    }
}
