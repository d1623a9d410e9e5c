//! Closest-first ordering of decode candidates
//!
//! The decode backend serves requests roughly in submission order, so the
//! candidate nearest the viewport center is submitted ahead of the rest.
//! Ties on distance are broken by page order.

use std::cmp::Ordering;

use crate::viewport::{ViewRect, ViewState};

/// Address of a tile: page, quad-tree level and grid position at that level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    /// Page index (0-based)
    pub page: usize,

    /// Quad-tree level (0 = whole page)
    pub level: u8,

    /// Tile X coordinate in the level grid
    pub x: u32,

    /// Tile Y coordinate in the level grid
    pub y: u32,
}

impl TileId {
    pub fn new(page: usize, level: u8, x: u32, y: u32) -> Self {
        Self { page, level, x, y }
    }

    /// Root tile of a page
    pub fn root(page: usize) -> Self {
        Self::new(page, 0, 0, 0)
    }

    /// Number of tiles per side at this tile's level
    pub fn grid_size(&self) -> u32 {
        1 << self.level
    }

    /// Region covered by this tile as fractions of the page
    pub fn page_region(&self) -> ViewRect {
        let step = 1.0 / self.grid_size() as f32;
        ViewRect::new(self.x as f32 * step, self.y as f32 * step, step, step)
    }
}

/// A tile that needs decoding, with its current on-screen placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeCandidate {
    pub tile: TileId,

    /// Tile bounds in view coordinates at the zoom of the pass
    pub view_rect: ViewRect,
}

impl DecodeCandidate {
    pub fn new(tile: TileId, view_rect: ViewRect) -> Self {
        Self { tile, view_rect }
    }
}

/// Compare two candidates by proximity to the viewport center, then by page
pub fn compare_candidates(view: &ViewState, a: &DecodeCandidate, b: &DecodeCandidate) -> Ordering {
    let viewport = view.viewport();
    let da = a.view_rect.center_distance_sq(&viewport);
    let db = b.view_rect.center_distance_sq(&viewport);
    da.total_cmp(&db)
        .then_with(|| page_order(view, a.tile.page).cmp(&page_order(view, b.tile.page)))
        .then_with(|| a.tile.cmp(&b.tile))
}

/// Visible pages first in index order, then the rest by distance from the
/// visible range
fn page_order(view: &ViewState, page: usize) -> (bool, usize) {
    match view.visible() {
        Some(range) if range.contains(page) => (false, page - range.first()),
        Some(range) if page < range.first() => (true, range.first() - page),
        Some(range) => (true, page - range.last()),
        None => (true, page),
    }
}

/// Index of the best candidate, `None` for an empty slice
pub fn best_candidate(view: &ViewState, candidates: &[DecodeCandidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| compare_candidates(view, a, b))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::PageRange;
    use docview_cache::Generation;

    fn view() -> ViewState {
        ViewState::probe(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), Generation::new(0))
            .with_visible(PageRange::new(0, 1), 1, 4)
    }

    fn candidate(page: usize, x: f32, y: f32) -> DecodeCandidate {
        DecodeCandidate::new(TileId::new(page, 1, 0, 0), ViewRect::new(x, y, 100.0, 100.0))
    }

    #[test]
    fn test_tile_page_region() {
        let tile = TileId::new(0, 2, 1, 3);
        assert_eq!(tile.grid_size(), 4);
        assert_eq!(tile.page_region(), ViewRect::new(0.25, 0.75, 0.25, 0.25));
        assert_eq!(TileId::root(5).page_region(), ViewRect::unit());
    }

    #[test]
    fn test_closest_candidate_wins() {
        let candidates = [
            candidate(0, 0.0, 0.0),
            candidate(0, 350.0, 250.0), // centered on the viewport
            candidate(1, 700.0, 500.0),
        ];
        assert_eq!(best_candidate(&view(), &candidates), Some(1));
    }

    #[test]
    fn test_distance_ordering_is_total() {
        let view = view();
        let a = candidate(0, 350.0, 250.0);
        let b = candidate(0, 100.0, 250.0);
        let c = candidate(1, 0.0, 2000.0);
        assert_eq!(compare_candidates(&view, &a, &b), Ordering::Less);
        assert_eq!(compare_candidates(&view, &b, &c), Ordering::Less);
        assert_eq!(compare_candidates(&view, &c, &a), Ordering::Greater);
    }

    #[test]
    fn test_tie_broken_by_visible_page_order() {
        let view = view();
        let on_hidden_page = candidate(3, 350.0, 250.0);
        let on_visible_page = candidate(1, 350.0, 250.0);
        assert_eq!(
            compare_candidates(&view, &on_visible_page, &on_hidden_page),
            Ordering::Less
        );
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(best_candidate(&view(), &[]), None);
    }
}
