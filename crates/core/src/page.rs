//! Document pages and their per-pass tile hooks

use docview_cache::RecycleBatch;
use docview_scheduler::{DecodeCandidate, TileId, ViewRect, ViewState};
use tracing::trace;

use crate::tile::{level_for_zoom, TileTree};

/// Natural page size in document units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A page of the document
///
/// `bounds` is the page's laid-out rectangle at zoom 1. Tiles are addressed in
/// fractions of that rectangle, so they stay valid across zoom changes.
#[derive(Debug)]
pub struct Page {
    index: usize,
    size: PageSize,
    bounds: ViewRect,
    tiles: TileTree,
}

impl Page {
    pub fn new(index: usize, size: PageSize) -> Self {
        Self {
            index,
            size,
            bounds: ViewRect::new(0.0, 0.0, size.width, size.height),
            tiles: TileTree::new(index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn bounds(&self) -> ViewRect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: ViewRect) {
        self.bounds = bounds;
    }

    /// Page rectangle in view coordinates at `zoom`
    pub fn bounds_at(&self, zoom: f32) -> ViewRect {
        self.bounds.scale(zoom)
    }

    pub fn tiles(&self) -> &TileTree {
        &self.tiles
    }

    pub fn tiles_mut(&mut self) -> &mut TileTree {
        &mut self.tiles
    }

    /// Tiles this page wants decoded for `view`
    ///
    /// Visible pages want every target-level tile that overlaps the viewport.
    /// Pages that are only cached want their root tile. Pages outside the
    /// cached range want nothing.
    pub fn wanted_tiles(&self, view: &ViewState) -> Vec<DecodeCandidate> {
        if !view.is_cached_index(self.index) {
            return Vec::new();
        }

        let page_rect = self.bounds_at(view.zoom());
        if !view.is_visible_index(self.index) {
            return vec![DecodeCandidate::new(TileId::root(self.index), page_rect)];
        }

        let level = level_for_zoom(view.zoom());
        let grid = 1u32 << level;
        let viewport = view.viewport();
        let mut wanted = Vec::new();
        for y in 0..grid {
            for x in 0..grid {
                let tile = TileId::new(self.index, level, x, y);
                let rect = page_rect.sub_region(&tile.page_region());
                if rect.intersects(&viewport) {
                    wanted.push(DecodeCandidate::new(tile, rect));
                }
            }
        }
        wanted
    }

    /// Recycle what `view` no longer needs: the whole tree when the page left
    /// the cached range, stale tiles otherwise
    pub fn reclaim(&mut self, view: &ViewState, recycle: &mut RecycleBatch) {
        if !view.is_cached_index(self.index) {
            self.tiles.recycle_all(recycle);
        } else {
            self.tiles.recycle_stale(view.generation(), &[], recycle);
        }
    }

    /// Position changed: collect tiles to decode and bitmaps to recycle
    pub fn on_position_changed(
        &mut self,
        view: &ViewState,
        decode: &mut Vec<DecodeCandidate>,
        recycle: &mut RecycleBatch,
    ) {
        let wanted = self.wanted_tiles(view);
        if wanted.is_empty() {
            self.tiles.recycle_all(recycle);
            return;
        }

        let generation = view.generation();
        let keep: Vec<TileId> = wanted.iter().map(|c| c.tile).collect();
        self.tiles.recycle_stale(generation, &keep, recycle);

        let before = decode.len();
        for candidate in wanted {
            let node = self.tiles.get_or_split(candidate.tile);
            if node.needs_decode(generation) {
                node.begin_decode(generation, recycle);
                decode.push(candidate);
            }
        }
        trace!(
            page = self.index,
            requested = decode.len() - before,
            "page position changed"
        );
    }

    /// Zoom changed from `old_zoom`: drop tiles deeper than the new target
    /// level, then run the position pass
    pub fn on_zoom_changed(
        &mut self,
        old_zoom: f32,
        view: &ViewState,
        decode: &mut Vec<DecodeCandidate>,
        recycle: &mut RecycleBatch,
    ) {
        if old_zoom != view.zoom() {
            self.tiles.prune_below(level_for_zoom(view.zoom()), recycle);
        }
        self.on_position_changed(view, decode, recycle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileState;
    use docview_cache::{Bitmap, BitmapRef, Generation};
    use docview_scheduler::PageRange;

    fn page(index: usize) -> Page {
        let mut page = Page::new(index, PageSize::new(800.0, 1000.0));
        page.set_bounds(ViewRect::new(0.0, index as f32 * 1000.0, 800.0, 1000.0));
        page
    }

    fn view(zoom: f32, viewport: ViewRect, visible: (usize, usize), generation: u64) -> ViewState {
        ViewState::probe(zoom, viewport, Generation::new(generation))
            .with_visible(PageRange::new(visible.0, visible.1), 1, 10)
    }

    fn install_all(page: &mut Page, candidates: &[DecodeCandidate], generation: u64) {
        for candidate in candidates {
            let node = page.tiles_mut().get_mut(candidate.tile).unwrap();
            let bitmap = BitmapRef::new(Bitmap::new(2, 2), Generation::new(generation));
            node.install(bitmap).unwrap();
        }
    }

    #[test]
    fn test_visible_page_wants_overlapping_tiles() {
        let page = page(0);
        // zoom 2 -> level 1 (2x2 grid of 800x1000 tiles); viewport covers the top-left tile only
        let v = view(2.0, ViewRect::new(0.0, 0.0, 700.0, 900.0), (0, 0), 0);
        let wanted = page.wanted_tiles(&v);
        assert_eq!(wanted.len(), 1);
        assert_eq!(wanted[0].tile, TileId::new(0, 1, 0, 0));
        assert_eq!(wanted[0].view_rect, ViewRect::new(0.0, 0.0, 800.0, 1000.0));
    }

    #[test]
    fn test_cached_page_wants_root() {
        let page = page(1);
        let v = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        let wanted = page.wanted_tiles(&v);
        assert_eq!(wanted.len(), 1);
        assert_eq!(wanted[0].tile, TileId::root(1));
    }

    #[test]
    fn test_far_page_wants_nothing() {
        let page = page(5);
        let v = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        assert!(page.wanted_tiles(&v).is_empty());
    }

    #[test]
    fn test_position_changed_is_idempotent() {
        let mut page = page(0);
        let v = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);

        let mut decode = Vec::new();
        let mut recycle = RecycleBatch::new();
        page.on_position_changed(&v, &mut decode, &mut recycle);
        assert_eq!(decode.len(), 1);
        assert_eq!(
            page.tiles().root().state(),
            TileState::Decoding(Generation::new(0))
        );

        let mut decode = Vec::new();
        page.on_position_changed(&v, &mut decode, &mut recycle);
        assert!(decode.is_empty());
        assert!(recycle.is_empty());
    }

    #[test]
    fn test_page_leaving_cached_range_is_recycled() {
        let mut page = page(0);
        let near = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        let mut decode = Vec::new();
        let mut recycle = RecycleBatch::new();
        page.on_position_changed(&near, &mut decode, &mut recycle);
        install_all(&mut page, &decode, 0);

        let far = view(1.0, ViewRect::new(0.0, 6000.0, 800.0, 600.0), (6, 6), 0);
        let mut decode = Vec::new();
        page.on_position_changed(&far, &mut decode, &mut recycle);

        assert!(decode.is_empty());
        assert_eq!(recycle.len(), 1);
        assert_eq!(page.tiles().root().state(), TileState::Recycled);
    }

    #[test]
    fn test_new_generation_redecodes() {
        let mut page = page(0);
        let v0 = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        let mut decode = Vec::new();
        let mut recycle = RecycleBatch::new();
        page.on_position_changed(&v0, &mut decode, &mut recycle);
        install_all(&mut page, &decode, 0);

        let v1 = v0.with_generation(Generation::new(1));
        let mut decode = Vec::new();
        page.on_position_changed(&v1, &mut decode, &mut recycle);

        assert_eq!(decode.len(), 1);
        assert_eq!(recycle.len(), 1);
        assert_eq!(
            page.tiles().root().state(),
            TileState::Decoding(Generation::new(1))
        );
    }

    #[test]
    fn test_zoom_changed_prunes_deeper_tiles() {
        let mut page = page(0);
        let zoomed = view(4.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        let mut decode = Vec::new();
        let mut recycle = RecycleBatch::new();
        page.on_position_changed(&zoomed, &mut decode, &mut recycle);
        assert!(decode.iter().all(|c| c.tile.level == 2));
        install_all(&mut page, &decode, 0);
        let deep = page.tiles().decoded_count();
        assert!(deep > 0);

        let back = view(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), (0, 0), 0);
        let mut decode = Vec::new();
        page.on_zoom_changed(4.0, &back, &mut decode, &mut recycle);

        assert_eq!(recycle.len(), deep);
        assert_eq!(page.tiles().node_count(), 1);
        assert_eq!(decode.len(), 1);
        assert_eq!(decode[0].tile, TileId::root(0));
    }
}
