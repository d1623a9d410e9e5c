//! Batched return of unneeded bitmaps to the pool
//!
//! Bitmaps collected during a pass are released in one call at the end of the
//! pass, never one by one.

use docview_cache::{BitmapContext, RecycleBatch};
use docview_scheduler::ViewState;
use tracing::debug;

use crate::page::Page;

/// Collects out-of-range and stale bitmaps and hands them back to the pool
#[derive(Debug, Clone)]
pub struct BitmapReclaimer {
    context: BitmapContext,
}

impl BitmapReclaimer {
    pub fn new(context: BitmapContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &BitmapContext {
        &self.context
    }

    /// Recycle tiles of pages outside the cached range and tiles whose
    /// generation is behind `view`
    pub fn collect(&self, pages: &mut [Page], view: &ViewState) -> RecycleBatch {
        let mut batch = RecycleBatch::new();
        for page in pages.iter_mut() {
            page.reclaim(view, &mut batch);
        }
        batch
    }

    /// Recycle every tile of every page
    pub fn collect_all(&self, pages: &mut [Page]) -> RecycleBatch {
        let mut batch = RecycleBatch::new();
        for page in pages.iter_mut() {
            page.tiles_mut().recycle_all(&mut batch);
        }
        batch
    }

    /// Release a batch in one call; returns the number of bitmaps released
    pub fn release(&self, batch: RecycleBatch) -> usize {
        let count = batch.len();
        if count > 0 {
            debug!(
                bitmaps = count,
                bytes = batch.memory_size(),
                "recycled bitmaps released"
            );
        }
        self.context.release(batch);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageSize;
    use docview_cache::{Bitmap, BitmapRef, Generation, RamBitmapPool};
    use docview_scheduler::{PageRange, TileId, ViewRect};
    use std::sync::Arc;

    fn decoded_page(index: usize, generation: u64) -> Page {
        let mut page = Page::new(index, PageSize::new(100.0, 100.0));
        let node = page.tiles_mut().get_or_split(TileId::root(index));
        let mut scratch = RecycleBatch::new();
        node.begin_decode(Generation::new(generation), &mut scratch);
        node.install(BitmapRef::new(Bitmap::new(8, 8), Generation::new(generation)))
            .unwrap();
        page
    }

    fn view(visible: usize, generation: u64) -> ViewState {
        ViewState::probe(1.0, ViewRect::new(0.0, 0.0, 100.0, 100.0), Generation::new(generation))
            .with_visible(PageRange::new(visible, visible), 1, 10)
    }

    #[test]
    fn test_collect_out_of_range_pages() {
        let reclaimer = BitmapReclaimer::new(BitmapContext::default());
        let mut pages: Vec<Page> = (0..5).map(|i| decoded_page(i, 0)).collect();

        // Cached range is 0..=2
        let batch = reclaimer.collect(&mut pages, &view(1, 0));
        assert_eq!(batch.len(), 2);
        assert_eq!(pages[2].tiles().decoded_count(), 1);
        assert_eq!(pages[3].tiles().decoded_count(), 0);
    }

    #[test]
    fn test_collect_stale_generation() {
        let reclaimer = BitmapReclaimer::new(BitmapContext::default());
        let mut pages = vec![decoded_page(0, 0), decoded_page(1, 1)];

        let batch = reclaimer.collect(&mut pages, &view(0, 1));
        assert_eq!(batch.len(), 1);
        assert_eq!(pages[0].tiles().decoded_count(), 0);
        assert_eq!(pages[1].tiles().decoded_count(), 1);
    }

    #[test]
    fn test_release_goes_to_pool_once() {
        let pool = Arc::new(RamBitmapPool::with_mb_limit(4));
        let reclaimer = BitmapReclaimer::new(BitmapContext::new(pool.clone()));
        let mut pages: Vec<Page> = (0..3).map(|i| decoded_page(i, 0)).collect();

        let batch = reclaimer.collect_all(&mut pages);
        assert_eq!(reclaimer.release(batch), 3);

        let stats = pool.stats();
        assert_eq!(stats.batches_released, 1);
        assert_eq!(stats.bitmaps_released, 3);
        assert_eq!(pool.free_count(), 3);
    }

    #[test]
    fn test_release_empty_batch_skips_pool() {
        let pool = Arc::new(RamBitmapPool::with_mb_limit(4));
        let reclaimer = BitmapReclaimer::new(BitmapContext::new(pool.clone()));
        assert_eq!(reclaimer.release(RecycleBatch::new()), 0);
        assert_eq!(pool.stats().batches_released, 0);
    }
}
