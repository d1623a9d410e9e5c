//! Bitmap context shared by the viewport controller and the decode backend

use std::sync::Arc;

use tracing::debug;

use crate::bitmap::{Generation, GenerationCounter};
use crate::pool::{BitmapPool, RamBitmapPool, RecycleBatch};

/// Generation counter plus the pool recycled bitmaps go back to
///
/// Cloning is cheap; clones share both the counter and the pool.
#[derive(Clone)]
pub struct BitmapContext {
    generation: GenerationCounter,
    pool: Arc<dyn BitmapPool>,
}

impl BitmapContext {
    pub fn new(pool: Arc<dyn BitmapPool>) -> Self {
        Self {
            generation: GenerationCounter::new(),
            pool,
        }
    }

    /// Context backed by a [`RamBitmapPool`] with the given limit
    pub fn with_ram_pool(limit_mb: usize) -> Self {
        Self::new(Arc::new(RamBitmapPool::with_mb_limit(limit_mb)))
    }

    pub fn generation(&self) -> Generation {
        self.generation.current()
    }

    /// Invalidate every bitmap and in-flight decode stamped before now
    pub fn invalidate(&self) -> Generation {
        let next = self.generation.bump();
        debug!(generation = %next, "bitmap generation advanced");
        next
    }

    pub fn counter(&self) -> &GenerationCounter {
        &self.generation
    }

    pub fn pool(&self) -> &Arc<dyn BitmapPool> {
        &self.pool
    }

    /// Release a batch to the pool; empty batches are not forwarded
    pub fn release(&self, batch: RecycleBatch) {
        if !batch.is_empty() {
            self.pool.release(batch);
        }
    }
}

impl Default for BitmapContext {
    fn default() -> Self {
        Self::new(Arc::new(RamBitmapPool::default()))
    }
}

impl std::fmt::Debug for BitmapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapContext")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
