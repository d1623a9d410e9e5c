//! Shared bitmap pool with bounded reuse
//!
//! Recycled tile bitmaps are returned to the pool in batches, one batch per
//! logical viewport operation. The pool keeps released buffers for reuse and
//! evicts the oldest free buffers once the configured byte budget is exceeded.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::bitmap::{Bitmap, BitmapRef};

/// Bitmaps collected during one viewport operation, released in one call
#[derive(Debug, Default)]
pub struct RecycleBatch {
    bitmaps: Vec<Bitmap>,
}

impl RecycleBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw bitmap to the batch
    pub fn push(&mut self, bitmap: Bitmap) {
        self.bitmaps.push(bitmap);
    }

    /// Add a stamped bitmap to the batch, discarding its stamp
    pub fn push_ref(&mut self, bitmap: BitmapRef) {
        self.bitmaps.push(bitmap.into_bitmap());
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    /// Total memory held by the batch in bytes
    pub fn memory_size(&self) -> usize {
        self.bitmaps.iter().map(Bitmap::memory_size).sum()
    }

    /// Move all bitmaps of `other` into this batch
    pub fn append(&mut self, other: &mut RecycleBatch) {
        self.bitmaps.append(&mut other.bitmaps);
    }

    pub fn into_bitmaps(self) -> Vec<Bitmap> {
        self.bitmaps
    }
}

/// Allocation and reuse policy for tile bitmaps
///
/// Implementations must be shareable with decode worker threads.
pub trait BitmapPool: Send + Sync {
    /// Obtain a bitmap of the given size, reusing a released buffer if possible
    fn acquire(&self, width: u32, height: u32) -> Bitmap;

    /// Return a batch of bitmaps that are no longer displayed
    fn release(&self, batch: RecycleBatch);

    /// Change how many bytes of free buffers the pool may keep
    fn set_memory_limit(&self, _memory_limit: usize) {}
}

/// Statistics about pool usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of free buffers held for reuse
    pub free_count: usize,

    /// Memory held by free buffers (bytes)
    pub memory_used: usize,

    /// Maximum memory kept for free buffers (bytes)
    pub memory_limit: usize,

    /// Buffers allocated because nothing matching was free
    pub allocations: u64,

    /// Buffers handed out from the free list
    pub reuses: u64,

    /// Number of `release` calls
    pub batches_released: u64,

    /// Number of bitmaps returned across all batches
    pub bitmaps_released: u64,

    /// Free buffers dropped to stay under the memory limit
    pub evictions: u64,
}

impl PoolStats {
    /// Fraction of acquisitions served from the free list (0.0 to 1.0)
    pub fn reuse_rate(&self) -> f64 {
        let total = self.allocations + self.reuses;
        if total == 0 {
            0.0
        } else {
            self.reuses as f64 / total as f64
        }
    }
}

type BufferSize = (u32, u32);

struct PoolState {
    /// Free buffers grouped by dimensions
    free: HashMap<BufferSize, Vec<Bitmap>>,

    /// Release order of free buffers (oldest at front)
    release_order: VecDeque<BufferSize>,

    memory_used: usize,
    memory_limit: usize,
    stats: PoolStats,
}

impl PoolState {
    fn new(memory_limit: usize) -> Self {
        Self {
            free: HashMap::new(),
            release_order: VecDeque::new(),
            memory_used: 0,
            memory_limit,
            stats: PoolStats {
                memory_limit,
                ..Default::default()
            },
        }
    }

    fn take(&mut self, size: BufferSize) -> Option<Bitmap> {
        let bitmap = self.free.get_mut(&size)?.pop()?;
        // Newest buffer of this size was taken; drop the newest order entry for it
        if let Some(index) = self.release_order.iter().rposition(|s| *s == size) {
            self.release_order.remove(index);
        }
        self.memory_used = self.memory_used.saturating_sub(bitmap.memory_size());
        Some(bitmap)
    }

    fn put(&mut self, bitmap: Bitmap) {
        let size = (bitmap.width(), bitmap.height());
        self.memory_used += bitmap.memory_size();
        self.free.entry(size).or_default().push(bitmap);
        self.release_order.push_back(size);
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(size) = self.release_order.pop_front() else {
            return false;
        };
        let Some(bucket) = self.free.get_mut(&size) else {
            return false;
        };
        if bucket.is_empty() {
            return false;
        }
        // Oldest buffer of a size sits at the front of its bucket
        let bitmap = bucket.remove(0);
        if bucket.is_empty() {
            self.free.remove(&size);
        }
        self.memory_used = self.memory_used.saturating_sub(bitmap.memory_size());
        self.stats.evictions += 1;
        true
    }

    fn evict_to_limit(&mut self) {
        while self.memory_used > self.memory_limit {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    fn refresh_stats(&mut self) {
        self.stats.free_count = self.free.values().map(Vec::len).sum();
        self.stats.memory_used = self.memory_used;
        self.stats.memory_limit = self.memory_limit;
    }
}

/// In-memory bitmap pool bounded by a byte budget
///
/// # Example
///
/// ```
/// use docview_cache::{BitmapPool, RamBitmapPool, RecycleBatch};
///
/// let pool = RamBitmapPool::with_mb_limit(16);
/// let bitmap = pool.acquire(256, 256);
///
/// let mut batch = RecycleBatch::new();
/// batch.push(bitmap);
/// pool.release(batch);
///
/// // The released buffer is handed out again
/// let _again = pool.acquire(256, 256);
/// assert_eq!(pool.stats().reuses, 1);
/// ```
pub struct RamBitmapPool {
    state: Mutex<PoolState>,
}

impl RamBitmapPool {
    /// Create a pool keeping at most `memory_limit` bytes of free buffers
    pub fn new(memory_limit: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::new(memory_limit)),
        }
    }

    /// Create a pool with a limit in megabytes
    pub fn with_mb_limit(megabytes: usize) -> Self {
        Self::new(megabytes * 1024 * 1024)
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> PoolStats {
        self.lock().stats
    }

    pub fn free_count(&self) -> usize {
        self.lock().stats.free_count
    }

    pub fn memory_used(&self) -> usize {
        self.lock().memory_used
    }

    /// Drop every free buffer
    pub fn clear(&self) {
        let mut state = self.lock();
        state.free.clear();
        state.release_order.clear();
        state.memory_used = 0;
        state.refresh_stats();
    }
}

impl Default for RamBitmapPool {
    fn default() -> Self {
        Self::with_mb_limit(64)
    }
}

impl BitmapPool for RamBitmapPool {
    fn acquire(&self, width: u32, height: u32) -> Bitmap {
        let mut state = self.lock();
        let bitmap = match state.take((width, height)) {
            Some(mut bitmap) => {
                state.stats.reuses += 1;
                bitmap.clear();
                bitmap
            }
            None => {
                state.stats.allocations += 1;
                Bitmap::new(width, height)
            }
        };
        state.refresh_stats();
        bitmap
    }

    fn release(&self, batch: RecycleBatch) {
        if batch.is_empty() {
            return;
        }

        let mut state = self.lock();
        let count = batch.len();
        for bitmap in batch.into_bitmaps() {
            state.put(bitmap);
        }
        state.stats.batches_released += 1;
        state.stats.bitmaps_released += count as u64;
        state.evict_to_limit();
        state.refresh_stats();

        trace!(
            count,
            free = state.stats.free_count,
            memory_used = state.memory_used,
            "bitmaps returned to pool"
        );
    }

    /// Evicts oldest free buffers if the new budget is already exceeded
    fn set_memory_limit(&self, memory_limit: usize) {
        let mut state = self.lock();
        state.memory_limit = memory_limit;
        state.evict_to_limit();
        state.refresh_stats();
        debug!(memory_limit, "bitmap pool limit changed");
    }
}
