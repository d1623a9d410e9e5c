//! Document Viewer Cache Library
//!
//! Tile bitmaps, the generation stamp that invalidates them, and the shared
//! pool recycled bitmaps are returned to.

pub mod bitmap;
pub mod config;
pub mod context;
pub mod pool;

pub use bitmap::{Bitmap, BitmapRef, Generation, GenerationCounter, BYTES_PER_PIXEL};
pub use config::{ConfigError, MemoryConfig};
pub use context::BitmapContext;
pub use pool::{BitmapPool, PoolStats, RamBitmapPool, RecycleBatch};
