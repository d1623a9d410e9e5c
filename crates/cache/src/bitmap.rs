//! Decoded tile bitmaps and the generation stamp that guards them
//!
//! Every bitmap is stamped with the generation that was current when its
//! decode request was issued. A zoom change bumps the generation, which turns
//! every older bitmap (and every in-flight decode) stale.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Bytes per pixel for the RGBA buffers handed out by the pool
pub const BYTES_PER_PIXEL: usize = 4;

/// Generation stamp carried by decode requests and bitmaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Create a generation from a raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw counter value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns true if this stamp is older than `current`
    pub fn is_stale(self, current: Generation) -> bool {
        self.0 < current.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// Monotonic generation counter shared between the controller and the
/// decode backend
///
/// Clones observe the same counter. Only the control thread bumps it; worker
/// threads read it.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    value: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Create a counter starting at generation 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation
    pub fn current(&self) -> Generation {
        Generation(self.value.load(Ordering::Acquire))
    }

    /// Advance to the next generation and return it
    pub fn bump(&self) -> Generation {
        Generation(self.value.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

/// Owned RGBA pixel buffer
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Bitmap {
    /// Allocate a zeroed bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; Self::byte_len(width, height)],
            width,
            height,
        }
    }

    /// Wrap an existing RGBA buffer
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != Self::byte_len(width, height) {
            return None;
        }
        Some(Self {
            pixels,
            width,
            height,
        })
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Memory held by this bitmap in bytes
    pub fn memory_size(&self) -> usize {
        self.pixels.len()
    }

    /// Zero the pixel data before reuse
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// A bitmap installed on a tile, together with its generation stamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapRef {
    bitmap: Bitmap,
    generation: Generation,
}

impl BitmapRef {
    pub fn new(bitmap: Bitmap, generation: Generation) -> Self {
        Self { bitmap, generation }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Release the stamp and hand back the pixel buffer
    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_counter_is_monotonic() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), Generation::new(0));

        let first = counter.bump();
        let second = counter.bump();
        assert!(second > first);
        assert_eq!(counter.current(), second);
    }

    #[test]
    fn test_generation_counter_clones_share_state() {
        let counter = GenerationCounter::new();
        let shared = counter.clone();
        counter.bump();
        assert_eq!(shared.current(), Generation::new(1));
    }

    #[test]
    fn test_stale_generation() {
        let old = Generation::new(3);
        assert!(old.is_stale(Generation::new(4)));
        assert!(!old.is_stale(Generation::new(3)));
        assert!(!old.is_stale(Generation::new(2)));
    }

    #[test]
    fn test_bitmap_dimensions() {
        let bitmap = Bitmap::new(16, 8);
        assert_eq!(bitmap.memory_size(), 16 * 8 * BYTES_PER_PIXEL);
        assert!(bitmap.pixels().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bitmap_from_pixels_rejects_wrong_length() {
        assert!(Bitmap::from_pixels(2, 2, vec![0; 3]).is_none());
        assert!(Bitmap::from_pixels(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_bitmap_clear() {
        let mut bitmap = Bitmap::from_pixels(1, 1, vec![9, 9, 9, 9]).unwrap();
        bitmap.clear();
        assert_eq!(bitmap.pixels(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_bitmap_ref_keeps_stamp() {
        let bitmap_ref = BitmapRef::new(Bitmap::new(1, 1), Generation::new(7));
        assert_eq!(bitmap_ref.generation(), Generation::new(7));
        assert_eq!(bitmap_ref.into_bitmap().width(), 1);
    }
}
