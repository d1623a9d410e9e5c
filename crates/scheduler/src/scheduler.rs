//! Best-first decode submission
//!
//! Picks the candidate closest to the viewport center, submits it first, then
//! submits the remaining candidates in their given order. Every request carries
//! the generation of the pass that produced it.

use std::collections::HashMap;
use std::sync::Arc;

use docview_cache::{Bitmap, Generation};
use tracing::{debug, trace};

use crate::error::ScheduleError;
use crate::priority::{best_candidate, DecodeCandidate, TileId};
use crate::viewport::{ViewRect, ViewState};

/// A request handed to the decode backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeRequest {
    pub tile: TileId,

    /// Region of the page to decode, as page fractions
    pub region: ViewRect,

    /// Zoom the tile is rendered at
    pub zoom: f32,

    /// Target bitmap width in pixels
    pub width: u32,

    /// Target bitmap height in pixels
    pub height: u32,

    /// Generation current when the request was issued
    pub generation: Generation,
}

impl DecodeRequest {
    fn from_candidate(view: &ViewState, candidate: &DecodeCandidate) -> Self {
        Self {
            tile: candidate.tile,
            region: candidate.tile.page_region(),
            zoom: view.zoom(),
            width: candidate.view_rect.width.round().max(1.0) as u32,
            height: candidate.view_rect.height.round().max(1.0) as u32,
            generation: view.generation(),
        }
    }
}

/// Result of a decode, delivered back to the control thread
#[derive(Debug)]
pub struct DecodeOutcome {
    pub request: DecodeRequest,

    /// Decoded pixels, `None` if the backend failed to decode the tile
    pub bitmap: Option<Bitmap>,
}

/// Asynchronous decode service
///
/// `submit` must not block on decoding. Results come back as
/// [`DecodeOutcome`]s through whatever channel the backend provides.
pub trait DecodeBackend: Send + Sync {
    fn submit(&self, request: DecodeRequest);
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Requests handed to the backend
    pub submitted: u64,

    /// Candidates skipped because the same tile was already in flight for the
    /// same generation
    pub suppressed: u64,

    /// Outcomes matched against an in-flight request
    pub completed: u64,

    /// Outcomes whose generation no longer matched the in-flight request
    pub stale: u64,
}

/// What one `schedule` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleReport {
    /// Tile chosen as best and considered first
    pub best: TileId,
    pub submitted: usize,
    pub suppressed: usize,
}

/// Decode scheduler with per-tile duplicate suppression
///
/// # Example
///
/// ```
/// use docview_scheduler::{
///     DecodeBackend, DecodeCandidate, DecodeRequest, DecodeScheduler, PageRange, TileId,
///     ViewRect, ViewState,
/// };
/// use docview_cache::Generation;
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Recorder(Mutex<Vec<TileId>>);
///
/// impl DecodeBackend for Recorder {
///     fn submit(&self, request: DecodeRequest) {
///         self.0.lock().unwrap().push(request.tile);
///     }
/// }
///
/// let backend = Arc::new(Recorder::default());
/// let mut scheduler = DecodeScheduler::new(backend.clone());
///
/// let view = ViewState::probe(1.0, ViewRect::new(0.0, 0.0, 800.0, 600.0), Generation::new(0))
///     .with_visible(PageRange::new(0, 0), 1, 1);
/// let far = DecodeCandidate::new(TileId::new(0, 1, 1, 1), ViewRect::new(700.0, 500.0, 100.0, 100.0));
/// let near = DecodeCandidate::new(TileId::new(0, 1, 0, 0), ViewRect::new(350.0, 250.0, 100.0, 100.0));
///
/// scheduler.schedule(&view, vec![far, near]).unwrap();
/// assert_eq!(backend.0.lock().unwrap()[0], near.tile);
/// ```
pub struct DecodeScheduler {
    backend: Arc<dyn DecodeBackend>,
    in_flight: HashMap<TileId, Generation>,
    stats: SchedulerStats,
}

impl DecodeScheduler {
    pub fn new(backend: Arc<dyn DecodeBackend>) -> Self {
        Self {
            backend,
            in_flight: HashMap::new(),
            stats: SchedulerStats::default(),
        }
    }

    /// Submit every candidate, best first
    ///
    /// # Errors
    /// [`ScheduleError::EmptyCandidates`] if `candidates` is empty.
    pub fn schedule(
        &mut self,
        view: &ViewState,
        candidates: Vec<DecodeCandidate>,
    ) -> Result<ScheduleReport, ScheduleError> {
        let best_index = best_candidate(view, &candidates).ok_or(ScheduleError::EmptyCandidates)?;
        let best = candidates[best_index];

        let mut submitted = 0;
        let mut suppressed = 0;

        let rest = candidates
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != best_index)
            .map(|(_, candidate)| candidate);

        for candidate in std::iter::once(&best).chain(rest) {
            if self.submit(view, candidate) {
                submitted += 1;
            } else {
                suppressed += 1;
            }
        }

        debug!(
            best = ?best.tile,
            submitted,
            suppressed,
            generation = %view.generation(),
            "decode candidates scheduled"
        );

        Ok(ScheduleReport {
            best: best.tile,
            submitted,
            suppressed,
        })
    }

    fn submit(&mut self, view: &ViewState, candidate: &DecodeCandidate) -> bool {
        let generation = view.generation();
        if self.in_flight.get(&candidate.tile) == Some(&generation) {
            self.stats.suppressed += 1;
            trace!(tile = ?candidate.tile, "decode already in flight");
            return false;
        }

        self.in_flight.insert(candidate.tile, generation);
        self.stats.submitted += 1;
        self.backend
            .submit(DecodeRequest::from_candidate(view, candidate));
        true
    }

    /// Record that the backend finished `tile` for `generation`
    ///
    /// Returns `true` if this was the request currently in flight for the tile.
    /// Outcomes of superseded requests leave the newer in-flight entry intact.
    pub fn complete(&mut self, tile: TileId, generation: Generation) -> bool {
        match self.in_flight.get(&tile) {
            Some(current) if *current == generation => {
                self.in_flight.remove(&tile);
                self.stats.completed += 1;
                true
            }
            _ => {
                self.stats.stale += 1;
                false
            }
        }
    }

    /// Returns true if a request for `tile` at `generation` is outstanding
    pub fn is_in_flight(&self, tile: &TileId, generation: Generation) -> bool {
        self.in_flight.get(tile) == Some(&generation)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}
