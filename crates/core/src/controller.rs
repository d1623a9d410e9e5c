//! Viewport controller
//!
//! Owns the visible range and composes visibility search, tile collection,
//! reclaim and decode scheduling on every scroll, zoom, layout or settings
//! change. Everything here runs on the control thread.
//!
//! The controller starts uninitialized. The first layout, scroll or zoom
//! notification creates the pages, lays them out and shows the configured start
//! page; later notifications run their normal pass.

use std::sync::Arc;

use docview_cache::{BitmapContext, BitmapRef, MemoryConfig, RecycleBatch};
use docview_input::{
    GestureAction, GestureRouter, InputEvent, InputThrottle, KeyAction, KeyCode, KeyEvent,
};
use docview_scheduler::{
    union_of, DecodeBackend, DecodeCandidate, DecodeOutcome, DecodeRequest, DecodeScheduler,
    ViewRect, ViewState,
};
use tracing::{debug, trace, warn};

use crate::document::{DocumentModel, InvalidateSizeReason};
use crate::error::{check_page, check_zoom, ViewportResult};
use crate::reclaim::BitmapReclaimer;
use crate::settings::{PageAlign, ViewerSettings};
use crate::surface::{RenderSurface, ScrollLimits};
use crate::tile::TileNode;
use crate::visibility::{ContinuousScroll, PageVisibility, ScrollDirection, VisibilityScanner};
use crate::zoom::ZoomTransitionController;

/// Smallest zoom a pinch can reach
pub const MIN_ZOOM: f32 = 0.25;

/// Largest zoom a pinch can reach
pub const MAX_ZOOM: f32 = 16.0;

/// Lifecycle of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Initialized,
}

/// What one controller operation produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassReport {
    pub view: ViewState,

    /// Tiles that needed decoding
    pub decode_candidates: usize,

    /// Requests actually handed to the backend
    pub submitted: usize,

    /// Bitmaps returned to the pool
    pub recycled: usize,
}

impl PassReport {
    fn unchanged(view: ViewState) -> Self {
        Self {
            view,
            decode_candidates: 0,
            submitted: 0,
            recycled: 0,
        }
    }
}

/// Drives a document's pages from viewport changes and input
///
/// # Example
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use docview_cache::BitmapContext;
/// use docview_core::{
///     Document, PageSize, RenderSurface, ScrollDirection, ScrollLimits, ViewportController,
/// };
/// use docview_scheduler::{DecodeBackend, DecodeRequest, ViewRect, ViewState};
///
/// struct Screen(ViewRect);
///
/// impl RenderSurface for Screen {
///     fn viewport(&self) -> ViewRect { self.0 }
///     fn redraw(&mut self, _view: &ViewState) {}
///     fn invalidate_scroll(&mut self) {}
///     fn invalidate_scroll_for_zoom(&mut self, _new: f32, _old: f32) {}
///     fn scroll_by(&mut self, dx: f32, dy: f32) { self.0.x += dx; self.0.y += dy; }
///     fn scroll_to(&mut self, x: f32, y: f32) { self.0.x = x; self.0.y = y; }
///     fn start_fling(&mut self, _vx: f32, _vy: f32, _limits: ScrollLimits) {}
///     fn force_finish_scroll(&mut self) {}
///     fn toggle_zoom_controls(&mut self) {}
/// }
///
/// #[derive(Default)]
/// struct Queue(Mutex<Vec<DecodeRequest>>);
///
/// impl DecodeBackend for Queue {
///     fn submit(&self, request: DecodeRequest) {
///         self.0.lock().unwrap().push(request);
///     }
/// }
///
/// let backend = Arc::new(Queue::default());
/// let mut controller = ViewportController::new(
///     Document::uniform(10, PageSize::new(600.0, 800.0)),
///     Screen(ViewRect::new(0.0, 0.0, 600.0, 1000.0)),
///     backend.clone(),
///     BitmapContext::default(),
/// );
///
/// let report = controller.on_scroll(None, ScrollDirection::None).unwrap();
/// assert_eq!(report.view.first_visible(), 0);
/// assert_eq!(controller.last_visible_page(), 1);
/// assert!(!backend.0.lock().unwrap().is_empty());
/// ```
pub struct ViewportController<D: DocumentModel, S: RenderSurface> {
    document: D,
    surface: S,
    visibility: Box<dyn PageVisibility>,
    scanner: VisibilityScanner,
    scheduler: DecodeScheduler,
    reclaimer: BitmapReclaimer,
    zoom_control: ZoomTransitionController,
    gestures: GestureRouter,
    throttle: InputThrottle,
    settings: ViewerSettings,
    memory: MemoryConfig,
    state: ControllerState,
    zoom: f32,

    /// Last reported view
    view: ViewState,

    /// View the last decode pass ran for; differs from `view` during a zoom
    /// gesture
    settled: ViewState,
}

impl<D: DocumentModel, S: RenderSurface> ViewportController<D, S> {
    pub fn new(
        document: D,
        surface: S,
        backend: Arc<dyn DecodeBackend>,
        context: BitmapContext,
    ) -> Self {
        let zoom = 1.0;
        let view = ViewState::probe(zoom, surface.viewport(), context.generation());
        Self {
            document,
            surface,
            visibility: Box::new(ContinuousScroll),
            scanner: VisibilityScanner,
            scheduler: DecodeScheduler::new(backend),
            reclaimer: BitmapReclaimer::new(context),
            zoom_control: ZoomTransitionController::new(zoom),
            gestures: GestureRouter::new(),
            throttle: InputThrottle::default(),
            settings: ViewerSettings::default(),
            memory: MemoryConfig::default(),
            state: ControllerState::Uninitialized,
            zoom,
            view,
            settled: view,
        }
    }

    pub fn with_settings(mut self, settings: ViewerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.reclaimer
            .context()
            .pool()
            .set_memory_limit(memory.pool_limit_bytes());
        self.memory = memory;
        self
    }

    /// Viewer mode deciding which pages count as visible
    pub fn with_visibility(mut self, visibility: Box<dyn PageVisibility>) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_gesture_router(mut self, gestures: GestureRouter) -> Self {
        self.gestures = gestures;
        self
    }

    pub fn with_input_throttle(mut self, throttle: InputThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn memory_config(&self) -> MemoryConfig {
        self.memory
    }

    pub fn context(&self) -> &BitmapContext {
        self.reclaimer.context()
    }

    pub fn scheduler(&self) -> &DecodeScheduler {
        &self.scheduler
    }

    pub fn gestures_mut(&mut self) -> &mut GestureRouter {
        &mut self.gestures
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == ControllerState::Initialized
    }

    pub fn is_zooming(&self) -> bool {
        self.zoom_control.is_zooming()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub fn align(&self) -> PageAlign {
        self.settings.page_align
    }

    /// First visible page, `-1` when nothing is visible
    pub fn first_visible_page(&self) -> isize {
        self.view.first_visible()
    }

    /// Last visible page, `-1` when nothing is visible
    pub fn last_visible_page(&self) -> isize {
        self.view.last_visible()
    }

    /// The viewport moved
    ///
    /// `new_page` pivots the search on a known page; otherwise the previous
    /// range is re-anchored in `direction`. Suppressed while a zoom gesture is
    /// in progress.
    pub fn on_scroll(
        &mut self,
        new_page: Option<usize>,
        direction: ScrollDirection,
    ) -> ViewportResult<PassReport> {
        if !self.is_initialized() {
            return self.initialize();
        }
        if let Some(page) = new_page {
            check_page(page, self.document.page_count())?;
        }
        if self.zoom_control.is_zooming() {
            trace!("scroll during zoom gesture ignored");
            return Ok(PassReport::unchanged(self.view));
        }
        self.update_page_visibility(new_page, direction)
    }

    /// Zoom changed during a gesture
    ///
    /// Recomputes the visible range and redraws. Bitmaps are not invalidated
    /// and nothing is decoded until [`Self::on_zoom_commit`].
    pub fn on_zoom_delta(&mut self, new_zoom: f32) -> ViewportResult<PassReport> {
        let new_zoom = check_zoom(new_zoom)?;
        if !self.is_initialized() {
            return self.initialize();
        }

        self.zoom_control.begin(self.zoom);
        let old_zoom = self.zoom;
        self.zoom = new_zoom;
        self.surface.invalidate_scroll_for_zoom(new_zoom, old_zoom);

        let view = self.compute_view(None, ScrollDirection::None)?;
        self.view = view;
        self.surface.redraw(&view);
        trace!(zoom = new_zoom, "zoom delta");
        Ok(PassReport::unchanged(view))
    }

    /// Zoom gesture ended
    ///
    /// Invalidates bitmaps if the zoom differs from the gesture start, then
    /// collects tiles over the old and new cached ranges together.
    pub fn on_zoom_commit(&mut self) -> ViewportResult<PassReport> {
        if !self.is_initialized() {
            return self.initialize();
        }
        let commit = self.zoom_control.commit(self.zoom, self.reclaimer.context());
        self.zoom_pass(commit.start_zoom, RecycleBatch::new())
    }

    /// Surface layout changed
    ///
    /// A real, unlocked change recycles every tile, lays the pages out for
    /// `bounds` and redoes a full zoom pass at the current zoom.
    pub fn on_layout_changed(
        &mut self,
        changed: bool,
        locked: bool,
        bounds: ViewRect,
    ) -> ViewportResult<PassReport> {
        if !self.is_initialized() {
            return self.initialize();
        }
        if !changed || locked {
            return Ok(PassReport::unchanged(self.view));
        }
        self.relayout(InvalidateSizeReason::Layout, bounds.width, bounds.height)
    }

    /// Memory configuration changed
    ///
    /// Re-evaluates every page at the current zoom without invalidating
    /// bitmaps.
    pub fn on_memory_settings_changed(
        &mut self,
        memory: MemoryConfig,
    ) -> ViewportResult<PassReport> {
        self.reclaimer
            .context()
            .pool()
            .set_memory_limit(memory.pool_limit_bytes());
        self.memory = memory;
        if !self.is_initialized() {
            return self.initialize();
        }

        let view = self.compute_view(None, ScrollDirection::None)?;
        let mut decode = Vec::new();
        let mut recycle = self.reclaimer.collect(self.document.pages_mut(), &view);
        for page in self.document.pages_mut() {
            page.on_zoom_changed(0.0, &view, &mut decode, &mut recycle);
        }
        debug!(
            pages_in_memory = memory.pages_in_memory,
            pool_limit_mb = memory.pool_limit_mb,
            "memory settings applied"
        );
        self.finish_pass(view, decode, recycle)
    }

    /// Change the page-align mode and lay the pages out again
    pub fn set_align(&mut self, align: PageAlign) -> ViewportResult<PassReport> {
        self.settings.page_align = align;
        if !self.is_initialized() {
            return Ok(PassReport::unchanged(self.view));
        }
        let viewport = self.surface.viewport();
        self.relayout(InvalidateSizeReason::PageAlign, viewport.width, viewport.height)
    }

    /// Scroll to the top of page `index`
    pub fn go_to_page(&mut self, index: usize) -> ViewportResult<PassReport> {
        if !self.is_initialized() {
            self.initialize()?;
        }
        check_page(index, self.document.page_count())?;
        self.navigate(index)
    }

    /// Re-decode the given pages
    pub fn invalidate_pages(&mut self, indices: &[usize]) -> ViewportResult<PassReport> {
        if !self.is_initialized() {
            return self.initialize();
        }
        let page_count = self.document.page_count();
        for &index in indices {
            check_page(index, page_count)?;
        }
        let Some(&pivot) = indices.first() else {
            return Ok(PassReport::unchanged(self.view));
        };

        let view = self.compute_view(Some(pivot), ScrollDirection::None)?;
        let mut decode = Vec::new();
        let mut recycle = RecycleBatch::new();
        let pages = self.document.pages_mut();
        for &index in indices {
            let page = &mut pages[index];
            page.tiles_mut().recycle_all(&mut recycle);
            page.on_position_changed(&view, &mut decode, &mut recycle);
        }
        debug!(pages = indices.len(), "pages invalidated");
        self.finish_pass(view, decode, recycle)
    }

    /// Feed a touch event through the throttle and gesture recognizers
    ///
    /// Returns whether the event was consumed. Coalesced move events count as
    /// consumed.
    pub fn dispatch_input_event(&mut self, event: &InputEvent) -> ViewportResult<bool> {
        if let Some(held) = self.throttle.flush_before(event) {
            self.route_event(&held)?;
        }
        if !self.throttle.admit(event) {
            return Ok(true);
        }
        self.route_event(event)
    }

    /// Enable or disable pinch zoom, committing a pinch that is in progress
    pub fn set_pinch_enabled(&mut self, enabled: bool) -> ViewportResult<()> {
        if let Some(action) = self.gestures.set_pinch_enabled(enabled) {
            self.apply_gesture(action)?;
        }
        Ok(())
    }

    /// Deliver time-driven gesture outcomes, such as a confirmed single tap
    pub fn poll_gestures(&mut self, now_ms: u64) -> ViewportResult<()> {
        for action in self.gestures.poll(now_ms) {
            self.apply_gesture(action)?;
        }
        Ok(())
    }

    /// Handle a hardware key; returns whether it was consumed
    pub fn dispatch_key_event(&mut self, event: KeyEvent) -> ViewportResult<bool> {
        let height = self.surface.viewport().height;
        let paged = height * self.settings.scroll_fraction();
        let dy = match event.code {
            KeyCode::DpadUp => -height,
            KeyCode::DpadDown => height,
            KeyCode::VolumeUp => -paged,
            KeyCode::VolumeDown => paged,
            KeyCode::Other(_) => return Ok(false),
        };
        if event.action == KeyAction::Down {
            self.scroll_by(0.0, dy)?;
        }
        Ok(true)
    }

    /// Install a decoded bitmap
    ///
    /// The bitmap is installed only if its generation is still current and its
    /// tile is still waiting for it; otherwise it goes back to the pool.
    /// Returns whether it was installed.
    pub fn on_decode_complete(&mut self, outcome: DecodeOutcome) -> bool {
        let DecodeOutcome { request, bitmap } = outcome;
        self.scheduler.complete(request.tile, request.generation);

        let Some(bitmap) = bitmap else {
            warn!(tile = ?request.tile, "tile decode failed");
            if let Some(node) = self.tile_mut(request) {
                node.abort_decode(request.generation);
            }
            return false;
        };

        let bitmap = BitmapRef::new(bitmap, request.generation);
        let current = self.reclaimer.context().generation();
        let rejected = if request.generation != current {
            debug!(
                tile = ?request.tile,
                generation = %request.generation,
                current = %current,
                "stale decode dropped"
            );
            Some(bitmap)
        } else {
            match self.tile_mut(request) {
                Some(node) => node.install(bitmap).err(),
                None => Some(bitmap),
            }
        };

        match rejected {
            Some(bitmap) => {
                let mut batch = RecycleBatch::new();
                batch.push_ref(bitmap);
                self.reclaimer.release(batch);
                false
            }
            None => {
                self.surface.redraw(&self.view);
                true
            }
        }
    }

    fn route_event(&mut self, event: &InputEvent) -> ViewportResult<bool> {
        let dispatch = self.gestures.dispatch(event);
        for action in dispatch.actions {
            self.apply_gesture(action)?;
        }
        Ok(dispatch.consumed)
    }

    fn tile_mut(&mut self, request: DecodeRequest) -> Option<&mut TileNode> {
        self.document
            .pages_mut()
            .get_mut(request.tile.page)?
            .tiles_mut()
            .get_mut(request.tile)
    }

    fn initialize(&mut self) -> ViewportResult<PassReport> {
        self.document.init_pages();
        let viewport = self.surface.viewport();
        self.document.invalidate_page_sizes(
            InvalidateSizeReason::Init,
            self.settings.page_align,
            viewport.width,
            viewport.height,
        );
        self.surface.invalidate_scroll();
        self.state = ControllerState::Initialized;

        let page_count = self.document.page_count();
        debug!(pages = page_count, "viewport initialized");
        if page_count == 0 {
            return self.update_page_visibility(None, ScrollDirection::None);
        }

        let start = if self.settings.current_page < page_count {
            self.settings.current_page
        } else {
            0
        };
        self.navigate(start)
    }

    fn navigate(&mut self, index: usize) -> ViewportResult<PassReport> {
        let top = self.document.pages()[index].bounds_at(self.zoom).y;
        let x = self.surface.viewport().x;
        self.surface.scroll_to(x, top);
        self.update_page_visibility(Some(index), ScrollDirection::None)
    }

    fn compute_view(
        &self,
        pivot: Option<usize>,
        direction: ScrollDirection,
    ) -> ViewportResult<ViewState> {
        let probe = ViewState::probe(
            self.zoom,
            self.surface.viewport(),
            self.reclaimer.context().generation(),
        );
        let visible = self.scanner.scan_pages(
            self.document.pages(),
            self.visibility.as_ref(),
            &probe,
            pivot,
            direction,
            self.view.visible(),
        )?;
        Ok(probe.with_visible(
            visible,
            self.memory.pages_in_memory,
            self.document.page_count(),
        ))
    }

    fn update_page_visibility(
        &mut self,
        pivot: Option<usize>,
        direction: ScrollDirection,
    ) -> ViewportResult<PassReport> {
        let view = self.compute_view(pivot, direction)?;
        let mut decode = Vec::new();
        let mut recycle = self.reclaimer.collect(self.document.pages_mut(), &view);
        for page in self.document.pages_mut() {
            page.on_position_changed(&view, &mut decode, &mut recycle);
        }
        debug!(
            first = view.first_visible(),
            last = view.last_visible(),
            ?direction,
            "page visibility updated"
        );
        self.finish_pass(view, decode, recycle)
    }

    /// Zoom pass over the union of the settled and new cached ranges
    fn zoom_pass(&mut self, old_zoom: f32, mut recycle: RecycleBatch) -> ViewportResult<PassReport> {
        let view = self.compute_view(None, ScrollDirection::None)?;
        let mut decode = Vec::new();
        recycle.append(&mut self.reclaimer.collect(self.document.pages_mut(), &view));
        if let Some(range) = union_of(&[self.settled.cached(), view.cached()]) {
            let pages = self.document.pages_mut();
            for index in range.indices() {
                if let Some(page) = pages.get_mut(index) {
                    page.on_zoom_changed(old_zoom, &view, &mut decode, &mut recycle);
                }
            }
        }
        debug!(
            old_zoom,
            zoom = view.zoom(),
            generation = %view.generation(),
            first = view.first_visible(),
            last = view.last_visible(),
            "zoom pass"
        );
        self.finish_pass(view, decode, recycle)
    }

    fn relayout(
        &mut self,
        reason: InvalidateSizeReason,
        width: f32,
        height: f32,
    ) -> ViewportResult<PassReport> {
        let recycle = self.reclaimer.collect_all(self.document.pages_mut());
        self.document
            .invalidate_page_sizes(reason, self.settings.page_align, width, height);
        self.surface.invalidate_scroll();

        self.zoom_control.reset_baseline(0.0);
        let commit = self.zoom_control.commit(self.zoom, self.reclaimer.context());
        self.zoom_pass(commit.start_zoom, recycle)
    }

    /// Release recycled bitmaps, submit decodes best first and redraw
    fn finish_pass(
        &mut self,
        view: ViewState,
        decode: Vec<DecodeCandidate>,
        recycle: RecycleBatch,
    ) -> ViewportResult<PassReport> {
        let recycled = self.reclaimer.release(recycle);
        let decode_candidates = decode.len();
        let submitted = if decode.is_empty() {
            0
        } else {
            self.scheduler.schedule(&view, decode)?.submitted
        };

        self.view = view;
        self.settled = view;
        self.surface.redraw(&view);

        Ok(PassReport {
            view,
            decode_candidates,
            submitted,
            recycled,
        })
    }

    fn apply_gesture(&mut self, action: GestureAction) -> ViewportResult<()> {
        match action {
            GestureAction::ForceFinishScroll => self.surface.force_finish_scroll(),
            GestureAction::Scroll { dx, dy } => {
                self.scroll_by(dx, dy)?;
            }
            GestureAction::Fling { vx, vy } => {
                let limits = self.scroll_limits();
                self.surface.start_fling(vx, vy, limits);
            }
            GestureAction::DoubleTap { .. } => {
                if self.settings.zoom_by_double_tap {
                    self.surface.toggle_zoom_controls();
                }
            }
            GestureAction::SingleTap { y, .. } => self.on_single_tap(y)?,
            GestureAction::ZoomScale { factor } => {
                let start = self.zoom_control.start_zoom().unwrap_or(self.zoom);
                self.on_zoom_delta((start * factor).clamp(MIN_ZOOM, MAX_ZOOM))?;
            }
            GestureAction::ZoomCommit => {
                self.on_zoom_commit()?;
            }
        }
        Ok(())
    }

    /// Taps in the top or bottom edge zone page the view up or down
    fn on_single_tap(&mut self, y: f32) -> ViewportResult<()> {
        if !self.settings.tap_scroll {
            return Ok(());
        }
        let height = self.surface.viewport().height;
        let edge = height * self.settings.edge_fraction();
        let paged = height * self.settings.scroll_fraction();
        if y < edge {
            self.scroll_by(0.0, -paged)?;
        } else if y > height - edge {
            self.scroll_by(0.0, paged)?;
        }
        Ok(())
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) -> ViewportResult<PassReport> {
        self.surface.scroll_by(dx, dy);
        let direction = ScrollDirection::from_sign(if dy != 0.0 { dy } else { dx });
        self.on_scroll(None, direction)
    }

    fn scroll_limits(&self) -> ScrollLimits {
        let content = self.document.total_bounds().scale(self.zoom);
        let viewport = self.surface.viewport();
        ScrollLimits::for_content(content, viewport.width, viewport.height)
    }
}
