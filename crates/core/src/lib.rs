//! Document Viewer Core Library
//!
//! Viewport control for a paginated document viewer: which pages are visible,
//! which tiles to decode and in what order, which bitmaps to give back, and how
//! zoom gestures and layout changes invalidate what has been decoded.
//!
//! [`ViewportController`] is the entry point. It is driven from a single
//! control thread by scroll, zoom, layout and input notifications, and hands
//! decode requests to an asynchronous [`docview_scheduler::DecodeBackend`].

pub mod controller;
pub mod document;
pub mod error;
pub mod page;
pub mod reclaim;
pub mod settings;
pub mod surface;
pub mod tile;
pub mod visibility;
pub mod zoom;

pub use controller::{ControllerState, PassReport, ViewportController, MAX_ZOOM, MIN_ZOOM};
pub use document::{Document, DocumentModel, InvalidateSizeReason, PAGE_SPACING};
pub use error::{ViewportError, ViewportResult};
pub use page::{Page, PageSize};
pub use reclaim::BitmapReclaimer;
pub use settings::{PageAlign, ViewerSettings, MAX_EDGE_FRACTION};
pub use surface::{RenderSurface, ScrollLimits};
pub use tile::{level_for_zoom, TileNode, TileState, TileTree, MAX_TILE_LEVEL};
pub use visibility::{
    ContinuousScroll, PageVisibility, ScrollDirection, SinglePage, VisibilityScanner,
};
pub use zoom::{ZoomCommit, ZoomTransitionController, ZOOM_EPSILON};
