//! Document model: the ordered page sequence and its layout

use docview_scheduler::ViewRect;
use tracing::debug;

use crate::page::{Page, PageSize};
use crate::settings::PageAlign;

/// Vertical gap between laid-out pages, at zoom 1
pub const PAGE_SPACING: f32 = 8.0;

/// Why page sizes are being recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateSizeReason {
    Init,
    Layout,
    PageAlign,
}

/// Page sequence consumed by the viewport controller
pub trait DocumentModel {
    /// Create the page objects; called once before the first layout
    fn init_pages(&mut self);

    fn pages(&self) -> &[Page];

    fn pages_mut(&mut self) -> &mut [Page];

    /// Lay pages out again for a viewport of `view_width` x `view_height`
    fn invalidate_page_sizes(
        &mut self,
        reason: InvalidateSizeReason,
        align: PageAlign,
        view_width: f32,
        view_height: f32,
    );

    fn page_count(&self) -> usize {
        self.pages().len()
    }

    /// Rectangle enclosing every page at zoom 1
    fn total_bounds(&self) -> ViewRect {
        self.pages()
            .iter()
            .map(Page::bounds)
            .reduce(|acc, b| {
                let x = acc.x.min(b.x);
                let y = acc.y.min(b.y);
                ViewRect::new(x, y, acc.right().max(b.right()) - x, acc.bottom().max(b.bottom()) - y)
            })
            .unwrap_or_default()
    }
}

/// Document laid out as a vertical stack of pages
#[derive(Debug)]
pub struct Document {
    sizes: Vec<PageSize>,
    pages: Vec<Page>,
    spacing: f32,
}

impl Document {
    /// Document with the given natural page sizes; pages are created by
    /// [`DocumentModel::init_pages`]
    pub fn new(sizes: Vec<PageSize>) -> Self {
        Self {
            sizes,
            pages: Vec::new(),
            spacing: PAGE_SPACING,
        }
    }

    /// `count` pages of identical size
    pub fn uniform(count: usize, size: PageSize) -> Self {
        Self::new(vec![size; count])
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }
}

impl DocumentModel for Document {
    fn init_pages(&mut self) {
        self.pages = self
            .sizes
            .iter()
            .enumerate()
            .map(|(index, size)| Page::new(index, *size))
            .collect();
    }

    fn pages(&self) -> &[Page] {
        &self.pages
    }

    fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    fn invalidate_page_sizes(
        &mut self,
        reason: InvalidateSizeReason,
        align: PageAlign,
        view_width: f32,
        view_height: f32,
    ) {
        let mut y = 0.0;
        for page in &mut self.pages {
            let size = page.size();
            let scale = align.scale(size.width, size.height, view_width, view_height);
            let width = size.width * scale;
            let height = size.height * scale;
            let x = if view_width > width {
                (view_width - width) / 2.0
            } else {
                0.0
            };
            page.set_bounds(ViewRect::new(x, y, width, height));
            y += height + self.spacing;
        }
        debug!(
            ?reason,
            ?align,
            pages = self.pages.len(),
            view_width,
            view_height,
            "page sizes invalidated"
        );
    }
}
