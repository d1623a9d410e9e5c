//! Per-page quad-tree of tiles
//!
//! The root tile covers the whole page. Children are created on demand when a
//! deeper level is wanted, each covering one quarter of its parent.

use docview_cache::{BitmapRef, Generation, RecycleBatch};
use docview_scheduler::TileId;

/// Deepest quad-tree level (16 x 16 tiles per page)
pub const MAX_TILE_LEVEL: u8 = 4;

/// Tile level targeted at `zoom`: `floor(log2(zoom))` clamped to
/// `0..=MAX_TILE_LEVEL`
pub fn level_for_zoom(zoom: f32) -> u8 {
    if !zoom.is_finite() || zoom <= 1.0 {
        return 0;
    }
    (zoom.log2().floor() as u8).min(MAX_TILE_LEVEL)
}

/// Lifecycle of a tile's bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Never decoded
    Empty,
    /// Request outstanding for the given generation
    Decoding(Generation),
    /// Bitmap installed
    Decoded,
    /// Bitmap returned to the pool; decoded again when next wanted
    Recycled,
}

/// A node of the tile tree
#[derive(Debug)]
pub struct TileNode {
    id: TileId,
    state: TileState,
    bitmap: Option<BitmapRef>,
    children: Option<Box<[TileNode; 4]>>,
}

impl TileNode {
    pub fn new(id: TileId) -> Self {
        Self {
            id,
            state: TileState::Empty,
            bitmap: None,
            children: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    pub fn bitmap(&self) -> Option<&BitmapRef> {
        self.bitmap.as_ref()
    }

    pub fn children(&self) -> Option<&[TileNode; 4]> {
        self.children.as_deref()
    }

    /// Returns true if the tile must be (re)decoded for `generation`
    pub fn needs_decode(&self, generation: Generation) -> bool {
        match self.state {
            TileState::Empty | TileState::Recycled => true,
            TileState::Decoding(pending) => pending != generation,
            TileState::Decoded => self
                .bitmap
                .as_ref()
                .map_or(true, |bitmap| bitmap.generation() != generation),
        }
    }

    /// Returns true if the tile holds a bitmap or request older than
    /// `generation`
    pub fn is_stale(&self, generation: Generation) -> bool {
        match self.state {
            TileState::Decoding(pending) => pending.is_stale(generation),
            TileState::Decoded => self
                .bitmap
                .as_ref()
                .is_some_and(|bitmap| bitmap.generation().is_stale(generation)),
            TileState::Empty | TileState::Recycled => false,
        }
    }

    /// Mark the tile as decoding for `generation`, recycling any old bitmap
    pub fn begin_decode(&mut self, generation: Generation, recycle: &mut RecycleBatch) {
        if let Some(old) = self.bitmap.take() {
            recycle.push_ref(old);
        }
        self.state = TileState::Decoding(generation);
    }

    /// Install a decoded bitmap; only accepted while decoding for the bitmap's
    /// generation
    ///
    /// Returns the bitmap back if it was not accepted.
    pub fn install(&mut self, bitmap: BitmapRef) -> Result<(), BitmapRef> {
        if self.state != TileState::Decoding(bitmap.generation()) {
            return Err(bitmap);
        }
        self.bitmap = Some(bitmap);
        self.state = TileState::Decoded;
        Ok(())
    }

    /// Decode failed; the tile becomes eligible again on the next pass
    pub fn abort_decode(&mut self, generation: Generation) {
        if self.state == TileState::Decoding(generation) {
            self.state = TileState::Empty;
        }
    }

    /// Recycle this tile only
    pub fn recycle(&mut self, recycle: &mut RecycleBatch) {
        if let Some(bitmap) = self.bitmap.take() {
            recycle.push_ref(bitmap);
        }
        if self.state != TileState::Empty {
            self.state = TileState::Recycled;
        }
    }

    /// Recycle this tile and its whole subtree, dropping the children
    pub fn recycle_all(&mut self, recycle: &mut RecycleBatch) {
        self.recycle(recycle);
        if let Some(children) = self.children.take() {
            let children: [TileNode; 4] = *children;
            for mut child in children {
                child.recycle_all(recycle);
            }
        }
    }

    /// Children, created on first use
    fn split(&mut self) -> &mut [TileNode; 4] {
        let id = self.id;
        self.children.get_or_insert_with(|| {
            let child = |dx: u32, dy: u32| {
                TileNode::new(TileId::new(id.page, id.level + 1, id.x * 2 + dx, id.y * 2 + dy))
            };
            Box::new([child(0, 0), child(1, 0), child(0, 1), child(1, 1)])
        })
    }

    fn visit<F: FnMut(&TileNode)>(&self, f: &mut F) {
        f(self);
        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.visit(f);
            }
        }
    }

    fn visit_mut<F: FnMut(&mut TileNode)>(&mut self, f: &mut F) {
        f(self);
        if let Some(children) = self.children.as_deref_mut() {
            for child in children {
                child.visit_mut(f);
            }
        }
    }

    fn prune_below(&mut self, level: u8, recycle: &mut RecycleBatch) {
        if self.id.level >= level {
            if let Some(children) = self.children.take() {
                let children: [TileNode; 4] = *children;
                for mut child in children {
                    child.recycle_all(recycle);
                }
            }
            return;
        }
        if let Some(children) = self.children.as_deref_mut() {
            for child in children {
                child.prune_below(level, recycle);
            }
        }
    }
}

/// Tile tree of one page
#[derive(Debug)]
pub struct TileTree {
    root: TileNode,
}

impl TileTree {
    pub fn new(page: usize) -> Self {
        Self {
            root: TileNode::new(TileId::root(page)),
        }
    }

    pub fn root(&self) -> &TileNode {
        &self.root
    }

    /// Node for `id` if it exists
    pub fn get(&self, id: TileId) -> Option<&TileNode> {
        if id.page != self.root.id.page {
            return None;
        }
        let mut node = &self.root;
        for depth in 1..=id.level {
            let children = node.children.as_deref()?;
            node = &children[child_slot(id, depth)];
        }
        Some(node)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut TileNode> {
        if id.page != self.root.id.page {
            return None;
        }
        let mut node = &mut self.root;
        for depth in 1..=id.level {
            let children = node.children.as_deref_mut()?;
            node = &mut children[child_slot(id, depth)];
        }
        Some(node)
    }

    /// Node for `id`, splitting ancestors as needed
    ///
    /// `id` must belong to this tree's page and be at most [`MAX_TILE_LEVEL`].
    pub fn get_or_split(&mut self, id: TileId) -> &mut TileNode {
        let mut node = &mut self.root;
        for depth in 1..=id.level.min(MAX_TILE_LEVEL) {
            node = &mut node.split()[child_slot(id, depth)];
        }
        node
    }

    /// Recycle every tile and collapse the tree to its root
    pub fn recycle_all(&mut self, recycle: &mut RecycleBatch) {
        self.root.recycle_all(recycle);
    }

    /// Recycle tiles whose bitmap or request is older than `generation`,
    /// except those in `keep`
    pub fn recycle_stale(
        &mut self,
        generation: Generation,
        keep: &[TileId],
        recycle: &mut RecycleBatch,
    ) {
        self.root.visit_mut(&mut |node: &mut TileNode| {
            if node.is_stale(generation) && !keep.contains(&node.id) {
                node.recycle(recycle);
            }
        });
    }

    /// Recycle and drop every tile deeper than `level`
    pub fn prune_below(&mut self, level: u8, recycle: &mut RecycleBatch) {
        self.root.prune_below(level, recycle);
    }

    /// Number of nodes currently in the tree
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |_: &TileNode| count += 1);
        count
    }

    /// Number of tiles holding a bitmap
    pub fn decoded_count(&self) -> usize {
        let mut count = 0;
        self.root.visit(&mut |node: &TileNode| {
            if node.bitmap.is_some() {
                count += 1;
            }
        });
        count
    }
}

/// Child slot (0..4) taken at `depth` on the path from the root to `id`
fn child_slot(id: TileId, depth: u8) -> usize {
    let shift = id.level - depth;
    let cx = (id.x >> shift) & 1;
    let cy = (id.y >> shift) & 1;
    (cy * 2 + cx) as usize
}
