//! Octree nodes and leaf voxels.
//!
//! Flags live in an atomic byte so passes can mark subtrees without locks.
//! Per-voxel LOD state sits behind the voxel's own mutex; the lock is held
//! only around a read-modify-write, never across a recursive call.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use glam::DVec3;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard};

use super::bounds::DAabb3;
use super::graph::CloudId;

/// Per-node boolean flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeFlag {
  /// Inside the view frustum of its owning scene/cloud.
  Visible,
  /// Entirely removed by clip volumes.
  WholeClipped,
  /// Partially removed by clip volumes.
  PartClipped,
  /// Every sampled point hidden behind other voxels (occlusion stage).
  WholeHidden,
  /// Backing data unavailable to the pager.
  OutOfCore,
}

impl NodeFlag {
  #[inline]
  const fn bit(self) -> u8 {
    1 << self as u8
  }
}

/// Clip classification stored on a node.
///
/// Written as one atomic update so `WholeClipped` and `PartClipped` are never
/// observed together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClipState {
  Unclipped,
  Partial,
  Whole,
}

impl ClipState {
  #[inline]
  fn set_clear_bits(self) -> (u8, u8) {
    let whole = NodeFlag::WholeClipped.bit();
    let part = NodeFlag::PartClipped.bit();
    match self {
      ClipState::Unclipped => (0, whole | part),
      ClipState::Partial => (part, whole),
      ClipState::Whole => (whole, part),
    }
  }
}

/// Identifies a voxel within the whole forest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelKey {
  /// Owning cloud.
  pub cloud: CloudId,
  /// Leaf index within the cloud (pre-order).
  pub index: u32,
}

/// Clamp a LOD into `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp_lod(lod: f32) -> f32 {
  if lod.is_nan() {
    0.0
  } else {
    lod.clamp(0.0, 1.0)
  }
}

/// Mutable LOD state of a voxel, guarded by the voxel's mutex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VoxelLod {
  requested_lod: f32,
  priority: f32,
}

impl VoxelLod {
  /// Fraction of `full_point_count` desired resident.
  #[inline]
  pub fn requested_lod(&self) -> f32 {
    self.requested_lod
  }

  /// Set the requested LOD; always clamped into `[0, 1]`.
  #[inline]
  pub fn set_requested_lod(&mut self, lod: f32) {
    self.requested_lod = clamp_lod(lod);
  }

  #[inline]
  pub fn priority(&self) -> f32 {
    self.priority
  }

  #[inline]
  pub fn set_priority(&mut self, priority: f32) {
    self.priority = priority;
  }
}

/// Leaf payload: point counts owned by the pager plus engine-written LOD state.
#[derive(Debug)]
pub struct Voxel {
  key: VoxelKey,
  full_point_count: AtomicU64,
  lod_point_count: AtomicU64,
  /// Resident point positions in cloud-local space.
  resident: RwLock<Vec<DVec3>>,
  lod: Mutex<VoxelLod>,
}

impl Voxel {
  /// Create a voxel with nothing resident.
  pub fn new(key: VoxelKey, full_point_count: u64) -> Self {
    Self {
      key,
      full_point_count: AtomicU64::new(full_point_count),
      lod_point_count: AtomicU64::new(0),
      resident: RwLock::new(Vec::new()),
      lod: Mutex::new(VoxelLod::default()),
    }
  }

  #[inline]
  pub fn key(&self) -> VoxelKey {
    self.key
  }

  #[inline]
  pub fn index_in_cloud(&self) -> u32 {
    self.key.index
  }

  /// Points available on the backing store.
  #[inline]
  pub fn full_point_count(&self) -> u64 {
    self.full_point_count.load(Ordering::Relaxed)
  }

  /// Points currently resident in memory.
  #[inline]
  pub fn lod_point_count(&self) -> u64 {
    self.lod_point_count.load(Ordering::Relaxed)
  }

  /// Pager-side: update the backing-store point count.
  pub fn set_full_point_count(&self, count: u64) {
    self.full_point_count.store(count, Ordering::Relaxed);
  }

  /// Pager-side: update the resident count without touching samples.
  pub fn set_lod_point_count(&self, count: u64) {
    self.lod_point_count.store(count, Ordering::Relaxed);
  }

  /// Pager-side: replace the resident points; the resident count follows.
  pub fn set_resident_points(&self, points: Vec<DVec3>) {
    let count = points.len() as u64;
    *self.resident.write() = points;
    self.lod_point_count.store(count, Ordering::Relaxed);
  }

  /// Read access to the resident points (cloud-local).
  pub fn resident_points(&self) -> RwLockReadGuard<'_, Vec<DVec3>> {
    self.resident.read()
  }

  /// Exclusive access to the LOD state.
  #[inline]
  pub fn lock(&self) -> MutexGuard<'_, VoxelLod> {
    self.lod.lock()
  }

  /// Non-blocking exclusive access to the LOD state.
  #[inline]
  pub fn try_lock(&self) -> Option<MutexGuard<'_, VoxelLod>> {
    self.lod.try_lock()
  }

  /// Run a read-modify-write on the LOD state under the voxel lock.
  #[inline]
  pub fn update<R>(&self, f: impl FnOnce(&mut VoxelLod) -> R) -> R {
    let mut guard = self.lod.lock();
    f(&mut guard)
  }

  /// Snapshot of the LOD state.
  #[inline]
  pub fn lod(&self) -> VoxelLod {
    *self.lod.lock()
  }

  #[inline]
  pub fn requested_lod(&self) -> f32 {
    self.lod.lock().requested_lod()
  }

  #[inline]
  pub fn set_requested_lod(&self, lod: f32) {
    self.lod.lock().set_requested_lod(lod);
  }

  #[inline]
  pub fn priority(&self) -> f32 {
    self.lod.lock().priority()
  }

  /// Requested LOD expressed in points.
  #[inline]
  pub fn requested_points(&self) -> f64 {
    self.requested_lod() as f64 * self.full_point_count() as f64
  }
}

#[derive(Debug)]
enum NodeContent {
  Interior(Box<[Option<Node>; 8]>),
  Leaf(Arc<Voxel>),
}

/// Octree node: interior with up to 8 children, or a leaf holding a voxel.
#[derive(Debug)]
pub struct Node {
  extents: DAabb3,
  depth: u32,
  flags: AtomicU8,
  content: NodeContent,
}

impl Node {
  pub(crate) fn new_interior(extents: DAabb3, depth: u32, children: [Option<Node>; 8]) -> Self {
    Self {
      extents,
      depth,
      flags: AtomicU8::new(0),
      content: NodeContent::Interior(Box::new(children)),
    }
  }

  pub(crate) fn new_leaf(extents: DAabb3, depth: u32, voxel: Arc<Voxel>) -> Self {
    Self {
      extents,
      depth,
      flags: AtomicU8::new(0),
      content: NodeContent::Leaf(voxel),
    }
  }

  /// Bounds in the owning cloud's local frame.
  #[inline]
  pub fn extents(&self) -> &DAabb3 {
    &self.extents
  }

  /// Distance from the root (root = 0).
  #[inline]
  pub fn depth(&self) -> u32 {
    self.depth
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self.content, NodeContent::Leaf(_))
  }

  /// Child at `octant` (0-7), `None` for leaves and absent children.
  pub fn child(&self, octant: usize) -> Option<&Node> {
    match &self.content {
      NodeContent::Interior(children) => children.get(octant).and_then(Option::as_ref),
      NodeContent::Leaf(_) => None,
    }
  }

  /// Present children in octant order.
  pub fn children(&self) -> impl Iterator<Item = &Node> {
    let children: &[Option<Node>] = match &self.content {
      NodeContent::Interior(children) => &children[..],
      NodeContent::Leaf(_) => &[],
    };
    children.iter().flatten()
  }

  /// Leaf voxel, if this node is a leaf.
  #[inline]
  pub fn voxel(&self) -> Option<&Arc<Voxel>> {
    match &self.content {
      NodeContent::Leaf(voxel) => Some(voxel),
      NodeContent::Interior(_) => None,
    }
  }

  #[inline]
  pub fn flag(&self, flag: NodeFlag) -> bool {
    self.flags.load(Ordering::Relaxed) & flag.bit() != 0
  }

  /// Set or clear a flag, optionally on the whole subtree in one pass.
  ///
  /// Setting one clip flag clears the other.
  pub fn set_flag(&self, flag: NodeFlag, value: bool, recursive: bool) {
    let (set, clear) = match (flag, value) {
      (NodeFlag::WholeClipped, true) => ClipState::Whole.set_clear_bits(),
      (NodeFlag::PartClipped, true) => ClipState::Partial.set_clear_bits(),
      (_, true) => (flag.bit(), 0),
      (_, false) => (0, flag.bit()),
    };
    self.apply_bits(set, clear, recursive);
  }

  pub fn clip_state(&self) -> ClipState {
    if self.flag(NodeFlag::WholeClipped) {
      ClipState::Whole
    } else if self.flag(NodeFlag::PartClipped) {
      ClipState::Partial
    } else {
      ClipState::Unclipped
    }
  }

  pub fn set_clip_state(&self, state: ClipState, recursive: bool) {
    let (set, clear) = state.set_clear_bits();
    self.apply_bits(set, clear, recursive);
  }

  /// Visible and not wholly clipped.
  #[inline]
  pub fn is_renderable(&self) -> bool {
    let flags = self.flags.load(Ordering::Relaxed);
    flags & NodeFlag::Visible.bit() != 0 && flags & NodeFlag::WholeClipped.bit() == 0
  }

  fn apply_bits(&self, set: u8, clear: u8, recursive: bool) {
    let update = |node: &Node| {
      let _ = node
        .flags
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |f| Some((f & !clear) | set));
    };
    if recursive {
      self.for_each_node(&mut |node| update(node));
    } else {
      update(self);
    }
  }

  /// Pre-order visit of this node and every descendant.
  pub fn for_each_node<F: FnMut(&Node)>(&self, f: &mut F) {
    f(self);
    for child in self.children() {
      child.for_each_node(f);
    }
  }

  /// Visit every leaf reachable through renderable nodes only.
  pub fn for_each_renderable_leaf<F: FnMut(&Node, &Arc<Voxel>)>(&self, f: &mut F) {
    if !self.is_renderable() {
      return;
    }
    match &self.content {
      NodeContent::Leaf(voxel) => f(self, voxel),
      NodeContent::Interior(_) => {
        for child in self.children() {
          child.for_each_renderable_leaf(f);
        }
      }
    }
  }

  /// Set `Visible`, clear `WholeClipped` and `WholeHidden` in one update.
  pub(crate) fn show(&self, recursive: bool) {
    let set = NodeFlag::Visible.bit();
    let clear = NodeFlag::WholeClipped.bit() | NodeFlag::WholeHidden.bit();
    self.apply_bits(set, clear, recursive);
  }

  /// Mark the subtree not visible (nor occluded) and zero every voxel's
  /// requested LOD.
  pub fn hide_subtree(&self) {
    let clear = NodeFlag::Visible.bit() | NodeFlag::WholeHidden.bit();
    self.for_each_node(&mut |node| {
      let _ = node
        .flags
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |f| Some(f & !clear));
      if let Some(voxel) = node.voxel() {
        voxel.set_requested_lod(0.0);
      }
    });
  }

  /// Sum of leaf full point counts under this node.
  pub fn full_point_count(&self) -> u64 {
    match &self.content {
      NodeContent::Leaf(voxel) => voxel.full_point_count(),
      NodeContent::Interior(_) => self.children().map(Node::full_point_count).sum(),
    }
  }

  /// Number of leaves under this node.
  pub fn leaf_count(&self) -> usize {
    match &self.content {
      NodeContent::Leaf(_) => 1,
      NodeContent::Interior(_) => self.children().map(Node::leaf_count).sum(),
    }
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
