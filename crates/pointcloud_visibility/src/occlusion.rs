//! Coarse screen-space occlusion buffer.
//!
//! A downsampled grid of nearest depths, each tagged with the voxel that wrote
//! it. Filled from strided samples of every renderable leaf's resident points,
//! then queried with the same samples to find voxels hidden behind others.

use crate::config::OcclusionConfig;
use crate::scene::VoxelKey;

/// Nearest sample seen in one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OcclusionCell {
  /// NDC depth, smaller is nearer.
  pub z: f32,
  pub voxel: VoxelKey,
}

/// Per-pass nearest-depth grid.
#[derive(Clone, Debug)]
pub struct OcclusionFrame {
  width: usize,
  height: usize,
  factor: f64,
  cells: Vec<Option<OcclusionCell>>,
}

impl OcclusionFrame {
  /// Grid covering a `viewport_width` x `viewport_height` pixel viewport at
  /// `factor` resolution. At least one cell.
  pub fn new(viewport_width: f64, viewport_height: f64, factor: f64) -> Self {
    let (width, height) = grid_size(viewport_width, viewport_height, factor);
    Self {
      width,
      height,
      factor,
      cells: vec![None; width * height],
    }
  }

  /// Match a (possibly changed) viewport and clear every cell.
  pub fn resize(&mut self, viewport_width: f64, viewport_height: f64, factor: f64) {
    let (width, height) = grid_size(viewport_width, viewport_height, factor);
    if (width, height) != (self.width, self.height) {
      self.width = width;
      self.height = height;
      self.cells = vec![None; width * height];
    } else {
      self.clear();
    }
    self.factor = factor;
  }

  pub fn clear(&mut self) {
    self.cells.fill(None);
  }

  #[inline]
  pub fn width(&self) -> usize {
    self.width
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.height
  }

  #[inline]
  pub fn factor(&self) -> f64 {
    self.factor
  }

  /// Number of written cells.
  pub fn occupied(&self) -> usize {
    self.cells.iter().filter(|cell| cell.is_some()).count()
  }

  /// Cell under viewport pixel `(x, y)`; `None` when off-grid.
  fn index(&self, x: f64, y: f64) -> Option<usize> {
    let cx = (x * self.factor).floor();
    let cy = (y * self.factor).floor();
    if !(cx >= 0.0 && cy >= 0.0) {
      return None;
    }
    let (cx, cy) = (cx as usize, cy as usize);
    (cx < self.width && cy < self.height).then_some(cy * self.width + cx)
  }

  pub fn cell(&self, x: f64, y: f64) -> Option<OcclusionCell> {
    self.index(x, y).and_then(|i| self.cells[i])
  }

  /// Keep the nearer of the incumbent and `(z, voxel)`.
  ///
  /// Returns whether the cell was written. Off-grid samples are dropped.
  pub fn insert(&mut self, x: f64, y: f64, z: f32, voxel: VoxelKey) -> bool {
    let Some(index) = self.index(x, y) else {
      return false;
    };
    let cell = &mut self.cells[index];
    if matches!(cell, Some(incumbent) if incumbent.z <= z) {
      return false;
    }
    *cell = Some(OcclusionCell { z, voxel });
    true
  }

  /// The voxel hiding a sample at depth `z`, if the cell holds a nearer one.
  pub fn is_occluded(&self, x: f64, y: f64, z: f32) -> Option<VoxelKey> {
    self
      .cell(x, y)
      .filter(|incumbent| incumbent.z < z)
      .map(|incumbent| incumbent.voxel)
  }
}

fn grid_size(viewport_width: f64, viewport_height: f64, factor: f64) -> (usize, usize) {
  let cells = |pixels: f64| (pixels.max(0.0) * factor).ceil().max(1.0) as usize;
  (cells(viewport_width), cells(viewport_height))
}

/// Samples to draw from a voxel: proportional to its requested points, at
/// least `min_samples`, at most `max_samples`, never more than resident.
pub fn sample_count(
  config: &OcclusionConfig,
  requested_lod: f32,
  full_point_count: u64,
  resident: usize,
) -> usize {
  let wanted = requested_lod as f64 * full_point_count as f64 * config.sampling_factor;
  (wanted as usize)
    .max(config.min_samples)
    .min(config.max_samples)
    .min(resident)
}

/// `count` indices spread evenly over `0..resident`.
pub fn sample_indices(resident: usize, count: usize) -> impl Iterator<Item = usize> {
  let count = count.min(resident);
  (0..count).map(move |i| i * resident / count)
}

/// Outcome of one occlusion cull walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OcclusionStats {
  /// Leaves with at least one projected sample.
  pub voxels_tested: usize,
  /// Leaves whose samples were all hidden by other voxels.
  pub voxels_hidden: usize,
  pub samples_tested: usize,
  pub samples_occluded: usize,
}
