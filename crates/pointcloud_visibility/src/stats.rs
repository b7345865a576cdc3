//! Per-pass diagnostics published for HUD and telemetry readers.

/// Aggregate counters over the voxels that were in view after a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisibilityStats {
  /// Renderable leaves.
  pub visible_voxels: usize,
  pub min_lod: f32,
  pub max_lod: f32,
  pub avg_lod: f32,
  /// Sum of `full_point_count` over renderable leaves.
  pub full_points_in_view: u64,
  /// Sum of `requested_lod * full_point_count` over renderable leaves.
  pub lod_points_in_view: f64,
  /// Sum of leaf pixel areas.
  pub pixel_area: f64,
}

/// Builds a [`VisibilityStats`] one voxel at a time.
#[derive(Clone, Copy, Debug)]
pub struct StatsAccumulator {
  count: usize,
  min_lod: f32,
  max_lod: f32,
  lod_sum: f64,
  full_points: u64,
  lod_points: f64,
  pixel_area: f64,
}

impl StatsAccumulator {
  pub fn new() -> Self {
    Self {
      count: 0,
      min_lod: f32::INFINITY,
      max_lod: f32::NEG_INFINITY,
      lod_sum: 0.0,
      full_points: 0,
      lod_points: 0.0,
      pixel_area: 0.0,
    }
  }

  pub fn add(&mut self, lod: f32, full_point_count: u64, pixel_area: f64) {
    self.count += 1;
    self.min_lod = self.min_lod.min(lod);
    self.max_lod = self.max_lod.max(lod);
    self.lod_sum += lod as f64;
    self.full_points += full_point_count;
    self.lod_points += lod as f64 * full_point_count as f64;
    self.pixel_area += pixel_area;
  }

  /// Requested points accumulated so far.
  #[inline]
  pub fn lod_points(&self) -> f64 {
    self.lod_points
  }

  pub fn finish(&self) -> VisibilityStats {
    if self.count == 0 {
      return VisibilityStats::default();
    }
    VisibilityStats {
      visible_voxels: self.count,
      min_lod: self.min_lod,
      max_lod: self.max_lod,
      avg_lod: (self.lod_sum / self.count as f64) as f32,
      full_points_in_view: self.full_points,
      lod_points_in_view: self.lod_points,
      pixel_area: self.pixel_area,
    }
  }
}

impl Default for StatsAccumulator {
  fn default() -> Self {
    Self::new()
  }
}

/// Observed priority range of one pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriorityBounds {
  pub min: f32,
  pub max: f32,
}

impl PriorityBounds {
  /// No priority observed.
  pub const EMPTY: Self = Self {
    min: f32::INFINITY,
    max: f32::NEG_INFINITY,
  };

  #[inline]
  pub fn include(&mut self, priority: f32) {
    self.min = self.min.min(priority);
    self.max = self.max.max(priority);
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.min > self.max
  }

  /// Map a priority into `[0, 1]` within the bounds.
  pub fn normalize(&self, priority: f32) -> f32 {
    let range = self.max - self.min;
    if self.is_empty() || range <= 0.0 {
      return 1.0;
    }
    ((priority - self.min) / range).clamp(0.0, 1.0)
  }
}

impl Default for PriorityBounds {
  fn default() -> Self {
    Self::EMPTY
  }
}
