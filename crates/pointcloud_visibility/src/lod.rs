//! LOD solver: projected pixel area and point count to a resident fraction.

use crate::config::VisibilityConfig;
use crate::constants::{HIDDEN_LOD_CAP, HIDDEN_LOD_KNEE, HIDDEN_LOD_SCALE};
use crate::scene::Node;
use crate::view::{pixel_area, CloudView};

/// Result of scoring one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodEstimate {
  /// Requested fraction in `[0, 1]`.
  pub lod: f32,
  pub pixel_area: f64,
  /// Sum of leaf point counts under the node.
  pub full_point_count: u64,
}

/// Target density for `full_point_count` points covering `pixel_area` pixels.
///
/// Degenerate input (no area, NaN, no points) yields `lod_min`. Nodes whose
/// `lod_min` share would be fewer than `min_viable_points` get
/// `floor_points` instead, so they never render visually empty.
pub fn solve_lod(pixel_area: f64, full_point_count: u64, config: &VisibilityConfig) -> f32 {
  if pixel_area.is_nan() || pixel_area <= 0.0 || full_point_count == 0 {
    return config.lod_min;
  }

  let full = full_point_count as f64;
  let lod_min = config.lod_min as f64;
  let mut density = config.density_factor * pixel_area / full;
  if density < lod_min {
    density = if full * lod_min < config.min_viable_points {
      config.floor_points / full
    } else {
      lod_min
    };
  }
  density.min(1.0) as f32
}

/// Fade applied to nodes scored while not visible.
///
/// Discontinuous at the knee: just below it gives `0.4 * 0.01`, at it `0.05`.
#[inline]
pub fn attenuate_hidden(lod: f32) -> f32 {
  if lod < HIDDEN_LOD_KNEE {
    lod * HIDDEN_LOD_SCALE
  } else {
    HIDDEN_LOD_CAP
  }
}

/// Score `node` under `view`.
pub fn compute_lod(
  view: &CloudView,
  node: &Node,
  config: &VisibilityConfig,
  visible: bool,
) -> LodEstimate {
  let pixel_area = pixel_area(view, node.extents(), config.area_approximation);
  let full_point_count = node.full_point_count();
  let mut lod = solve_lod(pixel_area, full_point_count, config);
  if !visible {
    lod = attenuate_hidden(lod);
  }
  LodEstimate {
    lod,
    pixel_area,
    full_point_count,
  }
}

#[cfg(test)]
#[path = "lod_test.rs"]
mod lod_test;
