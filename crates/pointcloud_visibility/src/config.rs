//! VisibilityConfig - tunables for LOD scoring, budgeting and occlusion.

use crate::constants::{
  BUDGET_MAX_SCALE, DENSITY_FACTOR, FLOOR_POINTS, LOD_MIN, MIN_VIABLE_POINTS, REFINE_PIXEL_AREA,
  SCORE_MIN_DEPTH, SHORTFALL_THRESHOLD,
};
use crate::error::ConfigError;

/// How a node's screen footprint is estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AreaApproximation {
  /// Screen rectangle enclosing the 8 projected box corners, clipped to the
  /// viewport. Cheap.
  #[default]
  BoundingRect,
  /// Area of the convex hull of the projected corners, capped at the
  /// viewport area. Tighter for oblique boxes, costs a hull per node.
  ConvexHull,
}

/// Screen-space occlusion stage configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OcclusionConfig {
  /// Occlusion grid resolution relative to the viewport (0.25 = quarter res).
  pub factor: f64,
  /// Samples per requested point (`requested_lod * full_point_count`).
  pub sampling_factor: f64,
  /// Minimum samples per voxel (capped by resident points).
  pub min_samples: usize,
  /// Maximum samples per voxel.
  pub max_samples: usize,
}

impl OcclusionConfig {
  pub const DEFAULT: Self = Self {
    factor: 0.25,
    sampling_factor: 0.01,
    min_samples: 50,
    max_samples: 1024,
  };
}

impl Default for OcclusionConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Configuration for a [`crate::VisibilityEngine`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityConfig {
  /// Smallest LOD requested for a scored node.
  pub lod_min: f32,
  /// Desired points per projected pixel.
  pub density_factor: f64,
  /// Point count at `lod_min` under which a node counts as visually empty.
  pub min_viable_points: f64,
  /// Points guaranteed to an otherwise visually empty node.
  pub floor_points: f64,
  /// Interior nodes shallower than this are descended without scoring.
  pub score_min_depth: u32,
  /// Scored nodes below this pixel area assign one LOD to their subtree.
  pub refine_pixel_area: f64,
  /// Shortfalls under `threshold * full_point_count` are not reported.
  pub shortfall_threshold: f64,
  /// Upper bound of a single budget rescale factor.
  pub budget_max_scale: f64,
  /// Projected-area estimator.
  pub area_approximation: AreaApproximation,
  /// Occlusion stage; `None` disables it.
  pub occlusion: Option<OcclusionConfig>,
}

impl VisibilityConfig {
  /// Defaults matching the reference tuning.
  pub const DEFAULT: Self = Self {
    lod_min: LOD_MIN,
    density_factor: DENSITY_FACTOR,
    min_viable_points: MIN_VIABLE_POINTS,
    floor_points: FLOOR_POINTS,
    score_min_depth: SCORE_MIN_DEPTH,
    refine_pixel_area: REFINE_PIXEL_AREA,
    shortfall_threshold: SHORTFALL_THRESHOLD,
    budget_max_scale: BUDGET_MAX_SCALE,
    area_approximation: AreaApproximation::BoundingRect,
    occlusion: None,
  };

  /// Enable the occlusion stage.
  pub fn with_occlusion(mut self, occlusion: OcclusionConfig) -> Self {
    self.occlusion = Some(occlusion);
    self
  }

  /// Select the projected-area estimator.
  pub fn with_area_approximation(mut self, mode: AreaApproximation) -> Self {
    self.area_approximation = mode;
    self
  }

  /// Check every field for finiteness and range.
  pub fn validate(&self) -> Result<(), ConfigError> {
    check_range("lod_min", self.lod_min as f64, |v| v > 0.0 && v <= 1.0, "(0, 1]")?;
    check_range("density_factor", self.density_factor, |v| v > 0.0, "> 0")?;
    check_range("min_viable_points", self.min_viable_points, |v| v >= 0.0, ">= 0")?;
    check_range("floor_points", self.floor_points, |v| v >= 0.0, ">= 0")?;
    check_range("refine_pixel_area", self.refine_pixel_area, |v| v >= 0.0, ">= 0")?;
    check_range(
      "shortfall_threshold",
      self.shortfall_threshold,
      |v| (0.0..=1.0).contains(&v),
      "[0, 1]",
    )?;
    check_range("budget_max_scale", self.budget_max_scale, |v| v >= 1.0, ">= 1")?;

    if let Some(occlusion) = &self.occlusion {
      check_range("occlusion.factor", occlusion.factor, |v| v > 0.0 && v <= 1.0, "(0, 1]")?;
      check_range(
        "occlusion.sampling_factor",
        occlusion.sampling_factor,
        |v| v >= 0.0,
        ">= 0",
      )?;
      if occlusion.min_samples > occlusion.max_samples {
        return Err(ConfigError::SampleRange {
          min: occlusion.min_samples,
          max: occlusion.max_samples,
        });
      }
    }
    Ok(())
  }
}

impl Default for VisibilityConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

fn check_range(
  field: &'static str,
  value: f64,
  accept: impl Fn(f64) -> bool,
  expected: &'static str,
) -> Result<(), ConfigError> {
  if !value.is_finite() {
    return Err(ConfigError::NonFinite { field });
  }
  if !accept(value) {
    return Err(ConfigError::OutOfRange {
      field,
      value,
      expected,
    });
  }
  Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
