//! Tuning constants shared by the visibility passes.
//!
//! Most of these are the defaults of [`crate::VisibilityConfig`]; the priority
//! weights and hidden-node attenuation values are fixed.

// =============================================================================
// LOD solver
// =============================================================================

/// Smallest LOD ever requested for a scored node.
pub const LOD_MIN: f32 = 0.001;

/// Desired points per projected pixel.
pub const DENSITY_FACTOR: f64 = 3.0;

/// Below this many points at `LOD_MIN`, a node is considered visually empty.
pub const MIN_VIABLE_POINTS: f64 = 32.0;

/// Points guaranteed to a node that would otherwise be visually empty.
pub const FLOOR_POINTS: f64 = 16.0;

/// Interior nodes shallower than this are descended without scoring.
pub const SCORE_MIN_DEPTH: u32 = 3;

/// Scored nodes with a smaller pixel footprint assign one LOD to their subtree.
pub const REFINE_PIXEL_AREA: f64 = 1000.0;

/// LOD below which a hidden node is scaled rather than capped.
pub const HIDDEN_LOD_KNEE: f32 = 0.4;

/// Scale applied to a hidden node's LOD below the knee.
pub const HIDDEN_LOD_SCALE: f32 = 0.01;

/// LOD assigned to a hidden node at or above the knee.
pub const HIDDEN_LOD_CAP: f32 = 0.05;

// =============================================================================
// Priority
// =============================================================================

/// Priority of a node whose center cannot be projected.
pub const MIN_PRIORITY: f32 = 0.001;

/// Screen bias: weight of the depth term.
pub const SCREEN_DEPTH_WEIGHT: f64 = 10.0;

/// Screen bias: weight of the center-distance term.
pub const SCREEN_CENTER_WEIGHT: f64 = 2.0;

/// Screen bias: multiplier for nodes outside the frustum.
pub const SCREEN_HIDDEN_SCALE: f32 = 0.2;

/// Near/Far bias: multiplier for nodes outside the frustum.
pub const DEPTH_HIDDEN_SCALE: f32 = 0.1;

/// Point bias: multiplier for nodes outside the frustum.
pub const POINT_HIDDEN_SCALE: f32 = 0.75;

// =============================================================================
// Budget & paging
// =============================================================================

/// Budget value meaning "no budget configured".
pub const NO_BUDGET: i64 = -1;

/// Largest factor a single budget rescale may apply.
pub const BUDGET_MAX_SCALE: f64 = 1.5;

/// Fraction of a voxel's full point count below which a shortfall is ignored.
pub const SHORTFALL_THRESHOLD: f64 = 0.004;

// =============================================================================
// Projection
// =============================================================================

/// Clip-space `w` at or below which a point counts as behind the eye.
pub const W_EPSILON: f64 = 1e-9;

/// Squared distance to the bias point at or below which a node sits on top
/// of it. Keeps `1 / distance²` inside `f32`.
pub const POINT_BIAS_EPSILON: f64 = 1e-12;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hidden_attenuation_is_discontinuous_at_knee() {
    // Just below the knee the scaled value is far smaller than the cap.
    assert!((HIDDEN_LOD_KNEE - f32::EPSILON) * HIDDEN_LOD_SCALE < HIDDEN_LOD_CAP);
  }

  #[test]
  fn test_floor_points_fit_under_viable_minimum() {
    assert!(FLOOR_POINTS < MIN_VIABLE_POINTS);
  }

  #[test]
  fn test_point_bias_epsilon_bounds_priority() {
    assert!((1.0 / POINT_BIAS_EPSILON) < f32::MAX as f64);
  }
}
