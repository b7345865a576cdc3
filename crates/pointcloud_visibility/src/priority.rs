//! Priority scorer: how urgently the pager should serve a node.

use glam::DVec3;

use crate::constants::{
  DEPTH_HIDDEN_SCALE, MIN_PRIORITY, POINT_BIAS_EPSILON, POINT_HIDDEN_SCALE, SCREEN_CENTER_WEIGHT,
  SCREEN_DEPTH_WEIGHT, SCREEN_HIDDEN_SCALE,
};
use crate::scene::DAabb3;
use crate::view::CloudView;

/// Importance strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BiasMode {
  /// Near and centered nodes first.
  #[default]
  ScreenCenter,
  /// Nodes close to the near plane first.
  Near,
  /// Nodes close to the far plane first.
  Far,
  /// Inverse squared distance to a world point.
  PointBiased,
}

/// Bias mode plus the optional world point used by [`BiasMode::PointBiased`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisibilityBias {
  pub mode: BiasMode,
  /// Falls back to the eye position when absent.
  pub point: Option<DVec3>,
}

impl VisibilityBias {
  pub fn new(mode: BiasMode, point: Option<DVec3>) -> Self {
    Self { mode, point }
  }
}

/// Priority of a node box (cloud-local) under `view`.
///
/// An unprojectable center gets [`MIN_PRIORITY`] whatever the mode.
pub fn compute_priority(
  view: &CloudView,
  bias: &VisibilityBias,
  eye_position: DVec3,
  extents: &DAabb3,
  visible: bool,
) -> f32 {
  let center = extents.center();
  let Some(ndc) = view.project(center) else {
    return MIN_PRIORITY;
  };
  match bias.mode {
    BiasMode::PointBiased => point_priority(
      view.to_world(center),
      bias.point.unwrap_or(eye_position),
      visible,
    ),
    mode => priority_from_ndc(mode, ndc, visible),
  }
}

/// Screen, near and far priorities from a projected center.
///
/// `PointBiased` has no NDC form and scores as `ScreenCenter` here.
pub fn priority_from_ndc(mode: BiasMode, ndc: DVec3, visible: bool) -> f32 {
  match mode {
    BiasMode::Near => {
      let priority = (1.0 - ndc.z).max(0.0) as f32;
      if visible {
        priority
      } else {
        priority * DEPTH_HIDDEN_SCALE
      }
    }
    BiasMode::Far => {
      let priority = ndc.z.max(0.0) as f32;
      if visible {
        priority
      } else {
        priority * DEPTH_HIDDEN_SCALE
      }
    }
    BiasMode::ScreenCenter | BiasMode::PointBiased => {
      let depth = (1.0 - ndc.z.clamp(0.0, 1.0)).powi(3);
      let off_center = (ndc.x * ndc.x + ndc.y * ndc.y).sqrt() / std::f64::consts::SQRT_2;
      let center = 1.0 - off_center.min(1.0);
      let priority = ((SCREEN_DEPTH_WEIGHT * depth + SCREEN_CENTER_WEIGHT * center)
        / (SCREEN_DEPTH_WEIGHT + SCREEN_CENTER_WEIGHT)) as f32;
      if visible {
        priority
      } else {
        priority * SCREEN_HIDDEN_SCALE
      }
    }
  }
}

/// `1 / distance²` to the bias point, 0 on top of it (within
/// [`POINT_BIAS_EPSILON`]).
pub fn point_priority(center: DVec3, bias_point: DVec3, visible: bool) -> f32 {
  let distance_squared = center.distance_squared(bias_point);
  let priority = if distance_squared > POINT_BIAS_EPSILON {
    (1.0 / distance_squared) as f32
  } else {
    0.0
  };
  if visible {
    priority
  } else {
    priority * POINT_HIDDEN_SCALE
  }
}

#[cfg(test)]
mod tests {
  use glam::DAffine3;

  use super::*;
  use crate::stats::PriorityBounds;
  use crate::test_utils::default_camera;
  use crate::view::ViewContext;

  fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-6
  }

  #[test]
  fn test_near_bias() {
    let ndc = DVec3::new(0.2, -0.4, 0.3);
    assert!(close(priority_from_ndc(BiasMode::Near, ndc, true), 0.7));
    assert!(close(priority_from_ndc(BiasMode::Near, ndc, false), 0.07));
  }

  #[test]
  fn test_far_bias() {
    let ndc = DVec3::new(0.0, 0.0, 0.3);
    assert!(close(priority_from_ndc(BiasMode::Far, ndc, true), 0.3));
    assert!(close(priority_from_ndc(BiasMode::Far, ndc, false), 0.03));
    assert_eq!(priority_from_ndc(BiasMode::Far, DVec3::new(0.0, 0.0, -0.5), true), 0.0);
  }

  #[test]
  fn test_screen_bias_center_and_corner() {
    let center = priority_from_ndc(BiasMode::ScreenCenter, DVec3::ZERO, true);
    assert!(close(center, 1.0));

    // Depth weight 0, corner of the screen: nothing left.
    let corner = priority_from_ndc(BiasMode::ScreenCenter, DVec3::new(1.0, 1.0, 1.0), true);
    assert!(close(corner, 0.0));

    let hidden = priority_from_ndc(BiasMode::ScreenCenter, DVec3::ZERO, false);
    assert!(close(hidden, 0.2));
  }

  /// Depth dominates the center term 10:2.
  #[test]
  fn test_screen_bias_weights() {
    let z = 0.5;
    let expected = (10.0 * 0.125 + 2.0 * 1.0) / 12.0;
    let priority = priority_from_ndc(BiasMode::ScreenCenter, DVec3::new(0.0, 0.0, z), true);
    assert!(close(priority, expected as f32));
  }

  #[test]
  fn test_point_bias() {
    assert!(close(point_priority(DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO, true), 0.25));
    assert!(close(point_priority(DVec3::new(2.0, 0.0, 0.0), DVec3::ZERO, false), 0.1875));
    assert_eq!(point_priority(DVec3::ONE, DVec3::ONE, true), 0.0);
  }

  /// A center a hair off the bias point scores like one on top of it
  /// instead of overflowing `f32`.
  #[test]
  fn test_point_bias_near_zero_distance() {
    let center = DVec3::new(1e-30, 0.0, 0.0);
    assert_eq!(point_priority(center, DVec3::ZERO, true), 0.0);
    assert_eq!(point_priority(center, DVec3::ZERO, false), 0.0);

    let just_outside = DVec3::new(2e-6, 0.0, 0.0);
    assert!(point_priority(just_outside, DVec3::ZERO, true).is_finite());

    let mut bounds = PriorityBounds::EMPTY;
    bounds.include(point_priority(center, DVec3::ZERO, true));
    bounds.include(0.5);
    assert!(bounds.max.is_finite());
    assert!((bounds.normalize(0.25) - 0.5).abs() < 1e-6);
  }

  #[test]
  fn test_unprojectable_gets_minimum() {
    let view = CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY);
    let behind = DAabb3::from_center_half_extents(DVec3::new(0.0, 0.0, 5.0), DVec3::ONE);
    for mode in [BiasMode::ScreenCenter, BiasMode::Near, BiasMode::Far, BiasMode::PointBiased] {
      let bias = VisibilityBias::new(mode, None);
      assert_eq!(compute_priority(&view, &bias, DVec3::ZERO, &behind, true), MIN_PRIORITY);
    }
  }

  /// Without a bias point the eye is used.
  #[test]
  fn test_point_bias_defaults_to_eye() {
    let view = CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY);
    let ahead = DAabb3::from_center_half_extents(DVec3::new(0.0, 0.0, -10.0), DVec3::ONE);
    let bias = VisibilityBias::new(BiasMode::PointBiased, None);
    assert!(close(compute_priority(&view, &bias, DVec3::ZERO, &ahead, true), 0.01));

    let pinned = VisibilityBias::new(BiasMode::PointBiased, Some(DVec3::new(0.0, 0.0, -12.0)));
    assert!(close(compute_priority(&view, &pinned, DVec3::ZERO, &ahead, true), 0.25));
  }
}
