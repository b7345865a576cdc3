//! Six-plane frustum extracted from a clip-space matrix.
//!
//! Planes come from the Gribb-Hartmann row combinations for a `[0, 1]` depth
//! range (glam's `perspective_rh`). Normals point inward, so a point is on the
//! inner side of a plane when its signed distance is positive.

use glam::{DMat4, DVec3, DVec4};

use crate::scene::{Containment, DAabb3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  /// Left, right, bottom, top, near, far as `(normal, d)`.
  planes: [DVec4; 6],
}

impl Frustum {
  /// Extract planes in the space `matrix` maps from.
  pub fn from_matrix(matrix: &DMat4) -> Self {
    let r0 = matrix.row(0);
    let r1 = matrix.row(1);
    let r2 = matrix.row(2);
    let r3 = matrix.row(3);

    let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane);
    Self { planes }
  }

  #[inline]
  pub fn planes(&self) -> &[DVec4; 6] {
    &self.planes
  }

  #[inline]
  pub fn contains_point(&self, point: DVec3) -> bool {
    self.planes.iter().all(|plane| signed_distance(plane, point) >= 0.0)
  }

  /// Fast reject: `false` means the box is certainly outside.
  ///
  /// Tests only the corner furthest along each plane normal.
  pub fn in_frustum(&self, aabb: &DAabb3) -> bool {
    self.planes.iter().all(|plane| {
      let normal = plane.truncate();
      let positive = DVec3::select(normal.cmpge(DVec3::ZERO), aabb.max, aabb.min);
      signed_distance(plane, positive) >= 0.0
    })
  }

  /// Full 8-corner classification. Corners exactly on a plane count as
  /// neither side, so ties fall to `Intersects`.
  pub fn classify(&self, aabb: &DAabb3) -> Containment {
    let corners = aabb.corners();
    let mut all_inside = true;

    for plane in &self.planes {
      let mut outside = 0;
      let mut inside = 0;
      for &corner in &corners {
        let distance = signed_distance(plane, corner);
        if distance < 0.0 {
          outside += 1;
        } else if distance > 0.0 {
          inside += 1;
        }
      }
      if outside == corners.len() {
        return Containment::Outside;
      }
      if inside != corners.len() {
        all_inside = false;
      }
    }

    if all_inside {
      Containment::Inside
    } else {
      Containment::Intersects
    }
  }
}

#[inline]
fn signed_distance(plane: &DVec4, point: DVec3) -> f64 {
  plane.truncate().dot(point) + plane.w
}

fn normalize_plane(plane: DVec4) -> DVec4 {
  let length = plane.truncate().length();
  if length > 0.0 {
    plane / length
  } else {
    plane
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::default_camera;

  fn frustum() -> Frustum {
    Frustum::from_matrix(&default_camera().view_projection())
  }

  fn cube(center: DVec3, half: f64) -> DAabb3 {
    DAabb3::from_center_half_extents(center, DVec3::splat(half))
  }

  #[test]
  fn test_planes_normalized() {
    for plane in frustum().planes() {
      assert!((plane.truncate().length() - 1.0).abs() < 1e-12);
    }
  }

  #[test]
  fn test_box_ahead_inside() {
    let aabb = cube(DVec3::new(0.0, 0.0, -20.0), 1.0);
    assert!(frustum().in_frustum(&aabb));
    assert_eq!(frustum().classify(&aabb), Containment::Inside);
  }

  #[test]
  fn test_box_behind_outside() {
    let aabb = cube(DVec3::new(0.0, 0.0, 20.0), 1.0);
    assert!(!frustum().in_frustum(&aabb));
    assert_eq!(frustum().classify(&aabb), Containment::Outside);
  }

  /// 90 degree vertical fov: at depth 20 the top plane passes through y = 20.
  #[test]
  fn test_box_on_edge_intersects() {
    let aabb = cube(DVec3::new(0.0, 20.0, -20.0), 2.0);
    assert!(frustum().in_frustum(&aabb));
    assert_eq!(frustum().classify(&aabb), Containment::Intersects);
  }

  #[test]
  fn test_box_past_far_plane() {
    let aabb = cube(DVec3::new(0.0, 0.0, -5000.0), 1.0);
    assert!(!frustum().in_frustum(&aabb));
  }

  #[test]
  fn test_box_enclosing_camera_intersects() {
    let aabb = cube(DVec3::ZERO, 50.0);
    assert_eq!(frustum().classify(&aabb), Containment::Intersects);
  }

  #[test]
  fn test_contains_point() {
    assert!(frustum().contains_point(DVec3::new(0.0, 0.0, -10.0)));
    assert!(!frustum().contains_point(DVec3::new(0.0, 0.0, 10.0)));
  }

  /// Camera-relative origin keeps far-from-zero coordinates exact.
  #[test]
  fn test_far_origin() {
    use crate::test_utils::camera_at;

    let eye = DVec3::new(4.0e6, 5.0e6, 120.0);
    let view = camera_at(eye, eye + DVec3::NEG_Z);
    let frustum = Frustum::from_matrix(&view.view_projection());

    let ahead = cube(eye + DVec3::new(0.0, 0.0, -20.0), 1.0);
    let behind = cube(eye + DVec3::new(0.0, 0.0, 20.0), 1.0);
    assert_eq!(frustum.classify(&ahead), Containment::Inside);
    assert!(!frustum.in_frustum(&behind));
  }
}
