//! Projected-area approximators.
//!
//! Both estimators are upper bounds on the pixels covered by a node's box and
//! grow as the box grows or nears the camera.

use glam::{DVec2, DVec4};
use smallvec::SmallVec;

use super::CloudView;
use crate::config::AreaApproximation;
use crate::constants::W_EPSILON;
use crate::scene::DAabb3;

/// Estimated pixel footprint of `extents` (cloud-local) under `view`.
///
/// 0 for a point-sized box or one entirely behind the eye. A box crossing the
/// eye plane has no finite projection and is given the whole viewport.
pub fn pixel_area(view: &CloudView, extents: &DAabb3, mode: AreaApproximation) -> f64 {
  if extents.size().max_element() <= 0.0 {
    return 0.0;
  }

  let clip: [DVec4; 8] = extents.corners().map(|corner| view.clip_position(corner));
  let in_front = clip.iter().filter(|c| c.w > W_EPSILON).count();
  let viewport_area = view.viewport().area();
  if in_front == 0 {
    return 0.0;
  }
  if in_front < clip.len() {
    return viewport_area;
  }

  let pixels = clip.map(|c| view.ndc_to_pixel(c.truncate() / c.w));
  match mode {
    AreaApproximation::BoundingRect => bounding_rect_area(view, &pixels),
    AreaApproximation::ConvexHull => convex_hull_area(&pixels).min(viewport_area),
  }
}

fn bounding_rect_area(view: &CloudView, pixels: &[DVec2; 8]) -> f64 {
  let (min, max) = pixels[1..]
    .iter()
    .fold((pixels[0], pixels[0]), |(min, max), &p| (min.min(p), max.max(p)));

  let viewport = view.viewport();
  let lo = DVec2::new(viewport.x, viewport.y);
  let hi = lo + DVec2::new(viewport.width, viewport.height);
  let size = (max.min(hi) - min.max(lo)).max(DVec2::ZERO);
  size.x * size.y
}

/// Monotone-chain hull, shoelace area.
fn convex_hull_area(pixels: &[DVec2; 8]) -> f64 {
  let mut points: SmallVec<[DVec2; 8]> = pixels.iter().copied().collect();
  points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
  points.dedup();
  if points.len() < 3 {
    return 0.0;
  }

  let turn = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);
  let mut hull: SmallVec<[DVec2; 16]> = SmallVec::new();

  for &p in &points {
    while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
      hull.pop();
    }
    hull.push(p);
  }
  let lower_len = hull.len() + 1;
  for &p in points.iter().rev().skip(1) {
    while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
      hull.pop();
    }
    hull.push(p);
  }
  hull.pop();

  let doubled: f64 = (0..hull.len())
    .map(|i| hull[i].perp_dot(hull[(i + 1) % hull.len()]))
    .sum();
  doubled.abs() * 0.5
}

#[cfg(test)]
mod tests {
  use glam::{DAffine3, DVec3};

  use super::*;
  use crate::test_utils::{camera_at, default_camera};
  use crate::view::ViewContext;

  fn identity_view() -> CloudView {
    CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY)
  }

  fn cube(center: DVec3, half: f64) -> DAabb3 {
    DAabb3::from_center_half_extents(center, DVec3::splat(half))
  }

  #[test]
  fn test_zero_extent_is_zero() {
    let point = DAabb3::new(DVec3::new(0.0, 0.0, -5.0), DVec3::new(0.0, 0.0, -5.0));
    assert_eq!(pixel_area(&identity_view(), &point, AreaApproximation::BoundingRect), 0.0);
  }

  #[test]
  fn test_behind_eye_is_zero() {
    let aabb = cube(DVec3::new(0.0, 0.0, 10.0), 1.0);
    for mode in [AreaApproximation::BoundingRect, AreaApproximation::ConvexHull] {
      assert_eq!(pixel_area(&identity_view(), &aabb, mode), 0.0);
    }
  }

  #[test]
  fn test_straddling_eye_is_viewport() {
    let aabb = cube(DVec3::ZERO, 1.0);
    assert_eq!(
      pixel_area(&identity_view(), &aabb, AreaApproximation::BoundingRect),
      800.0 * 600.0
    );
  }

  /// Closer boxes never cover fewer pixels.
  #[test]
  fn test_monotonic_in_distance() {
    for mode in [AreaApproximation::BoundingRect, AreaApproximation::ConvexHull] {
      let mut previous = 0.0;
      for depth in [400.0, 200.0, 100.0, 50.0, 20.0, 10.0, 5.0] {
        let area = pixel_area(&identity_view(), &cube(DVec3::new(0.0, 0.0, -depth), 1.0), mode);
        assert!(area >= previous, "{mode:?}: area shrank at depth {depth}");
        previous = area;
      }
    }
  }

  #[test]
  fn test_monotonic_in_size() {
    let mut previous = 0.0;
    for half in [0.1, 0.5, 1.0, 2.0, 4.0] {
      let area = pixel_area(
        &identity_view(),
        &cube(DVec3::new(0.0, 0.0, -50.0), half),
        AreaApproximation::BoundingRect,
      );
      assert!(area > previous);
      previous = area;
    }
  }

  /// Hull never exceeds the enclosing rectangle.
  #[test]
  fn test_hull_within_rect() {
    let view = CloudView::new(
      &ViewContext::new(camera_at(DVec3::new(3.0, 4.0, 5.0), DVec3::new(0.0, 0.0, -20.0))),
      DAffine3::IDENTITY,
    );
    let aabb = cube(DVec3::new(0.0, 0.0, -20.0), 2.0);
    let rect = pixel_area(&view, &aabb, AreaApproximation::BoundingRect);
    let hull = pixel_area(&view, &aabb, AreaApproximation::ConvexHull);
    assert!(hull > 0.0);
    assert!(hull <= rect + 1e-6, "hull {hull} > rect {rect}");
  }

  #[test]
  fn test_hull_of_square() {
    let mut pixels = [DVec2::ZERO; 8];
    pixels[1] = DVec2::new(10.0, 0.0);
    pixels[2] = DVec2::new(10.0, 10.0);
    pixels[3] = DVec2::new(0.0, 10.0);
    pixels[4] = DVec2::new(5.0, 5.0);
    assert!((convex_hull_area(&pixels) - 100.0).abs() < 1e-9);
  }

  /// Face-on cube at depth 10: 2 units across at tan(45) = 1 spans 60 pixels
  /// vertically, then the back face is smaller, so the rect is the front face.
  #[test]
  fn test_face_on_rect_size() {
    let aabb = DAabb3::new(DVec3::new(-1.0, -1.0, -12.0), DVec3::new(1.0, 1.0, -10.0));
    let area = pixel_area(&identity_view(), &aabb, AreaApproximation::BoundingRect);
    assert!((area - 60.0 * 60.0).abs() < 1e-6, "area {area}");
  }
}
