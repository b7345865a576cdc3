use glam::{DAffine3, DVec3};

use super::*;
use crate::scene::{Containment, DAabb3};
use crate::test_utils::{camera_at, default_camera};

#[test]
fn test_eye_position_is_origin_for_perspective() {
  let eye = DVec3::new(10.0, -3.0, 7.5);
  let context = ViewContext::new(camera_at(eye, DVec3::ZERO));
  assert!((context.eye_position() - eye).length() < 1e-9);
  assert_eq!(context.origin(), eye);
}

#[test]
fn test_project_center_of_screen() {
  let view = CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY);
  let ndc = view.project(DVec3::new(0.0, 0.0, -10.0)).expect("in front of eye");
  assert!(ndc.x.abs() < 1e-12 && ndc.y.abs() < 1e-12);
  assert!(ndc.z > 0.0 && ndc.z < 1.0);

  let pixel = view.ndc_to_pixel(ndc);
  assert!((pixel - DVec2::new(400.0, 300.0)).length() < 1e-9);
}

#[test]
fn test_project_behind_eye_is_none() {
  let view = CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY);
  assert!(view.project(DVec3::new(0.0, 0.0, 10.0)).is_none());
  assert!(view.project(DVec3::ZERO).is_none());
}

/// Depth grows with distance from the eye.
#[test]
fn test_ndc_depth_monotonic() {
  let view = CloudView::new(&ViewContext::new(default_camera()), DAffine3::IDENTITY);
  let near = view.project(DVec3::new(0.0, 0.0, -1.0)).map(|p| p.z);
  let far = view.project(DVec3::new(0.0, 0.0, -100.0)).map(|p| p.z);
  assert!(near < far);
}

/// A cloud placed far away by its transform is classified in local space.
#[test]
fn test_cloud_view_uses_transform() {
  let context = ViewContext::new(default_camera());
  let transform = DAffine3::from_translation(DVec3::new(0.0, 0.0, -50.0));
  let view = CloudView::new(&context, transform);

  let local = DAabb3::from_center_half_extents(DVec3::ZERO, DVec3::ONE);
  assert_eq!(view.frustum().classify(&local), Containment::Inside);
  let untransformed = CloudView::new(&context, DAffine3::IDENTITY);
  assert_eq!(untransformed.frustum().classify(&local), Containment::Intersects);
  assert_eq!(view.to_world(DVec3::ZERO), DVec3::new(0.0, 0.0, -50.0));
}

#[test]
fn test_viewport_area() {
  assert_eq!(Viewport::from_size(800.0, 600.0).area(), 480_000.0);
  assert_eq!(Viewport::new(10.0, 10.0, -5.0, 100.0).area(), 0.0);
}
