//! Camera state consumed by every pass.
//!
//! [`ViewParameters`] are what the caller installs once per frame.
//! [`ViewContext`] is the engine's derived snapshot: the combined matrix and
//! eye position, rebuilt on every install and handed to each visitor
//! explicitly. [`CloudView`] re-expresses the context in one cloud's local
//! frame so node extents never need transforming.
//!
//! World coordinates are shifted by `origin` before the eye matrix is applied,
//! which keeps the numbers small near the camera for geo-referenced clouds.

pub mod area;
pub mod frustum;

use glam::{DAffine3, DMat4, DVec2, DVec3, DVec4};

pub use area::pixel_area;
pub use frustum::Frustum;

use crate::constants::W_EPSILON;
use crate::scene::PointCloud;

/// Screen rectangle in pixels. `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl Viewport {
  pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub fn from_size(width: f64, height: f64) -> Self {
    Self::new(0.0, 0.0, width, height)
  }

  /// Pixel area; 0 for degenerate sizes.
  #[inline]
  pub fn area(&self) -> f64 {
    self.width.max(0.0) * self.height.max(0.0)
  }
}

/// Per-frame camera input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewParameters {
  /// Eye to clip space, `[0, 1]` depth.
  pub projection: DMat4,
  /// Origin-relative world to eye space.
  pub eye: DMat4,
  /// Subtracted from world positions before `eye`.
  pub origin: DVec3,
  pub viewport: Viewport,
  /// `false` suspends passes until a camera is switched back on.
  pub camera_on: bool,
}

impl ViewParameters {
  /// Right-handed perspective camera looking from `eye` toward `target`.
  ///
  /// `origin` is set to `eye`.
  pub fn perspective(
    eye: DVec3,
    target: DVec3,
    up: DVec3,
    fov_y: f64,
    near: f64,
    far: f64,
    viewport: Viewport,
  ) -> Self {
    let aspect = if viewport.height > 0.0 {
      viewport.width / viewport.height
    } else {
      1.0
    };
    Self {
      projection: DMat4::perspective_rh(fov_y, aspect, near, far),
      eye: DMat4::look_at_rh(DVec3::ZERO, target - eye, up),
      origin: eye,
      viewport,
      camera_on: true,
    }
  }

  /// World to clip space.
  pub fn view_projection(&self) -> DMat4 {
    self.projection * self.eye * DMat4::from_translation(-self.origin)
  }
}

/// Derived camera state shared by every visitor of a pass.
#[derive(Clone, Debug)]
pub struct ViewContext {
  params: ViewParameters,
  view_projection: DMat4,
  eye_position: DVec3,
}

impl ViewContext {
  pub fn new(params: ViewParameters) -> Self {
    let view_projection = params.view_projection();
    let eye_position = params.origin + params.eye.inverse().w_axis.truncate();
    Self {
      params,
      view_projection,
      eye_position,
    }
  }

  #[inline]
  pub fn params(&self) -> &ViewParameters {
    &self.params
  }

  #[inline]
  pub fn view_projection(&self) -> &DMat4 {
    &self.view_projection
  }

  /// Camera position in world space.
  #[inline]
  pub fn eye_position(&self) -> DVec3 {
    self.eye_position
  }

  #[inline]
  pub fn origin(&self) -> DVec3 {
    self.params.origin
  }

  #[inline]
  pub fn viewport(&self) -> &Viewport {
    &self.params.viewport
  }

  /// This view expressed in `cloud`'s local frame.
  pub fn cloud_view(&self, cloud: &PointCloud) -> CloudView {
    CloudView::new(self, *cloud.transform())
  }
}

/// A [`ViewContext`] in one cloud's local frame.
#[derive(Clone, Debug)]
pub struct CloudView {
  mvp: DMat4,
  frustum: Frustum,
  transform: DAffine3,
  viewport: Viewport,
}

impl CloudView {
  pub fn new(context: &ViewContext, transform: DAffine3) -> Self {
    let mvp = *context.view_projection() * DMat4::from(transform);
    Self {
      mvp,
      frustum: Frustum::from_matrix(&mvp),
      transform,
      viewport: *context.viewport(),
    }
  }

  /// Cloud-local frustum.
  #[inline]
  pub fn frustum(&self) -> &Frustum {
    &self.frustum
  }

  #[inline]
  pub fn viewport(&self) -> &Viewport {
    &self.viewport
  }

  /// Homogeneous clip-space position of a cloud-local point.
  #[inline]
  pub fn clip_position(&self, local: DVec3) -> DVec4 {
    self.mvp * local.extend(1.0)
  }

  /// Normalized device coordinates, `None` at or behind the eye plane.
  pub fn project(&self, local: DVec3) -> Option<DVec3> {
    let clip = self.clip_position(local);
    if clip.w <= W_EPSILON {
      return None;
    }
    Some(clip.truncate() / clip.w)
  }

  /// NDC to viewport pixels (`y` down).
  #[inline]
  pub fn ndc_to_pixel(&self, ndc: DVec3) -> DVec2 {
    DVec2::new(
      self.viewport.x + (ndc.x + 1.0) * 0.5 * self.viewport.width,
      self.viewport.y + (1.0 - ndc.y) * 0.5 * self.viewport.height,
    )
  }

  /// Cloud-local to world.
  #[inline]
  pub fn to_world(&self, local: DVec3) -> DVec3 {
    self.transform.transform_point3(local)
  }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
