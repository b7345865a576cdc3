//! Test fixtures: cameras, single-cloud scenes and state snapshots.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{DAffine3, DVec3};

use crate::clip::ClipVolumeSet;
use crate::config::VisibilityConfig;
use crate::engine::VisibilityEngine;
use crate::scene::{DAabb3, NodeDesc, PointCloud, Scene, SceneGraph, Voxel};
use crate::view::{ViewParameters, Viewport};

// =============================================================================
// Cameras
// =============================================================================

pub fn viewport() -> Viewport {
  Viewport::from_size(800.0, 600.0)
}

/// 90 degree vertical fov, near 0.1, far 1000, 800x600.
pub fn camera_at(eye: DVec3, target: DVec3) -> ViewParameters {
  ViewParameters::perspective(eye, target, DVec3::Y, FRAC_PI_2, 0.1, 1000.0, viewport())
}

/// At the origin looking down -Z.
pub fn default_camera() -> ViewParameters {
  camera_at(DVec3::ZERO, DVec3::NEG_Z)
}

/// Looking down +Z, away from [`cloud_box`].
pub fn camera_facing_away() -> ViewParameters {
  camera_at(DVec3::ZERO, DVec3::Z)
}

// =============================================================================
// Scenes
// =============================================================================

/// 20 x 20 x 20 box centered 20 units in front of [`default_camera`].
pub fn cloud_box() -> DAabb3 {
  DAabb3::new(DVec3::new(-10.0, -10.0, -30.0), DVec3::new(10.0, 10.0, -10.0))
}

pub struct Fixture {
  pub graph: Arc<SceneGraph>,
  pub scene: Arc<Scene>,
  pub cloud: Arc<PointCloud>,
  pub clip: Arc<ClipVolumeSet>,
}

impl Fixture {
  pub fn engine(&self, config: VisibilityConfig) -> VisibilityEngine {
    VisibilityEngine::new(Arc::clone(&self.graph), self.clip.clone(), config)
      .expect("valid config")
  }

  pub fn voxels(&self) -> Vec<Arc<Voxel>> {
    self.cloud.voxels()
  }
}

/// One scene, one identity-placed cloud of `desc`.
pub fn fixture_from(desc: NodeDesc) -> Fixture {
  fixture_with_transform(DAffine3::IDENTITY, desc)
}

pub fn fixture_with_transform(transform: DAffine3, desc: NodeDesc) -> Fixture {
  let graph = Arc::new(SceneGraph::new());
  let mut scene = Scene::new();
  let cloud = scene.add_cloud(transform, desc);
  let scene = graph.add_scene(scene);
  Fixture {
    graph,
    scene,
    cloud,
    clip: Arc::new(ClipVolumeSet::new()),
  }
}

/// [`cloud_box`] subdivided `levels` deep.
pub fn single_cloud(levels: u32, points_per_leaf: u64) -> Fixture {
  fixture_from(NodeDesc::subdivided(cloud_box(), levels, points_per_leaf))
}

/// `n * n` points on the xy grid of `extents` at its center depth.
pub fn grid_points(extents: &DAabb3, n: usize) -> Vec<DVec3> {
  let size = extents.size();
  let z = extents.center().z;
  let mut points = Vec::with_capacity(n * n);
  for i in 0..n {
    for j in 0..n {
      let u = (i as f64 + 0.5) / n as f64;
      let v = (j as f64 + 0.5) / n as f64;
      points.push(DVec3::new(
        extents.min.x + u * size.x,
        extents.min.y + v * size.y,
        z,
      ));
    }
  }
  points
}

// =============================================================================
// Snapshots
// =============================================================================

/// `(requested_lod, priority)` of every voxel in the graph, pre-order.
pub fn lod_snapshot(graph: &SceneGraph) -> Vec<(f32, f32)> {
  graph
    .scenes()
    .iter()
    .flat_map(|scene| scene.clouds().flat_map(|cloud| cloud.voxels()).collect::<Vec<_>>())
    .map(|voxel| {
      let state = voxel.lod();
      (state.requested_lod(), state.priority())
    })
    .collect()
}

/// `Σ requested_lod * full_point_count` over renderable leaves.
pub fn renderable_lod_points(cloud: &PointCloud) -> f64 {
  let mut total = 0.0;
  cloud.root().for_each_renderable_leaf(&mut |_, voxel| {
    total += voxel.requested_lod() as f64 * voxel.full_point_count() as f64;
  });
  total
}
