use glam::{DVec2, DVec3};

use crate::config::OcclusionConfig;
use crate::occlusion::{sample_count, sample_indices, OcclusionFrame, OcclusionStats};
use crate::scene::{Node, NodeFlag, PointCloud, Scene, Voxel};
use crate::view::{CloudView, ViewContext};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Viewport-relative pixel and depth of every projectable sample of `voxel`.
fn for_each_sample(
  view: &CloudView,
  config: &OcclusionConfig,
  voxel: &Voxel,
  mut f: impl FnMut(DVec2, f32),
) {
  let resident = voxel.resident_points();
  let count = sample_count(
    config,
    voxel.requested_lod(),
    voxel.full_point_count(),
    resident.len(),
  );
  let viewport = view.viewport();
  let offset = DVec2::new(viewport.x, viewport.y);
  for index in sample_indices(resident.len(), count) {
    let Some(ndc) = project_sample(view, resident[index]) else {
      continue;
    };
    f(view.ndc_to_pixel(ndc) - offset, ndc.z as f32);
  }
}

#[inline]
fn project_sample(view: &CloudView, point: DVec3) -> Option<DVec3> {
  view
    .project(point)
    .filter(|ndc| (0.0..=1.0).contains(&ndc.z))
}

/// Writes strided resident samples of every renderable leaf into the frame.
pub struct OcclusionFill<'a> {
  context: &'a ViewContext,
  config: &'a OcclusionConfig,
  frame: &'a mut OcclusionFrame,
  cloud_view: Option<CloudView>,
  /// Samples that won their cell at insert time.
  pub written: usize,
}

impl<'a> OcclusionFill<'a> {
  pub fn new(
    context: &'a ViewContext,
    config: &'a OcclusionConfig,
    frame: &'a mut OcclusionFrame,
  ) -> Self {
    Self {
      context,
      config,
      frame,
      cloud_view: None,
      written: 0,
    }
  }
}

impl PointCloudVisitor for OcclusionFill<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::OcclusionFill
  }

  fn visit_cloud(&mut self, _scene: &Scene, cloud: &PointCloud) -> bool {
    self.cloud_view = Some(self.context.cloud_view(cloud));
    true
  }

  fn visit_node(&mut self, _cloud: &PointCloud, node: &Node) -> bool {
    let Some(view) = &self.cloud_view else {
      return false;
    };
    if !node.is_renderable() {
      return false;
    }
    if let Some(voxel) = node.voxel() {
      let key = voxel.key();
      let frame = &mut *self.frame;
      let written = &mut self.written;
      for_each_sample(view, self.config, voxel, |pixel, z| {
        if frame.insert(pixel.x, pixel.y, z, key) {
          *written += 1;
        }
      });
    }
    true
  }
}

/// Lowers the LOD of leaves whose samples lie behind other voxels.
///
/// `requested_lod *= 1 - occluded / sampled`, counting only samples that land
/// on a written cell. A leaf with every sample hidden is flagged `WholeHidden`.
pub struct OcclusionCull<'a> {
  context: &'a ViewContext,
  config: &'a OcclusionConfig,
  frame: &'a OcclusionFrame,
  cloud_view: Option<CloudView>,
  stats: OcclusionStats,
  /// Requested points over every renderable leaf after culling.
  pub lod_points: f64,
}

impl<'a> OcclusionCull<'a> {
  pub fn new(context: &'a ViewContext, config: &'a OcclusionConfig, frame: &'a OcclusionFrame) -> Self {
    Self {
      context,
      config,
      frame,
      cloud_view: None,
      stats: OcclusionStats::default(),
      lod_points: 0.0,
    }
  }

  pub fn stats(&self) -> OcclusionStats {
    self.stats
  }
}

impl PointCloudVisitor for OcclusionCull<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::OcclusionCull
  }

  fn visit_cloud(&mut self, _scene: &Scene, cloud: &PointCloud) -> bool {
    self.cloud_view = Some(self.context.cloud_view(cloud));
    true
  }

  fn visit_node(&mut self, _cloud: &PointCloud, node: &Node) -> bool {
    let Some(view) = &self.cloud_view else {
      return false;
    };
    if !node.is_renderable() {
      return false;
    }
    let Some(voxel) = node.voxel() else {
      return true;
    };

    let key = voxel.key();
    let frame = self.frame;
    let (mut sampled, mut occluded) = (0usize, 0usize);
    for_each_sample(view, self.config, voxel, |pixel, z| {
      if frame.cell(pixel.x, pixel.y).is_none() {
        return;
      }
      sampled += 1;
      if frame
        .is_occluded(pixel.x, pixel.y, z)
        .is_some_and(|by| by != key)
      {
        occluded += 1;
      }
    });

    let lod = if sampled > 0 {
      self.stats.voxels_tested += 1;
      self.stats.samples_tested += sampled;
      self.stats.samples_occluded += occluded;
      if occluded == sampled {
        self.stats.voxels_hidden += 1;
        node.set_flag(NodeFlag::WholeHidden, true, false);
      }
      let factor = 1.0 - occluded as f32 / sampled as f32;
      voxel.update(|state| {
        state.set_requested_lod(state.requested_lod() * factor);
        state.requested_lod()
      })
    } else {
      voxel.requested_lod()
    };
    self.lod_points += lod as f64 * voxel.full_point_count() as f64;
    false
  }
}
