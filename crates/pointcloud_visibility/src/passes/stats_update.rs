use std::sync::Arc;

use crate::config::AreaApproximation;
use crate::scene::{Node, PointCloud, Scene, Voxel};
use crate::stats::{StatsAccumulator, VisibilityStats};
use crate::view::{pixel_area, CloudView, ViewContext};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Recomputes pass statistics from the final flags and LODs, and collects
/// the renderable voxels.
pub struct StatsUpdate<'a> {
  context: &'a ViewContext,
  area: AreaApproximation,
  cloud_view: Option<CloudView>,
  stats: StatsAccumulator,
  visible: Vec<(f32, Arc<Voxel>)>,
}

impl<'a> StatsUpdate<'a> {
  pub fn new(context: &'a ViewContext, area: AreaApproximation) -> Self {
    Self {
      context,
      area,
      cloud_view: None,
      stats: StatsAccumulator::new(),
      visible: Vec::new(),
    }
  }

  /// Final stats and the visibility set, highest priority first.
  pub fn finish(mut self) -> (VisibilityStats, Vec<Arc<Voxel>>) {
    self
      .visible
      .sort_by(|(a, _), (b, _)| b.total_cmp(a));
    let voxels = self.visible.into_iter().map(|(_, voxel)| voxel).collect();
    (self.stats.finish(), voxels)
  }
}

impl PointCloudVisitor for StatsUpdate<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::StatsUpdate
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
      let state = voxel.lod();
      let area = pixel_area(view, node.extents(), self.area);
      self
        .stats
        .add(state.requested_lod(), voxel.full_point_count(), area);
      self.visible.push((state.priority(), Arc::clone(voxel)));
    }
    true
  }
}
