use crate::config::VisibilityConfig;
use crate::lod::compute_lod;
use crate::priority::{compute_priority, VisibilityBias};
use crate::scene::{Node, PointCloud, Scene};
use crate::stats::{PriorityBounds, StatsAccumulator};
use crate::view::{CloudView, ViewContext};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Scores renderable nodes and writes LOD and priority onto their voxels.
///
/// Interior nodes shallower than `score_min_depth` are descended unscored.
/// A scored node that is a leaf or covers fewer than `refine_pixel_area`
/// pixels hands one LOD and priority to every renderable leaf below it;
/// larger nodes are refined through their children.
pub struct VisibilityCompute<'a> {
  context: &'a ViewContext,
  config: &'a VisibilityConfig,
  bias: VisibilityBias,
  cloud_view: Option<CloudView>,
  stats: StatsAccumulator,
  bounds: PriorityBounds,
  /// Nodes passed through the LOD solver.
  pub scored: usize,
}

impl<'a> VisibilityCompute<'a> {
  pub fn new(context: &'a ViewContext, config: &'a VisibilityConfig, bias: VisibilityBias) -> Self {
    Self {
      context,
      config,
      bias,
      cloud_view: None,
      stats: StatsAccumulator::new(),
      bounds: PriorityBounds::EMPTY,
      scored: 0,
    }
  }

  /// Per-leaf LOD totals. Pixel areas are left to the stats pass.
  pub fn stats(&self) -> &StatsAccumulator {
    &self.stats
  }

  pub fn priority_bounds(&self) -> PriorityBounds {
    self.bounds
  }
}

impl PointCloudVisitor for VisibilityCompute<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::VisibilityCompute
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
    if !node.is_leaf() && node.depth() < self.config.score_min_depth {
      return true;
    }

    self.scored += 1;
    let estimate = compute_lod(view, node, self.config, true);
    if !node.is_leaf() && estimate.pixel_area >= self.config.refine_pixel_area {
      return true;
    }

    let priority = compute_priority(
      view,
      &self.bias,
      self.context.eye_position(),
      node.extents(),
      true,
    );
    self.bounds.include(priority);

    let stats = &mut self.stats;
    node.for_each_renderable_leaf(&mut |_, voxel| {
      let lod = voxel.update(|state| {
        state.set_requested_lod(estimate.lod);
        state.set_priority(priority);
        state.requested_lod()
      });
      stats.add(lod, voxel.full_point_count(), 0.0);
    });
    false
  }
}
