use std::collections::HashMap;

use crate::scene::{Node, NodeFlag, PointCloud, SceneId};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Points missing per scene: the paging layer's fetch list.
pub type LoadedShortfallMap = HashMap<SceneId, i64>;

/// Sums `requested - resident` points per scene over renderable,
/// in-core leaves. Deficits at or under `threshold * full_point_count` are
/// ignored.
pub struct ShortfallCompute<'a> {
  threshold: f64,
  map: &'a mut LoadedShortfallMap,
}

impl<'a> ShortfallCompute<'a> {
  pub fn new(threshold: f64, map: &'a mut LoadedShortfallMap) -> Self {
    Self { threshold, map }
  }
}

/// Deficit of one voxel, `None` under the reporting threshold.
pub(crate) fn voxel_shortfall(
  requested_lod: f32,
  full_point_count: u64,
  lod_point_count: u64,
  threshold: f64,
) -> Option<i64> {
  let full = full_point_count as f64;
  let shortfall = requested_lod as f64 * full - lod_point_count as f64;
  (shortfall > threshold * full).then_some(shortfall as i64)
}

impl PointCloudVisitor for ShortfallCompute<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::ShortfallCompute
  }

  fn visit_node(&mut self, cloud: &PointCloud, node: &Node) -> bool {
    if !node.is_renderable() {
      return false;
    }
    let Some(voxel) = node.voxel() else {
      return true;
    };
    if node.flag(NodeFlag::OutOfCore) {
      return false;
    }
    if let Some(shortfall) = voxel_shortfall(
      voxel.requested_lod(),
      voxel.full_point_count(),
      voxel.lod_point_count(),
      self.threshold,
    ) {
      *self.map.entry(cloud.scene()).or_insert(0) += shortfall;
    }
    false
  }
}
