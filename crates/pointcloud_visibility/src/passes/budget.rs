use crate::scene::{Node, PointCloud};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Rescale factor for `current` requested points against a `target` budget.
///
/// `None` when within budget, when no budget is set (negative target) or
/// when `current` is not a usable number.
pub fn budget_scale(current: f64, target: f64, max_scale: f64) -> Option<f64> {
  if target < 0.0 || !current.is_finite() || current <= target {
    return None;
  }
  Some((target / current).min(max_scale))
}

/// Multiplies the LOD of every renderable leaf by one factor.
pub struct BudgetAdjust {
  scale: f32,
  /// Requested points after the rescale.
  pub lod_points: f64,
  pub adjusted: usize,
}

impl BudgetAdjust {
  pub fn new(scale: f64) -> Self {
    Self {
      scale: scale as f32,
      lod_points: 0.0,
      adjusted: 0,
    }
  }
}

impl PointCloudVisitor for BudgetAdjust {
  fn kind(&self) -> VisitorKind {
    VisitorKind::BudgetAdjust
  }

  fn visit_node(&mut self, _cloud: &PointCloud, node: &Node) -> bool {
    if !node.is_renderable() {
      return false;
    }
    if let Some(voxel) = node.voxel() {
      let scale = self.scale;
      let lod = voxel.update(|state| {
        state.set_requested_lod(state.requested_lod() * scale);
        state.requested_lod()
      });
      self.lod_points += lod as f64 * voxel.full_point_count() as f64;
      self.adjusted += 1;
    }
    true
  }
}
