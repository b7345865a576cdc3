use crate::clip::{ClipState, ClipVolumes};
use crate::scene::{Containment, Node, PointCloud, Scene};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Propagates clip-volume classification onto node flags.
///
/// The enabled switch is sampled once when the visitor is built, so a toggle
/// mid-walk cannot leave the forest half cleared.
pub struct ClipCheck<'a> {
  clip: &'a dyn ClipVolumes,
  enabled: bool,
}

impl<'a> ClipCheck<'a> {
  pub fn new(clip: &'a dyn ClipVolumes) -> Self {
    Self {
      clip,
      enabled: clip.enabled(),
    }
  }
}

impl PointCloudVisitor for ClipCheck<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::ClipCheck
  }

  fn visit_cloud(&mut self, _scene: &Scene, cloud: &PointCloud) -> bool {
    if self.enabled {
      return true;
    }
    cloud.root().set_clip_state(ClipState::Unclipped, true);
    false
  }

  fn visit_node(&mut self, cloud: &PointCloud, node: &Node) -> bool {
    match self.clip.classify(cloud, node.extents()) {
      Containment::Outside => {
        node.set_clip_state(ClipState::Whole, true);
        false
      }
      Containment::Inside => {
        node.set_clip_state(ClipState::Unclipped, true);
        false
      }
      Containment::Intersects => {
        node.set_clip_state(ClipState::Partial, false);
        true
      }
    }
  }
}
