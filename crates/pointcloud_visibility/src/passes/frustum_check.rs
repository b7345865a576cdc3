use crate::scene::{Containment, Node, PointCloud, Scene};
use crate::view::{CloudView, ViewContext};
use crate::walker::{PointCloudVisitor, VisitorKind};

/// Marks nodes visible or culled against the view frustum.
///
/// Only the fast `in_frustum` reject is trusted to cull. A full classification
/// of `Inside` marks the whole subtree visible and stops; an `Outside` from the
/// full test is not trusted and the walk continues.
pub struct FrustumCheck<'a> {
  context: &'a ViewContext,
  cloud_view: Option<CloudView>,
  /// Subtrees culled by the fast reject.
  pub culled: usize,
  /// Subtrees accepted whole.
  pub accepted: usize,
}

impl<'a> FrustumCheck<'a> {
  pub fn new(context: &'a ViewContext) -> Self {
    Self {
      context,
      cloud_view: None,
      culled: 0,
      accepted: 0,
    }
  }
}

impl PointCloudVisitor for FrustumCheck<'_> {
  fn kind(&self) -> VisitorKind {
    VisitorKind::FrustumCheck
  }

  fn visit_scene(&mut self, scene: &Scene) -> bool {
    if scene.is_visible() && scene.is_loaded() {
      return true;
    }
    for cloud in scene.clouds() {
      cloud.root().hide_subtree();
    }
    false
  }

  fn visit_cloud(&mut self, _scene: &Scene, cloud: &PointCloud) -> bool {
    if !cloud.is_visible() {
      cloud.root().hide_subtree();
      return false;
    }
    self.cloud_view = Some(self.context.cloud_view(cloud));
    true
  }

  fn visit_node(&mut self, _cloud: &PointCloud, node: &Node) -> bool {
    let Some(view) = &self.cloud_view else {
      return false;
    };
    let frustum = view.frustum();
    if !frustum.in_frustum(node.extents()) {
      node.hide_subtree();
      self.culled += 1;
      return false;
    }
    if frustum.classify(node.extents()) == Containment::Inside {
      node.show(true);
      self.accepted += 1;
      return false;
    }
    node.show(false);
    true
  }
}
