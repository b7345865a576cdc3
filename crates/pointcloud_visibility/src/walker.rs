//! Depth-first pre-order traversal of the scene forest.
//!
//! Scenes, then their clouds, then each cloud's octree. A callback returning
//! `false` prunes everything below the element it was called on. Absent
//! children are skipped. Scene and cloud callbacks may mark a whole subtree in
//! one fused pass (see [`Node::hide_subtree`]) and return `false`.

use crate::scene::{Node, PointCloud, Scene, SceneGraph};

/// The closed set of traversal purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisitorKind {
  FrustumCheck,
  ClipCheck,
  VisibilityCompute,
  BudgetAdjust,
  ShortfallCompute,
  StatsUpdate,
  OcclusionFill,
  OcclusionCull,
}

impl VisitorKind {
  /// Every kind, in pass order.
  pub const ALL: [VisitorKind; 8] = [
    VisitorKind::FrustumCheck,
    VisitorKind::ClipCheck,
    VisitorKind::VisibilityCompute,
    VisitorKind::OcclusionFill,
    VisitorKind::OcclusionCull,
    VisitorKind::BudgetAdjust,
    VisitorKind::ShortfallCompute,
    VisitorKind::StatsUpdate,
  ];

  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  pub const fn name(self) -> &'static str {
    match self {
      VisitorKind::FrustumCheck => "frustum_check",
      VisitorKind::ClipCheck => "clip_check",
      VisitorKind::VisibilityCompute => "visibility_compute",
      VisitorKind::BudgetAdjust => "budget_adjust",
      VisitorKind::ShortfallCompute => "shortfall_compute",
      VisitorKind::StatsUpdate => "stats_update",
      VisitorKind::OcclusionFill => "occlusion_fill",
      VisitorKind::OcclusionCull => "occlusion_cull",
    }
  }
}

/// Callbacks for one traversal purpose.
///
/// Visitors accumulate their own results; nothing is shared between sibling
/// subtrees.
pub trait PointCloudVisitor {
  fn kind(&self) -> VisitorKind;

  /// Return `false` to skip every cloud of `scene`.
  fn visit_scene(&mut self, _scene: &Scene) -> bool {
    true
  }

  /// Return `false` to skip the cloud's octree.
  fn visit_cloud(&mut self, _scene: &Scene, _cloud: &PointCloud) -> bool {
    true
  }

  /// Return `false` to skip the node's children.
  fn visit_node(&mut self, cloud: &PointCloud, node: &Node) -> bool;
}

/// Walk the whole forest. Holds the graph's read lock for the duration.
pub fn walk(graph: &SceneGraph, visitor: &mut dyn PointCloudVisitor) {
  #[cfg(feature = "tracing")]
  let _span = tracing::info_span!("walk", kind = visitor.kind().name()).entered();

  let scenes = graph.read();
  for scene in scenes.iter() {
    if !visitor.visit_scene(scene) {
      continue;
    }
    for cloud in scene.clouds() {
      if visitor.visit_cloud(scene, cloud) {
        walk_node(visitor, cloud, cloud.root());
      }
    }
  }
}

fn walk_node(visitor: &mut dyn PointCloudVisitor, cloud: &PointCloud, node: &Node) {
  if !visitor.visit_node(cloud, node) {
    return;
  }
  for child in node.children() {
    walk_node(visitor, cloud, child);
  }
}

#[cfg(test)]
#[path = "walker_test.rs"]
mod walker_test;
