//! Plain octree description, turned into [`Node`]s when a cloud is added.

use std::sync::Arc;

use glam::DVec3;

use super::bounds::DAabb3;
use super::graph::CloudId;
use super::node::{Node, Voxel, VoxelKey};

/// Octree shape handed to [`super::Scene::add_cloud`].
///
/// Depths and voxel indices are assigned during the build: depth from the root,
/// indices in pre-order starting at 0.
#[derive(Clone, Debug)]
pub enum NodeDesc {
  Interior {
    extents: DAabb3,
    /// `(octant, child)`; octants outside 0-7 are dropped.
    children: Vec<(u8, NodeDesc)>,
  },
  Leaf {
    extents: DAabb3,
    full_point_count: u64,
    /// Initially resident points, cloud-local.
    points: Vec<DVec3>,
  },
}

impl NodeDesc {
  /// Leaf with nothing resident.
  pub fn leaf(extents: DAabb3, full_point_count: u64) -> Self {
    NodeDesc::Leaf {
      extents,
      full_point_count,
      points: Vec::new(),
    }
  }

  pub fn interior(extents: DAabb3, children: impl IntoIterator<Item = (u8, NodeDesc)>) -> Self {
    NodeDesc::Interior {
      extents,
      children: children.into_iter().collect(),
    }
  }

  /// Attach initially resident points. No effect on interior nodes.
  pub fn with_points(self, resident: Vec<DVec3>) -> Self {
    match self {
      NodeDesc::Leaf {
        extents,
        full_point_count,
        ..
      } => NodeDesc::Leaf {
        extents,
        full_point_count,
        points: resident,
      },
      interior => interior,
    }
  }

  /// Complete octree `levels` deep with `points_per_leaf` on every leaf.
  pub fn subdivided(extents: DAabb3, levels: u32, points_per_leaf: u64) -> Self {
    if levels == 0 {
      return Self::leaf(extents, points_per_leaf);
    }
    Self::interior(
      extents,
      (0..8u8).map(|octant| {
        (
          octant,
          Self::subdivided(extents.octant(octant), levels - 1, points_per_leaf),
        )
      }),
    )
  }

  pub fn extents(&self) -> &DAabb3 {
    match self {
      NodeDesc::Interior { extents, .. } | NodeDesc::Leaf { extents, .. } => extents,
    }
  }

  pub(crate) fn build(self, cloud: CloudId) -> Node {
    let mut next_index = 0;
    self.build_at(cloud, 0, &mut next_index)
  }

  fn build_at(self, cloud: CloudId, depth: u32, next_index: &mut u32) -> Node {
    match self {
      NodeDesc::Leaf {
        extents,
        full_point_count,
        points,
      } => {
        let key = VoxelKey {
          cloud,
          index: *next_index,
        };
        *next_index += 1;
        let voxel = Voxel::new(key, full_point_count);
        if !points.is_empty() {
          voxel.set_resident_points(points);
        }
        Node::new_leaf(extents, depth, Arc::new(voxel))
      }
      NodeDesc::Interior { extents, children } => {
        let mut slots: [Option<Node>; 8] = Default::default();
        for (octant, child) in children {
          debug_assert!(octant < 8, "octant {octant} out of range");
          if let Some(slot) = slots.get_mut(octant as usize) {
            *slot = Some(child.build_at(cloud, depth + 1, next_index));
          }
        }
        Node::new_interior(extents, depth, slots)
      }
    }
  }
}
