//! pointcloud_visibility - Framework/engine independent point-cloud visibility
//!
//! This crate decides, once per frame, which nodes of a very large out-of-core
//! point-cloud octree are visible, at what fractional point density each one
//! should be resident, and how urgently the paging layer should fetch the
//! missing points. It draws nothing and loads nothing: results are written onto
//! shared per-voxel state and into a per-scene shortfall map.
//!
//! # Features
//!
//! - **Frustum & clip classification**: fused subtree marking, per-cloud
//!   frustums extracted in cloud-local space
//! - **LOD solver**: projected pixel area vs. point count, floor/ceiling clamps
//! - **Priority bias**: screen-center, near, far or point-biased importance
//! - **Budget governor**: proportional rescale when the global point budget is
//!   exceeded
//! - **Shortfall accumulation**: per-scene point deficits for the pager
//! - **Occlusion buffer**: optional coarse z-buffer that de-prioritizes
//!   voxels hidden behind nearer samples
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pointcloud_visibility::{
//!   ClipVolumeSet, NodeDesc, Scene, SceneGraph, ViewParameters, VisibilityConfig,
//!   VisibilityEngine, Viewport,
//! };
//!
//! let graph = Arc::new(SceneGraph::new());
//! let mut scene = Scene::new();
//! scene.add_cloud(glam::DAffine3::IDENTITY, octree_desc);
//! graph.add_scene(scene);
//!
//! let engine = VisibilityEngine::new(graph, Arc::new(ClipVolumeSet::new()), VisibilityConfig::DEFAULT)?;
//! engine.set_view_parameters(view);
//! engine.set_points_budget(10_000_000);
//! engine.compute_visibility();
//!
//! for (scene, points) in engine.take_shortfall() {
//!     pager.prefetch(scene, points);
//! }
//! ```

pub mod constants;
pub mod error;
pub use error::ConfigError;

pub mod config;
pub use config::{AreaApproximation, OcclusionConfig, VisibilityConfig};

// Scene graph collaborator: scenes, clouds, octree nodes, voxels
pub mod scene;
pub use scene::{
  CloudId, Containment, DAabb3, Node, NodeDesc, NodeFlag, PointCloud, Scene, SceneGraph, SceneId,
  Voxel, VoxelKey, VoxelLod,
};

// Depth-first traversal with pruning
pub mod walker;
pub use walker::{walk, PointCloudVisitor, VisitorKind};

// Camera, frustum and projected area
pub mod view;
pub use view::{CloudView, Frustum, ViewContext, ViewParameters, Viewport};

pub mod clip;
pub use clip::{ClipMode, ClipState, ClipVolume, ClipVolumeSet, ClipVolumes};

pub mod lod;
pub mod priority;
pub use priority::{BiasMode, VisibilityBias};

pub mod occlusion;
pub use occlusion::OcclusionFrame;

pub mod stats;
pub use stats::{PriorityBounds, VisibilityStats};

// One visitor per traversal purpose
pub mod passes;

pub mod metrics;

// Per-frame orchestration
pub mod engine;
pub use engine::{
  EngineState, LoadedShortfallMap, NodeScore, PassOutcome, PassSummary, VisibilityEngine,
};

#[cfg(test)]
pub(crate) mod test_utils;
