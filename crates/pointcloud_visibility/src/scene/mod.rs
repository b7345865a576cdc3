//! Scene graph consumed by the visibility engine.
//!
//! A forest of [`Scene`]s, each holding [`PointCloud`]s, each owning one
//! explicit octree of [`Node`]s whose leaves carry a shared [`Voxel`].
//!
//! # Ownership
//!
//! The tree structure is built once from a [`NodeDesc`] and never mutated by
//! the engine. Point counts and resident samples on a voxel belong to the
//! paging subsystem; the engine only writes `requested_lod` / `priority`,
//! always under the voxel's own lock.
//!
//! # Module Structure
//!
//! - [`bounds`]: `DAabb3` and `Containment`
//! - [`node`]: `Node`, `NodeFlag`, `Voxel`
//! - [`graph`]: `SceneGraph`, `Scene`, `PointCloud` and their ids
//! - [`desc`]: `NodeDesc` - plain octree description used to build clouds

pub mod bounds;
pub mod desc;
pub mod graph;
pub mod node;

// Re-exports
pub use bounds::{Containment, DAabb3};
pub use desc::NodeDesc;
pub use graph::{CloudId, PointCloud, Scene, SceneGraph, SceneId};
pub use node::{Node, NodeFlag, Voxel, VoxelKey, VoxelLod};
