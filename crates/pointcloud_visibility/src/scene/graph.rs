//! Scene forest: scenes own point clouds, clouds own one octree.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use glam::DAffine3;
use parking_lot::{RwLock, RwLockReadGuard};
use smallvec::SmallVec;

use super::desc::NodeDesc;
use super::node::{Node, Voxel};
use crate::walker::{walk, PointCloudVisitor};

// =============================================================================
// Ids
// =============================================================================

static SCENE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
static CLOUD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque scene identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct SceneId(u64);

impl SceneId {
    /// Generate a new unique SceneId.
    pub fn new() -> Self {
        Self(SCENE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque point-cloud identifier, unique within the process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CloudId(u64);

impl CloudId {
    /// Generate a new unique CloudId.
    pub fn new() -> Self {
        Self(CLOUD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for CloudId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PointCloud
// =============================================================================

/// One octree placed in its scene by an affine transform.
#[derive(Debug)]
pub struct PointCloud {
    id: CloudId,
    scene: SceneId,
    visible: AtomicBool,
    /// Cloud-local to world transform.
    transform: DAffine3,
    root: Node,
}

impl PointCloud {
    pub fn id(&self) -> CloudId {
        self.id
    }

    /// Owning scene.
    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    /// Display toggle. Takes effect on the next pass.
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn transform(&self) -> &DAffine3 {
        &self.transform
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Every leaf voxel of the octree, pre-order.
    pub fn voxels(&self) -> Vec<Arc<Voxel>> {
        let mut voxels = Vec::with_capacity(self.root.leaf_count());
        self.root.for_each_node(&mut |node| {
            if let Some(voxel) = node.voxel() {
                voxels.push(Arc::clone(voxel));
            }
        });
        voxels
    }
}

// =============================================================================
// Scene
// =============================================================================

/// A group of point clouds sharing display and load state.
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    visible: AtomicBool,
    loaded: AtomicBool,
    clouds: SmallVec<[Arc<PointCloud>; 4]>,
}

impl Scene {
    /// Empty scene, visible and loaded.
    pub fn new() -> Self {
        Self {
            id: SceneId::new(),
            visible: AtomicBool::new(true),
            loaded: AtomicBool::new(true),
            clouds: SmallVec::new(),
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    /// Pager-side: mark the scene's data (un)available.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Relaxed);
    }

    /// Build an octree from `desc` and append it as a new cloud.
    pub fn add_cloud(&mut self, transform: DAffine3, desc: NodeDesc) -> Arc<PointCloud> {
        let id = CloudId::new();
        let cloud = Arc::new(PointCloud {
            id,
            scene: self.id,
            visible: AtomicBool::new(true),
            transform,
            root: desc.build(id),
        });
        self.clouds.push(Arc::clone(&cloud));
        cloud
    }

    /// Number of clouds.
    pub fn num_objects(&self) -> usize {
        self.clouds.len()
    }

    pub fn cloud(&self, index: usize) -> Option<&Arc<PointCloud>> {
        self.clouds.get(index)
    }

    pub fn clouds(&self) -> impl Iterator<Item = &Arc<PointCloud>> {
        self.clouds.iter()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SceneGraph
// =============================================================================

/// The forest of scenes visited by every traversal.
///
/// Adding or removing scenes takes the write lock and therefore waits for any
/// traversal in flight.
#[derive(Debug, Default)]
pub struct SceneGraph {
    scenes: RwLock<Vec<Arc<Scene>>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scene(&self, scene: Scene) -> Arc<Scene> {
        let scene = Arc::new(scene);
        self.scenes.write().push(Arc::clone(&scene));
        scene
    }

    pub fn remove_scene(&self, id: SceneId) -> Option<Arc<Scene>> {
        let mut scenes = self.scenes.write();
        let index = scenes.iter().position(|scene| scene.id() == id)?;
        Some(scenes.remove(index))
    }

    /// Snapshot of the current scene list.
    pub fn scenes(&self) -> Vec<Arc<Scene>> {
        self.scenes.read().clone()
    }

    pub fn scene(&self, id: SceneId) -> Option<Arc<Scene>> {
        self.scenes.read().iter().find(|scene| scene.id() == id).cloned()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Scene>>> {
        self.scenes.read()
    }

    /// Depth-first walk of the whole forest with `visitor`.
    pub fn visit_point_clouds(&self, visitor: &mut dyn PointCloudVisitor) {
        walk(self, visitor);
    }
}
