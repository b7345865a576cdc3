//! Clip volumes: user boxes that keep or remove parts of clouds.
//!
//! The engine only sees the [`ClipVolumes`] trait. [`ClipVolumeSet`] is the
//! stock implementation: world-space boxes, each either global or bound to a
//! single cloud.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::scene::{CloudId, Containment, DAabb3, PointCloud};

pub use crate::scene::node::ClipState;

/// Clip-volume manager consulted by the clip pass.
pub trait ClipVolumes: Send + Sync {
  /// Global clipping switch. When off, every node is unclipped.
  fn enabled(&self) -> bool;

  /// Classify a node box (cloud-local) against the volumes that apply to
  /// `cloud`: `Outside` is clipped away, `Inside` is fully kept.
  fn classify(&self, cloud: &PointCloud, extents: &DAabb3) -> Containment;
}

/// Which side of a volume survives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipMode {
  KeepInside,
  KeepOutside,
}

/// A world-space clip box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipVolume {
  pub bounds: DAabb3,
  pub mode: ClipMode,
  /// Restrict to one cloud; `None` applies to all.
  pub cloud: Option<CloudId>,
}

impl ClipVolume {
  pub fn keep_inside(bounds: DAabb3) -> Self {
    Self {
      bounds,
      mode: ClipMode::KeepInside,
      cloud: None,
    }
  }

  pub fn keep_outside(bounds: DAabb3) -> Self {
    Self {
      bounds,
      mode: ClipMode::KeepOutside,
      cloud: None,
    }
  }

  pub fn for_cloud(mut self, cloud: CloudId) -> Self {
    self.cloud = Some(cloud);
    self
  }

  #[inline]
  fn applies_to(&self, cloud: CloudId) -> bool {
    self.cloud.map_or(true, |id| id == cloud)
  }

  /// Classify a world box: `Inside` means kept.
  fn classify(&self, world: &DAabb3) -> Containment {
    let containment = self.bounds.classify(world);
    match self.mode {
      ClipMode::KeepInside => containment,
      ClipMode::KeepOutside => containment.inverted(),
    }
  }
}

/// Thread-safe list of clip boxes.
#[derive(Debug)]
pub struct ClipVolumeSet {
  enabled: AtomicBool,
  volumes: RwLock<Vec<ClipVolume>>,
}

impl ClipVolumeSet {
  /// Empty, enabled set.
  pub fn new() -> Self {
    Self {
      enabled: AtomicBool::new(true),
      volumes: RwLock::new(Vec::new()),
    }
  }

  pub fn add(&self, volume: ClipVolume) {
    self.volumes.write().push(volume);
  }

  pub fn clear(&self) {
    self.volumes.write().clear();
  }

  pub fn len(&self) -> usize {
    self.volumes.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.volumes.read().is_empty()
  }

  pub fn set_enabled(&self, enabled: bool) {
    self.enabled.store(enabled, Ordering::Relaxed);
  }
}

impl Default for ClipVolumeSet {
  fn default() -> Self {
    Self::new()
  }
}

impl ClipVolumes for ClipVolumeSet {
  fn enabled(&self) -> bool {
    self.enabled.load(Ordering::Relaxed)
  }

  /// Any volume removing the box wins; all volumes keeping it fully gives
  /// `Inside`; no applicable volume keeps everything.
  fn classify(&self, cloud: &PointCloud, extents: &DAabb3) -> Containment {
    let world = extents.transformed(cloud.transform());
    let mut result = Containment::Inside;
    for volume in self.volumes.read().iter().filter(|v| v.applies_to(cloud.id())) {
      match volume.classify(&world) {
        Containment::Outside => return Containment::Outside,
        Containment::Intersects => result = Containment::Intersects,
        Containment::Inside => {}
      }
    }
    result
  }
}
