//! VisibilityEngine - per-frame visibility orchestration.
//!
//! One pass of [`VisibilityEngine::compute_visibility`] runs, in order:
//!
//! 1. frustum check
//! 2. clip check
//! 3. LOD and priority compute
//! 4. occlusion fill + cull (only when configured)
//! 5. budget adjust (only when over a configured budget)
//! 6. shortfall compute
//! 7. stats update
//!
//! then publishes stats and priority bounds. Every step is a full forest walk
//! that completes before the next begins. Passes run on the calling thread.
//!
//! # Pause protocol
//!
//! A pass registers itself in `working` before checking `paused`; `pause()`
//! raises `paused` before waiting for `working` to drain. Both sides use
//! sequentially consistent operations, so once `pause()` returns no pass is
//! running and none can start until `unpause()`.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use glam::DVec3;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use web_time::Instant;

use crate::clip::ClipVolumes;
use crate::config::VisibilityConfig;
use crate::constants::NO_BUDGET;
use crate::error::ConfigError;
use crate::lod::compute_lod;
use crate::metrics::VisibilityMetrics;
use crate::occlusion::{OcclusionFrame, OcclusionStats};
use crate::passes::{
  budget_scale, BudgetAdjust, ClipCheck, FrustumCheck, OcclusionCull, OcclusionFill,
  ShortfallCompute, StatsUpdate, VisibilityCompute,
};
use crate::priority::{compute_priority, BiasMode, VisibilityBias};
use crate::scene::{Node, NodeFlag, PointCloud, SceneGraph, Voxel};
use crate::stats::{PriorityBounds, VisibilityStats};
use crate::view::{ViewContext, ViewParameters};
use crate::walker::{walk, PointCloudVisitor, VisitorKind};

pub use crate::passes::LoadedShortfallMap;

// =============================================================================
// Public types
// =============================================================================

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
  Idle,
  Running,
  Paused,
  /// Terminal.
  Stopped,
}

/// What one completed pass did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassSummary {
  pub stats: VisibilityStats,
  pub priority_bounds: PriorityBounds,
  /// Requested points before the budget governor.
  pub requested_points: f64,
  /// Factor applied by the budget governor, if it ran.
  pub budget_scale: Option<f64>,
  /// Nodes passed through the LOD solver.
  pub scored_nodes: usize,
  /// Scenes with a reported shortfall.
  pub shortfall_scenes: usize,
  pub occlusion: Option<OcclusionStats>,
  pub elapsed_us: u64,
}

/// Result of [`VisibilityEngine::compute_visibility`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PassOutcome {
  Completed(PassSummary),
  /// Refused: the engine is paused.
  Paused,
  /// Refused: the engine was stopped.
  Stopped,
  /// Refused: no view installed, or the camera is off.
  NoView,
}

impl PassOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, PassOutcome::Completed(_))
  }

  pub fn summary(&self) -> Option<&PassSummary> {
    match self {
      PassOutcome::Completed(summary) => Some(summary),
      _ => None,
    }
  }
}

/// Diagnostic score of a single node under the current view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeScore {
  pub lod: f32,
  pub priority: f32,
  /// `priority` within the last pass's [`PriorityBounds`].
  pub normalized_priority: f32,
  pub pixel_area: f64,
  pub full_point_count: u64,
  /// Node's `Visible` flag at scoring time; hidden nodes are attenuated.
  pub visible: bool,
}

// =============================================================================
// VisibilityEngine
// =============================================================================

/// Decides per frame which voxels are visible and how many of their points
/// should be resident.
pub struct VisibilityEngine {
  graph: Arc<SceneGraph>,
  clip: Arc<dyn ClipVolumes>,
  config: VisibilityConfig,

  view: RwLock<Option<ViewContext>>,
  view_updated: AtomicBool,
  bias: RwLock<VisibilityBias>,
  points_budget: AtomicI64,

  paused: AtomicBool,
  stopped: AtomicBool,
  working: AtomicUsize,

  /// Renderable voxels of the last pass, highest priority first. Held for
  /// the whole of a pass.
  visibility_set: Mutex<Vec<Arc<Voxel>>>,
  occlusion: Mutex<Option<OcclusionFrame>>,
  shortfall: Mutex<LoadedShortfallMap>,
  stats: RwLock<VisibilityStats>,
  priority_bounds: RwLock<PriorityBounds>,
  metrics: Mutex<VisibilityMetrics>,
}

/// Decrements the in-flight counter when a pass ends.
struct WorkGuard<'a>(&'a AtomicUsize);

impl Drop for WorkGuard<'_> {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

type StepTimings = SmallVec<[(VisitorKind, u64); 8]>;

fn timed_walk(graph: &SceneGraph, visitor: &mut dyn PointCloudVisitor, timings: &mut StepTimings) {
  let start = Instant::now();
  walk(graph, visitor);
  timings.push((visitor.kind(), start.elapsed().as_micros() as u64));
}

impl VisibilityEngine {
  /// Engine over `graph` using `clip` for clip volumes.
  pub fn new(
    graph: Arc<SceneGraph>,
    clip: Arc<dyn ClipVolumes>,
    config: VisibilityConfig,
  ) -> Result<Self, ConfigError> {
    config.validate()?;
    #[cfg(feature = "tracing")]
    tracing::debug!(?config, "visibility engine created");
    Ok(Self {
      graph,
      clip,
      config,
      view: RwLock::new(None),
      view_updated: AtomicBool::new(false),
      bias: RwLock::new(VisibilityBias::default()),
      points_budget: AtomicI64::new(NO_BUDGET),
      paused: AtomicBool::new(false),
      stopped: AtomicBool::new(false),
      working: AtomicUsize::new(0),
      visibility_set: Mutex::new(Vec::new()),
      occlusion: Mutex::new(None),
      shortfall: Mutex::new(LoadedShortfallMap::new()),
      stats: RwLock::new(VisibilityStats::default()),
      priority_bounds: RwLock::new(PriorityBounds::EMPTY),
      metrics: Mutex::new(VisibilityMetrics::new()),
    })
  }

  pub fn graph(&self) -> &Arc<SceneGraph> {
    &self.graph
  }

  pub fn config(&self) -> &VisibilityConfig {
    &self.config
  }

  // ---------------------------------------------------------------------------
  // Frame inputs
  // ---------------------------------------------------------------------------

  /// Install this frame's camera; rebuilds the frustum immediately.
  pub fn set_view_parameters(&self, params: ViewParameters) {
    *self.view.write() = Some(ViewContext::new(params));
    self.view_updated.store(true, Ordering::Release);
  }

  pub fn view_parameters(&self) -> Option<ViewParameters> {
    self.view.read().as_ref().map(|context| *context.params())
  }

  /// Whether a view was installed since the last call. Clears the flag.
  pub fn is_view_updated(&self) -> bool {
    self.view_updated.swap(false, Ordering::AcqRel)
  }

  /// Takes effect from the next pass.
  pub fn set_bias(&self, mode: BiasMode, point: Option<DVec3>) {
    *self.bias.write() = VisibilityBias::new(mode, point);
  }

  pub fn bias(&self) -> VisibilityBias {
    *self.bias.read()
  }

  /// Global cap on requested points. Negative values ([`NO_BUDGET`])
  /// disable the governor.
  pub fn set_points_budget(&self, budget: i64) {
    self.points_budget.store(budget, Ordering::Relaxed);
  }

  pub fn points_budget(&self) -> i64 {
    self.points_budget.load(Ordering::Relaxed)
  }

  // ---------------------------------------------------------------------------
  // Lifecycle
  // ---------------------------------------------------------------------------

  /// Block new passes and wait for running ones to finish.
  pub fn pause(&self) {
    self.paused.store(true, Ordering::SeqCst);
    while self.working.load(Ordering::SeqCst) != 0 {
      std::thread::yield_now();
    }
  }

  /// Allow passes again. Does not start one.
  pub fn unpause(&self) {
    self.paused.store(false, Ordering::SeqCst);
  }

  /// Permanently refuse further passes. Running passes complete.
  pub fn stop(&self) {
    if !self.stopped.swap(true, Ordering::SeqCst) {
      #[cfg(feature = "tracing")]
      tracing::debug!("visibility engine stopped");
    }
  }

  pub fn state(&self) -> EngineState {
    if self.stopped.load(Ordering::SeqCst) {
      EngineState::Stopped
    } else if self.paused.load(Ordering::SeqCst) {
      EngineState::Paused
    } else if self.working.load(Ordering::SeqCst) > 0 {
      EngineState::Running
    } else {
      EngineState::Idle
    }
  }

  /// Passes currently registered as running.
  pub fn passes_in_flight(&self) -> usize {
    self.working.load(Ordering::SeqCst)
  }

  fn begin_pass(&self) -> Option<WorkGuard<'_>> {
    self.working.fetch_add(1, Ordering::SeqCst);
    let guard = WorkGuard(&self.working);
    if self.paused.load(Ordering::SeqCst) {
      return None;
    }
    Some(guard)
  }

  // ---------------------------------------------------------------------------
  // Passes
  // ---------------------------------------------------------------------------

  /// Run one full visibility pass.
  ///
  /// Calling this after [`Self::stop`] is a caller bug: it asserts in debug
  /// builds and returns [`PassOutcome::Stopped`] otherwise.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "visibility::compute"))]
  pub fn compute_visibility(&self) -> PassOutcome {
    if self.stopped.load(Ordering::SeqCst) {
      #[cfg(feature = "tracing")]
      tracing::warn!("compute_visibility called after stop");
      debug_assert!(false, "compute_visibility called after stop");
      return PassOutcome::Stopped;
    }
    let Some(_guard) = self.begin_pass() else {
      self.metrics.lock().record_skipped();
      return PassOutcome::Paused;
    };
    let Some(context) = self.view.read().clone() else {
      #[cfg(feature = "tracing")]
      tracing::warn!("compute_visibility called before any view was installed");
      self.metrics.lock().record_skipped();
      return PassOutcome::NoView;
    };
    if !context.params().camera_on {
      self.metrics.lock().record_skipped();
      return PassOutcome::NoView;
    }

    let mut visibility_set = self.visibility_set.lock();
    let start = Instant::now();
    let bias = *self.bias.read();
    let mut timings = StepTimings::new();

    let mut frustum = FrustumCheck::new(&context);
    timed_walk(&self.graph, &mut frustum, &mut timings);

    let mut clip = ClipCheck::new(&*self.clip);
    timed_walk(&self.graph, &mut clip, &mut timings);

    let mut compute = VisibilityCompute::new(&context, &self.config, bias);
    timed_walk(&self.graph, &mut compute, &mut timings);
    let requested_points = compute.stats().lod_points();
    let priority_bounds = compute.priority_bounds();
    let mut current_points = requested_points;

    let occlusion = self.config.occlusion.map(|config| {
      #[cfg(feature = "tracing")]
      let _span = tracing::info_span!("occlusion").entered();
      let viewport = context.viewport();
      let mut frame_slot = self.occlusion.lock();
      let frame = frame_slot
        .get_or_insert_with(|| OcclusionFrame::new(viewport.width, viewport.height, config.factor));
      frame.resize(viewport.width, viewport.height, config.factor);

      let mut fill = OcclusionFill::new(&context, &config, frame);
      timed_walk(&self.graph, &mut fill, &mut timings);

      let mut cull = OcclusionCull::new(&context, &config, frame);
      timed_walk(&self.graph, &mut cull, &mut timings);
      current_points = cull.lod_points;
      let stats = cull.stats();
      #[cfg(feature = "tracing")]
      tracing::debug!(
        voxels_tested = stats.voxels_tested,
        voxels_hidden = stats.voxels_hidden,
        samples_occluded = stats.samples_occluded,
        "occlusion cull"
      );
      stats
    });

    let budget = self.points_budget.load(Ordering::Relaxed);
    let scale = if budget >= 0 {
      budget_scale(current_points, budget as f64, self.config.budget_max_scale)
    } else {
      None
    };
    if let Some(scale) = scale {
      #[cfg(feature = "tracing")]
      tracing::debug!(
        current_points,
        budget,
        scale,
        "points budget exceeded, rescaling"
      );
      let mut adjust = BudgetAdjust::new(scale);
      timed_walk(&self.graph, &mut adjust, &mut timings);
    }

    let shortfall_scenes = {
      let mut shortfall = self.shortfall.lock();
      shortfall.clear();
      let mut accumulate = ShortfallCompute::new(self.config.shortfall_threshold, &mut shortfall);
      timed_walk(&self.graph, &mut accumulate, &mut timings);
      shortfall.len()
    };

    let mut update = StatsUpdate::new(&context, self.config.area_approximation);
    timed_walk(&self.graph, &mut update, &mut timings);
    let (stats, voxels) = update.finish();
    *visibility_set = voxels;
    drop(visibility_set);

    *self.stats.write() = stats;
    *self.priority_bounds.write() = priority_bounds;

    let elapsed_us = start.elapsed().as_micros() as u64;
    {
      let mut metrics = self.metrics.lock();
      for (kind, us) in timings {
        metrics.record_step(kind, us);
      }
      metrics.record_pass(elapsed_us, scale.is_some());
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
      elapsed_us,
      visible_voxels = stats.visible_voxels,
      lod_points = stats.lod_points_in_view,
      "visibility pass complete"
    );

    PassOutcome::Completed(PassSummary {
      stats,
      priority_bounds,
      requested_points,
      budget_scale: scale,
      scored_nodes: compute.scored,
      shortfall_scenes,
      occlusion,
      elapsed_us,
    })
  }

  /// Give every voxel of the last visibility set the same LOD.
  ///
  /// Best effort: returns `false` without effect while a pass (or another
  /// caller) holds the set.
  pub fn set_fixed_visibility(&self, lod: f32) -> bool {
    let Some(voxels) = self.visibility_set.try_lock() else {
      self.metrics.lock().record_fixed_visibility(false);
      return false;
    };
    for voxel in voxels.iter() {
      voxel.set_requested_lod(lod);
    }
    drop(voxels);
    self.metrics.lock().record_fixed_visibility(true);
    true
  }

  /// Score `node` of `cloud` under the installed view without writing
  /// anything. `None` without a view.
  pub fn score_node(&self, cloud: &PointCloud, node: &Node) -> Option<NodeScore> {
    let view = self.view.read();
    let context = view.as_ref()?;
    let cloud_view = context.cloud_view(cloud);
    let visible = node.flag(NodeFlag::Visible);
    let estimate = compute_lod(&cloud_view, node, &self.config, visible);
    let priority = compute_priority(
      &cloud_view,
      &self.bias.read(),
      context.eye_position(),
      node.extents(),
      visible,
    );
    Some(NodeScore {
      lod: estimate.lod,
      priority,
      normalized_priority: self.priority_bounds.read().normalize(priority),
      pixel_area: estimate.pixel_area,
      full_point_count: estimate.full_point_count,
      visible,
    })
  }

  // ---------------------------------------------------------------------------
  // Published results
  // ---------------------------------------------------------------------------

  pub fn stats(&self) -> VisibilityStats {
    *self.stats.read()
  }

  pub fn priority_bounds(&self) -> PriorityBounds {
    *self.priority_bounds.read()
  }

  /// Copy of the last pass's shortfall map.
  pub fn shortfall(&self) -> LoadedShortfallMap {
    self.shortfall.lock().clone()
  }

  /// Hand the shortfall map to the pager, leaving it empty.
  pub fn take_shortfall(&self) -> LoadedShortfallMap {
    std::mem::take(&mut *self.shortfall.lock())
  }

  /// Renderable voxels of the last pass, highest priority first.
  pub fn visible_voxels(&self) -> Vec<Arc<Voxel>> {
    self.visibility_set.lock().clone()
  }

  pub fn metrics(&self) -> VisibilityMetrics {
    self.metrics.lock().clone()
  }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
