//! Visibility pass benchmarks.
//!
//! Workloads:
//! - **full pass**: one `compute_visibility` over octrees of growing depth
//! - **budgeted**: same pass with the governor forced to rescale
//! - **occlusion**: pass with the screen-space occlusion stage enabled
//! - **pixel area**: the two projected-area estimators in isolation

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glam::{DAffine3, DVec3};
use pointcloud_visibility::{
  view::pixel_area, AreaApproximation, ClipVolumeSet, CloudView, DAabb3, NodeDesc, OcclusionConfig,
  Scene, SceneGraph, ViewContext, ViewParameters, Viewport, VisibilityConfig, VisibilityEngine,
};

// =============================================================================
// Fixtures
// =============================================================================

fn camera() -> ViewParameters {
  ViewParameters::perspective(
    DVec3::new(0.0, 5.0, 0.0),
    DVec3::new(0.0, 0.0, -40.0),
    DVec3::Y,
    FRAC_PI_2,
    0.1,
    1000.0,
    Viewport::from_size(1920.0, 1080.0),
  )
}

fn cloud_box() -> DAabb3 {
  DAabb3::new(DVec3::new(-40.0, -10.0, -80.0), DVec3::new(40.0, 10.0, -5.0))
}

/// Octree `levels` deep with a 4 x 4 resident grid on every leaf.
fn subdivide(extents: DAabb3, levels: u32) -> NodeDesc {
  if levels == 0 {
    let size = extents.size();
    let points = (0..16)
      .map(|i| {
        let (u, v) = ((i % 4) as f64 + 0.5, (i / 4) as f64 + 0.5);
        extents.min + DVec3::new(u * size.x / 4.0, v * size.y / 4.0, size.z / 2.0)
      })
      .collect();
    return NodeDesc::leaf(extents, 50_000).with_points(points);
  }
  NodeDesc::interior(
    extents,
    (0..8u8).map(|octant| (octant, subdivide(extents.octant(octant), levels - 1))),
  )
}

fn build_engine(levels: u32, config: VisibilityConfig) -> VisibilityEngine {
  let graph = Arc::new(SceneGraph::new());
  let mut scene = Scene::new();
  scene.add_cloud(DAffine3::IDENTITY, subdivide(cloud_box(), levels));
  graph.add_scene(scene);
  let engine = VisibilityEngine::new(graph, Arc::new(ClipVolumeSet::new()), config)
    .expect("default config is valid");
  engine.set_view_parameters(camera());
  engine
}

// =============================================================================
// Pass benchmarks
// =============================================================================

fn bench_full_pass(c: &mut Criterion) {
  let mut group = c.benchmark_group("full_pass");

  for levels in [3u32, 4, 5] {
    let engine = build_engine(levels, VisibilityConfig::DEFAULT);
    group.throughput(Throughput::Elements(8u64.pow(levels)));
    group.bench_with_input(BenchmarkId::new("levels", levels), &levels, |b, _| {
      b.iter(|| black_box(engine.compute_visibility()))
    });
  }

  group.finish();
}

fn bench_budgeted_pass(c: &mut Criterion) {
  let engine = build_engine(4, VisibilityConfig::DEFAULT);
  engine.set_points_budget(100_000);

  c.bench_function("budgeted_pass_levels_4", |b| {
    b.iter(|| black_box(engine.compute_visibility()))
  });
}

fn bench_occlusion_pass(c: &mut Criterion) {
  let mut group = c.benchmark_group("occlusion_pass");

  for factor in [0.125, 0.25, 0.5] {
    let config = VisibilityConfig::DEFAULT.with_occlusion(OcclusionConfig {
      factor,
      ..OcclusionConfig::DEFAULT
    });
    let engine = build_engine(4, config);
    group.bench_with_input(BenchmarkId::new("factor", factor), &factor, |b, _| {
      b.iter(|| black_box(engine.compute_visibility()))
    });
  }

  group.finish();
}

// =============================================================================
// Isolated estimators
// =============================================================================

fn bench_pixel_area(c: &mut Criterion) {
  let mut group = c.benchmark_group("pixel_area");
  let context = ViewContext::new(camera());
  let view = CloudView::new(&context, DAffine3::IDENTITY);
  let boxes: Vec<DAabb3> = (0..8u8).map(|octant| cloud_box().octant(octant)).collect();
  group.throughput(Throughput::Elements(boxes.len() as u64));

  for (name, mode) in [
    ("bounding_rect", AreaApproximation::BoundingRect),
    ("convex_hull", AreaApproximation::ConvexHull),
  ] {
    group.bench_function(name, |b| {
      b.iter(|| {
        boxes
          .iter()
          .map(|extents| pixel_area(&view, black_box(extents), mode))
          .sum::<f64>()
      })
    });
  }

  group.finish();
}

criterion_group!(passes, bench_full_pass, bench_budgeted_pass, bench_occlusion_pass);
criterion_group!(isolated, bench_pixel_area);
criterion_main!(passes, isolated);
