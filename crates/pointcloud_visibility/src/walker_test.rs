use glam::{DAffine3, DVec3};

use super::*;
use crate::scene::{DAabb3, NodeDesc, SceneId};

/// Records the order of every callback.
#[derive(Default)]
struct Recorder {
  events: Vec<String>,
  prune_below_depth: Option<u32>,
  skip_scene: Option<SceneId>,
}

impl PointCloudVisitor for Recorder {
  fn kind(&self) -> VisitorKind {
    VisitorKind::StatsUpdate
  }

  fn visit_scene(&mut self, scene: &Scene) -> bool {
    self.events.push(format!("scene:{}", scene.num_objects()));
    self.skip_scene != Some(scene.id())
  }

  fn visit_cloud(&mut self, _scene: &Scene, _cloud: &PointCloud) -> bool {
    self.events.push("cloud".to_string());
    true
  }

  fn visit_node(&mut self, _cloud: &PointCloud, node: &Node) -> bool {
    self.events.push(format!("node:{}", node.depth()));
    self.prune_below_depth.map_or(true, |depth| node.depth() < depth)
  }
}

fn graph_with(levels: &[u32]) -> (SceneGraph, Vec<SceneId>) {
  let graph = SceneGraph::new();
  let mut ids = Vec::new();
  for &level in levels {
    let mut scene = Scene::new();
    scene.add_cloud(
      DAffine3::IDENTITY,
      NodeDesc::subdivided(DAabb3::new(DVec3::ZERO, DVec3::ONE), level, 10),
    );
    ids.push(graph.add_scene(scene).id());
  }
  (graph, ids)
}

#[test]
fn test_pre_order() {
  let (graph, _) = graph_with(&[1]);
  let mut recorder = Recorder::default();
  walk(&graph, &mut recorder);

  let mut expected = vec!["scene:1".to_string(), "cloud".into(), "node:0".into()];
  expected.extend((0..8).map(|_| "node:1".to_string()));
  assert_eq!(recorder.events, expected);
}

/// Returning false stops descent below that node only.
#[test]
fn test_pruning_stops_descent() {
  let (graph, _) = graph_with(&[3]);
  let mut recorder = Recorder {
    prune_below_depth: Some(1),
    ..Default::default()
  };
  walk(&graph, &mut recorder);

  let nodes = recorder.events.iter().filter(|e| e.starts_with("node")).count();
  assert_eq!(nodes, 1 + 8);
  assert!(!recorder.events.iter().any(|e| e == "node:2"));
}

#[test]
fn test_scene_pruning_skips_clouds() {
  let (graph, ids) = graph_with(&[1, 1]);
  let mut recorder = Recorder {
    skip_scene: Some(ids[0]),
    ..Default::default()
  };
  graph.visit_point_clouds(&mut recorder);

  let clouds = recorder.events.iter().filter(|e| *e == "cloud").count();
  assert_eq!(clouds, 1, "only the second scene's cloud is visited");
  assert_eq!(recorder.events.iter().filter(|e| e.starts_with("scene")).count(), 2);
}

#[test]
fn test_empty_graph() {
  let graph = SceneGraph::new();
  let mut recorder = Recorder::default();
  walk(&graph, &mut recorder);
  assert!(recorder.events.is_empty());
}

#[test]
fn test_kind_names_unique() {
  use std::collections::HashSet;
  let names: HashSet<_> = VisitorKind::ALL.iter().map(|k| k.name()).collect();
  let indices: HashSet<_> = VisitorKind::ALL.iter().map(|k| k.index()).collect();
  assert_eq!(names.len(), VisitorKind::ALL.len());
  assert_eq!(indices.len(), VisitorKind::ALL.len());
  assert!(indices.iter().all(|&i| i < VisitorKind::ALL.len()));
}
