mod force;
mod ring;

use std::collections::HashMap;

use eframe::egui::Pos2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::Snapshot;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    Ring,
}

impl LayoutMode {
    pub const ALL: [Self; 2] = [Self::Force, Self::Ring];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Ring => "Ring",
        }
    }
}

#[derive(Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub snapshot: &'a Snapshot,
    pub width: u32,
    pub height: u32,
    pub mode: LayoutMode,
    /// Positions from the previous pass, keyed by node id.
    pub previous: &'a HashMap<String, Pos2>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNode {
    pub id: String,
    pub position: Pos2,
}

/// A link whose endpoints both exist. Geometry only; per-link values such
/// as utilization are read from the current snapshot at draw time.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLink {
    pub source: String,
    pub target: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<PlacedNode>,
    pub links: Vec<PlacedLink>,
}

/// Assigns world positions to a snapshot's nodes. World space is centred on
/// the origin; a result that fits `width x height` fits the viewport at zoom 1.
pub trait LayoutEngine {
    fn compute(&mut self, request: LayoutRequest<'_>) -> LayoutResult;
}

impl<F> LayoutEngine for F
where
    F: FnMut(LayoutRequest<'_>) -> LayoutResult,
{
    fn compute(&mut self, request: LayoutRequest<'_>) -> LayoutResult {
        self(request)
    }
}

pub struct DefaultLayoutEngine {
    force_iterations: usize,
}

impl DefaultLayoutEngine {
    pub fn new(force_iterations: usize) -> Self {
        Self { force_iterations }
    }
}

impl LayoutEngine for DefaultLayoutEngine {
    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?request.mode, nodes = request.snapshot.nodes.len()))]
    fn compute(&mut self, request: LayoutRequest<'_>) -> LayoutResult {
        let snapshot = request.snapshot;
        let index_by_id = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect::<HashMap<_, _>>();

        let mut edges = Vec::with_capacity(snapshot.links.len());
        let mut links = Vec::with_capacity(snapshot.links.len());
        for link in &snapshot.links {
            let (Some(&from), Some(&to)) = (
                index_by_id.get(link.source.as_str()),
                index_by_id.get(link.target.as_str()),
            ) else {
                continue;
            };
            edges.push((from, to));
            links.push(PlacedLink {
                source: link.source.clone(),
                target: link.target.clone(),
            });
        }
        let dangling = snapshot.links.len() - links.len();
        if dangling > 0 {
            debug!(dangling, "ignoring links with unknown endpoints");
        }

        let ids = snapshot
            .nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        let extent = 0.42 * request.width.min(request.height).max(1) as f32;

        let positions = match request.mode {
            LayoutMode::Force => {
                let seeds = ids
                    .iter()
                    .map(|id| request.previous.get(*id).copied())
                    .collect::<Vec<_>>();
                force::force_layout(&ids, &edges, &seeds, self.force_iterations, extent)
            }
            LayoutMode::Ring => ring::ring_layout(ids.len(), extent),
        };

        LayoutResult {
            nodes: ids
                .iter()
                .zip(positions)
                .map(|(id, position)| PlacedNode {
                    id: (*id).to_owned(),
                    position,
                })
                .collect(),
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{LinkRecord, NodeRecord};

    fn request<'a>(
        snapshot: &'a Snapshot,
        mode: LayoutMode,
        previous: &'a HashMap<String, Pos2>,
    ) -> LayoutRequest<'a> {
        LayoutRequest {
            snapshot,
            width: 800,
            height: 600,
            mode,
            previous,
        }
    }

    fn sample() -> Snapshot {
        Snapshot {
            nodes: ["A", "B", "C", "D"].into_iter().map(NodeRecord::new).collect(),
            links: vec![
                LinkRecord::new("A", "B"),
                LinkRecord::new("B", "C"),
                LinkRecord::new("C", "Z"),
            ],
            generated_at: None,
        }
    }

    #[test]
    fn dangling_links_are_dropped() {
        let snapshot = sample();
        let previous = HashMap::new();
        let result =
            DefaultLayoutEngine::new(50).compute(request(&snapshot, LayoutMode::Force, &previous));

        assert_eq!(result.nodes.len(), 4);
        assert_eq!(result.links.len(), 2);
        assert!(result.links.iter().all(|link| link.target != "Z"));
    }

    #[test]
    fn results_fit_the_viewport() {
        let snapshot = sample();
        let previous = HashMap::new();
        for mode in LayoutMode::ALL {
            let result =
                DefaultLayoutEngine::new(80).compute(request(&snapshot, mode, &previous));
            for node in &result.nodes {
                assert!(node.position.x.abs() <= 400.0, "{mode:?} x {}", node.position.x);
                assert!(node.position.y.abs() <= 300.0, "{mode:?} y {}", node.position.y);
            }
        }
    }

    #[test]
    fn force_layout_is_deterministic() {
        let snapshot = sample();
        let previous = HashMap::new();
        let mut engine = DefaultLayoutEngine::new(60);
        let a = engine.compute(request(&snapshot, LayoutMode::Force, &previous));
        let b = engine.compute(request(&snapshot, LayoutMode::Force, &previous));
        assert_eq!(a, b);
    }

    #[test]
    fn closures_are_engines() {
        let snapshot = sample();
        let previous = HashMap::new();
        let mut calls = 0;
        let mut engine = |_: LayoutRequest<'_>| {
            calls += 1;
            LayoutResult::default()
        };
        engine.compute(request(&snapshot, LayoutMode::Ring, &previous));
        assert_eq!(calls, 1);
    }
}
