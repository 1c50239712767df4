//! Read-only layout snapshots handed to the renderer.

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;
use crate::spatial::SpatialIndex;

/// Position of one node at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Copy of all node positions at a given step. Node order matches the
/// graph's declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub step: u32,
    pub max_steps: u32,
    pub live: bool,
    pub nodes: Vec<NodePosition>,
}

impl LayoutSnapshot {
    pub fn get(&self, id: &str) -> Option<&NodePosition> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Bounding box of all nodes as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for node in &self.nodes {
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }
        Some((min_x, min_y, max_x, max_y))
    }

    /// R-tree over the snapshot for pointer hit testing.
    pub fn spatial_index(&self) -> SpatialIndex {
        let points: Vec<_> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node.x, node.y))
            .collect();
        SpatialIndex::bulk_load(&points)
    }

    /// Id of the node nearest to `(x, y)` within `radius`.
    pub fn node_at(&self, x: f64, y: f64, radius: f64) -> Option<&str> {
        self.spatial_index()
            .nearest_within(x, y, radius)
            .map(|id| self.nodes[id.index()].id.as_str())
    }

    /// Ids of every node within `radius` of `(x, y)`, in declaration order.
    pub fn nodes_within(&self, x: f64, y: f64, radius: f64) -> Vec<&str> {
        self.resolve(self.spatial_index().in_radius(x, y, radius))
    }

    /// Ids of every node inside a rectangle, in declaration order.
    pub fn nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<&str> {
        self.resolve(self.spatial_index().in_rect(min_x, min_y, max_x, max_y))
    }

    fn resolve(&self, mut ids: Vec<NodeId>) -> Vec<&str> {
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| self.nodes[id.index()].id.as_str())
            .collect()
    }
}
