//! Graph - immutable description of the system map topology.
//!
//! The Graph is built once from host data and shared read-only with the
//! simulation. Topology lives in petgraph's StableGraph (used for adjacency
//! queries); a dense endpoint list mirrors the edges for the spring pass.

use std::collections::{HashMap, HashSet};

use log::info;
use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use super::edge::{EdgeId, EdgeSpec};
use super::node::{NodeId, NodeSpec};
use crate::error::{LayoutError, ValidationError};

/// Serializable input form: node table plus an optional explicit edge list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl GraphDescription {
    /// Parse a JSON description.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate and build the graph.
    pub fn build(&self) -> Result<Graph, ValidationError> {
        build_graph(self.nodes.clone(), &self.edges)
    }
}

/// Build a graph from node specs and explicit edges.
///
/// Relations declared through [`NodeSpec::connections`] become edges too; a
/// pair declared from both sides that way yields a single edge. Explicit
/// `edges` are kept as a multiset. No partial graph is returned on error.
pub fn build_graph(nodes: Vec<NodeSpec>, edges: &[EdgeSpec]) -> Result<Graph, ValidationError> {
    let mut ids: HashMap<String, NodeId> = HashMap::with_capacity(nodes.len());
    let mut categories: Vec<String> = Vec::new();
    let mut category_of = Vec::with_capacity(nodes.len());
    let mut topology: StableGraph<NodeId, EdgeId, Undirected> =
        StableGraph::with_capacity(nodes.len(), edges.len());

    for (i, spec) in nodes.iter().enumerate() {
        if spec.id.is_empty() {
            return Err(ValidationError::EmptyNodeId(i));
        }
        if let Some([x, y]) = spec.position {
            if !x.is_finite() || !y.is_finite() {
                return Err(ValidationError::NonFinitePosition(spec.id.clone()));
            }
        }

        let id = NodeId(i as u32);
        if ids.insert(spec.id.clone(), id).is_some() {
            return Err(ValidationError::DuplicateNodeId(spec.id.clone()));
        }

        let category = match categories.iter().position(|c| *c == spec.category) {
            Some(index) => index,
            None => {
                categories.push(spec.category.clone());
                categories.len() - 1
            }
        };
        category_of.push(category);
        topology.add_node(id);
    }

    let resolve = |from: &str, to: &str| -> Result<(NodeId, NodeId), ValidationError> {
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ValidationError::UnknownEdgeEndpoint {
                    from: from.to_string(),
                    to: to.to_string(),
                    missing: name.to_string(),
                })
        };
        Ok((lookup(from)?, lookup(to)?))
    };

    let mut endpoints = Vec::with_capacity(edges.len());
    for edge in edges {
        endpoints.push(resolve(&edge.from, &edge.to)?);
    }

    // Relations listed on both sides of a pair collapse into one edge.
    let mut declared: HashSet<(NodeId, NodeId)> = HashSet::new();
    for spec in &nodes {
        for other in &spec.connections {
            let (a, b) = resolve(&spec.id, other)?;
            if declared.insert((a.min(b), a.max(b))) {
                endpoints.push((a, b));
            }
        }
    }

    for (i, &(a, b)) in endpoints.iter().enumerate() {
        topology.add_edge(
            NodeIndex::new(a.index()),
            NodeIndex::new(b.index()),
            EdgeId(i as u32),
        );
    }

    info!(
        "built graph: {} nodes, {} edges, {} categories",
        nodes.len(),
        endpoints.len(),
        categories.len()
    );

    Ok(Graph {
        topology,
        nodes,
        ids,
        categories,
        category_of,
        endpoints,
    })
}

/// Structurally immutable graph.
#[derive(Debug, Clone)]
pub struct Graph {
    /// Undirected topology; node weights are their own slot ids.
    topology: StableGraph<NodeId, EdgeId, Undirected>,

    /// Node specs by slot.
    nodes: Vec<NodeSpec>,

    /// Host id to slot.
    ids: HashMap<String, NodeId>,

    /// Distinct categories in order of first appearance.
    categories: Vec<String>,

    /// Category index by slot.
    category_of: Vec<usize>,

    /// Edge endpoints by EdgeId.
    endpoints: Vec<(NodeId, NodeId)>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Spec of the node in a slot.
    pub fn node(&self, id: NodeId) -> Option<&NodeSpec> {
        self.nodes.get(id.index())
    }

    /// All node specs in slot order.
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Look up a slot by host id.
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.ids.get(name).copied()
    }

    /// Look up a slot by host id, failing on unknown ids.
    pub fn resolve(&self, name: &str) -> Result<NodeId, ValidationError> {
        self.id_of(name)
            .ok_or_else(|| ValidationError::UnknownNode(name.to_string()))
    }

    /// Edge endpoints, indexed by [`EdgeId`].
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.endpoints
    }

    /// Endpoints of one edge.
    pub fn edge(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        self.endpoints.get(id.raw() as usize).copied()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Category index of a node (order of first appearance).
    pub fn category_index(&self, id: NodeId) -> usize {
        self.category_of[id.index()]
    }

    /// Distinct neighbours of a node, sorted by slot.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let index = NodeIndex::new(id.index());
        if !self.topology.contains_node(index) {
            return Vec::new();
        }
        let mut neighbors: Vec<NodeId> = self
            .topology
            .neighbors(index)
            .filter_map(|n| self.topology.node_weight(n).copied())
            .filter(|&n| n != id)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Number of edges incident to a node, parallel edges counted separately.
    pub fn degree(&self, id: NodeId) -> usize {
        let index = NodeIndex::new(id.index());
        if !self.topology.contains_node(index) {
            return 0;
        }
        self.topology.edges(index).count()
    }

    /// Ids of the edges incident to a node.
    pub fn incident_edges(&self, id: NodeId) -> Vec<EdgeId> {
        let index = NodeIndex::new(id.index());
        if !self.topology.contains_node(index) {
            return Vec::new();
        }
        let mut edges: Vec<EdgeId> = self.topology.edges(index).map(|e| *e.weight()).collect();
        edges.sort_unstable_by_key(|e| e.raw());
        edges.dedup();
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        build_graph(
            vec![
                NodeSpec::new("a", "Foundation"),
                NodeSpec::new("b", "Foundation"),
                NodeSpec::new("c", "Data"),
            ],
            &[
                EdgeSpec::new("a", "b"),
                EdgeSpec::new("b", "c"),
                EdgeSpec::new("c", "a"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_build_graph() {
        let graph = triangle();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.categories(), ["Foundation", "Data"]);
        assert_eq!(graph.category_index(NodeId(2)), 1);
        assert_eq!(graph.id_of("c"), Some(NodeId(2)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = build_graph(
            vec![NodeSpec::new("a", "x"), NodeSpec::new("a", "y")],
            &[],
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::DuplicateNodeId("a".into()));
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let err = build_graph(vec![NodeSpec::new("a", "x")], &[EdgeSpec::new("a", "ghost")])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownEdgeEndpoint {
                from: "a".into(),
                to: "ghost".into(),
                missing: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_unknown_connection_rejected() {
        let err = build_graph(
            vec![NodeSpec::new("a", "x").connected_to(["nowhere"])],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownEdgeEndpoint { missing, .. } if missing == "nowhere"));
    }

    #[test]
    fn test_empty_and_non_finite_rejected() {
        assert_eq!(
            build_graph(vec![NodeSpec::new("", "x")], &[]).unwrap_err(),
            ValidationError::EmptyNodeId(0)
        );
        assert_eq!(
            build_graph(vec![NodeSpec::new("a", "x").at(f64::NAN, 0.0)], &[]).unwrap_err(),
            ValidationError::NonFinitePosition("a".into())
        );
    }

    #[test]
    fn test_parallel_edges_accumulate() {
        let graph = build_graph(
            vec![NodeSpec::new("a", "x"), NodeSpec::new("b", "x")],
            &[EdgeSpec::new("a", "b"), EdgeSpec::new("b", "a")],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(NodeId(0)), 2);
        // Still a single distinct neighbour.
        assert_eq!(graph.neighbors(NodeId(0)), vec![NodeId(1)]);
        assert_eq!(graph.incident_edges(NodeId(1)), vec![EdgeId(0), EdgeId(1)]);
    }

    #[test]
    fn test_symmetric_connections_collapse() {
        let graph = build_graph(
            vec![
                NodeSpec::new("qeng", "Processing").connected_to(["qvm", "optimization"]),
                NodeSpec::new("qvm", "Processing").connected_to(["qeng"]),
                NodeSpec::new("optimization", "Processing").connected_to(["qeng"]),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.neighbors(NodeId(0)), vec![NodeId(1), NodeId(2)]);
    }

    #[test]
    fn test_neighbors_of_triangle() {
        let graph = triangle();
        assert_eq!(graph.neighbors(NodeId(1)), vec![NodeId(0), NodeId(2)]);
        assert_eq!(graph.edge(EdgeId(1)), Some((NodeId(1), NodeId(2))));
        assert!(graph.neighbors(NodeId(9)).is_empty());
    }

    #[test]
    fn test_description_from_json() {
        let description = GraphDescription::from_json(
            r#"{
                "nodes": [
                    { "id": "a", "category": "x", "connections": ["b"] },
                    { "id": "b", "category": "y", "position": [10, 20], "pinned": true }
                ]
            }"#,
        )
        .unwrap();
        let graph = description.build().unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node(NodeId(1)).unwrap().position, Some([10.0, 20.0]));
    }
}
