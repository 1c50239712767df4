//! System Map Layout - WASM Module
//!
//! This crate provides the force-directed layout engine behind the
//! interactive system/component map. It is compiled to WebAssembly and
//! exposes a JavaScript-friendly API via wasm-bindgen; the same engine is
//! usable natively.
//!
//! # Architecture
//!
//! - `graph`: Immutable graph model (node ids, categories, relations)
//! - `layout`: Layout state, force functions and the annealed simulation
//! - `scheduler`: Frame-loop contract with explicit start/stop
//! - `spatial`: R-tree hit testing over layout snapshots
//! - `config`: Tunable constants
//! - `error`: Validation and configuration errors

use js_sys::Float64Array;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod scheduler;
pub mod spatial;

pub use config::{Bounds, DEFAULT_SEED, LayoutConfig};
pub use error::{ConfigError, LayoutError, ValidationError};
pub use graph::{EdgeSpec, Graph, GraphDescription, NodeId, NodeSpec, build_graph};
pub use layout::{Kinematics, LayoutSnapshot, LayoutState, NodePosition, Simulation, StepReport};
pub use scheduler::{Frame, Running, Scheduler};

/// Initialize the WASM module: panic hook and console logger.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A logger may already be installed by the host bundle.
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Result of one host frame, as seen from JavaScript.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Not running; keep the current picture.
    Idle = 0,
    /// Advanced; no repaint needed yet.
    Advanced = 1,
    /// Advanced; repaint now.
    Repaint = 2,
    /// Advanced the final step; repaint and stop requesting frames.
    Finished = 3,
}

impl From<Frame> for FrameStatus {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Idle => FrameStatus::Idle,
            Frame::Advanced { repaint: false, .. } => FrameStatus::Advanced,
            Frame::Advanced { repaint: true, .. } => FrameStatus::Repaint,
            Frame::Finished { .. } => FrameStatus::Finished,
        }
    }
}

/// Main entry point for the layout engine.
///
/// Wraps a [`Scheduler`] driving one [`Simulation`] and provides the public
/// API exposed to JavaScript. All position reads are copies.
#[wasm_bindgen]
pub struct SystemMapLayout {
    scheduler: Scheduler,
}

impl SystemMapLayout {
    /// Build from an already-parsed description and config.
    pub fn from_description(
        description: &GraphDescription,
        config: LayoutConfig,
        seed: u64,
    ) -> Result<Self, LayoutError> {
        let graph = description.build()?;
        let simulation = Simulation::with_seed(graph, config, seed)?;
        Ok(Self {
            scheduler: Scheduler::new(simulation),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }
}

fn parse_description(description: JsValue) -> Result<GraphDescription, JsError> {
    serde_wasm_bindgen::from_value(description).map_err(|e| JsError::new(&e.to_string()))
}

fn parse_config(config: JsValue) -> Result<LayoutConfig, JsError> {
    if config.is_undefined() || config.is_null() {
        return Ok(LayoutConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsError::new(&e.to_string()))
}

fn random_seed() -> u64 {
    let high = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    let low = (js_sys::Math::random() * f64::from(u32::MAX)) as u64;
    (high << 32) | low
}

#[wasm_bindgen]
impl SystemMapLayout {
    /// Create a layout from a graph description and an optional partial
    /// config. Initial placement uses `config.seed` (fixed by default).
    #[wasm_bindgen(constructor)]
    pub fn new(description: JsValue, config: JsValue) -> Result<SystemMapLayout, JsError> {
        let description = parse_description(description)?;
        let config = parse_config(config)?;
        let seed = config.seed;
        Ok(Self::from_description(&description, config, seed)?)
    }

    /// Create a layout whose initial placement is freshly randomized.
    #[wasm_bindgen(js_name = withRandomSeed)]
    pub fn with_random_seed(
        description: JsValue,
        config: JsValue,
    ) -> Result<SystemMapLayout, JsError> {
        let description = parse_description(description)?;
        let config = parse_config(config)?;
        Ok(Self::from_description(&description, config, random_seed())?)
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Run one physics step directly. Returns false once frozen.
    pub fn advance(&mut self) -> bool {
        self.scheduler.simulation_mut().advance().is_some()
    }

    #[wasm_bindgen(js_name = isLive)]
    pub fn is_live(&self) -> bool {
        self.scheduler.simulation().is_live()
    }

    pub fn step(&self) -> u32 {
        self.scheduler.simulation().step()
    }

    #[wasm_bindgen(js_name = maxSteps)]
    pub fn max_steps(&self) -> u32 {
        self.scheduler.simulation().max_steps()
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Begin scheduling (e.g. when the map scrolls into view).
    pub fn start(&mut self) -> bool {
        self.scheduler.start()
    }

    /// Stop scheduling (e.g. on unmount).
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Call once per animation frame.
    pub fn frame(&mut self) -> FrameStatus {
        self.scheduler.frame().into()
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Copy of all positions as `{ step, maxSteps, live, nodes: [{ id, x, y }] }`.
    #[wasm_bindgen(js_name = getSnapshot)]
    pub fn get_snapshot(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.scheduler.snapshot())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Copy of X positions in declaration order.
    #[wasm_bindgen(js_name = positionsX)]
    pub fn positions_x(&self) -> Float64Array {
        Float64Array::from(self.scheduler.simulation().state().positions_x())
    }

    /// Copy of Y positions in declaration order.
    #[wasm_bindgen(js_name = positionsY)]
    pub fn positions_y(&self) -> Float64Array {
        Float64Array::from(self.scheduler.simulation().state().positions_y())
    }

    // =========================================================================
    // Interaction hooks
    // =========================================================================

    pub fn pin(&mut self, id: &str) -> Result<(), JsError> {
        Ok(self.scheduler.simulation_mut().pin(id)?)
    }

    pub fn unpin(&mut self, id: &str) -> Result<(), JsError> {
        Ok(self.scheduler.simulation_mut().unpin(id)?)
    }

    #[wasm_bindgen(js_name = isPinned)]
    pub fn is_pinned(&self, id: &str) -> Result<bool, JsError> {
        Ok(self.scheduler.simulation().is_pinned(id)?)
    }

    /// Pin a node and move it under the pointer.
    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> Result<(), JsError> {
        Ok(self.scheduler.simulation_mut().drag_to(id, x, y)?)
    }

    /// Id of the node under the pointer, if any.
    #[wasm_bindgen(js_name = findNodeAt)]
    pub fn find_node_at(&self, x: f64, y: f64, radius: f64) -> Option<String> {
        self.scheduler
            .snapshot()
            .node_at(x, y, radius)
            .map(str::to_string)
    }

    /// Ids of the nodes inside a selection rectangle.
    #[wasm_bindgen(js_name = findNodesInRect)]
    pub fn find_nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<String> {
        self.scheduler
            .snapshot()
            .nodes_in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    // =========================================================================
    // Graph queries
    // =========================================================================

    /// Distinct neighbours of a node, for hover highlighting.
    pub fn neighbors(&self, id: &str) -> Result<Vec<String>, JsError> {
        let graph = self.scheduler.simulation().graph();
        let slot = graph.resolve(id)?;
        Ok(graph
            .neighbors(slot)
            .into_iter()
            .filter_map(|n| graph.node(n).map(|spec| spec.id.clone()))
            .collect())
    }

    /// Categories in order of first appearance, for the legend.
    pub fn categories(&self) -> Vec<String> {
        self.scheduler.simulation().graph().categories().to_vec()
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.scheduler.simulation().graph().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.scheduler.simulation().graph().edge_count() as u32
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    const SYSTEM_MAP: &str = include_str!("../fixtures/system_map.json");

    fn system_map() -> GraphDescription {
        GraphDescription::from_json(SYSTEM_MAP).unwrap()
    }

    fn distance(a: &NodePosition, b: &NodePosition) -> f64 {
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    /// Full pipeline: description → graph → simulation → scheduler, driven
    /// frame by frame exactly like the host render loop.
    #[test]
    fn test_system_map_pipeline() {
        let mut layout =
            SystemMapLayout::from_description(&system_map(), LayoutConfig::default(), DEFAULT_SEED)
                .unwrap();
        assert_eq!(layout.node_count(), 14);
        assert_eq!(layout.edge_count(), 16);
        assert_eq!(layout.categories().len(), 7);

        let bounds = Bounds::default();
        let mut repaints = 0;
        let mut frames = 0;
        assert!(layout.start());
        loop {
            let status = layout.frame();
            frames += 1;
            if matches!(status, FrameStatus::Repaint | FrameStatus::Finished) {
                repaints += 1;
                let snapshot = layout.scheduler().snapshot();
                for node in &snapshot.nodes {
                    assert!(node.x.is_finite() && node.y.is_finite());
                    assert!(bounds.contains(node.x, node.y), "{} escaped", node.id);
                }
            }
            if status == FrameStatus::Finished {
                break;
            }
        }

        assert_eq!(frames, 300);
        assert_eq!(repaints, 101);
        assert!(!layout.is_live());
        assert!(!layout.is_running());
        assert!(!layout.advance());
    }

    /// Related components should end up closer together than unrelated ones.
    #[test]
    fn test_system_map_clusters_related_nodes() {
        let description = system_map();
        let graph = description.build().unwrap();
        let mut simulation = Simulation::new(graph, LayoutConfig::default()).unwrap();
        simulation.settle();

        let snapshot = simulation.snapshot();
        let graph = simulation.graph();
        let mut edge_lengths = Vec::new();
        let mut other_lengths = Vec::new();
        for i in 0..snapshot.nodes.len() {
            for j in (i + 1)..snapshot.nodes.len() {
                let d = distance(&snapshot.nodes[i], &snapshot.nodes[j]);
                assert!(
                    d > 50.0,
                    "{} and {} overlap",
                    snapshot.nodes[i].id,
                    snapshot.nodes[j].id
                );
                if graph.neighbors(NodeId(i as u32)).contains(&NodeId(j as u32)) {
                    edge_lengths.push(d);
                } else {
                    other_lengths.push(d);
                }
            }
        }

        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        assert_eq!(edge_lengths.len(), 16);
        assert!(
            mean(&edge_lengths) < mean(&other_lengths),
            "edges {} vs others {}",
            mean(&edge_lengths),
            mean(&other_lengths)
        );
    }

    #[test]
    fn test_same_seed_same_layout() {
        let run = |seed| {
            let mut layout =
                SystemMapLayout::from_description(&system_map(), LayoutConfig::default(), seed)
                    .unwrap();
            layout.scheduler_mut().simulation_mut().settle();
            layout.scheduler().snapshot()
        };
        assert_eq!(run(11), run(11));
        assert_ne!(run(11), run(12));
    }

    #[test]
    fn test_drag_then_release() {
        let mut layout =
            SystemMapLayout::from_description(&system_map(), LayoutConfig::default(), DEFAULT_SEED)
                .unwrap();
        layout.start();
        for _ in 0..20 {
            layout.frame();
        }

        let snapshot = layout.scheduler().snapshot();
        let core = snapshot.get("aros-core").unwrap();
        assert_eq!(
            layout.find_node_at(core.x + 2.0, core.y - 2.0, 12.0),
            snapshot.node_at(core.x + 2.0, core.y - 2.0, 12.0).map(str::to_string)
        );

        layout
            .scheduler_mut()
            .simulation_mut()
            .drag_to("aros-core", 120.0, 120.0)
            .unwrap();
        for _ in 0..20 {
            layout.frame();
        }
        let dragged = layout.scheduler().snapshot();
        let core = dragged.get("aros-core").unwrap();
        assert_eq!((core.x, core.y), (120.0, 120.0));
        assert_eq!(layout.find_node_at(121.0, 119.0, 5.0).as_deref(), Some("aros-core"));

        layout.scheduler_mut().simulation_mut().unpin("aros-core").unwrap();
        while layout.frame() != FrameStatus::Finished {}
        let released = layout.scheduler().snapshot();
        assert_ne!(released.get("aros-core").unwrap().x, 120.0);
    }

    #[test]
    fn test_invalid_description_is_rejected() {
        let description = GraphDescription::from_json(
            r#"{ "nodes": [ { "id": "a", "category": "x", "connections": ["missing"] } ] }"#,
        )
        .unwrap();
        let err = SystemMapLayout::from_description(&description, LayoutConfig::default(), 0)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LayoutError::Validation(ValidationError::UnknownEdgeEndpoint { .. })
        ));
    }

    #[test]
    fn test_frame_status_mapping() {
        assert_eq!(FrameStatus::from(Frame::Idle), FrameStatus::Idle);
        assert_eq!(
            FrameStatus::from(Frame::Advanced { step: 1, repaint: false }),
            FrameStatus::Advanced
        );
        assert_eq!(
            FrameStatus::from(Frame::Advanced { step: 3, repaint: true }),
            FrameStatus::Repaint
        );
        assert_eq!(FrameStatus::from(Frame::Finished { step: 299 }), FrameStatus::Finished);
    }
}
