//! Browser-side tests of the JavaScript facade.
#![cfg(target_arch = "wasm32")]

use serde::Serialize;
use system_map_layout::{
    FrameStatus, GraphDescription, LayoutConfig, LayoutSnapshot, NodeSpec, SystemMapLayout,
};
use wasm_bindgen::{JsError, JsValue};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn description() -> JsValue {
    let description = GraphDescription {
        nodes: vec![
            NodeSpec::new("core", "Foundation").connected_to(["agents", "qvm"]),
            NodeSpec::new("agents", "Intelligence"),
            NodeSpec::new("qvm", "Processing"),
        ],
        edges: Vec::new(),
    };
    serde_wasm_bindgen::to_value(&description).unwrap()
}

fn ok<T>(result: Result<T, JsError>) -> T {
    result.ok().expect("facade call failed")
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    max_steps: u32,
}

#[wasm_bindgen_test]
fn constructs_with_default_config() {
    let layout = ok(SystemMapLayout::new(description(), JsValue::UNDEFINED));
    assert_eq!(layout.node_count(), 3);
    assert_eq!(layout.edge_count(), 2);
    assert_eq!(layout.max_steps(), LayoutConfig::default().max_steps);
    assert_eq!(layout.positions_x().length(), 3);
}

#[wasm_bindgen_test]
fn runs_partial_config_to_finish() {
    let config = serde_wasm_bindgen::to_value(&PartialConfig { max_steps: 12 }).unwrap();
    let mut layout = ok(SystemMapLayout::new(description(), config));
    assert_eq!(layout.frame(), FrameStatus::Idle);

    assert!(layout.start());
    let mut frames = 1;
    while layout.frame() != FrameStatus::Finished {
        frames += 1;
    }
    assert_eq!(frames, 12);
    assert!(!layout.is_running());

    let snapshot: LayoutSnapshot =
        serde_wasm_bindgen::from_value(ok(layout.get_snapshot())).unwrap();
    assert_eq!(snapshot.step, 12);
    assert!(!snapshot.live);
    assert_eq!(snapshot.nodes.len(), 3);
}

#[wasm_bindgen_test]
fn pin_and_drag() {
    let mut layout = ok(SystemMapLayout::with_random_seed(description(), JsValue::NULL));
    ok(layout.drag_to("agents", 300.0, 250.0));
    assert!(ok(layout.is_pinned("agents")));

    layout.start();
    for _ in 0..10 {
        layout.frame();
    }
    assert_eq!(layout.find_node_at(301.0, 250.0, 4.0).as_deref(), Some("agents"));

    ok(layout.unpin("agents"));
    assert!(!ok(layout.is_pinned("agents")));
    assert!(layout.pin("nope").is_err());
    assert_eq!(ok(layout.neighbors("core")), vec!["agents", "qvm"]);
}
