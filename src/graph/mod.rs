//! Graph data structures.
//!
//! The graph is the static input of a layout run: node ids, categories and
//! undirected relations. It never changes while a simulation is live.

mod edge;
mod model;
mod node;

pub use edge::{EdgeId, EdgeSpec};
pub use model::{Graph, GraphDescription, build_graph};
pub use node::{NodeFlags, NodeId, NodeSpec};
