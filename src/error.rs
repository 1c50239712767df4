//! Error types for graph construction, configuration and simulation setup.
//!
//! Numeric degeneracies during a step (coincident nodes, non-finite
//! intermediate values) are not errors: they are recovered inside the
//! engine and only surface in [`crate::layout::StepReport`].

use thiserror::Error;

/// A malformed graph description or an operation naming a node that
/// does not exist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Two node specs share the same id.
    #[error("duplicate node id `{0}`")]
    DuplicateNodeId(String),

    /// A node spec has an empty id.
    #[error("node at index {0} has an empty id")]
    EmptyNodeId(usize),

    /// An edge (or a `connections` entry) references a node that is not
    /// in the node set.
    #[error("edge `{from}` -> `{to}` references unknown node `{missing}`")]
    UnknownEdgeEndpoint {
        from: String,
        to: String,
        missing: String,
    },

    /// A node spec carries a NaN or infinite position.
    #[error("node `{0}` has a non-finite position")]
    NonFinitePosition(String),

    /// A pin/unpin/drag request named a node that is not in the graph.
    #[error("unknown node id `{0}`")]
    UnknownNode(String),

    /// A caller-supplied layout state does not match the graph size.
    #[error("layout state has {actual} nodes, graph has {expected}")]
    StateMismatch { expected: usize, actual: usize },
}

/// A layout configuration value outside its accepted range.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid layout config `{field}`: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Any failure while setting up a simulation.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A JSON description or config could not be parsed.
    #[error("failed to parse layout input: {0}")]
    Parse(#[from] serde_json::Error),
}
