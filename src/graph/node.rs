//! Node type and related structures.
//!
//! Nodes are the vertices of the system map. Each node has:
//! - A unique string identifier supplied by the host
//! - A category (groups nodes for placement, centering anchors and the legend)
//! - An optional seeded position, and whether it starts pinned
//!
//! Internally every node is addressed by a dense [`NodeId`] slot index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense node slot identifier.
///
/// Slots are assigned in declaration order and never change during a run,
/// so a `NodeId` indexes directly into the layout state arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot index into per-node arrays.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Host-supplied description of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    pub category: String,
    /// Seeded position. When absent the placement is derived from the
    /// category and the PRNG seed.
    #[serde(default)]
    pub position: Option<[f64; 2]>,
    /// Start the run pinned at `position` (or at the seeded placement).
    #[serde(default)]
    pub pinned: bool,
    /// Ids of related nodes, as the system map tables declare them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<String>,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            position: None,
            pinned: false,
            connections: Vec::new(),
        }
    }

    /// Seed the node at a fixed position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some([x, y]);
        self
    }

    /// Start the node pinned.
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Declare relations to other nodes by id.
    pub fn connected_to<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Per-node simulation flags packed into a single byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    flags: u8,
}

impl NodeFlags {
    const PINNED: u8 = 0b0000_0001;
    const CLAMPED: u8 = 0b0000_0010;

    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    /// Check if the node is pinned (excluded from position updates).
    #[inline]
    pub fn is_pinned(self) -> bool {
        self.flags & Self::PINNED != 0
    }

    #[inline]
    pub fn set_pinned(&mut self, pinned: bool) {
        if pinned {
            self.flags |= Self::PINNED;
        } else {
            self.flags &= !Self::PINNED;
        }
    }

    /// Check if the node was clamped to a wall during the last step.
    #[inline]
    pub fn is_clamped(self) -> bool {
        self.flags & Self::CLAMPED != 0
    }

    #[inline]
    pub fn set_clamped(&mut self, clamped: bool) {
        if clamped {
            self.flags |= Self::CLAMPED;
        } else {
            self.flags &= !Self::CLAMPED;
        }
    }
}
