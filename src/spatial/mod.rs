//! Spatial indexing for pointer hit testing.
//!
//! This module provides an R-tree based spatial index so the host can map a
//! pointer position to the node under it before pinning or dragging.

mod rtree;

pub use rtree::SpatialIndex;
