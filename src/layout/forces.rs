//! Force functions.
//!
//! Each function reads the current layout state and accumulates a force
//! contribution per node into a [`ForceBuffer`], scaled by the anneal weight.
//! Positions are never read and written in the same pass, so results do not
//! depend on node order beyond floating point summation order.
//!
//! Pinned nodes still act as force sources; whatever accumulates on them is
//! discarded at integration time.

use crate::config::{Bounds, LayoutConfig};
use crate::graph::{Graph, NodeId};

use super::state::LayoutState;

/// pi * (3 - sqrt(5))
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Per-node force accumulator, reused across steps.
#[derive(Debug, Clone, Default)]
pub struct ForceBuffer {
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
}

impl ForceBuffer {
    pub fn new(n: usize) -> Self {
        Self {
            fx: vec![0.0; n],
            fy: vec![0.0; n],
        }
    }

    /// Zero the buffer for `n` nodes.
    pub fn reset(&mut self, n: usize) {
        self.fx.clear();
        self.fx.resize(n, 0.0);
        self.fy.clear();
        self.fy.resize(n, 0.0);
    }

    pub fn get(&self, id: NodeId) -> (f64, f64) {
        (self.fx[id.index()], self.fy[id.index()])
    }
}

/// Pairwise repulsion within `repulsion_radius`.
///
/// Magnitude `k_rep * (radius - d) / d` applied along the displacement, so
/// the push grows linearly as the pair closes in. Exactly coincident pairs
/// are skipped; returns how many were.
pub fn apply_repulsion(
    state: &LayoutState,
    config: &LayoutConfig,
    weight: f64,
    forces: &mut ForceBuffer,
) -> usize {
    let n = state.len();
    let radius = config.repulsion_radius;
    let mut degenerate = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            let dx = state.pos_x[i] - state.pos_x[j];
            let dy = state.pos_y[i] - state.pos_y[j];
            let distance = (dx * dx + dy * dy).sqrt();

            if distance == 0.0 {
                degenerate += 1;
                continue;
            }
            if distance < radius {
                let force = config.repulsion_strength * (radius - distance) / distance * weight;
                let fx = dx * force;
                let fy = dy * force;
                forces.fx[i] += fx;
                forces.fy[i] += fy;
                forces.fx[j] -= fx;
                forces.fy[j] -= fy;
            }
        }
    }
    degenerate
}

/// One-sided springs along every edge.
///
/// A stretched edge pulls its endpoints together with magnitude
/// `(d - rest_length) * k_spring`; a compressed edge exerts nothing.
pub fn apply_edge_springs(
    graph: &Graph,
    state: &LayoutState,
    config: &LayoutConfig,
    weight: f64,
    forces: &mut ForceBuffer,
) {
    for &(a, b) in graph.edges() {
        let (a, b) = (a.index(), b.index());
        if a == b {
            continue;
        }
        let dx = state.pos_x[a] - state.pos_x[b];
        let dy = state.pos_y[a] - state.pos_y[b];
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > config.rest_length {
            let force = (distance - config.rest_length) * config.spring_strength * weight;
            let fx = dx / distance * force;
            let fy = dy / distance * force;
            forces.fx[a] -= fx;
            forces.fy[a] -= fy;
            forces.fx[b] += fx;
            forces.fy[b] += fy;
        }
    }
}

/// Pull each node toward its centering target once it strays beyond
/// `centering_radius`. `targets` holds one point per node slot.
pub fn apply_centering(
    state: &LayoutState,
    targets: &[[f64; 2]],
    config: &LayoutConfig,
    weight: f64,
    forces: &mut ForceBuffer,
) {
    for (i, [tx, ty]) in targets.iter().copied().enumerate().take(state.len()) {
        let dx = tx - state.pos_x[i];
        let dy = ty - state.pos_y[i];
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > config.centering_radius {
            forces.fx[i] += dx * config.centering_strength * weight;
            forces.fy[i] += dy * config.centering_strength * weight;
        }
    }
}

/// Move nodes off exactly coincident neighbours.
///
/// The later unpinned node of each coincident pair is shifted by `nudge`
/// along a golden-angle direction derived from its slot, mirrored on any
/// axis that would leave the bounds. Deterministic. Returns the number of
/// nodes moved.
pub fn separate_coincident(state: &mut LayoutState, bounds: &Bounds, nudge: f64) -> usize {
    let n = state.len();
    let mut moved = 0;
    if nudge <= 0.0 {
        return 0;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if state.pos_x[i] != state.pos_x[j] || state.pos_y[i] != state.pos_y[j] {
                continue;
            }
            let target = if !state.flags[j].is_pinned() {
                j
            } else if !state.flags[i].is_pinned() {
                i
            } else {
                continue;
            };

            let angle = target as f64 * GOLDEN_ANGLE;
            let (ox, oy) = (angle.cos() * nudge, angle.sin() * nudge);
            let (x, y) = (state.pos_x[target], state.pos_y[target]);

            let mut nx = x + ox;
            if nx < bounds.min_x() || nx > bounds.max_x() {
                nx = x - ox;
            }
            let mut ny = y + oy;
            if ny < bounds.min_y() || ny > bounds.max_y() {
                ny = y - oy;
            }
            state.pos_x[target] = nx;
            state.pos_y[target] = ny;
            moved += 1;
        }
    }
    moved
}

/// Hard-clamp unpinned nodes into the bounds.
///
/// A clamped velocity component is turned back inward and scaled by
/// `bounce`. Sets each node's clamped flag; returns how many were clamped.
pub fn contain(state: &mut LayoutState, bounds: &Bounds, bounce: f64) -> usize {
    let mut clamped = 0;
    for i in 0..state.len() {
        if state.flags[i].is_pinned() {
            continue;
        }
        let mut hit = false;

        if state.pos_x[i] < bounds.min_x() {
            state.pos_x[i] = bounds.min_x();
            state.vel_x[i] = state.vel_x[i].abs() * bounce;
            hit = true;
        } else if state.pos_x[i] > bounds.max_x() {
            state.pos_x[i] = bounds.max_x();
            state.vel_x[i] = -state.vel_x[i].abs() * bounce;
            hit = true;
        }

        if state.pos_y[i] < bounds.min_y() {
            state.pos_y[i] = bounds.min_y();
            state.vel_y[i] = state.vel_y[i].abs() * bounce;
            hit = true;
        } else if state.pos_y[i] > bounds.max_y() {
            state.pos_y[i] = bounds.max_y();
            state.vel_y[i] = -state.vel_y[i].abs() * bounce;
            hit = true;
        }

        state.flags[i].set_clamped(hit);
        if hit {
            clamped += 1;
        }
    }
    clamped
}
