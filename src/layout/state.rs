//! LayoutState - per-node mutable simulation state.
//!
//! Positions and velocities are stored in SoA (Structure of Arrays) layout,
//! indexed by [`NodeId`] slot. The state is owned by a single
//! [`Simulation`](super::Simulation); hosts only ever see copies.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::graph::{Graph, NodeFlags, NodeId};

/// Position and velocity of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Kinematics {
    /// A node at rest.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
        }
    }

    pub fn with_velocity(mut self, vx: f64, vy: f64) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.vx.is_finite() && self.vy.is_finite()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutState {
    pub(crate) pos_x: Vec<f64>,
    pub(crate) pos_y: Vec<f64>,
    pub(crate) vel_x: Vec<f64>,
    pub(crate) vel_y: Vec<f64>,
    pub(crate) flags: Vec<NodeFlags>,
}

impl LayoutState {
    /// Deterministic initial placement.
    ///
    /// Each category gets an angle around the center by order of first
    /// appearance; nodes are scattered around their category's angle with a
    /// small jitter. Nodes with a seeded position keep it. Random draws are
    /// made for every node so that seeding one position does not shift the
    /// placement of the others.
    pub fn seeded(graph: &Graph, config: &LayoutConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = graph.node_count();
        let category_count = graph.categories().len().max(1) as f64;
        let [cx, cy] = config.center_point();

        let mut state = Self::with_capacity(n);
        for (i, spec) in graph.nodes().iter().enumerate() {
            let id = NodeId(i as u32);
            let angle_noise: f64 = rng.random();
            let radius_noise: f64 = rng.random();

            let (x, y) = match spec.position {
                Some([x, y]) => (x, y),
                None => {
                    let base = graph.category_index(id) as f64 / category_count * TAU;
                    let angle = base + (angle_noise - 0.5) * config.angle_jitter;
                    let radius = config.spawn_radius + radius_noise * config.spawn_jitter;
                    (cx + angle.cos() * radius, cy + angle.sin() * radius)
                }
            };

            let (x, y) = config.bounds.clamp(x, y);
            state.push(Kinematics::at(x, y));
            state.flags[i].set_pinned(spec.pinned);
        }
        state
    }

    /// Build a state from explicit kinematics, one entry per node slot.
    pub fn from_kinematics(points: impl IntoIterator<Item = Kinematics>) -> Self {
        let mut state = Self::default();
        for point in points {
            state.push(point);
        }
        state
    }

    fn with_capacity(n: usize) -> Self {
        Self {
            pos_x: Vec::with_capacity(n),
            pos_y: Vec::with_capacity(n),
            vel_x: Vec::with_capacity(n),
            vel_y: Vec::with_capacity(n),
            flags: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, point: Kinematics) {
        self.pos_x.push(point.x);
        self.pos_y.push(point.y);
        self.vel_x.push(point.vx);
        self.vel_y.push(point.vy);
        self.flags.push(NodeFlags::new());
    }

    pub fn len(&self) -> usize {
        self.pos_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_x.is_empty()
    }

    pub fn kinematics(&self, id: NodeId) -> Option<Kinematics> {
        let i = id.index();
        (i < self.len()).then(|| Kinematics {
            x: self.pos_x[i],
            y: self.pos_y[i],
            vx: self.vel_x[i],
            vy: self.vel_y[i],
        })
    }

    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        let i = id.index();
        (i < self.len()).then(|| (self.pos_x[i], self.pos_y[i]))
    }

    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.flags.get(id.index()).copied().unwrap_or_default()
    }

    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.flags(id).is_pinned()
    }

    pub(crate) fn set_pinned(&mut self, id: NodeId, pinned: bool) {
        if let Some(flags) = self.flags.get_mut(id.index()) {
            flags.set_pinned(pinned);
        }
    }

    pub(crate) fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        let i = id.index();
        if i < self.len() {
            self.pos_x[i] = x;
            self.pos_y[i] = y;
        }
    }

    pub(crate) fn set_velocity(&mut self, id: NodeId, vx: f64, vy: f64) {
        let i = id.index();
        if i < self.len() {
            self.vel_x[i] = vx;
            self.vel_y[i] = vy;
        }
    }

    pub fn positions_x(&self) -> &[f64] {
        &self.pos_x
    }

    pub fn positions_y(&self) -> &[f64] {
        &self.pos_y
    }

    pub fn velocities_x(&self) -> &[f64] {
        &self.vel_x
    }

    pub fn velocities_y(&self) -> &[f64] {
        &self.vel_y
    }

    /// Every position and velocity component is finite.
    pub fn is_finite(&self) -> bool {
        [&self.pos_x, &self.pos_y, &self.vel_x, &self.vel_y]
            .iter()
            .all(|values| values.iter().all(|v| v.is_finite()))
    }
}
