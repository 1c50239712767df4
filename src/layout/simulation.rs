//! Simulation - the force-directed layout engine.
//!
//! A simulation is a two-state machine. While **Running** (`step < max_steps`)
//! every [`Simulation::advance`] call performs one annealed physics step:
//!
//! 1. Compute the anneal weight `max(min_weight, base_weight * (1 - step / max_steps))`.
//! 2. Separate exactly coincident nodes.
//! 3. Accumulate repulsion, edge springs and centering into the force buffer.
//! 4. Damp velocities, add `force * time_step`, integrate `position += velocity`
//!    for every unpinned node. A node whose new state is non-finite has its
//!    velocity zeroed and keeps its last position.
//! 5. Clamp into the bounds with an inelastic bounce.
//! 6. Increment the step.
//!
//! Once `step == max_steps` the simulation is **Frozen** and `advance` is a
//! no-op. The run is frame-count driven: there is no wall-clock input, so a
//! paused and resumed host sees exactly the same sequence of layouts.

use std::sync::Arc;

use log::{debug, info, trace, warn};

use crate::config::LayoutConfig;
use crate::error::{LayoutError, ValidationError};
use crate::graph::{Graph, NodeId};

use super::forces::{
    ForceBuffer, apply_centering, apply_edge_springs, apply_repulsion, contain,
    separate_coincident,
};
use super::snapshot::{LayoutSnapshot, NodePosition};
use super::state::{Kinematics, LayoutState};

/// Annealing step counter. `0 <= step <= max_steps`; `max_steps` is fixed
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    step: u32,
    max_steps: u32,
}

impl SimulationClock {
    pub fn new(max_steps: u32) -> Self {
        Self { step: 0, max_steps }
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn is_frozen(&self) -> bool {
        self.step >= self.max_steps
    }

    /// Fraction of the schedule completed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.max_steps == 0 {
            1.0
        } else {
            f64::from(self.step) / f64::from(self.max_steps)
        }
    }

    fn tick(&mut self) {
        if self.step < self.max_steps {
            self.step += 1;
        }
    }
}

/// What happened during one [`Simulation::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Step index that was executed (before the increment).
    pub step: u32,
    /// Anneal weight used for the step.
    pub weight: f64,
    /// Nodes moved off an exactly coincident neighbour.
    pub separated: usize,
    /// Pairs skipped by repulsion because they were still coincident.
    pub coincident_pairs: usize,
    /// Nodes whose velocity was zeroed after a non-finite result.
    pub recovered: usize,
    /// Nodes clamped to a wall.
    pub clamped: usize,
}

/// The layout engine. Owns its layout state exclusively.
#[derive(Debug, Clone)]
pub struct Simulation {
    graph: Arc<Graph>,
    config: LayoutConfig,
    state: LayoutState,
    clock: SimulationClock,
    /// Centering target per node slot.
    targets: Vec<[f64; 2]>,
    forces: ForceBuffer,
}

impl Simulation {
    /// Create a simulation seeded from `config.seed`.
    pub fn new(graph: impl Into<Arc<Graph>>, config: LayoutConfig) -> Result<Self, LayoutError> {
        let seed = config.seed;
        Self::with_seed(graph, config, seed)
    }

    /// Create a simulation with an explicit placement seed.
    pub fn with_seed(
        graph: impl Into<Arc<Graph>>,
        config: LayoutConfig,
        seed: u64,
    ) -> Result<Self, LayoutError> {
        config.validate()?;
        let graph = graph.into();
        let state = LayoutState::seeded(&graph, &config, seed);
        info!(
            "simulation created: {} nodes, {} edges, seed {seed:#x}",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self::assemble(graph, config, state))
    }

    /// Create a simulation from a caller-supplied initial layout.
    ///
    /// The layout must hold one entry per node slot. Positions are clamped
    /// into the bounds; nodes pinned in the graph description or in the
    /// layout itself start pinned.
    pub fn with_layout(
        graph: impl Into<Arc<Graph>>,
        config: LayoutConfig,
        mut layout: LayoutState,
    ) -> Result<Self, LayoutError> {
        config.validate()?;
        let graph = graph.into();
        if layout.len() != graph.node_count() {
            return Err(ValidationError::StateMismatch {
                expected: graph.node_count(),
                actual: layout.len(),
            }
            .into());
        }

        for (i, spec) in graph.nodes().iter().enumerate() {
            let id = NodeId(i as u32);
            let Some(point) = layout.kinematics(id) else {
                continue;
            };
            if !point.is_finite() {
                return Err(ValidationError::NonFinitePosition(spec.id.clone()).into());
            }
            let (x, y) = config.bounds.clamp(point.x, point.y);
            layout.set_position(id, x, y);
            if spec.pinned {
                layout.set_pinned(id, true);
            }
        }

        info!(
            "simulation created from layout: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self::assemble(graph, config, layout))
    }

    fn assemble(graph: Arc<Graph>, config: LayoutConfig, state: LayoutState) -> Self {
        let targets = graph
            .nodes()
            .iter()
            .map(|spec| config.anchor_for(&spec.category))
            .collect();
        let n = graph.node_count();
        Self {
            clock: SimulationClock::new(config.max_steps),
            forces: ForceBuffer::new(n),
            graph,
            config,
            state,
            targets,
        }
    }

    /// Anneal weight for the current step.
    pub fn anneal_weight(&self) -> f64 {
        let decay = self.config.base_weight * (1.0 - self.clock.progress());
        // f64::max ignores a NaN operand, so the floor also absorbs it.
        decay.max(self.config.min_weight)
    }

    /// True while the simulation is Running.
    pub fn is_live(&self) -> bool {
        !self.clock.is_frozen()
    }

    /// Run one physics step. Returns `None`, without touching any state,
    /// once Frozen.
    pub fn advance(&mut self) -> Option<StepReport> {
        if self.clock.is_frozen() {
            return None;
        }

        let step = self.clock.step();
        let weight = self.anneal_weight();
        let n = self.state.len();

        let separated = separate_coincident(
            &mut self.state,
            &self.config.bounds,
            self.config.coincident_nudge,
        );

        self.forces.reset(n);
        let coincident_pairs = apply_repulsion(&self.state, &self.config, weight, &mut self.forces);
        apply_edge_springs(&self.graph, &self.state, &self.config, weight, &mut self.forces);
        apply_centering(&self.state, &self.targets, &self.config, weight, &mut self.forces);

        let recovered = self.integrate();
        let clamped = contain(&mut self.state, &self.config.bounds, self.config.bounce);

        if separated > 0 || coincident_pairs > 0 {
            debug!(
                "step {step}: separated {separated} coincident nodes, skipped {coincident_pairs} pairs"
            );
        }
        if recovered > 0 {
            warn!("step {step}: zeroed velocity of {recovered} nodes with non-finite state");
        }

        self.clock.tick();
        trace!("step {step}: weight {weight:.5}, clamped {clamped}");
        if self.clock.is_frozen() {
            debug!("simulation frozen after {} steps", self.clock.step());
        }

        Some(StepReport {
            step,
            weight,
            separated,
            coincident_pairs,
            recovered,
            clamped,
        })
    }

    /// Damp, apply forces and move every unpinned node. Returns the number
    /// of nodes recovered from a non-finite result.
    fn integrate(&mut self) -> usize {
        let damping = self.config.damping;
        let dt = self.config.time_step;
        let state = &mut self.state;
        let mut recovered = 0;

        for i in 0..state.len() {
            if state.flags[i].is_pinned() {
                continue;
            }
            let vx = state.vel_x[i] * damping + self.forces.fx[i] * dt;
            let vy = state.vel_y[i] * damping + self.forces.fy[i] * dt;
            let x = state.pos_x[i] + vx;
            let y = state.pos_y[i] + vy;

            if vx.is_finite() && vy.is_finite() && x.is_finite() && y.is_finite() {
                state.vel_x[i] = vx;
                state.vel_y[i] = vy;
                state.pos_x[i] = x;
                state.pos_y[i] = y;
            } else {
                state.vel_x[i] = 0.0;
                state.vel_y[i] = 0.0;
                recovered += 1;
            }
        }
        recovered
    }

    /// Advance until Frozen. Returns the number of steps taken.
    pub fn settle(&mut self) -> u32 {
        let mut steps = 0;
        while self.advance().is_some() {
            steps += 1;
        }
        steps
    }

    // =========================================================================
    // Interaction hooks
    // =========================================================================

    /// Freeze a node against all forces. It keeps acting on its neighbours.
    pub fn pin(&mut self, id: &str) -> Result<(), ValidationError> {
        let slot = self.graph.resolve(id)?;
        self.state.set_pinned(slot, true);
        debug!("pinned `{id}`");
        Ok(())
    }

    /// Release a pinned node back to the simulation.
    pub fn unpin(&mut self, id: &str) -> Result<(), ValidationError> {
        let slot = self.graph.resolve(id)?;
        self.state.set_pinned(slot, false);
        debug!("unpinned `{id}`");
        Ok(())
    }

    /// Pin a node and move it, as while the user drags it. The position is
    /// clamped into the bounds and the node's velocity is cleared.
    pub fn drag_to(&mut self, id: &str, x: f64, y: f64) -> Result<(), ValidationError> {
        let slot = self.graph.resolve(id)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(ValidationError::NonFinitePosition(id.to_string()));
        }
        let (x, y) = self.config.bounds.clamp(x, y);
        self.state.set_pinned(slot, true);
        self.state.set_position(slot, x, y);
        self.state.set_velocity(slot, 0.0, 0.0);
        Ok(())
    }

    pub fn is_pinned(&self, id: &str) -> Result<bool, ValidationError> {
        let slot = self.graph.resolve(id)?;
        Ok(self.state.is_pinned(slot))
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Copy of every node's current position.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let nodes = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, spec)| NodePosition {
                id: spec.id.clone(),
                x: self.state.pos_x[i],
                y: self.state.pos_y[i],
            })
            .collect();
        LayoutSnapshot {
            step: self.clock.step(),
            max_steps: self.clock.max_steps(),
            live: self.is_live(),
            nodes,
        }
    }

    /// Position and velocity of a node by host id.
    pub fn kinematics(&self, id: &str) -> Option<Kinematics> {
        self.graph.id_of(id).and_then(|slot| self.state.kinematics(slot))
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Shared handle to the graph, for hosts that query adjacency.
    pub fn graph_handle(&self) -> Arc<Graph> {
        Arc::clone(&self.graph)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn clock(&self) -> SimulationClock {
        self.clock
    }

    pub fn step(&self) -> u32 {
        self.clock.step()
    }

    pub fn max_steps(&self) -> u32 {
        self.clock.max_steps()
    }
}
