//! Force-directed layout.
//!
//! [`Simulation`] owns a [`LayoutState`] and advances it one annealed step at
//! a time using the force functions in [`forces`]. Hosts read positions only
//! through [`LayoutSnapshot`] copies.

pub mod forces;
mod simulation;
mod snapshot;
mod state;

pub use forces::ForceBuffer;
pub use simulation::{Simulation, SimulationClock, StepReport};
pub use snapshot::{LayoutSnapshot, NodePosition};
pub use state::{Kinematics, LayoutState};
