//! Frame scheduler contract.
//!
//! The host's animation loop calls [`Scheduler::frame`] once per display
//! frame. The scheduler advances the simulation at most once per call, and
//! only between an explicit [`Scheduler::start`] and the matching
//! [`Scheduler::stop`] (or until the simulation freezes). [`Scheduler::run`]
//! returns a guard that stops scheduling when dropped, so every exit path of
//! the host's view releases the running state.

use log::debug;

use crate::layout::{LayoutSnapshot, Simulation};

/// Outcome of one host frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Not running; nothing was advanced.
    Idle,
    /// One step was advanced. `repaint` is set on the configured cadence.
    Advanced { step: u32, repaint: bool },
    /// The last step was advanced and the simulation froze. The host should
    /// repaint once more and stop requesting frames.
    Finished { step: u32 },
}

impl Frame {
    /// Whether the host should request another frame.
    pub fn should_continue(self) -> bool {
        matches!(self, Frame::Advanced { .. })
    }

    /// Whether the host should repaint after this frame.
    pub fn needs_repaint(self) -> bool {
        matches!(
            self,
            Frame::Advanced { repaint: true, .. } | Frame::Finished { .. }
        )
    }
}

/// Drives a [`Simulation`] from a host frame loop.
#[derive(Debug, Clone)]
pub struct Scheduler {
    simulation: Simulation,
    running: bool,
    render_interval: u32,
}

impl Scheduler {
    pub fn new(simulation: Simulation) -> Self {
        let render_interval = simulation.config().render_interval.max(1);
        Self {
            simulation,
            running: false,
            render_interval,
        }
    }

    /// Begin scheduling. Returns false (and stays stopped) if the
    /// simulation is already frozen.
    pub fn start(&mut self) -> bool {
        if !self.simulation.is_live() {
            return false;
        }
        if !self.running {
            debug!("scheduler started at step {}", self.simulation.step());
            self.running = true;
        }
        true
    }

    /// Stop scheduling. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            debug!("scheduler stopped at step {}", self.simulation.step());
            self.running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start scheduling for the lifetime of the returned guard.
    pub fn run(&mut self) -> Running<'_> {
        self.start();
        Running { scheduler: self }
    }

    /// Handle one host frame.
    pub fn frame(&mut self) -> Frame {
        if !self.running {
            return Frame::Idle;
        }
        let Some(report) = self.simulation.advance() else {
            self.stop();
            return Frame::Idle;
        };

        if !self.simulation.is_live() {
            self.stop();
            return Frame::Finished { step: report.step };
        }
        Frame::Advanced {
            step: report.step,
            repaint: report.step % self.render_interval == 0,
        }
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        self.simulation.snapshot()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Mutable access for the pin/unpin/drag hooks.
    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn into_simulation(self) -> Simulation {
        self.simulation
    }
}

/// Scoped running state. Scheduling stops when this guard is dropped.
pub struct Running<'a> {
    scheduler: &'a mut Scheduler,
}

impl Running<'_> {
    pub fn frame(&mut self) -> Frame {
        self.scheduler.frame()
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn scheduler(&mut self) -> &mut Scheduler {
        &mut *self.scheduler
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::graph::{NodeSpec, build_graph};

    fn scheduler(max_steps: u32) -> Scheduler {
        let graph = build_graph(
            vec![
                NodeSpec::new("a", "x").connected_to(["b"]),
                NodeSpec::new("b", "y"),
                NodeSpec::new("c", "y"),
            ],
            &[],
        )
        .unwrap();
        let config = LayoutConfig {
            max_steps,
            ..Default::default()
        };
        Scheduler::new(Simulation::new(graph, config).unwrap())
    }

    #[test]
    fn test_idle_until_started() {
        let mut scheduler = scheduler(10);
        assert_eq!(scheduler.frame(), Frame::Idle);
        assert_eq!(scheduler.simulation().step(), 0);

        assert!(scheduler.start());
        assert_eq!(
            scheduler.frame(),
            Frame::Advanced {
                step: 0,
                repaint: true
            }
        );
        assert_eq!(scheduler.simulation().step(), 1);
    }

    #[test]
    fn test_runs_to_finish_and_releases() {
        let mut scheduler = scheduler(10);
        scheduler.start();

        let mut frames = Vec::new();
        loop {
            let frame = scheduler.frame();
            frames.push(frame);
            if !frame.should_continue() {
                break;
            }
        }
        assert_eq!(frames.len(), 10);
        assert_eq!(frames.last(), Some(&Frame::Finished { step: 9 }));
        assert!(!scheduler.is_running());
        assert!(!scheduler.simulation().is_live());

        // Frozen: cannot restart, frames do nothing.
        assert!(!scheduler.start());
        assert_eq!(scheduler.frame(), Frame::Idle);
    }

    #[test]
    fn test_repaint_cadence() {
        let mut scheduler = scheduler(10);
        scheduler.start();
        let repaints: Vec<bool> = (0..10).map(|_| scheduler.frame().needs_repaint()).collect();
        // Steps 0, 3, 6 on cadence, step 9 because it is the last.
        assert_eq!(
            repaints,
            vec![true, false, false, true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn test_stop_pauses_without_advancing() {
        let mut scheduler = scheduler(10);
        scheduler.start();
        scheduler.frame();
        scheduler.stop();
        scheduler.stop();
        for _ in 0..5 {
            assert_eq!(scheduler.frame(), Frame::Idle);
        }
        assert_eq!(scheduler.simulation().step(), 1);

        assert!(scheduler.start());
        scheduler.frame();
        assert_eq!(scheduler.simulation().step(), 2);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let mut scheduler = scheduler(50);
        {
            let mut running = scheduler.run();
            assert!(running.is_running());
            running.frame();
            running.frame();
        }
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.simulation().step(), 2);
    }

    #[test]
    fn test_guard_releases_on_early_return() {
        fn mount_then_bail(scheduler: &mut Scheduler) -> Result<(), &'static str> {
            let mut running = scheduler.run();
            running.frame();
            Err::<(), _>("unmounted")?;
            running.frame();
            Ok(())
        }

        let mut scheduler = scheduler(50);
        assert!(mount_then_bail(&mut scheduler).is_err());
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.simulation().step(), 1);
    }

    #[test]
    fn test_pin_through_scheduler() {
        let mut scheduler = scheduler(20);
        scheduler.simulation_mut().pin("c").unwrap();
        let before = scheduler.simulation().kinematics("c").unwrap();
        let mut running = scheduler.run();
        while running.frame().should_continue() {}
        drop(running);
        assert_eq!(scheduler.simulation().kinematics("c").unwrap(), before);
    }
}
