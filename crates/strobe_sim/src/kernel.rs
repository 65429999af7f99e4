//! The tick execution engine.
//!
//! [`TickKernel`] owns a circuit value struct and its validated
//! [`Schedule`]. One call to [`tick`](TickKernel::tick) executes every step
//! exactly once, in order, and is the engine's entire runtime: no event
//! queue, no sensitivity analysis, no error path. External stimulus is
//! written into the circuit through [`circuit_mut`](TickKernel::circuit_mut)
//! strictly before the tick that is meant to observe it.

use serde::{Deserialize, Serialize};

use crate::schedule::Schedule;

/// Summary of a completed [`run`](TickKernel::run).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Ticks executed by this run.
    pub ticks: u64,
    /// Steps executed by this run (`ticks * schedule length`).
    pub steps: u64,
}

/// The simulation engine: a circuit plus its fixed per-tick schedule.
pub struct TickKernel<C> {
    circuit: C,
    schedule: Schedule<C>,
    ticks: u64,
}

impl<C> TickKernel<C> {
    /// Creates a kernel from a circuit in its construction state and a
    /// validated schedule.
    pub fn new(circuit: C, schedule: Schedule<C>) -> Self {
        Self {
            circuit,
            schedule,
            ticks: 0,
        }
    }

    /// Executes one clock tick: every step once, in schedule order.
    pub fn tick(&mut self) {
        for step in self.schedule.steps() {
            step.execute(&mut self.circuit);
        }
        self.ticks += 1;
    }

    /// Executes `ticks` clock ticks.
    pub fn run(&mut self, ticks: u64) -> RunStats {
        for _ in 0..ticks {
            self.tick();
        }
        RunStats {
            ticks,
            steps: ticks * self.schedule.len() as u64,
        }
    }

    /// Total ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Read access to the circuit state.
    pub fn circuit(&self) -> &C {
        &self.circuit
    }

    /// Mutable access to the circuit state, for injecting external
    /// stimulus between ticks.
    pub fn circuit_mut(&mut self) -> &mut C {
        &mut self.circuit
    }

    /// The kernel's schedule.
    pub fn schedule(&self) -> &Schedule<C> {
        &self.schedule
    }
}
