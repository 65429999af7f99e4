//! Validation circuits for the Strobe simulator.
//!
//! Three complete designs exercise the static scheduler end to end, each
//! wrapped by a stream source and sink that drive and drain it every tick:
//!
//! - `gcd` — the iterative subtract/compare GCD unit;
//! - `mul_varlat` — a shift-add multiplier with a data-dependent,
//!   variable-latency step size;
//! - `mul_nstage` — a fixed-latency pipelined multiplier built from one
//!   parametrized one-bit shift-add stage instantiated 32 times.
//!
//! Every circuit is a plain struct-of-structs with top-down ownership;
//! cross-module reads (a controller observing a datapath comparator) are
//! explicit value copies performed by fanout steps, never aliased state.
//! Each harness builder allocates the full signal table, emits every
//! commit, recompute, and fanout step in dependency order, and returns a
//! kernel whose schedule has passed construction-time validation.

#![warn(missing_docs)]

pub mod gcd;
pub mod mul_nstage;
pub mod mul_varlat;
pub mod stream;

pub use gcd::GcdSim;
pub use mul_nstage::MulNstageSim;
pub use mul_varlat::MulVarLatSim;
pub use stream::{SourcePattern, StreamSink, StreamSource};

use strobe_sim::TickKernel;

/// Controller state for the GCD and multiplier FSMs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CtrlState {
    /// Waiting for a request transfer; operands latch on acceptance.
    #[default]
    Idle,
    /// Iterating on the datapath registers.
    Calc,
    /// Holding the result until the response transfer completes.
    Done,
}

/// Drives a kernel until `done` holds or the tick budget is exhausted.
///
/// Returns the total tick count at completion, or `None` if the predicate
/// never held within `max_ticks`. Liveness stays a caller responsibility —
/// this helper only bounds the wait.
pub fn run_until<C>(
    kernel: &mut TickKernel<C>,
    max_ticks: u64,
    mut done: impl FnMut(&C) -> bool,
) -> Option<u64> {
    for _ in 0..max_ticks {
        if done(kernel.circuit()) {
            return Some(kernel.ticks());
        }
        kernel.tick();
    }
    if done(kernel.circuit()) {
        Some(kernel.ticks())
    } else {
        None
    }
}
