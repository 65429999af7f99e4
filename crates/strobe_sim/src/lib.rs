//! Static per-tick scheduling and the tick kernel for the Strobe simulator.
//!
//! A Strobe circuit is a plain value struct (registers, combinational
//! units, handshake bundles) paired with a fixed, precomputed sequence of
//! steps — register commits, combinational recomputes, and fanout copies —
//! that is executed once per clock tick. The sequence reproduces the
//! semantics of concurrent hardware evaluation purely through its order:
//! every combinational output is computed after its producers and before
//! its consumers, and every register's visible value is the one captured at
//! the previous tick boundary.
//!
//! The ordering guarantee is established once, at construction time:
//! [`Schedule::new`] checks the producer-before-consumer invariant against
//! the steps' declared signal reads and writes and rejects a misordered or
//! cyclic sequence. The per-tick loop in [`TickKernel::tick`] then runs
//! unchecked — there is no runtime error path and no re-verification.
//!
//! # Modules
//!
//! - `signal` — flat named-signal table and `SigId`
//! - `step` — commit/comb/fanout step descriptors
//! - `schedule` — the validated step sequence
//! - `error` — construction-time validation errors
//! - `kernel` — the tick execution engine

#![warn(missing_docs)]

pub mod error;
pub mod kernel;
pub mod schedule;
pub mod signal;
pub mod step;

pub use error::ScheduleError;
pub use kernel::{RunStats, TickKernel};
pub use schedule::Schedule;
pub use signal::{SigId, SignalDb, SignalInfo};
pub use step::{Step, StepKind};
