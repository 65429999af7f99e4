//! Hardware primitive library for the Strobe cycle-accurate simulator.
//!
//! This crate provides the fixed set of units that Strobe circuits are built
//! from: stateless combinational units (multiplexer, comparators, adder,
//! subtractor, barrel shifters) and clocked registers with explicit
//! pending/committed halves, plus the val/rdy handshake bundle used for
//! elastic flow control between pipeline stages.
//!
//! Every unit owns its ports as public fields. Input ports are written by
//! the wiring (fanout) steps of a schedule; a combinational unit's
//! `recompute()` reads its input ports and rewrites its output port, and a
//! register's `commit()` performs the tick-boundary update. No unit touches
//! state outside its own fields.

#![warn(missing_docs)]

pub mod arith;
pub mod mux;
pub mod reg;
pub mod shift;
pub mod valrdy;

pub use arith::{Adder, LtComp, Subtractor, ZeroComp};
pub use mux::Mux;
pub use reg::{Reg, RegEn};
pub use shift::{LShifter, RShifter};
pub use valrdy::ValRdy;
