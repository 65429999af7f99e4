//! Schedule step descriptors.
//!
//! A step is one call in the per-tick sequence: a register commit, a
//! combinational recompute, or a fanout (one producer value copied to many
//! consumer ports). Each step carries the signals it reads and writes so
//! the schedule can be validated once at construction; the executor closure
//! is what the tick loop actually runs.

use crate::signal::SigId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of update a step performs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum StepKind {
    /// A register commit at the tick boundary. Reads are the register's
    /// pending/enable ports as settled on the *previous* tick.
    Commit,
    /// A combinational recompute: pure function of same-tick inputs.
    Comb,
    /// A fanout: copies one producer signal to its consumer ports.
    Fanout,
}

/// One step of a circuit's per-tick schedule, executing against the
/// circuit state type `C`.
pub struct Step<C> {
    name: String,
    kind: StepKind,
    reads: Vec<SigId>,
    writes: Vec<SigId>,
    exec: Box<dyn Fn(&mut C)>,
}

impl<C> Step<C> {
    /// Creates a register-commit step.
    pub fn commit(
        name: impl Into<String>,
        reads: Vec<SigId>,
        writes: Vec<SigId>,
        exec: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self::with_kind(StepKind::Commit, name, reads, writes, exec)
    }

    /// Creates a combinational-recompute step.
    pub fn comb(
        name: impl Into<String>,
        reads: Vec<SigId>,
        writes: Vec<SigId>,
        exec: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self::with_kind(StepKind::Comb, name, reads, writes, exec)
    }

    /// Creates a fanout step.
    pub fn fanout(
        name: impl Into<String>,
        reads: Vec<SigId>,
        writes: Vec<SigId>,
        exec: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self::with_kind(StepKind::Fanout, name, reads, writes, exec)
    }

    fn with_kind(
        kind: StepKind,
        name: impl Into<String>,
        reads: Vec<SigId>,
        writes: Vec<SigId>,
        exec: impl Fn(&mut C) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            reads,
            writes,
            exec: Box::new(exec),
        }
    }

    /// The step's display name (typically the updated unit's path).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The step's kind.
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Signals this step reads.
    pub fn reads(&self) -> &[SigId] {
        &self.reads
    }

    /// Signals this step writes.
    pub fn writes(&self) -> &[SigId] {
        &self.writes
    }

    /// Runs the step against the circuit state.
    pub fn execute(&self, circuit: &mut C) {
        (self.exec)(circuit);
    }
}

// The executor closure is opaque; render the metadata only.
impl<C> fmt::Debug for Step<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_executes_against_state() {
        let step: Step<u32> = Step::comb("bump", vec![], vec![], |c| *c += 1);
        let mut state = 0u32;
        step.execute(&mut state);
        step.execute(&mut state);
        assert_eq!(state, 2);
    }

    #[test]
    fn metadata_accessors() {
        let r = SigId::from_raw(0);
        let w = SigId::from_raw(1);
        let step: Step<()> = Step::fanout("top.wire", vec![r], vec![w], |_| {});
        assert_eq!(step.name(), "top.wire");
        assert_eq!(step.kind(), StepKind::Fanout);
        assert_eq!(step.reads(), &[r]);
        assert_eq!(step.writes(), &[w]);
    }

    #[test]
    fn debug_omits_closure() {
        let step: Step<()> = Step::commit("top.reg", vec![], vec![], |_| {});
        let dbg = format!("{step:?}");
        assert!(dbg.contains("top.reg"));
        assert!(dbg.contains("Commit"));
    }
}
