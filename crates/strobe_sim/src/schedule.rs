//! The validated per-tick step sequence.
//!
//! [`Schedule::new`] performs the one-time validation that makes the
//! unchecked tick loop safe to trust:
//!
//! 1. every referenced signal is in the table;
//! 2. every signal has at most one writing step;
//! 3. the combinational producer→consumer relation is acyclic (a cyclic
//!    graph has no valid order at all);
//! 4. every combinational or fanout step runs strictly after the producers
//!    of the signals it reads;
//! 5. every register commit runs strictly before any same-tick producer of
//!    the pending/enable ports it samples, so a commit always consumes the
//!    value settled on the previous tick.
//!
//! Signals with no producing step are external stimulus or construction
//! constants and impose no ordering constraint. Rule 5 exempts a commit's
//! reads of its own writes (a stream source samples the ready flag it also
//! regenerates) and reads of other commits' outputs.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use crate::error::ScheduleError;
use crate::signal::SignalDb;
use crate::step::{Step, StepKind};

/// A fixed, validated sequence of steps executed once per tick, plus the
/// signal table it was validated against.
#[derive(Debug)]
pub struct Schedule<C> {
    signals: SignalDb,
    steps: Vec<Step<C>>,
}

impl<C> Schedule<C> {
    /// Validates the step sequence and builds the schedule.
    ///
    /// Returns the first defect found, in the rule order above.
    pub fn new(signals: SignalDb, steps: Vec<Step<C>>) -> Result<Self, ScheduleError> {
        validate(&signals, &steps)?;
        Ok(Self { signals, steps })
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[Step<C>] {
        &self.steps
    }

    /// The signal table.
    pub fn signals(&self) -> &SignalDb {
        &self.signals
    }

    /// Number of steps per tick.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns whether the schedule has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn validate<C>(signals: &SignalDb, steps: &[Step<C>]) -> Result<(), ScheduleError> {
    // Rule 1: all signal IDs resolve.
    for step in steps {
        for &id in step.reads().iter().chain(step.writes()) {
            if !signals.contains(id) {
                return Err(ScheduleError::UnknownSignal {
                    step: step.name().to_string(),
                    id: id.as_raw(),
                });
            }
        }
    }

    // Rule 2: at most one writer per signal.
    let mut writer: Vec<Option<usize>> = vec![None; signals.len()];
    for (i, step) in steps.iter().enumerate() {
        for &w in step.writes() {
            let slot = &mut writer[w.as_raw() as usize];
            match *slot {
                Some(first) => {
                    return Err(ScheduleError::MultipleWriters {
                        signal: signals.name(w).to_string(),
                        first: steps[first].name().to_string(),
                        second: step.name().to_string(),
                    });
                }
                None => *slot = Some(i),
            }
        }
    }

    // Rule 3: the combinational subgraph is acyclic. Commits are excluded
    // on both sides: a commit's output is available from the start of the
    // tick and its inputs are previous-tick values, so it cannot close a
    // same-tick loop.
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: Vec<_> = (0..steps.len()).map(|i| graph.add_node(i)).collect();
    for (i, step) in steps.iter().enumerate() {
        if step.kind() == StepKind::Commit {
            continue;
        }
        for &r in step.reads() {
            if let Some(p) = writer[r.as_raw() as usize] {
                if steps[p].kind() == StepKind::Commit {
                    continue;
                }
                if p == i {
                    return Err(ScheduleError::CombinationalCycle {
                        path: format!("{} -> {}", step.name(), step.name()),
                    });
                }
                graph.add_edge(nodes[p], nodes[i], ());
            }
        }
    }
    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let mut names: Vec<&str> = scc.iter().map(|&n| steps[graph[n]].name()).collect();
            names.push(names[0]);
            return Err(ScheduleError::CombinationalCycle {
                path: names.join(" -> "),
            });
        }
    }

    // Rules 4 and 5: index ordering.
    for (i, step) in steps.iter().enumerate() {
        for &r in step.reads() {
            let Some(p) = writer[r.as_raw() as usize] else {
                continue;
            };
            if p == i {
                continue;
            }
            match step.kind() {
                StepKind::Comb | StepKind::Fanout => {
                    if p > i {
                        return Err(ScheduleError::OrderViolation {
                            signal: signals.name(r).to_string(),
                            producer: steps[p].name().to_string(),
                            consumer: step.name().to_string(),
                        });
                    }
                }
                StepKind::Commit => {
                    if steps[p].kind() != StepKind::Commit && p < i {
                        return Err(ScheduleError::CommitAfterProducer {
                            commit: step.name().to_string(),
                            producer: steps[p].name().to_string(),
                            signal: signals.name(r).to_string(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalDb;

    // Validation never runs the closures; a unit circuit type is enough.
    type S = Step<()>;

    #[test]
    fn valid_chain_accepted() {
        let mut db = SignalDb::new();
        let reg_in = db.signal("t.reg.in", 32);
        let reg_out = db.signal("t.reg.out", 32);
        let unit_in = db.signal("t.unit.in", 32);
        let unit_out = db.signal("t.unit.out", 32);
        let steps = vec![
            S::commit("t.reg", vec![reg_in], vec![reg_out], |_| {}),
            S::fanout("t.reg.out", vec![reg_out], vec![unit_in], |_| {}),
            S::comb("t.unit", vec![unit_in], vec![unit_out], |_| {}),
            S::fanout("t.unit.out", vec![unit_out], vec![reg_in], |_| {}),
        ];
        let sched = Schedule::new(db, steps).unwrap();
        assert_eq!(sched.len(), 4);
    }

    #[test]
    fn unknown_signal_rejected() {
        let db = SignalDb::new();
        let bogus = crate::signal::SigId::from_raw(5);
        let steps = vec![S::comb("t.unit", vec![bogus], vec![], |_| {})];
        let err = Schedule::new(db, steps).unwrap_err();
        assert!(matches!(err, ScheduleError::UnknownSignal { id: 5, .. }));
    }

    #[test]
    fn multiple_writers_rejected() {
        let mut db = SignalDb::new();
        let x = db.signal("t.x", 1);
        let steps = vec![
            S::comb("t.a", vec![], vec![x], |_| {}),
            S::comb("t.b", vec![], vec![x], |_| {}),
        ];
        let err = Schedule::new(db, steps).unwrap_err();
        match err {
            ScheduleError::MultipleWriters { signal, first, second } => {
                assert_eq!(signal, "t.x");
                assert_eq!(first, "t.a");
                assert_eq!(second, "t.b");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn misordered_consumer_rejected() {
        let mut db = SignalDb::new();
        let x = db.signal("t.x", 32);
        let steps = vec![
            S::comb("t.consumer", vec![x], vec![], |_| {}),
            S::comb("t.producer", vec![], vec![x], |_| {}),
        ];
        let err = Schedule::new(db, steps).unwrap_err();
        assert!(matches!(err, ScheduleError::OrderViolation { .. }));
    }

    #[test]
    fn commit_after_pending_producer_rejected() {
        let mut db = SignalDb::new();
        let reg_in = db.signal("t.reg.in", 32);
        let reg_out = db.signal("t.reg.out", 32);
        let steps = vec![
            S::comb("t.driver", vec![], vec![reg_in], |_| {}),
            S::commit("t.reg", vec![reg_in], vec![reg_out], |_| {}),
        ];
        let err = Schedule::new(db, steps).unwrap_err();
        assert!(matches!(err, ScheduleError::CommitAfterProducer { .. }));
    }

    #[test]
    fn commit_before_pending_producer_accepted() {
        let mut db = SignalDb::new();
        let reg_in = db.signal("t.reg.in", 32);
        let reg_out = db.signal("t.reg.out", 32);
        let steps = vec![
            S::commit("t.reg", vec![reg_in], vec![reg_out], |_| {}),
            S::comb("t.driver", vec![], vec![reg_in], |_| {}),
        ];
        assert!(Schedule::new(db, steps).is_ok());
    }

    #[test]
    fn combinational_cycle_rejected() {
        let mut db = SignalDb::new();
        let x = db.signal("t.x", 1);
        let y = db.signal("t.y", 1);
        let steps = vec![
            S::comb("t.a", vec![y], vec![x], |_| {}),
            S::comb("t.b", vec![x], vec![y], |_| {}),
        ];
        let err = Schedule::new(db, steps).unwrap_err();
        match err {
            ScheduleError::CombinationalCycle { path } => {
                assert!(path.contains("t.a"));
                assert!(path.contains("t.b"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_loop_rejected() {
        let mut db = SignalDb::new();
        let x = db.signal("t.x", 1);
        let steps = vec![S::comb("t.a", vec![x], vec![x], |_| {})];
        let err = Schedule::new(db, steps).unwrap_err();
        assert!(matches!(err, ScheduleError::CombinationalCycle { .. }));
    }

    #[test]
    fn commit_reading_own_write_accepted() {
        // A stream source regenerates the valid flag it also samples.
        let mut db = SignalDb::new();
        let val = db.signal("t.src.val", 1);
        let rdy = db.signal("t.src.rdy", 1);
        let steps = vec![
            S::commit("t.src", vec![val, rdy], vec![val], |_| {}),
            S::fanout("t.rdy", vec![], vec![rdy], |_| {}),
        ];
        assert!(Schedule::new(db, steps).is_ok());
    }

    #[test]
    fn unwritten_reads_are_external_inputs() {
        let mut db = SignalDb::new();
        let ext = db.signal("t.ext", 32);
        let out = db.signal("t.unit.out", 32);
        let steps = vec![S::comb("t.unit", vec![ext], vec![out], |_| {})];
        assert!(Schedule::new(db, steps).is_ok());
    }
}
