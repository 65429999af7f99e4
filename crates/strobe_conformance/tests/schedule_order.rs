//! Static schedule inspection: for every producer→consumer signal edge in
//! each built circuit, the producer's step index is strictly less than the
//! consumer's, and every register commit precedes the same-tick producers
//! of the ports it samples.

use strobe_circuits::{GcdSim, MulNstageSim, MulVarLatSim, SourcePattern};
use strobe_sim::{Schedule, StepKind};

fn assert_well_ordered<C>(schedule: &Schedule<C>, label: &str) {
    let steps = schedule.steps();
    let signals = schedule.signals();

    let mut writer: Vec<Option<usize>> = vec![None; signals.len()];
    for (i, step) in steps.iter().enumerate() {
        for &w in step.writes() {
            let slot = &mut writer[w.as_raw() as usize];
            assert!(
                slot.is_none() || *slot == Some(i),
                "{label}: signal `{}` has two writers",
                signals.name(w)
            );
            *slot = Some(i);
        }
    }

    for (i, step) in steps.iter().enumerate() {
        for &r in step.reads() {
            let Some(p) = writer[r.as_raw() as usize] else {
                continue; // external stimulus or construction constant
            };
            if p == i {
                continue;
            }
            match step.kind() {
                StepKind::Comb | StepKind::Fanout => assert!(
                    p < i,
                    "{label}: step `{}` reads `{}` before producer `{}`",
                    step.name(),
                    signals.name(r),
                    steps[p].name()
                ),
                StepKind::Commit => {
                    if steps[p].kind() != StepKind::Commit {
                        assert!(
                            p > i,
                            "{label}: commit `{}` samples `{}` after same-tick producer `{}`",
                            step.name(),
                            signals.name(r),
                            steps[p].name()
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn gcd_schedule_is_well_ordered() {
    let kernel = GcdSim::kernel(SourcePattern::Script(vec![])).unwrap();
    assert_well_ordered(kernel.schedule(), "gcd");
}

#[test]
fn varlat_schedule_is_well_ordered() {
    let kernel = MulVarLatSim::kernel(SourcePattern::Script(vec![])).unwrap();
    assert_well_ordered(kernel.schedule(), "mul_varlat");
}

#[test]
fn nstage_schedules_are_well_ordered_at_every_depth() {
    for nstages in [1, 2, 4, 8, 16, 32] {
        let kernel = MulNstageSim::kernel(nstages, SourcePattern::Script(vec![])).unwrap();
        assert_well_ordered(kernel.schedule(), &format!("mul_nstage/{nstages}"));
    }
}

#[test]
fn every_step_kind_appears() {
    let kernel = GcdSim::kernel(SourcePattern::Script(vec![])).unwrap();
    let steps = kernel.schedule().steps();
    for kind in [StepKind::Commit, StepKind::Comb, StepKind::Fanout] {
        assert!(
            steps.iter().any(|s| s.kind() == kind),
            "schedule missing {kind:?} steps"
        );
    }
}
