//! The fixed-latency pipelined multiplier.
//!
//! Thirty-two one-bit shift-add steps in a straight line, with pipeline
//! registers (operands, running partial product, and the valid tag)
//! inserted every `32 / nstages` steps. All pipeline registers share a
//! single enable driven from the downstream ready, so back-pressure from a
//! stalled sink freezes the entire pipeline at once; `req.rdy` is wired
//! from `resp.rdy`. Once full, the pipeline retires one result per tick
//! with a fixed `nstages`-tick latency.
//!
//! The wiring and the per-tick schedule are generated from the
//! parametrization — the stage pattern is written once and instantiated in
//! a loop, never hand-unrolled.

use strobe_prim::{Adder, LShifter, Mux, RShifter, RegEn};
use strobe_sim::{Schedule, ScheduleError, SignalDb, Step, TickKernel};

use crate::stream::{SourcePattern, StreamSink, StreamSource};

/// Total one-bit shift-add steps; one per bit of the 32-bit operands.
pub const TOTAL_STEPS: usize = 32;

/// One 1-bit shift-add step: shifts the operands by exactly one and
/// conditionally absorbs the pre-shift A into the partial product when the
/// incoming B is odd.
#[derive(Clone, Copy, Debug, Default)]
pub struct MulStep {
    /// Shifts the A operand left by one.
    pub a_lsh: LShifter,
    /// Shifts the B operand right by one.
    pub b_rsh: RShifter,
    /// Computes `in_a + in_res`.
    pub adder: Adder,
    /// Chooses the incoming partial product or the sum, on bit 0 of B.
    pub mux: Mux<u32, 2>,
}

impl MulStep {
    /// Creates a step with the shift amounts fixed at one.
    pub fn new() -> Self {
        let mut step = Self::default();
        step.a_lsh.shamt = 1;
        step.b_rsh.shamt = 1;
        step
    }
}

/// The pipelined multiplier: 32 steps and `nstages` ranks of pipeline
/// registers (the input rank included).
pub struct MulNstageUnit {
    /// The shift-add steps, in order.
    pub steps: Vec<MulStep>,
    /// A-operand pipeline registers, one per stage.
    pub a_preg: Vec<RegEn<u32>>,
    /// B-operand pipeline registers, one per stage.
    pub b_preg: Vec<RegEn<u32>>,
    /// Valid-tag pipeline registers, one per stage.
    pub val_preg: Vec<RegEn<bool>>,
    /// Partial-product pipeline registers, one per stage.
    pub res_preg: Vec<RegEn<u32>>,
}

/// The pipelined multiplier wrapped by a stream source and sink.
pub struct MulNstageSim {
    /// Drives the request handshake with `(a, b)` operand pairs.
    pub src: StreamSource<(u32, u32)>,
    /// The unit under test.
    pub imul: MulNstageUnit,
    /// Drains the response handshake.
    pub sink: StreamSink<u32>,
}

/// Where a pipeline value is produced: a register rank or an earlier step.
#[derive(Clone, Copy)]
enum Src {
    Preg(usize),
    Step(usize),
}

impl MulNstageSim {
    /// Builds the harness and its generated, validated schedule.
    ///
    /// # Panics
    ///
    /// Panics unless `nstages` is one of 1, 2, 4, 8, 16, 32.
    pub fn kernel(
        nstages: usize,
        pattern: SourcePattern<(u32, u32)>,
    ) -> Result<TickKernel<Self>, ScheduleError> {
        assert!(
            matches!(nstages, 1 | 2 | 4 | 8 | 16 | 32),
            "nstages must divide {TOTAL_STEPS}: got {nstages}"
        );
        let steps_per_stage = TOTAL_STEPS / nstages;

        let mut db = SignalDb::new();

        let src_val = db.signal("src.out.val", 1);
        let src_rdy = db.signal("src.out.rdy", 1);
        let src_msg = db.signal("src.out.msg", 64);
        let sink_val = db.signal("sink.in.val", 1);
        let sink_rdy = db.signal("sink.in.rdy", 1);
        let sink_msg = db.signal("sink.in.msg", 32);

        // Pipeline register ports, per stage.
        let mut a_in = Vec::new();
        let mut a_en = Vec::new();
        let mut a_out = Vec::new();
        let mut b_in = Vec::new();
        let mut b_en = Vec::new();
        let mut b_out = Vec::new();
        let mut val_in = Vec::new();
        let mut val_en = Vec::new();
        let mut val_out = Vec::new();
        let mut res_in = Vec::new();
        let mut res_en = Vec::new();
        let mut res_out = Vec::new();
        for s in 0..nstages {
            a_in.push(db.signal(format!("imul.a_preg[{s}].in"), 32));
            a_en.push(db.signal(format!("imul.a_preg[{s}].en"), 1));
            a_out.push(db.signal(format!("imul.a_preg[{s}].out"), 32));
            b_in.push(db.signal(format!("imul.b_preg[{s}].in"), 32));
            b_en.push(db.signal(format!("imul.b_preg[{s}].en"), 1));
            b_out.push(db.signal(format!("imul.b_preg[{s}].out"), 32));
            val_in.push(db.signal(format!("imul.val_preg[{s}].in"), 1));
            val_en.push(db.signal(format!("imul.val_preg[{s}].en"), 1));
            val_out.push(db.signal(format!("imul.val_preg[{s}].out"), 1));
            res_in.push(db.signal(format!("imul.res_preg[{s}].in"), 32));
            res_en.push(db.signal(format!("imul.res_preg[{s}].en"), 1));
            res_out.push(db.signal(format!("imul.res_preg[{s}].out"), 32));
        }

        // Shift-add step ports, per step.
        let mut a_lsh_in = Vec::new();
        let mut a_lsh_out = Vec::new();
        let mut b_rsh_in = Vec::new();
        let mut b_rsh_out = Vec::new();
        let mut adder_a = Vec::new();
        let mut adder_b = Vec::new();
        let mut adder_out = Vec::new();
        let mut mux_in_res = Vec::new();
        let mut mux_in_add = Vec::new();
        let mut mux_sel = Vec::new();
        let mut mux_out = Vec::new();
        for i in 0..TOTAL_STEPS {
            a_lsh_in.push(db.signal(format!("imul.steps[{i}].a_lsh.in"), 32));
            a_lsh_out.push(db.signal(format!("imul.steps[{i}].a_lsh.out"), 32));
            b_rsh_in.push(db.signal(format!("imul.steps[{i}].b_rsh.in"), 32));
            b_rsh_out.push(db.signal(format!("imul.steps[{i}].b_rsh.out"), 32));
            adder_a.push(db.signal(format!("imul.steps[{i}].adder.a"), 32));
            adder_b.push(db.signal(format!("imul.steps[{i}].adder.b"), 32));
            adder_out.push(db.signal(format!("imul.steps[{i}].adder.out"), 32));
            mux_in_res.push(db.signal(format!("imul.steps[{i}].mux.in_res"), 32));
            mux_in_add.push(db.signal(format!("imul.steps[{i}].mux.in_add"), 32));
            mux_sel.push(db.signal(format!("imul.steps[{i}].mux.sel"), 1));
            mux_out.push(db.signal(format!("imul.steps[{i}].mux.out"), 32));
        }

        let mut steps: Vec<Step<MulNstageSim>> = Vec::new();

        // Tick boundary: every pipeline register commits, then the streams
        // pulse. All consume values settled on the previous tick.
        for s in 0..nstages {
            steps.push(Step::commit(
                format!("imul.a_preg[{s}]"),
                vec![a_in[s], a_en[s]],
                vec![a_out[s]],
                move |c: &mut MulNstageSim| c.imul.a_preg[s].commit(),
            ));
            steps.push(Step::commit(
                format!("imul.b_preg[{s}]"),
                vec![b_in[s], b_en[s]],
                vec![b_out[s]],
                move |c: &mut MulNstageSim| c.imul.b_preg[s].commit(),
            ));
            steps.push(Step::commit(
                format!("imul.val_preg[{s}]"),
                vec![val_in[s], val_en[s]],
                vec![val_out[s]],
                move |c: &mut MulNstageSim| c.imul.val_preg[s].commit(),
            ));
            steps.push(Step::commit(
                format!("imul.res_preg[{s}]"),
                vec![res_in[s], res_en[s]],
                vec![res_out[s]],
                move |c: &mut MulNstageSim| c.imul.res_preg[s].commit(),
            ));
        }
        steps.push(Step::commit(
            "src",
            vec![src_val, src_rdy],
            vec![src_val, src_msg],
            |c: &mut MulNstageSim| c.src.pulse(),
        ));
        steps.push(Step::commit(
            "sink",
            vec![sink_val, sink_rdy, sink_msg],
            vec![],
            |c: &mut MulNstageSim| c.sink.pulse(),
        ));

        steps.push(Step::comb("sink.set_ready", vec![], vec![sink_rdy], |c: &mut MulNstageSim| {
            c.sink.set_ready()
        }));

        // The shared enable: one downstream ready gates every pipeline
        // register and the request ready alike.
        {
            let mut writes = vec![src_rdy];
            for s in 0..nstages {
                writes.extend([a_en[s], b_en[s], val_en[s], res_en[s]]);
            }
            steps.push(Step::fanout(
                "sink.in.rdy",
                vec![sink_rdy],
                writes,
                move |c: &mut MulNstageSim| {
                    let rdy = c.sink.in_.rdy;
                    for s in 0..nstages {
                        c.imul.a_preg[s].enable = rdy;
                        c.imul.b_preg[s].enable = rdy;
                        c.imul.val_preg[s].enable = rdy;
                        c.imul.res_preg[s].enable = rdy;
                    }
                    c.src.out.rdy = rdy;
                },
            ));
        }

        // Request side into the input rank. The input partial product is a
        // construction constant zero.
        steps.push(Step::fanout(
            "src.out.val",
            vec![src_val],
            vec![val_in[0]],
            |c: &mut MulNstageSim| c.imul.val_preg[0].pending = c.src.out.val,
        ));
        steps.push(Step::fanout(
            "src.out.msg",
            vec![src_msg],
            vec![a_in[0], b_in[0]],
            |c: &mut MulNstageSim| {
                let (a, b) = c.src.out.msg;
                c.imul.a_preg[0].pending = a;
                c.imul.b_preg[0].pending = b;
            },
        ));

        // The steps, with a register rank spliced in every
        // `steps_per_stage` of them. A step's inputs come from the rank
        // just committed (at a stage boundary) or from the previous step.
        let mut a_src = (a_out[0], Src::Preg(0));
        let mut b_src = (b_out[0], Src::Preg(0));
        let mut res_src = (res_out[0], Src::Preg(0));
        let mut val_stage = 0usize;

        for i in 0..TOTAL_STEPS {
            if i > 0 && i % steps_per_stage == 0 {
                let stage = i / steps_per_stage;
                let prev = i - 1;
                steps.push(Step::fanout(
                    format!("imul.a_preg[{stage}].in"),
                    vec![a_lsh_out[prev]],
                    vec![a_in[stage]],
                    move |c: &mut MulNstageSim| {
                        c.imul.a_preg[stage].pending = c.imul.steps[prev].a_lsh.out;
                    },
                ));
                steps.push(Step::fanout(
                    format!("imul.b_preg[{stage}].in"),
                    vec![b_rsh_out[prev]],
                    vec![b_in[stage]],
                    move |c: &mut MulNstageSim| {
                        c.imul.b_preg[stage].pending = c.imul.steps[prev].b_rsh.out;
                    },
                ));
                steps.push(Step::fanout(
                    format!("imul.res_preg[{stage}].in"),
                    vec![mux_out[prev]],
                    vec![res_in[stage]],
                    move |c: &mut MulNstageSim| {
                        c.imul.res_preg[stage].pending = c.imul.steps[prev].mux.out;
                    },
                ));
                let prev_stage = val_stage;
                steps.push(Step::fanout(
                    format!("imul.val_preg[{stage}].in"),
                    vec![val_out[prev_stage]],
                    vec![val_in[stage]],
                    move |c: &mut MulNstageSim| {
                        c.imul.val_preg[stage].pending = c.imul.val_preg[prev_stage].committed;
                    },
                ));
                a_src = (a_out[stage], Src::Preg(stage));
                b_src = (b_out[stage], Src::Preg(stage));
                res_src = (res_out[stage], Src::Preg(stage));
                val_stage = stage;
            } else if i > 0 {
                a_src = (a_lsh_out[i - 1], Src::Step(i - 1));
                b_src = (b_rsh_out[i - 1], Src::Step(i - 1));
                res_src = (mux_out[i - 1], Src::Step(i - 1));
            }

            let (a_sig, a_from) = a_src;
            steps.push(Step::fanout(
                format!("imul.steps[{i}].in_a"),
                vec![a_sig],
                vec![a_lsh_in[i], adder_a[i]],
                move |c: &mut MulNstageSim| {
                    let a = read_a(c, a_from);
                    c.imul.steps[i].a_lsh.input = a;
                    c.imul.steps[i].adder.a = a;
                },
            ));
            // Bit 0 of the incoming B selects pass-through or absorb.
            let (b_sig, b_from) = b_src;
            steps.push(Step::fanout(
                format!("imul.steps[{i}].in_b"),
                vec![b_sig],
                vec![b_rsh_in[i], mux_sel[i]],
                move |c: &mut MulNstageSim| {
                    let b = read_b(c, b_from);
                    c.imul.steps[i].b_rsh.input = b;
                    c.imul.steps[i].mux.sel = b & 1;
                },
            ));
            let (res_sig, res_from) = res_src;
            steps.push(Step::fanout(
                format!("imul.steps[{i}].in_res"),
                vec![res_sig],
                vec![adder_b[i], mux_in_res[i]],
                move |c: &mut MulNstageSim| {
                    let res = read_res(c, res_from);
                    c.imul.steps[i].adder.b = res;
                    c.imul.steps[i].mux.inputs[0] = res;
                },
            ));
            steps.push(Step::comb(
                format!("imul.steps[{i}].a_lsh"),
                vec![a_lsh_in[i]],
                vec![a_lsh_out[i]],
                move |c: &mut MulNstageSim| c.imul.steps[i].a_lsh.recompute(),
            ));
            steps.push(Step::comb(
                format!("imul.steps[{i}].b_rsh"),
                vec![b_rsh_in[i]],
                vec![b_rsh_out[i]],
                move |c: &mut MulNstageSim| c.imul.steps[i].b_rsh.recompute(),
            ));
            steps.push(Step::comb(
                format!("imul.steps[{i}].adder"),
                vec![adder_a[i], adder_b[i]],
                vec![adder_out[i]],
                move |c: &mut MulNstageSim| c.imul.steps[i].adder.recompute(),
            ));
            steps.push(Step::fanout(
                format!("imul.steps[{i}].adder.out"),
                vec![adder_out[i]],
                vec![mux_in_add[i]],
                move |c: &mut MulNstageSim| {
                    c.imul.steps[i].mux.inputs[1] = c.imul.steps[i].adder.out
                },
            ));
            steps.push(Step::comb(
                format!("imul.steps[{i}].mux"),
                vec![mux_in_res[i], mux_in_add[i], mux_sel[i]],
                vec![mux_out[i]],
                move |c: &mut MulNstageSim| c.imul.steps[i].mux.recompute(),
            ));
        }

        // Response side from the last step and the last valid rank.
        let last = TOTAL_STEPS - 1;
        let last_val = val_stage;
        steps.push(Step::fanout(
            "imul.resp_val",
            vec![val_out[last_val]],
            vec![sink_val],
            move |c: &mut MulNstageSim| c.sink.in_.val = c.imul.val_preg[last_val].committed,
        ));
        steps.push(Step::fanout(
            "imul.resp_msg",
            vec![mux_out[last]],
            vec![sink_msg],
            move |c: &mut MulNstageSim| c.sink.in_.msg = c.imul.steps[last].mux.out,
        ));

        let schedule = Schedule::new(db, steps)?;
        let circuit = MulNstageSim {
            src: StreamSource::new(pattern),
            imul: MulNstageUnit {
                steps: (0..TOTAL_STEPS).map(|_| MulStep::new()).collect(),
                a_preg: vec![RegEn::new(); nstages],
                b_preg: vec![RegEn::new(); nstages],
                val_preg: vec![RegEn::new(); nstages],
                res_preg: vec![RegEn::new(); nstages],
            },
            sink: StreamSink::new(),
        };
        Ok(TickKernel::new(circuit, schedule))
    }

    /// One-line state rendering for debugging: the valid tag per stage.
    pub fn line_trace(&self) -> String {
        let tags: String = self
            .imul
            .val_preg
            .iter()
            .map(|v| if v.committed { '*' } else { '.' })
            .collect();
        format!("{} > [{}] > {}", self.src.out, tags, self.sink.in_)
    }
}

fn read_a(c: &MulNstageSim, from: Src) -> u32 {
    match from {
        Src::Preg(s) => c.imul.a_preg[s].committed,
        Src::Step(i) => c.imul.steps[i].a_lsh.out,
    }
}

fn read_b(c: &MulNstageSim, from: Src) -> u32 {
    match from {
        Src::Preg(s) => c.imul.b_preg[s].committed,
        Src::Step(i) => c.imul.steps[i].b_rsh.out,
    }
}

fn read_res(c: &MulNstageSim, from: Src) -> u32 {
    match from {
        Src::Preg(s) => c.imul.res_preg[s].committed,
        Src::Step(i) => c.imul.steps[i].mux.out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_until;

    #[test]
    fn schedule_builds_for_every_depth() {
        for nstages in [1, 2, 4, 8, 16, 32] {
            let kernel = MulNstageSim::kernel(nstages, SourcePattern::Script(vec![])).unwrap();
            assert!(!kernel.schedule().is_empty(), "nstages = {nstages}");
        }
    }

    #[test]
    #[should_panic(expected = "nstages must divide")]
    fn rejects_non_divisor_depth() {
        let _ = MulNstageSim::kernel(3, SourcePattern::Script(vec![]));
    }

    #[test]
    fn multiplies_through_the_pipeline() {
        let mut kernel =
            MulNstageSim::kernel(4, SourcePattern::Script(vec![(6, 7), (60, 35)])).unwrap();
        let done = run_until(&mut kernel, 50, |c| c.sink.received.len() == 2);
        assert!(done.is_some());
        assert_eq!(kernel.circuit().sink.received, vec![42, 2100]);
    }

    #[test]
    fn single_stage_depth_has_single_tick_latency() {
        let mut kernel = MulNstageSim::kernel(1, SourcePattern::Script(vec![(5, 9)])).unwrap();
        // Accepted on tick 0, committed into the input rank at tick 1,
        // response captured at the tick-2 boundary.
        kernel.run(3);
        assert_eq!(kernel.circuit().sink.received, vec![45]);
    }
}
