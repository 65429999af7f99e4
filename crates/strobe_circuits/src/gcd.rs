//! The iterative GCD unit.
//!
//! Subtractive Euclid in hardware: while `b != 0`, swap the operand
//! registers when `a < b`, otherwise replace `a` with `a - b`. The
//! controller latches a new operand pair on the request transfer, iterates
//! until the comparators signal `!(a < b) && b == 0`, then holds the
//! subtractor output (`a - 0`) on the response port until it is accepted.

use strobe_prim::{LtComp, Mux, Reg, RegEn, Subtractor, ZeroComp};
use strobe_sim::{Schedule, ScheduleError, SignalDb, Step, TickKernel};

use crate::stream::{SourcePattern, StreamSink, StreamSource};
use crate::CtrlState;

/// a-mux select: load the incoming operand.
pub const A_MUX_SEL_IN: u32 = 0;
/// a-mux select: load the subtractor output.
pub const A_MUX_SEL_SUB: u32 = 1;
/// a-mux select: load the B register (swap).
pub const A_MUX_SEL_B: u32 = 2;
/// b-mux select: load the A register (swap).
pub const B_MUX_SEL_A: u32 = 0;
/// b-mux select: load the incoming operand.
pub const B_MUX_SEL_IN: u32 = 1;

/// Control bundle from the GCD controller to its datapath.
#[derive(Clone, Copy, Debug, Default)]
pub struct GcdCs {
    /// Select for the A-register input mux.
    pub a_mux_sel: u32,
    /// Load enable for the A register.
    pub a_reg_en: bool,
    /// Select for the B-register input mux.
    pub b_mux_sel: u32,
    /// Load enable for the B register.
    pub b_reg_en: bool,
}

/// GCD datapath: operand registers, their input muxes, the comparators,
/// and the subtractor.
#[derive(Default)]
pub struct GcdDpath {
    /// The A operand register.
    pub a_reg: RegEn<u32>,
    /// The B operand register.
    pub b_reg: RegEn<u32>,
    /// Input mux for A: operand / subtractor / B (fourth slot unused).
    pub a_mux: Mux<u32, 4>,
    /// Input mux for B: A / operand.
    pub b_mux: Mux<u32, 2>,
    /// Computes `a - b`, which is also the response payload.
    pub b_sub: Subtractor,
    /// Computes `a < b` (swap condition).
    pub b_ltc: LtComp,
    /// Computes `b == 0` (termination condition).
    pub b_zcp: ZeroComp,
}

/// GCD controller: the IDLE/CALC/DONE state machine.
#[derive(Default)]
pub struct GcdCtrl {
    /// Request valid, copied in from the source.
    pub req_val: bool,
    /// Request ready, asserted in IDLE.
    pub req_rdy: bool,
    /// Response valid, asserted in DONE.
    pub resp_val: bool,
    /// Response ready, copied in from the sink.
    pub resp_rdy: bool,
    /// Status: `b == 0`, copied in from the datapath.
    pub is_b_zero: bool,
    /// Status: `a < b`, copied in from the datapath.
    pub is_a_lt_b: bool,
    /// The state register.
    pub state: Reg<CtrlState>,
    /// Control outputs to the datapath.
    pub cs: GcdCs,
}

impl GcdCtrl {
    /// Output function: control and handshake outputs from the current
    /// state and status inputs.
    pub fn state_outputs(&mut self) {
        self.req_rdy = false;
        self.resp_val = false;
        self.cs = GcdCs::default();

        match self.state.committed {
            // Wait for operands and latch them.
            CtrlState::Idle => {
                self.req_rdy = true;
                self.cs.a_mux_sel = A_MUX_SEL_IN;
                self.cs.b_mux_sel = B_MUX_SEL_IN;
                self.cs.a_reg_en = true;
                self.cs.b_reg_en = true;
            }
            // Swap when a < b, subtract otherwise. B only updates on a
            // swap.
            CtrlState::Calc => {
                self.cs.a_mux_sel = if self.is_a_lt_b {
                    A_MUX_SEL_B
                } else {
                    A_MUX_SEL_SUB
                };
                self.cs.a_reg_en = true;
                self.cs.b_mux_sel = B_MUX_SEL_A;
                self.cs.b_reg_en = self.is_a_lt_b;
            }
            // Hold the result until the response transfer.
            CtrlState::Done => {
                self.resp_val = true;
            }
        }
    }

    /// Next-state function, writing the state register's pending half.
    pub fn state_transitions(&mut self) {
        let next = match self.state.committed {
            CtrlState::Idle if self.req_val && self.req_rdy => CtrlState::Calc,
            CtrlState::Calc if !self.is_a_lt_b && self.is_b_zero => CtrlState::Done,
            CtrlState::Done if self.resp_val && self.resp_rdy => CtrlState::Idle,
            current => current,
        };
        self.state.pending = next;
    }
}

/// The composed GCD unit: datapath plus controller.
#[derive(Default)]
pub struct GcdUnit {
    /// The datapath.
    pub dpath: GcdDpath,
    /// The controller.
    pub ctrl: GcdCtrl,
}

/// The GCD unit wrapped by a stream source and sink.
pub struct GcdSim {
    /// Drives the request handshake with `(a, b)` operand pairs.
    pub src: StreamSource<(u32, u32)>,
    /// The unit under test.
    pub gcd: GcdUnit,
    /// Drains the response handshake.
    pub sink: StreamSink<u32>,
}

impl GcdSim {
    /// Builds the harness and its validated per-tick schedule.
    pub fn kernel(pattern: SourcePattern<(u32, u32)>) -> Result<TickKernel<Self>, ScheduleError> {
        let mut db = SignalDb::new();

        let src_val = db.signal("src.out.val", 1);
        let src_rdy = db.signal("src.out.rdy", 1);
        let src_msg = db.signal("src.out.msg", 64);
        let sink_val = db.signal("sink.in.val", 1);
        let sink_rdy = db.signal("sink.in.rdy", 1);
        let sink_msg = db.signal("sink.in.msg", 32);

        let req_val = db.signal("gcd.ctrl.req_val", 1);
        let req_rdy = db.signal("gcd.ctrl.req_rdy", 1);
        let resp_val = db.signal("gcd.ctrl.resp_val", 1);
        let resp_rdy = db.signal("gcd.ctrl.resp_rdy", 1);
        let is_b_zero = db.signal("gcd.ctrl.is_b_zero", 1);
        let is_a_lt_b = db.signal("gcd.ctrl.is_a_lt_b", 1);
        let cs_a_mux_sel = db.signal("gcd.ctrl.cs.a_mux_sel", 2);
        let cs_a_reg_en = db.signal("gcd.ctrl.cs.a_reg_en", 1);
        let cs_b_mux_sel = db.signal("gcd.ctrl.cs.b_mux_sel", 1);
        let cs_b_reg_en = db.signal("gcd.ctrl.cs.b_reg_en", 1);
        let state_in = db.signal("gcd.ctrl.state.in", 2);
        let state_out = db.signal("gcd.ctrl.state.out", 2);

        let a_reg_in = db.signal("gcd.dpath.a_reg.in", 32);
        let a_reg_en = db.signal("gcd.dpath.a_reg.en", 1);
        let a_reg_out = db.signal("gcd.dpath.a_reg.out", 32);
        let b_reg_in = db.signal("gcd.dpath.b_reg.in", 32);
        let b_reg_en = db.signal("gcd.dpath.b_reg.en", 1);
        let b_reg_out = db.signal("gcd.dpath.b_reg.out", 32);
        let a_mux_in_ld = db.signal("gcd.dpath.a_mux.in_ld", 32);
        let a_mux_in_sub = db.signal("gcd.dpath.a_mux.in_sub", 32);
        let a_mux_in_b = db.signal("gcd.dpath.a_mux.in_b", 32);
        let a_mux_sel = db.signal("gcd.dpath.a_mux.sel", 2);
        let a_mux_out = db.signal("gcd.dpath.a_mux.out", 32);
        let b_mux_in_a = db.signal("gcd.dpath.b_mux.in_a", 32);
        let b_mux_in_ld = db.signal("gcd.dpath.b_mux.in_ld", 32);
        let b_mux_sel = db.signal("gcd.dpath.b_mux.sel", 1);
        let b_mux_out = db.signal("gcd.dpath.b_mux.out", 32);
        let sub_a = db.signal("gcd.dpath.b_sub.a", 32);
        let sub_b = db.signal("gcd.dpath.b_sub.b", 32);
        let sub_out = db.signal("gcd.dpath.b_sub.out", 32);
        let ltc_a = db.signal("gcd.dpath.b_ltc.a", 32);
        let ltc_b = db.signal("gcd.dpath.b_ltc.b", 32);
        let ltc_out = db.signal("gcd.dpath.b_ltc.out", 1);
        let zcp_in = db.signal("gcd.dpath.b_zcp.in", 32);
        let zcp_out = db.signal("gcd.dpath.b_zcp.out", 1);

        let steps: Vec<Step<GcdSim>> = vec![
            // Tick boundary: register commits and stream pulses, all
            // consuming values settled on the previous tick.
            Step::commit(
                "gcd.dpath.a_reg",
                vec![a_reg_in, a_reg_en],
                vec![a_reg_out],
                |c: &mut GcdSim| c.gcd.dpath.a_reg.commit(),
            ),
            Step::commit(
                "gcd.dpath.b_reg",
                vec![b_reg_in, b_reg_en],
                vec![b_reg_out],
                |c: &mut GcdSim| c.gcd.dpath.b_reg.commit(),
            ),
            Step::commit(
                "gcd.ctrl.state",
                vec![state_in],
                vec![state_out],
                |c: &mut GcdSim| c.gcd.ctrl.state.commit(),
            ),
            Step::commit(
                "src",
                vec![src_val, src_rdy],
                vec![src_val, src_msg],
                |c: &mut GcdSim| c.src.pulse(),
            ),
            Step::commit(
                "sink",
                vec![sink_val, sink_rdy, sink_msg],
                vec![],
                |c: &mut GcdSim| c.sink.pulse(),
            ),
            // Settle the combinational fabric.
            Step::comb("sink.set_ready", vec![], vec![sink_rdy], |c: &mut GcdSim| {
                c.sink.set_ready()
            }),
            Step::fanout("src.out.val", vec![src_val], vec![req_val], |c: &mut GcdSim| {
                c.gcd.ctrl.req_val = c.src.out.val
            }),
            Step::fanout(
                "src.out.msg",
                vec![src_msg],
                vec![a_mux_in_ld, b_mux_in_ld],
                |c: &mut GcdSim| {
                    let (a, b) = c.src.out.msg;
                    c.gcd.dpath.a_mux.inputs[A_MUX_SEL_IN as usize] = a;
                    c.gcd.dpath.b_mux.inputs[B_MUX_SEL_IN as usize] = b;
                },
            ),
            Step::fanout("sink.in.rdy", vec![sink_rdy], vec![resp_rdy], |c: &mut GcdSim| {
                c.gcd.ctrl.resp_rdy = c.sink.in_.rdy
            }),
            Step::fanout(
                "gcd.dpath.a_reg.out",
                vec![a_reg_out],
                vec![b_mux_in_a, ltc_a, sub_a],
                |c: &mut GcdSim| {
                    let a = c.gcd.dpath.a_reg.committed;
                    c.gcd.dpath.b_mux.inputs[B_MUX_SEL_A as usize] = a;
                    c.gcd.dpath.b_ltc.a = a;
                    c.gcd.dpath.b_sub.a = a;
                },
            ),
            Step::fanout(
                "gcd.dpath.b_reg.out",
                vec![b_reg_out],
                vec![a_mux_in_b, ltc_b, sub_b, zcp_in],
                |c: &mut GcdSim| {
                    let b = c.gcd.dpath.b_reg.committed;
                    c.gcd.dpath.a_mux.inputs[A_MUX_SEL_B as usize] = b;
                    c.gcd.dpath.b_ltc.b = b;
                    c.gcd.dpath.b_sub.b = b;
                    c.gcd.dpath.b_zcp.input = b;
                },
            ),
            Step::comb("gcd.dpath.b_zcp", vec![zcp_in], vec![zcp_out], |c: &mut GcdSim| {
                c.gcd.dpath.b_zcp.recompute()
            }),
            Step::comb("gcd.dpath.b_ltc", vec![ltc_a, ltc_b], vec![ltc_out], |c: &mut GcdSim| {
                c.gcd.dpath.b_ltc.recompute()
            }),
            Step::comb("gcd.dpath.b_sub", vec![sub_a, sub_b], vec![sub_out], |c: &mut GcdSim| {
                c.gcd.dpath.b_sub.recompute()
            }),
            Step::fanout(
                "gcd.dpath.b_zcp.out",
                vec![zcp_out],
                vec![is_b_zero],
                |c: &mut GcdSim| c.gcd.ctrl.is_b_zero = c.gcd.dpath.b_zcp.out,
            ),
            Step::fanout(
                "gcd.dpath.b_ltc.out",
                vec![ltc_out],
                vec![is_a_lt_b],
                |c: &mut GcdSim| c.gcd.ctrl.is_a_lt_b = c.gcd.dpath.b_ltc.out,
            ),
            Step::fanout(
                "gcd.dpath.b_sub.out",
                vec![sub_out],
                vec![a_mux_in_sub, sink_msg],
                |c: &mut GcdSim| {
                    let diff = c.gcd.dpath.b_sub.out;
                    c.gcd.dpath.a_mux.inputs[A_MUX_SEL_SUB as usize] = diff;
                    c.sink.in_.msg = diff;
                },
            ),
            Step::comb(
                "gcd.ctrl.state_outputs",
                vec![state_out, is_a_lt_b],
                vec![
                    req_rdy,
                    resp_val,
                    cs_a_mux_sel,
                    cs_a_reg_en,
                    cs_b_mux_sel,
                    cs_b_reg_en,
                ],
                |c: &mut GcdSim| c.gcd.ctrl.state_outputs(),
            ),
            Step::comb(
                "gcd.ctrl.state_transitions",
                vec![
                    state_out, req_val, req_rdy, resp_val, resp_rdy, is_b_zero, is_a_lt_b,
                ],
                vec![state_in],
                |c: &mut GcdSim| c.gcd.ctrl.state_transitions(),
            ),
            Step::fanout("gcd.ctrl.req_rdy", vec![req_rdy], vec![src_rdy], |c: &mut GcdSim| {
                c.src.out.rdy = c.gcd.ctrl.req_rdy
            }),
            Step::fanout(
                "gcd.ctrl.resp_val",
                vec![resp_val],
                vec![sink_val],
                |c: &mut GcdSim| c.sink.in_.val = c.gcd.ctrl.resp_val,
            ),
            Step::fanout(
                "gcd.ctrl.cs.a_mux_sel",
                vec![cs_a_mux_sel],
                vec![a_mux_sel],
                |c: &mut GcdSim| c.gcd.dpath.a_mux.sel = c.gcd.ctrl.cs.a_mux_sel,
            ),
            Step::fanout(
                "gcd.ctrl.cs.b_mux_sel",
                vec![cs_b_mux_sel],
                vec![b_mux_sel],
                |c: &mut GcdSim| c.gcd.dpath.b_mux.sel = c.gcd.ctrl.cs.b_mux_sel,
            ),
            Step::fanout(
                "gcd.ctrl.cs.a_reg_en",
                vec![cs_a_reg_en],
                vec![a_reg_en],
                |c: &mut GcdSim| c.gcd.dpath.a_reg.enable = c.gcd.ctrl.cs.a_reg_en,
            ),
            Step::fanout(
                "gcd.ctrl.cs.b_reg_en",
                vec![cs_b_reg_en],
                vec![b_reg_en],
                |c: &mut GcdSim| c.gcd.dpath.b_reg.enable = c.gcd.ctrl.cs.b_reg_en,
            ),
            Step::comb(
                "gcd.dpath.a_mux",
                vec![a_mux_in_ld, a_mux_in_sub, a_mux_in_b, a_mux_sel],
                vec![a_mux_out],
                |c: &mut GcdSim| c.gcd.dpath.a_mux.recompute(),
            ),
            Step::comb(
                "gcd.dpath.b_mux",
                vec![b_mux_in_a, b_mux_in_ld, b_mux_sel],
                vec![b_mux_out],
                |c: &mut GcdSim| c.gcd.dpath.b_mux.recompute(),
            ),
            Step::fanout(
                "gcd.dpath.a_mux.out",
                vec![a_mux_out],
                vec![a_reg_in],
                |c: &mut GcdSim| c.gcd.dpath.a_reg.pending = c.gcd.dpath.a_mux.out,
            ),
            Step::fanout(
                "gcd.dpath.b_mux.out",
                vec![b_mux_out],
                vec![b_reg_in],
                |c: &mut GcdSim| c.gcd.dpath.b_reg.pending = c.gcd.dpath.b_mux.out,
            ),
        ];

        let schedule = Schedule::new(db, steps)?;
        let circuit = GcdSim {
            src: StreamSource::new(pattern),
            gcd: GcdUnit::default(),
            sink: StreamSink::new(),
        };
        Ok(TickKernel::new(circuit, schedule))
    }

    /// One-line state rendering for debugging.
    pub fn line_trace(&self) -> String {
        format!(
            "{} > a:{:10} b:{:10} {:?} > {}",
            self.src.out,
            self.gcd.dpath.a_reg.committed,
            self.gcd.dpath.b_reg.committed,
            self.gcd.ctrl.state.committed,
            self.sink.in_
        )
    }
}
