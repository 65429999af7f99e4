//! The variable-latency shift-add multiplier.
//!
//! Classic shift-add with a data-dependent step size: each CALC cycle a
//! normalization shift amount is computed from the low byte of the B
//! register — 8 if the byte is fully zero, otherwise enough to bring the
//! next set bit to (or past) bit zero — and both operand registers shift by
//! that amount while the accumulator conditionally absorbs the pre-shift A
//! when the current B is odd. Latency is therefore proportional to the
//! population structure of B rather than a fixed 32 cycles.

use strobe_prim::{Adder, LShifter, Mux, Reg, RegEn, RShifter, ZeroComp};
use strobe_sim::{Schedule, ScheduleError, SignalDb, Step, TickKernel};

use crate::stream::{SourcePattern, StreamSink, StreamSource};
use crate::CtrlState;

/// a-mux select: load the left-shifted A.
pub const A_MUX_SEL_LSH: u32 = 0;
/// a-mux select: load the incoming operand.
pub const A_MUX_SEL_LD: u32 = 1;
/// b-mux select: load the right-shifted B.
pub const B_MUX_SEL_RSH: u32 = 0;
/// b-mux select: load the incoming operand.
pub const B_MUX_SEL_LD: u32 = 1;
/// result-mux select: load the add-mux output.
pub const RES_MUX_SEL_ADD: u32 = 0;
/// result-mux select: load zero (accumulator initialization).
pub const RES_MUX_SEL_ZERO: u32 = 1;
/// add-mux select: take the adder output (absorb A).
pub const ADD_MUX_SEL_ADD: u32 = 0;
/// add-mux select: recirculate the accumulator unchanged.
pub const ADD_MUX_SEL_RESULT: u32 = 1;

/// Computes the per-cycle normalization shift amount from the low byte of
/// B: 8 on a zero byte (large jump), 1 while bit 0 or bit 1 is set,
/// otherwise the index of the lowest set bit.
#[derive(Clone, Copy, Debug, Default)]
pub struct CalcShamt {
    /// The low byte of the B register (masked by the feeding fanout).
    pub input: u32,
    /// The shift amount, 1..=8.
    pub out: u32,
}

impl CalcShamt {
    /// Creates the unit with all ports zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the shift amount.
    pub fn recompute(&mut self) {
        self.out = if self.input == 0 {
            8
        } else if self.input & 0b11 != 0 {
            1
        } else {
            self.input.trailing_zeros()
        };
    }
}

/// Control bundle from the multiplier controller to its datapath.
#[derive(Clone, Copy, Debug, Default)]
pub struct MulVarLatCs {
    /// Select for the A-register input mux.
    pub a_mux_sel: u32,
    /// Select for the B-register input mux.
    pub b_mux_sel: u32,
    /// Select for the accumulator input mux.
    pub res_mux_sel: u32,
    /// Select for the conditional-add mux.
    pub add_mux_sel: u32,
    /// Load enable for the accumulator register.
    pub res_reg_en: bool,
}

/// Multiplier datapath: operand registers and shifters, the accumulator,
/// and the conditional-add mux network.
#[derive(Default)]
pub struct MulVarLatDpath {
    /// Input mux for B: shifted / operand.
    pub b_mux: Mux<u32, 2>,
    /// The B operand register.
    pub b_reg: Reg<u32>,
    /// Shift-amount unit fed from B's low byte.
    pub calc_shamt: CalcShamt,
    /// Termination comparator (`b == 0`).
    pub b_zcp: ZeroComp,
    /// Right shifter for B.
    pub b_rsh: RShifter,
    /// Input mux for A: shifted / operand.
    pub a_mux: Mux<u32, 2>,
    /// The A operand register.
    pub a_reg: Reg<u32>,
    /// Left shifter for A.
    pub a_lsh: LShifter,
    /// Input mux for the accumulator: add-mux output / zero.
    pub res_mux: Mux<u32, 2>,
    /// The accumulator register; its committed value is the response.
    pub res_reg: RegEn<u32>,
    /// Computes `a + result`.
    pub res_add: Adder,
    /// Chooses between the sum and the unchanged accumulator.
    pub add_mux: Mux<u32, 2>,
}

/// Multiplier controller: the IDLE/CALC/DONE state machine.
#[derive(Default)]
pub struct MulVarLatCtrl {
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
    /// Status: bit 0 of B, copied in from the datapath.
    pub b_lsb: bool,
    /// The state register.
    pub state: Reg<CtrlState>,
    /// Control outputs to the datapath.
    pub cs: MulVarLatCs,
}

impl MulVarLatCtrl {
    /// Output function: control and handshake outputs from the current
    /// state and the B least-significant bit.
    pub fn state_outputs(&mut self) {
        self.req_rdy = false;
        self.resp_val = false;
        self.cs = MulVarLatCs::default();

        match self.state.committed {
            // Load both operands and zero the accumulator.
            CtrlState::Idle => {
                self.req_rdy = true;
                self.cs.a_mux_sel = A_MUX_SEL_LD;
                self.cs.b_mux_sel = B_MUX_SEL_LD;
                self.cs.res_mux_sel = RES_MUX_SEL_ZERO;
                self.cs.res_reg_en = true;
            }
            // Shift by the computed amount; absorb A only when B is odd.
            CtrlState::Calc => {
                self.cs.a_mux_sel = A_MUX_SEL_LSH;
                self.cs.b_mux_sel = B_MUX_SEL_RSH;
                self.cs.res_mux_sel = RES_MUX_SEL_ADD;
                self.cs.res_reg_en = true;
                self.cs.add_mux_sel = if self.b_lsb {
                    ADD_MUX_SEL_ADD
                } else {
                    ADD_MUX_SEL_RESULT
                };
            }
            // Hold the accumulator until the response transfer.
            CtrlState::Done => {
                self.resp_val = true;
            }
        }
    }

    /// Next-state function, writing the state register's pending half.
    pub fn state_transitions(&mut self) {
        let next = match self.state.committed {
            CtrlState::Idle if self.req_val && self.req_rdy => CtrlState::Calc,
            CtrlState::Calc if self.is_b_zero => CtrlState::Done,
            CtrlState::Done if self.resp_val && self.resp_rdy => CtrlState::Idle,
            current => current,
        };
        self.state.pending = next;
    }
}

/// The composed variable-latency multiplier.
#[derive(Default)]
pub struct MulVarLatUnit {
    /// The datapath.
    pub dpath: MulVarLatDpath,
    /// The controller.
    pub ctrl: MulVarLatCtrl,
}

/// The variable-latency multiplier wrapped by a stream source and sink.
pub struct MulVarLatSim {
    /// Drives the request handshake with `(a, b)` operand pairs.
    pub src: StreamSource<(u32, u32)>,
    /// The unit under test.
    pub imul: MulVarLatUnit,
    /// Drains the response handshake.
    pub sink: StreamSink<u32>,
}

impl MulVarLatSim {
    /// Builds the harness and its validated per-tick schedule.
    pub fn kernel(pattern: SourcePattern<(u32, u32)>) -> Result<TickKernel<Self>, ScheduleError> {
        let mut db = SignalDb::new();

        let src_val = db.signal("src.out.val", 1);
        let src_rdy = db.signal("src.out.rdy", 1);
        let src_msg = db.signal("src.out.msg", 64);
        let sink_val = db.signal("sink.in.val", 1);
        let sink_rdy = db.signal("sink.in.rdy", 1);
        let sink_msg = db.signal("sink.in.msg", 32);

        let req_val = db.signal("imul.ctrl.req_val", 1);
        let req_rdy = db.signal("imul.ctrl.req_rdy", 1);
        let resp_val = db.signal("imul.ctrl.resp_val", 1);
        let resp_rdy = db.signal("imul.ctrl.resp_rdy", 1);
        let is_b_zero = db.signal("imul.ctrl.is_b_zero", 1);
        let b_lsb = db.signal("imul.ctrl.b_lsb", 1);
        let cs_a_mux_sel = db.signal("imul.ctrl.cs.a_mux_sel", 1);
        let cs_b_mux_sel = db.signal("imul.ctrl.cs.b_mux_sel", 1);
        let cs_res_mux_sel = db.signal("imul.ctrl.cs.res_mux_sel", 1);
        let cs_add_mux_sel = db.signal("imul.ctrl.cs.add_mux_sel", 1);
        let cs_res_reg_en = db.signal("imul.ctrl.cs.res_reg_en", 1);
        let state_in = db.signal("imul.ctrl.state.in", 2);
        let state_out = db.signal("imul.ctrl.state.out", 2);

        let a_mux_in_lsh = db.signal("imul.dpath.a_mux.in_lsh", 32);
        let a_mux_in_ld = db.signal("imul.dpath.a_mux.in_ld", 32);
        let a_mux_sel = db.signal("imul.dpath.a_mux.sel", 1);
        let a_mux_out = db.signal("imul.dpath.a_mux.out", 32);
        let a_reg_in = db.signal("imul.dpath.a_reg.in", 32);
        let a_reg_out = db.signal("imul.dpath.a_reg.out", 32);
        let a_lsh_in = db.signal("imul.dpath.a_lsh.in", 32);
        let a_lsh_shamt = db.signal("imul.dpath.a_lsh.shamt", 4);
        let a_lsh_out = db.signal("imul.dpath.a_lsh.out", 32);

        let b_mux_in_rsh = db.signal("imul.dpath.b_mux.in_rsh", 32);
        let b_mux_in_ld = db.signal("imul.dpath.b_mux.in_ld", 32);
        let b_mux_sel = db.signal("imul.dpath.b_mux.sel", 1);
        let b_mux_out = db.signal("imul.dpath.b_mux.out", 32);
        let b_reg_in = db.signal("imul.dpath.b_reg.in", 32);
        let b_reg_out = db.signal("imul.dpath.b_reg.out", 32);
        let b_rsh_in = db.signal("imul.dpath.b_rsh.in", 32);
        let b_rsh_shamt = db.signal("imul.dpath.b_rsh.shamt", 4);
        let b_rsh_out = db.signal("imul.dpath.b_rsh.out", 32);
        let calc_shamt_in = db.signal("imul.dpath.calc_shamt.in", 8);
        let calc_shamt_out = db.signal("imul.dpath.calc_shamt.out", 4);
        let zcp_in = db.signal("imul.dpath.b_zcp.in", 32);
        let zcp_out = db.signal("imul.dpath.b_zcp.out", 1);

        let res_mux_in_add = db.signal("imul.dpath.res_mux.in_add", 32);
        let res_mux_sel = db.signal("imul.dpath.res_mux.sel", 1);
        let res_mux_out = db.signal("imul.dpath.res_mux.out", 32);
        let res_reg_in = db.signal("imul.dpath.res_reg.in", 32);
        let res_reg_en = db.signal("imul.dpath.res_reg.en", 1);
        let res_reg_out = db.signal("imul.dpath.res_reg.out", 32);
        let res_add_a = db.signal("imul.dpath.res_add.a", 32);
        let res_add_b = db.signal("imul.dpath.res_add.b", 32);
        let res_add_out = db.signal("imul.dpath.res_add.out", 32);
        let add_mux_in_add = db.signal("imul.dpath.add_mux.in_add", 32);
        let add_mux_in_res = db.signal("imul.dpath.add_mux.in_res", 32);
        let add_mux_sel = db.signal("imul.dpath.add_mux.sel", 1);
        let add_mux_out = db.signal("imul.dpath.add_mux.out", 32);

        let steps: Vec<Step<MulVarLatSim>> = vec![
            // Tick boundary.
            Step::commit(
                "imul.dpath.res_reg",
                vec![res_reg_in, res_reg_en],
                vec![res_reg_out],
                |c: &mut MulVarLatSim| c.imul.dpath.res_reg.commit(),
            ),
            Step::commit(
                "imul.dpath.a_reg",
                vec![a_reg_in],
                vec![a_reg_out],
                |c: &mut MulVarLatSim| c.imul.dpath.a_reg.commit(),
            ),
            Step::commit(
                "imul.dpath.b_reg",
                vec![b_reg_in],
                vec![b_reg_out],
                |c: &mut MulVarLatSim| c.imul.dpath.b_reg.commit(),
            ),
            Step::commit(
                "imul.ctrl.state",
                vec![state_in],
                vec![state_out],
                |c: &mut MulVarLatSim| c.imul.ctrl.state.commit(),
            ),
            Step::commit(
                "src",
                vec![src_val, src_rdy],
                vec![src_val, src_msg],
                |c: &mut MulVarLatSim| c.src.pulse(),
            ),
            Step::commit(
                "sink",
                vec![sink_val, sink_rdy, sink_msg],
                vec![],
                |c: &mut MulVarLatSim| c.sink.pulse(),
            ),
            // Settle the combinational fabric.
            Step::comb("sink.set_ready", vec![], vec![sink_rdy], |c: &mut MulVarLatSim| {
                c.sink.set_ready()
            }),
            Step::fanout(
                "imul.dpath.res_reg.out",
                vec![res_reg_out],
                vec![sink_msg, res_add_b, add_mux_in_res],
                |c: &mut MulVarLatSim| {
                    let res = c.imul.dpath.res_reg.committed;
                    c.sink.in_.msg = res;
                    c.imul.dpath.res_add.b = res;
                    c.imul.dpath.add_mux.inputs[ADD_MUX_SEL_RESULT as usize] = res;
                },
            ),
            Step::fanout(
                "imul.dpath.a_reg.out",
                vec![a_reg_out],
                vec![a_lsh_in, res_add_a],
                |c: &mut MulVarLatSim| {
                    let a = c.imul.dpath.a_reg.committed;
                    c.imul.dpath.a_lsh.input = a;
                    c.imul.dpath.res_add.a = a;
                },
            ),
            // Bit slices of B feed the controller and the shamt unit.
            Step::fanout(
                "imul.dpath.b_reg.out[0:1]",
                vec![b_reg_out],
                vec![b_lsb],
                |c: &mut MulVarLatSim| c.imul.ctrl.b_lsb = c.imul.dpath.b_reg.committed & 1 != 0,
            ),
            Step::fanout(
                "imul.dpath.b_reg.out[0:8]",
                vec![b_reg_out],
                vec![calc_shamt_in],
                |c: &mut MulVarLatSim| {
                    c.imul.dpath.calc_shamt.input = c.imul.dpath.b_reg.committed & 0xff
                },
            ),
            Step::fanout(
                "imul.dpath.b_reg.out",
                vec![b_reg_out],
                vec![zcp_in, b_rsh_in],
                |c: &mut MulVarLatSim| {
                    let b = c.imul.dpath.b_reg.committed;
                    c.imul.dpath.b_zcp.input = b;
                    c.imul.dpath.b_rsh.input = b;
                },
            ),
            Step::fanout(
                "sink.in.rdy",
                vec![sink_rdy],
                vec![resp_rdy],
                |c: &mut MulVarLatSim| c.imul.ctrl.resp_rdy = c.sink.in_.rdy,
            ),
            Step::fanout(
                "src.out.msg",
                vec![src_msg],
                vec![a_mux_in_ld, b_mux_in_ld],
                |c: &mut MulVarLatSim| {
                    let (a, b) = c.src.out.msg;
                    c.imul.dpath.a_mux.inputs[A_MUX_SEL_LD as usize] = a;
                    c.imul.dpath.b_mux.inputs[B_MUX_SEL_LD as usize] = b;
                },
            ),
            Step::fanout("src.out.val", vec![src_val], vec![req_val], |c: &mut MulVarLatSim| {
                c.imul.ctrl.req_val = c.src.out.val
            }),
            Step::comb(
                "imul.dpath.res_add",
                vec![res_add_a, res_add_b],
                vec![res_add_out],
                |c: &mut MulVarLatSim| c.imul.dpath.res_add.recompute(),
            ),
            Step::comb(
                "imul.ctrl.state_outputs",
                vec![state_out, b_lsb],
                vec![
                    req_rdy,
                    resp_val,
                    cs_a_mux_sel,
                    cs_b_mux_sel,
                    cs_res_mux_sel,
                    cs_add_mux_sel,
                    cs_res_reg_en,
                ],
                |c: &mut MulVarLatSim| c.imul.ctrl.state_outputs(),
            ),
            Step::comb(
                "imul.dpath.b_zcp",
                vec![zcp_in],
                vec![zcp_out],
                |c: &mut MulVarLatSim| c.imul.dpath.b_zcp.recompute(),
            ),
            Step::comb(
                "imul.dpath.calc_shamt",
                vec![calc_shamt_in],
                vec![calc_shamt_out],
                |c: &mut MulVarLatSim| c.imul.dpath.calc_shamt.recompute(),
            ),
            Step::fanout(
                "imul.dpath.res_add.out",
                vec![res_add_out],
                vec![add_mux_in_add],
                |c: &mut MulVarLatSim| {
                    c.imul.dpath.add_mux.inputs[ADD_MUX_SEL_ADD as usize] = c.imul.dpath.res_add.out
                },
            ),
            Step::fanout(
                "imul.ctrl.cs.a_mux_sel",
                vec![cs_a_mux_sel],
                vec![a_mux_sel],
                |c: &mut MulVarLatSim| c.imul.dpath.a_mux.sel = c.imul.ctrl.cs.a_mux_sel,
            ),
            Step::fanout(
                "imul.ctrl.cs.b_mux_sel",
                vec![cs_b_mux_sel],
                vec![b_mux_sel],
                |c: &mut MulVarLatSim| c.imul.dpath.b_mux.sel = c.imul.ctrl.cs.b_mux_sel,
            ),
            Step::fanout(
                "imul.ctrl.cs.res_mux_sel",
                vec![cs_res_mux_sel],
                vec![res_mux_sel],
                |c: &mut MulVarLatSim| c.imul.dpath.res_mux.sel = c.imul.ctrl.cs.res_mux_sel,
            ),
            Step::fanout(
                "imul.ctrl.cs.add_mux_sel",
                vec![cs_add_mux_sel],
                vec![add_mux_sel],
                |c: &mut MulVarLatSim| c.imul.dpath.add_mux.sel = c.imul.ctrl.cs.add_mux_sel,
            ),
            Step::fanout(
                "imul.ctrl.cs.res_reg_en",
                vec![cs_res_reg_en],
                vec![res_reg_en],
                |c: &mut MulVarLatSim| c.imul.dpath.res_reg.enable = c.imul.ctrl.cs.res_reg_en,
            ),
            Step::fanout(
                "imul.ctrl.req_rdy",
                vec![req_rdy],
                vec![src_rdy],
                |c: &mut MulVarLatSim| c.src.out.rdy = c.imul.ctrl.req_rdy,
            ),
            Step::fanout(
                "imul.ctrl.resp_val",
                vec![resp_val],
                vec![sink_val],
                |c: &mut MulVarLatSim| c.sink.in_.val = c.imul.ctrl.resp_val,
            ),
            Step::fanout(
                "imul.dpath.b_zcp.out",
                vec![zcp_out],
                vec![is_b_zero],
                |c: &mut MulVarLatSim| c.imul.ctrl.is_b_zero = c.imul.dpath.b_zcp.out,
            ),
            Step::fanout(
                "imul.dpath.calc_shamt.out",
                vec![calc_shamt_out],
                vec![b_rsh_shamt, a_lsh_shamt],
                |c: &mut MulVarLatSim| {
                    let shamt = c.imul.dpath.calc_shamt.out;
                    c.imul.dpath.b_rsh.shamt = shamt;
                    c.imul.dpath.a_lsh.shamt = shamt;
                },
            ),
            Step::comb(
                "imul.dpath.add_mux",
                vec![add_mux_in_add, add_mux_in_res, add_mux_sel],
                vec![add_mux_out],
                |c: &mut MulVarLatSim| c.imul.dpath.add_mux.recompute(),
            ),
            Step::comb(
                "imul.ctrl.state_transitions",
                vec![state_out, req_val, req_rdy, resp_val, resp_rdy, is_b_zero],
                vec![state_in],
                |c: &mut MulVarLatSim| c.imul.ctrl.state_transitions(),
            ),
            Step::comb(
                "imul.dpath.b_rsh",
                vec![b_rsh_in, b_rsh_shamt],
                vec![b_rsh_out],
                |c: &mut MulVarLatSim| c.imul.dpath.b_rsh.recompute(),
            ),
            Step::comb(
                "imul.dpath.a_lsh",
                vec![a_lsh_in, a_lsh_shamt],
                vec![a_lsh_out],
                |c: &mut MulVarLatSim| c.imul.dpath.a_lsh.recompute(),
            ),
            Step::fanout(
                "imul.dpath.add_mux.out",
                vec![add_mux_out],
                vec![res_mux_in_add],
                |c: &mut MulVarLatSim| {
                    c.imul.dpath.res_mux.inputs[RES_MUX_SEL_ADD as usize] = c.imul.dpath.add_mux.out
                },
            ),
            Step::fanout(
                "imul.dpath.b_rsh.out",
                vec![b_rsh_out],
                vec![b_mux_in_rsh],
                |c: &mut MulVarLatSim| {
                    c.imul.dpath.b_mux.inputs[B_MUX_SEL_RSH as usize] = c.imul.dpath.b_rsh.out
                },
            ),
            Step::fanout(
                "imul.dpath.a_lsh.out",
                vec![a_lsh_out],
                vec![a_mux_in_lsh],
                |c: &mut MulVarLatSim| {
                    c.imul.dpath.a_mux.inputs[A_MUX_SEL_LSH as usize] = c.imul.dpath.a_lsh.out
                },
            ),
            // The zero slot of the result mux is a construction constant.
            Step::comb(
                "imul.dpath.res_mux",
                vec![res_mux_in_add, res_mux_sel],
                vec![res_mux_out],
                |c: &mut MulVarLatSim| c.imul.dpath.res_mux.recompute(),
            ),
            Step::comb(
                "imul.dpath.b_mux",
                vec![b_mux_in_rsh, b_mux_in_ld, b_mux_sel],
                vec![b_mux_out],
                |c: &mut MulVarLatSim| c.imul.dpath.b_mux.recompute(),
            ),
            Step::comb(
                "imul.dpath.a_mux",
                vec![a_mux_in_lsh, a_mux_in_ld, a_mux_sel],
                vec![a_mux_out],
                |c: &mut MulVarLatSim| c.imul.dpath.a_mux.recompute(),
            ),
            Step::fanout(
                "imul.dpath.res_mux.out",
                vec![res_mux_out],
                vec![res_reg_in],
                |c: &mut MulVarLatSim| c.imul.dpath.res_reg.pending = c.imul.dpath.res_mux.out,
            ),
            Step::fanout(
                "imul.dpath.b_mux.out",
                vec![b_mux_out],
                vec![b_reg_in],
                |c: &mut MulVarLatSim| c.imul.dpath.b_reg.pending = c.imul.dpath.b_mux.out,
            ),
            Step::fanout(
                "imul.dpath.a_mux.out",
                vec![a_mux_out],
                vec![a_reg_in],
                |c: &mut MulVarLatSim| c.imul.dpath.a_reg.pending = c.imul.dpath.a_mux.out,
            ),
        ];

        let schedule = Schedule::new(db, steps)?;
        let circuit = MulVarLatSim {
            src: StreamSource::new(pattern),
            imul: MulVarLatUnit::default(),
            sink: StreamSink::new(),
        };
        Ok(TickKernel::new(circuit, schedule))
    }

    /// One-line state rendering for debugging.
    pub fn line_trace(&self) -> String {
        format!(
            "{} > a:{:10} b:{:10} res:{:10} {:?} > {}",
            self.src.out,
            self.imul.dpath.a_reg.committed,
            self.imul.dpath.b_reg.committed,
            self.imul.dpath.res_reg.committed,
            self.imul.ctrl.state.committed,
            self.sink.in_
        )
    }
}
