//! Pipelined-multiplier timing: fixed latency, one-result-per-tick
//! steady-state throughput, and whole-pipeline freeze under back-pressure.

use strobe_circuits::{run_until, MulNstageSim, SourcePattern};
use strobe_conformance::mul_ref;

/// The free-running operand generator used to soak the pipeline.
fn soak(t: u64) -> (u32, u32) {
    let t = t as u32;
    (t.wrapping_add(2) & 0xffff, t.wrapping_add(19_182) & 0xffff)
}

#[test]
fn full_depth_latency_is_32_ticks() {
    let mut kernel = MulNstageSim::kernel(32, SourcePattern::Generator(soak)).unwrap();
    // A pair accepted on tick k is committed into the input rank at tick
    // k+1, leaves the last rank's step on tick k+32, and is captured by
    // the sink at the k+33 tick boundary.
    kernel.run(33);
    assert!(kernel.circuit().sink.received.is_empty());
    kernel.tick();
    assert_eq!(kernel.circuit().sink.received.len(), 1);
    assert_eq!(kernel.circuit().sink.received[0], {
        let (a, b) = soak(0);
        mul_ref(a, b)
    });
}

#[test]
fn steady_state_throughput_is_one_per_tick() {
    let mut kernel = MulNstageSim::kernel(32, SourcePattern::Generator(soak)).unwrap();
    kernel.run(34);
    let filled = kernel.circuit().sink.received.len();
    assert_eq!(filled, 1);

    for extra in 1..=20 {
        kernel.tick();
        assert_eq!(
            kernel.circuit().sink.received.len(),
            filled + extra,
            "pipeline stalled after {extra} extra ticks"
        );
    }

    // Every retired result is the product of the pair accepted 33 ticks
    // before its capture.
    for (k, &result) in kernel.circuit().sink.received.iter().enumerate() {
        let (a, b) = soak(k as u64);
        assert_eq!(result, mul_ref(a, b), "result index {k}");
    }
}

#[test]
fn stalled_sink_freezes_the_whole_pipeline() {
    let pairs: Vec<(u32, u32)> = (1..=12u32).map(|i| (i, i.wrapping_mul(31))).collect();
    let expected: Vec<u32> = pairs.iter().map(|&(a, b)| mul_ref(a, b)).collect();

    let mut kernel = MulNstageSim::kernel(8, SourcePattern::Script(pairs)).unwrap();
    kernel.run(12);
    assert!(!kernel.circuit().sink.received.is_empty());

    // Deassert ready. The tick after the stall begins may still capture
    // the transfer completed on the last ready tick; after that, nothing
    // moves.
    kernel.circuit_mut().sink.ready = false;
    kernel.tick();
    let frozen_count = kernel.circuit().sink.received.len();
    let frozen_a: Vec<u32> = kernel.circuit().imul.a_preg.iter().map(|r| r.committed).collect();
    let frozen_val: Vec<bool> = kernel
        .circuit()
        .imul
        .val_preg
        .iter()
        .map(|r| r.committed)
        .collect();

    kernel.run(6);
    let c = kernel.circuit();
    assert_eq!(c.sink.received.len(), frozen_count);
    let stalled_a: Vec<u32> = c.imul.a_preg.iter().map(|r| r.committed).collect();
    let stalled_val: Vec<bool> = c.imul.val_preg.iter().map(|r| r.committed).collect();
    assert_eq!(stalled_a, frozen_a);
    assert_eq!(stalled_val, frozen_val);

    // Resume: every scripted pair still comes out, exactly once, in order.
    kernel.circuit_mut().sink.ready = true;
    let done = run_until(&mut kernel, 100, |c| c.sink.received.len() == expected.len());
    assert!(done.is_some(), "pipeline did not drain after resume");
    assert_eq!(kernel.circuit().sink.received, expected);
}
