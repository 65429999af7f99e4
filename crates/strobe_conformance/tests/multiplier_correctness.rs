//! Multiplier conformance, both variants: simulated products against the
//! software reference, including fixed-width wrap-around.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use strobe_circuits::{run_until, MulNstageSim, MulVarLatSim, SourcePattern};
use strobe_conformance::mul_ref;

fn known_vectors() -> Vec<(u32, u32)> {
    vec![
        (6, 7),
        (0, 5),
        (5, 0),
        (1, u32::MAX),
        (u32::MAX, 2),
        (60, 35),
        (18, 24),
        (195, 43),
        (0xdead_beef, 0x1234_5678),
    ]
}

#[test]
fn varlat_known_vectors() {
    let pairs = known_vectors();
    let expected: Vec<u32> = pairs.iter().map(|&(a, b)| mul_ref(a, b)).collect();

    let mut kernel = MulVarLatSim::kernel(SourcePattern::Script(pairs)).unwrap();
    let done = run_until(&mut kernel, 2_000, |c| {
        c.sink.received.len() == expected.len()
    });
    assert!(done.is_some(), "did not drain within the tick budget");
    assert_eq!(kernel.circuit().sink.received, expected);
}

#[test]
fn varlat_random_sweep_matches_reference() {
    let mut rng = StdRng::seed_from_u64(0xb01d_face);
    let pairs: Vec<(u32, u32)> = (0..50).map(|_| (rng.gen(), rng.gen())).collect();
    let expected: Vec<u32> = pairs.iter().map(|&(a, b)| mul_ref(a, b)).collect();

    let mut kernel = MulVarLatSim::kernel(SourcePattern::Script(pairs)).unwrap();
    let done = run_until(&mut kernel, 10_000, |c| {
        c.sink.received.len() == expected.len()
    });
    assert!(done.is_some(), "did not drain within the tick budget");
    assert_eq!(kernel.circuit().sink.received, expected);
}

#[test]
fn varlat_latency_is_data_dependent() {
    // A sparse B takes the 8-bit jumps and finishes much sooner than a
    // dense one of the same width.
    let mut sparse = MulVarLatSim::kernel(SourcePattern::Script(vec![(3, 1 << 24)])).unwrap();
    let sparse_ticks = run_until(&mut sparse, 1_000, |c| c.sink.received.len() == 1).unwrap();

    let mut dense = MulVarLatSim::kernel(SourcePattern::Script(vec![(3, 0x00ff_ffff)])).unwrap();
    let dense_ticks = run_until(&mut dense, 1_000, |c| c.sink.received.len() == 1).unwrap();

    assert_eq!(sparse.circuit().sink.received, vec![3 << 24]);
    assert_eq!(
        dense.circuit().sink.received,
        vec![mul_ref(3, 0x00ff_ffff)]
    );
    assert!(
        sparse_ticks < dense_ticks,
        "sparse {sparse_ticks} >= dense {dense_ticks}"
    );
}

#[test]
fn nstage_known_vectors_at_every_depth() {
    let pairs = known_vectors();
    let expected: Vec<u32> = pairs.iter().map(|&(a, b)| mul_ref(a, b)).collect();

    for nstages in [1, 2, 4, 8, 16, 32] {
        let mut kernel =
            MulNstageSim::kernel(nstages, SourcePattern::Script(pairs.clone())).unwrap();
        let done = run_until(&mut kernel, 500, |c| c.sink.received.len() == expected.len());
        assert!(done.is_some(), "nstages = {nstages} did not drain");
        assert_eq!(
            kernel.circuit().sink.received,
            expected,
            "nstages = {nstages}"
        );
    }
}

#[test]
fn nstage_random_sweep_matches_reference() {
    let mut rng = StdRng::seed_from_u64(0x715e11);
    let pairs: Vec<(u32, u32)> = (0..50).map(|_| (rng.gen(), rng.gen())).collect();
    let expected: Vec<u32> = pairs.iter().map(|&(a, b)| mul_ref(a, b)).collect();

    let mut kernel = MulNstageSim::kernel(8, SourcePattern::Script(pairs)).unwrap();
    let done = run_until(&mut kernel, 1_000, |c| {
        c.sink.received.len() == expected.len()
    });
    assert!(done.is_some(), "did not drain within the tick budget");
    assert_eq!(kernel.circuit().sink.received, expected);
}
