//! Property-based equivalence tests across engines.

use std::sync::Arc;

use proptest::prelude::*;

use strassen_core::codec;
use strassen_core::memory::{FixedProbe, MemoryBudget};
use strassen_core::ops;
use strassen_core::{Matrix, ParallelEngine, SequentialEngine};

const PLENTY: u64 = 8 * 1024 * 1024 * 1024;

fn budget(bytes: u64) -> MemoryBudget {
    MemoryBudget::new(Arc::new(FixedProbe::new(bytes)))
}

/// Strategy: a random n x n matrix with small integer entries.
fn matrix(n: usize) -> impl Strategy<Value = Matrix> {
    proptest::collection::vec(-50i32..50, n * n)
        .prop_map(move |values| {
            let rows: Vec<Vec<i32>> = values.chunks(n).map(<[i32]>::to_vec).collect();
            Matrix::from_rows(&rows)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Sequential Strassen agrees with the direct product.
    #[test]
    fn sequential_equals_direct(
        (a, b) in prop_oneof![Just(1usize), Just(2), Just(4), Just(8), Just(16), Just(32)]
            .prop_flat_map(|n| (matrix(n), matrix(n)))
    ) {
        let engine = SequentialEngine::new(budget(PLENTY));
        prop_assert_eq!(engine.multiply(&a, &b), ops::multiply(&a, &b));
    }

    /// The fork-join engine agrees with the sequential engine.
    #[test]
    fn parallel_equals_sequential(
        (a, b) in prop_oneof![Just(2usize), Just(4), Just(8), Just(16), Just(32)]
            .prop_flat_map(|n| (matrix(n), matrix(n)))
    ) {
        let sequential = SequentialEngine::new(budget(PLENTY));
        let parallel = ParallelEngine::new(budget(PLENTY));
        prop_assert_eq!(parallel.multiply(&a, &b), sequential.multiply(&a, &b));
    }

    /// Flatten then unflatten is the identity.
    #[test]
    fn codec_round_trip(
        a in (1usize..12).prop_flat_map(matrix)
    ) {
        let n = a.size();
        let rebuilt = codec::unflatten(codec::flatten(&a), n).unwrap();
        prop_assert_eq!(rebuilt, a);
    }

    /// A starved memory budget still yields the exact product.
    #[test]
    fn starved_budget_is_correct(
        (a, b) in prop_oneof![Just(4usize), Just(8), Just(16)]
            .prop_flat_map(|n| (matrix(n), matrix(n)))
    ) {
        let engine = SequentialEngine::new(budget(1024));
        prop_assert_eq!(engine.multiply(&a, &b), ops::multiply(&a, &b));
    }
}
