//! Property-based tests.

use einsum_eval::notation::parse_einsum;
use einsum_eval::{ContractionStrategy, EinsumConfig, NdArrayBackend, einsum, einsum_with_config};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

/// Small integer-valued entries keep every summation order exact.
fn array_strategy(shape: Vec<usize>) -> impl Strategy<Value = ArrayD<f64>> {
    let len: usize = shape.iter().product();
    prop::collection::vec((-5i32..=5).prop_map(f64::from), len).prop_map(move |data| {
        ArrayD::from_shape_vec(IxDyn(&shape), data).expect("length matches shape")
    })
}

fn chain_strategy() -> impl Strategy<Value = Vec<ArrayD<f64>>> {
    prop::collection::vec(1usize..5, 5).prop_flat_map(|d| {
        (
            array_strategy(vec![d[0], d[1]]),
            array_strategy(vec![d[1], d[2]]),
            array_strategy(vec![d[2], d[3]]),
            array_strategy(vec![d[3], d[4]]),
        )
            .prop_map(|(a, b, c, e)| vec![a, b, c, e])
    })
}

fn cube_strategy() -> impl Strategy<Value = ArrayD<f64>> {
    (1usize..4, 1usize..4, 1usize..4).prop_flat_map(|(a, b, c)| array_strategy(vec![a, b, c]))
}

fn permutation_strategy() -> impl Strategy<Value = String> {
    Just(vec!['a', 'b', 'c'])
        .prop_shuffle()
        .prop_map(|labels| labels.into_iter().collect())
}

proptest! {
    #[test]
    fn grouping_does_not_change_result(operands in chain_strategy()) {
        let refs: Vec<&ArrayD<f64>> = operands.iter().collect();
        let backend = NdArrayBackend::new();
        let results: Vec<ArrayD<f64>> = [
            ContractionStrategy::LeftToRight,
            ContractionStrategy::Greedy,
            ContractionStrategy::Optimal,
        ]
        .into_iter()
        .map(|s| {
            let config = EinsumConfig::new().with_strategy(s);
            einsum_with_config(&backend, "ij,jk,kl,lm->im", &refs, &config).unwrap()
        })
        .collect();

        prop_assert_eq!(&results[0], &results[1]);
        prop_assert_eq!(&results[0], &results[2]);
    }

    #[test]
    fn implicit_output_is_sorted(a in cube_strategy(), labels in permutation_strategy()) {
        let backend = NdArrayBackend::new();
        let implicit = einsum(&backend, &labels, &[&a]).unwrap();
        let explicit = einsum(&backend, &format!("{}->abc", labels), &[&a]).unwrap();
        prop_assert_eq!(implicit, explicit);
    }

    #[test]
    fn transpose_round_trip(a in cube_strategy(), labels in permutation_strategy()) {
        let backend = NdArrayBackend::new();
        let forward = einsum(&backend, &format!("abc->{}", labels), &[&a]).unwrap();
        let back = einsum(&backend, &format!("{}->abc", labels), &[&forward]).unwrap();
        prop_assert_eq!(back, a);
    }

    #[test]
    fn parser_never_panics(expr in "[a-dA-D,>\\- .%]{0,12}", operands in 0usize..4) {
        let _ = parse_einsum(&expr, operands);
    }

    #[test]
    fn full_sum_matches_iterator_sum(a in cube_strategy()) {
        let total = einsum(&NdArrayBackend::new(), "abc->", &[&a]).unwrap();
        prop_assert_eq!(total[[]], a.iter().sum::<f64>());
    }
}
