//! End-to-end evaluation on the ndarray host backend.

use einsum_eval::{ContractionStrategy, EinsumConfig, NdArrayBackend, einsum, einsum_with_config};
use half::f16;
use ndarray::{ArrayD, Ix2, IxDyn, array};
use pretty_assertions::assert_eq;

use crate::utils::{arange, assert_close, naive_einsum, scalar};

fn backend() -> NdArrayBackend<f64> {
    NdArrayBackend::new()
}

/// Evaluates `expr` and compares with the brute-force reference.
fn check(expr: &str, inputs: &[&str], output: &str, operands: &[&ArrayD<f64>]) {
    let expected = naive_einsum(inputs, output, operands);
    for strategy in [
        ContractionStrategy::LeftToRight,
        ContractionStrategy::Greedy,
        ContractionStrategy::Optimal,
    ] {
        let config = EinsumConfig::new().with_strategy(strategy);
        let actual = einsum_with_config(&backend(), expr, operands, &config).unwrap();
        assert_close(&actual, &expected);
    }
}

#[test]
fn test_diagonal_all_dtypes() {
    let f64s = arange(&[3, 3]);
    assert_eq!(
        einsum(&backend(), "ii->i", &[&f64s]).unwrap(),
        array![0.0, 4.0, 8.0].into_dyn()
    );

    let f32s = f64s.mapv(|x| x as f32);
    assert_eq!(
        einsum(&NdArrayBackend::new(), "ii->i", &[&f32s]).unwrap(),
        array![0.0f32, 4.0, 8.0].into_dyn()
    );

    let ints = f64s.mapv(|x| x as i64);
    assert_eq!(
        einsum(&NdArrayBackend::new(), "ii->i", &[&ints]).unwrap(),
        array![0i64, 4, 8].into_dyn()
    );

    let halves = f64s.mapv(f16::from_f64);
    let diag = einsum(&NdArrayBackend::new(), "ii->i", &[&halves]).unwrap();
    assert_eq!(diag.mapv(f16::to_f64), array![0.0, 4.0, 8.0].into_dyn());
}

#[test]
fn test_identity_and_transpose() {
    let a = arange(&[2, 3]);
    assert_eq!(einsum(&backend(), "ij", &[&a]).unwrap(), a);
    assert_eq!(
        einsum(&backend(), "ji", &[&a]).unwrap(),
        a.t().to_owned().into_dyn()
    );
    assert_eq!(einsum(&backend(), "ij->ji", &[&a]).unwrap(), a.t().to_owned());
}

#[test]
fn test_matmul_matches_dot() {
    let a = arange(&[3, 4]);
    let b = arange(&[4, 5]);
    let expected = a
        .clone()
        .into_dimensionality::<Ix2>()
        .unwrap()
        .dot(&b.clone().into_dimensionality::<Ix2>().unwrap());

    assert_eq!(einsum(&backend(), "ij,jk", &[&a, &b]).unwrap(), expected.into_dyn());
}

#[test]
fn test_chain_matches_both_groupings() {
    let a = arange(&[2, 3]).into_dimensionality::<Ix2>().unwrap();
    let b = arange(&[3, 4]).into_dimensionality::<Ix2>().unwrap();
    let c = arange(&[4, 5]).into_dimensionality::<Ix2>().unwrap();
    let left = a.dot(&b).dot(&c);
    let right = a.dot(&b.dot(&c));
    assert_eq!(left, right);

    let operands = [a.into_dyn(), b.into_dyn(), c.into_dyn()];
    let refs: Vec<&ArrayD<f64>> = operands.iter().collect();
    for strategy in [
        ContractionStrategy::LeftToRight,
        ContractionStrategy::Greedy,
        ContractionStrategy::Optimal,
        ContractionStrategy::Auto,
    ] {
        let config = EinsumConfig::new().with_strategy(strategy);
        let result = einsum_with_config(&backend(), "ij,jk,kl", &refs, &config).unwrap();
        assert_eq!(result, left.clone().into_dyn());
    }
}

#[test]
fn test_sum_to_scalar() {
    let v = array![1.0, 2.0, 3.0].into_dyn();
    let s = einsum(&backend(), "i->", &[&v]).unwrap();
    assert_eq!(s.ndim(), 0);
    assert_eq!(s[[]], 6.0);
}

#[test]
fn test_outer_product() {
    let a = array![1.0, 2.0].into_dyn();
    let b = array![1.0, 2.0, 3.0].into_dyn();
    assert_eq!(
        einsum(&backend(), "i,j", &[&a, &b]).unwrap(),
        array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]].into_dyn()
    );
}

#[test]
fn test_implicit_trace() {
    let a = array![[0.0, 1.0], [2.0, 3.0]].into_dyn();
    let t = einsum(&backend(), "ii", &[&a]).unwrap();
    assert_eq!(t, scalar(3.0));
}

#[test]
fn test_implicit_output_is_alphabetical() {
    // "ba" implies "->ab", a transpose
    let a = arange(&[2, 3]);
    let t = einsum(&backend(), "ba", &[&a]).unwrap();
    assert_eq!(t, a.t().to_owned());
}

#[test]
fn test_rank_zero_identity() {
    let s = scalar(7.0);
    assert_eq!(einsum(&backend(), "->", &[&s]).unwrap(), s);
}

#[test]
fn test_zero_sized_axes() {
    let a = ArrayD::<f64>::zeros(IxDyn(&[0, 3]));
    let b = arange(&[3, 2]);
    assert_eq!(einsum(&backend(), "ij,jk", &[&a, &b]).unwrap().shape(), &[0, 2]);

    let s = einsum(&backend(), "ij->", &[&a]).unwrap();
    assert_eq!(s, scalar(0.0));
}

#[test]
fn test_inputs_untouched() {
    let a = arange(&[3, 3]);
    let before = a.clone();
    let mut d = einsum(&backend(), "ii->i", &[&a]).unwrap();
    d.fill(-1.0);
    let mut t = einsum(&backend(), "ij", &[&a]).unwrap();
    t.fill(-1.0);
    assert_eq!(a, before);
}

#[test]
fn test_diagonals() {
    check("jii->ij", &["jii"], "ij", &[&arange(&[2, 3, 3])]);
    check("iji->ij", &["iji"], "ij", &[&arange(&[3, 2, 3])]);
    check("iii->i", &["iii"], "i", &[&arange(&[3, 3, 3])]);
}

#[test]
fn test_permutations() {
    let a = arange(&[2, 3, 4]);
    check("ijk->jik", &["ijk"], "jik", &[&a]);
    check("ijk->kij", &["ijk"], "kij", &[&a]);
    check("ijk->ikj", &["ijk"], "ikj", &[&a]);
    check("kji->ikj", &["kji"], "ikj", &[&a]);

    let t = einsum(&backend(), "ijk->kij", &[&a]).unwrap();
    assert_eq!(t[[3, 1, 2]], a[[1, 2, 3]]);
}

#[test]
fn test_matrix_vector() {
    let m = arange(&[3, 4]);
    let v = arange(&[4]);
    let w = arange(&[3]);
    check("ij,j", &["ij", "j"], "i", &[&m, &v]);
    check("ji,j", &["ji", "j"], "i", &[&m, &w]);
}

#[test]
fn test_contraction_with_whitespace() {
    check(
        "ijk, jil -> kl",
        &["ijk", "jil"],
        "kl",
        &[&arange(&[2, 3, 4]), &arange(&[3, 2, 5])],
    );
}

#[test]
fn test_scalar_operands() {
    let v = arange(&[4]);
    let r = einsum(&backend(), ",i->", &[&scalar(3.0), &v]).unwrap();
    assert_eq!(r, scalar(18.0));

    let r = einsum(&backend(), "i,->", &[&v, &scalar(4.0)]).unwrap();
    assert_eq!(r, scalar(24.0));

    let r = einsum(&backend(), ",i", &[&scalar(2.0), &v]).unwrap();
    assert_eq!(r, array![0.0, 2.0, 4.0, 6.0].into_dyn());
}

#[test]
fn test_diagonal_with_reduction() {
    check("ijkj->kij", &["ijkj"], "kij", &[&arange(&[2, 3, 4, 3])]);
    check(
        "ijil,jkk->kj",
        &["ijil", "jkk"],
        "kj",
        &[&arange(&[2, 3, 2, 4]), &arange(&[3, 5, 5])],
    );
    check("ijij->ij", &["ijij"], "ij", &[&arange(&[2, 3, 2, 3])]);
    check("jiji->ji", &["jiji"], "ji", &[&arange(&[2, 3, 2, 3])]);
}

#[test]
fn test_three_operands_sharing_a_label() {
    let a = arange(&[2, 3]);
    let b = arange(&[2, 4]);
    let c = arange(&[2]);
    check("ij,ik,i->ijk", &["ij", "ik", "i"], "ijk", &[&a, &b, &c]);

    let b = arange(&[4, 2]);
    check("ij,ki,i->jk", &["ij", "ki", "i"], "jk", &[&a, &b, &c]);
}

#[test]
fn test_batched_matmul() {
    check(
        "bij,bjk->bik",
        &["bij", "bjk"],
        "bik",
        &[&arange(&[2, 3, 4]), &arange(&[2, 4, 5])],
    );
    check(
        "bhqd,bhkd->bhqk",
        &["bhqd", "bhkd"],
        "bhqk",
        &[&arange(&[2, 2, 3, 4]), &arange(&[2, 2, 5, 4])],
    );
}

#[test]
fn test_long_chain() {
    let shapes: [&[usize]; 6] = [&[2, 3], &[3, 2], &[2, 4], &[4, 3], &[3, 2], &[2, 2]];
    let operands: Vec<ArrayD<f64>> = shapes.iter().map(|s| arange(s)).collect();
    let refs: Vec<&ArrayD<f64>> = operands.iter().collect();
    check(
        "ab,bc,cd,de,ef,fg->ag",
        &["ab", "bc", "cd", "de", "ef", "fg"],
        "ag",
        &refs,
    );
}

#[test]
fn test_uppercase_labels_are_distinct() {
    let a = arange(&[2, 3]);
    let b = arange(&[3, 2]);
    check("iJ,Jk->ik", &["iJ", "Jk"], "ik", &[&a, &b]);
    // 'I' sorts before 'i'
    let t = einsum(&backend(), "iI", &[&a]).unwrap();
    assert_eq!(t, a.t().to_owned());
}

#[test]
fn test_parallel_config() {
    let a = arange(&[2, 3]);
    let b = arange(&[3, 4]);
    let c = arange(&[4, 2]);
    let d = arange(&[2, 5]);
    let config = EinsumConfig::fast().with_parallel(true);
    let result =
        einsum_with_config(&backend(), "ij,jk,kl,lm->im", &[&a, &b, &c, &d], &config).unwrap();
    let expected = naive_einsum(&["ij", "jk", "kl", "lm"], "im", &[&a, &b, &c, &d]);
    assert_close(&result, &expected);
}
