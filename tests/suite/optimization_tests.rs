//! Contraction path optimization tests.

use einsum_eval::notation::{LabelSizeTable, Subscript, parse_einsum, validate_shapes};
use einsum_eval::optimization::{
    ContractionStrategy, CostModel, MAX_DP_TENSORS, greedy_path, left_to_right_path, optimal_path,
    split_pair,
};
use pretty_assertions::assert_eq;

fn setup(expr: &str, shapes: &[&[usize]]) -> (Vec<Subscript>, LabelSizeTable, Subscript) {
    let notation = parse_einsum(expr, shapes.len()).unwrap();
    let validated = validate_shapes(&notation, shapes).unwrap();
    (notation.inputs().to_vec(), validated.sizes, validated.output)
}

#[test]
fn test_greedy_two_tensors() {
    let (terms, sizes, output) = setup("ij,jk->ik", &[&[100, 200], &[200, 300]]);
    let path = greedy_path(&terms, &sizes, &output, &CostModel::default());
    assert_eq!(path.len(), 1);
}

#[test]
fn test_greedy_three_tensors() {
    let (terms, sizes, output) = setup("ij,jk,kl->il", &[&[10, 20], &[20, 30], &[30, 40]]);
    let path = greedy_path(&terms, &sizes, &output, &CostModel::default());
    assert_eq!(path.len(), 2);
}

#[test]
fn test_optimal_three_tensors() {
    let (terms, sizes, output) = setup("ij,jk,kl->il", &[&[10, 20], &[20, 30], &[30, 40]]);
    let path = optimal_path(&terms, &sizes, &output, &CostModel::default());
    assert_eq!(path.len(), 2);
}

#[test]
fn test_optimal_beats_call_order() {
    // (AB) first builds a 1000x1000 intermediate; (BC) keeps it at 10x10
    let (terms, sizes, output) =
        setup("ij,jk,kl->il", &[&[1000, 10], &[10, 1000], &[1000, 10]]);
    let model = CostModel::flops_only();

    let fixed = left_to_right_path(&terms, &sizes, &output, &model);
    let optimal = optimal_path(&terms, &sizes, &output, &model);

    assert_eq!(fixed.to_pairs(), vec![(0, 1), (3, 2)]);
    assert_eq!(optimal.to_pairs(), vec![(1, 2), (0, 3)]);
    assert!(optimal.total_flops() < fixed.total_flops());
}

#[test]
fn test_optimal_falls_back_above_limit() {
    let n = MAX_DP_TENSORS + 1;
    let labels: Vec<char> = ('a'..='z').take(n + 1).collect();
    let terms: Vec<Subscript> = (0..n)
        .map(|i| Subscript::from_chars([labels[i], labels[i + 1]]))
        .collect();
    let expr = format!(
        "{}->{}{}",
        terms.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(","),
        labels[0],
        labels[n]
    );
    let shapes: Vec<Vec<usize>> = (0..n).map(|_| vec![2, 2]).collect();
    let shape_refs: Vec<&[usize]> = shapes.iter().map(|s| s.as_slice()).collect();

    let (terms, sizes, output) = setup(&expr, &shape_refs);
    let path = optimal_path(&terms, &sizes, &output, &CostModel::default());
    assert_eq!(path.len(), n - 1);
    assert_eq!(
        ContractionStrategy::Optimal.resolve(n),
        ContractionStrategy::Greedy
    );
}

#[test]
fn test_pair_split_keeps_batch_labels() {
    let (terms, _, output) = setup("bij,bjk->bik", &[&[2, 3, 4], &[2, 4, 5]]);
    let pair = split_pair(&terms[0], &terms[1], |c| output.contains(c));

    assert_eq!(pair.batch.to_string(), "b");
    assert_eq!(pair.summed.to_string(), "j");
    assert_eq!(pair.result().to_string(), "bik");
}

#[test]
fn test_cost_model() {
    let (terms, sizes, output) = setup("ij,jk->ik", &[&[100, 200], &[200, 300]]);
    let pair = split_pair(&terms[0], &terms[1], |c| output.contains(c));

    let cost = CostModel::default().compute_pairwise_cost(&sizes, &terms[0], &terms[1], &pair);

    // FLOPs = M * N * K * 2 = 100 * 300 * 200 * 2 = 12,000,000
    assert_eq!(cost.flops, 12_000_000);
    // Memory = inputs + result
    assert_eq!(cost.memory, 20_000 + 60_000 + 30_000);
    assert!(cost.total > cost.flops);
}
