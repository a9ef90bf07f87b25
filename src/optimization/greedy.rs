//! Greedy and fixed-order contraction paths.

use super::cost::{ContractionCost, CostModel};
use super::path::{ContractionPath, ContractionStep, TensorId, TensorState};
use crate::notation::{LabelSizeTable, Subscript};

/// Contracts the terms strictly left to right: `((t0 t1) t2) t3 ...`.
pub fn left_to_right_path(
    terms: &[Subscript],
    sizes: &LabelSizeTable,
    output: &Subscript,
    cost_model: &CostModel,
) -> ContractionPath {
    let n = terms.len();
    if n < 2 {
        return ContractionPath::new();
    }

    let mut state = TensorState::new(terms);
    let mut path = ContractionPath::with_capacity(n - 1);
    let mut acc: TensorId = 0;

    for next in 1..n {
        let (step, _) = evaluate_pair(&state, acc, next, output, sizes, cost_model);
        acc = state.contract(acc, next, step.result_indices());
        path.push(step);
    }

    path
}

/// Finds a contraction path using the greedy algorithm.
///
/// At each step, contracts the live pair with the lowest cost. Ties keep
/// the first pair found, so the result is deterministic.
/// Time complexity: O(n³) where n is the number of terms.
pub fn greedy_path(
    terms: &[Subscript],
    sizes: &LabelSizeTable,
    output: &Subscript,
    cost_model: &CostModel,
) -> ContractionPath {
    let n = terms.len();
    if n < 2 {
        return ContractionPath::new();
    }

    let mut state = TensorState::new(terms);
    let mut path = ContractionPath::with_capacity(n - 1);

    // Greedy loop: contract cheapest pair until one tensor remains
    while state.len() > 1 {
        let step = find_best_pair(&state, output, sizes, cost_model);
        let (a, b) = step.inputs;
        state.contract(a, b, step.result_indices());
        path.push(step);
    }

    path
}

/// Finds the best pair to contract in the current state.
fn find_best_pair(
    state: &TensorState,
    output: &Subscript,
    sizes: &LabelSizeTable,
    cost_model: &CostModel,
) -> ContractionStep {
    let live = state.live();
    let mut best: Option<(ContractionStep, ContractionCost)> = None;

    for (pos, &a) in live.iter().enumerate() {
        for &b in &live[pos + 1..] {
            let (step, cost) = evaluate_pair(state, a, b, output, sizes, cost_model);
            if best.as_ref().is_none_or(|(_, best_cost)| cost < *best_cost) {
                best = Some((step, cost));
            }
        }
    }

    let (step, _) = best.expect("greedy search needs at least two live tensors");
    step
}

/// Evaluates the cost of contracting a specific pair.
fn evaluate_pair(
    state: &TensorState,
    a: TensorId,
    b: TensorId,
    output: &Subscript,
    sizes: &LabelSizeTable,
    cost_model: &CostModel,
) -> (ContractionStep, ContractionCost) {
    let labels = state.pair_labels(a, b, output);
    let cost = cost_model.compute_pairwise_cost(sizes, state.labels(a), state.labels(b), &labels);
    (ContractionStep::new((a, b), labels, cost.flops), cost)
}
