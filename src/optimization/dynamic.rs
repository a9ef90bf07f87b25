//! Optimal contraction path via dynamic programming.
//!
//! Finds the globally optimal contraction tree by trying all bipartitions of
//! every subset of terms. Exponential in the number of terms, but optimal
//! under the cost model.

use std::collections::BTreeSet;

use hashbrown::HashMap;

use super::cost::{ContractionCost, CostModel};
use super::path::{ContractionPath, ContractionStep, TensorId, TensorState};
use crate::notation::{Label, LabelSizeTable, Subscript};

/// Maximum number of terms for which DP is feasible.
/// For n terms, we have 2^n subsets to consider.
pub const MAX_DP_TENSORS: usize = 12;

/// Best way found to contract one subset of terms.
#[derive(Debug, Clone)]
struct SubsetPlan {
    cost: ContractionCost,
    /// Left and right halves; `None` for single terms.
    split: Option<(u32, u32)>,
    /// Labels the subset's result carries.
    labels: BTreeSet<Label>,
}

/// Finds the optimal contraction path using dynamic programming.
///
/// Memoizes over all subsets of terms. Time complexity: O(3^n) where n is
/// the number of terms. Callers fall back to greedy above
/// [`MAX_DP_TENSORS`]; this function does the same rather than panic.
pub fn optimal_path(
    terms: &[Subscript],
    sizes: &LabelSizeTable,
    output: &Subscript,
    cost_model: &CostModel,
) -> ContractionPath {
    let n = terms.len();
    if n < 2 {
        return ContractionPath::new();
    }
    if n > MAX_DP_TENSORS {
        return super::greedy::greedy_path(terms, sizes, output, cost_model);
    }

    let full: u32 = (1u32 << n) - 1;
    let output_set: BTreeSet<Label> = output.iter().collect();
    let term_sets: Vec<BTreeSet<Label>> = terms.iter().map(|t| t.iter().collect()).collect();

    let mut memo: HashMap<u32, SubsetPlan> = HashMap::new();
    for (i, set) in term_sets.iter().enumerate() {
        memo.insert(
            1u32 << i,
            SubsetPlan {
                cost: ContractionCost::zero(),
                split: None,
                labels: set.clone(),
            },
        );
    }

    // DP over subset sizes
    for size in 2..=n {
        for subset in subsets_of_size(n, size) {
            let labels = subset_labels(subset, full, &term_sets, &output_set);
            let result_volume = sizes.volume(labels.iter().copied());

            let mut best: Option<SubsetPlan> = None;
            let mut left = (subset - 1) & subset;
            while left > 0 {
                let right = subset ^ left;
                // Each bipartition once
                if left < right {
                    let l = &memo[&left];
                    let r = &memo[&right];
                    let union: BTreeSet<Label> = l.labels.union(&r.labels).copied().collect();
                    let step = cost_model.contraction_cost(
                        sizes.volume(l.labels.iter().copied()),
                        sizes.volume(r.labels.iter().copied()),
                        sizes.volume(union.into_iter()),
                        result_volume,
                    );
                    let cost = l.cost + r.cost + step;
                    if best.as_ref().is_none_or(|b| cost < b.cost) {
                        best = Some(SubsetPlan {
                            cost,
                            split: Some((left, right)),
                            labels: labels.clone(),
                        });
                    }
                }
                left = (left - 1) & subset;
            }

            if let Some(plan) = best {
                memo.insert(subset, plan);
            }
        }
    }

    let mut state = TensorState::new(terms);
    let mut path = ContractionPath::with_capacity(n - 1);
    emit(full, &memo, &mut state, output, sizes, cost_model, &mut path);
    path
}

/// Emits the steps of `subset`'s tree in post-order; returns its tensor id.
fn emit(
    subset: u32,
    memo: &HashMap<u32, SubsetPlan>,
    state: &mut TensorState,
    output: &Subscript,
    sizes: &LabelSizeTable,
    cost_model: &CostModel,
    path: &mut ContractionPath,
) -> TensorId {
    match memo[&subset].split {
        None => subset.trailing_zeros() as TensorId,
        Some((left, right)) => {
            let a = emit(left, memo, state, output, sizes, cost_model, path);
            let b = emit(right, memo, state, output, sizes, cost_model, path);
            let labels = state.pair_labels(a, b, output);
            let cost =
                cost_model.compute_pairwise_cost(sizes, state.labels(a), state.labels(b), &labels);
            let result = labels.result();
            path.push(ContractionStep::new((a, b), labels, cost.flops));
            state.contract(a, b, result)
        }
    }
}

/// Labels of a subset's result: those needed by the output or by a term
/// outside the subset.
fn subset_labels(
    subset: u32,
    full: u32,
    term_sets: &[BTreeSet<Label>],
    output: &BTreeSet<Label>,
) -> BTreeSet<Label> {
    let mut inside = BTreeSet::new();
    let mut outside = output.clone();
    for (i, set) in term_sets.iter().enumerate() {
        let bit = 1u32 << i;
        if subset & bit != 0 {
            inside.extend(set.iter().copied());
        } else if full & bit != 0 {
            outside.extend(set.iter().copied());
        }
    }
    inside.intersection(&outside).copied().collect()
}

/// All `n`-bit masks with exactly `size` bits set.
fn subsets_of_size(n: usize, size: usize) -> impl Iterator<Item = u32> {
    (1u32..(1u32 << n)).filter(move |s| s.count_ones() as usize == size)
}
