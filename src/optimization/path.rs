//! Contraction path representation.
//!
//! Paths use single-assignment ids: the `n` starting terms are `0..n`, and
//! each contraction creates the next id, so the first step produces `n`,
//! the second `n + 1`, and so on. A consumed id is never referenced again.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::notation::{Label, Subscript};

/// Identifier of a tensor value in a path or plan.
pub type TensorId = usize;

/// How the labels of two tensors split when they are contracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairLabels {
    /// Shared labels still needed later, kept as batch axes.
    pub batch: Subscript,
    /// Shared labels summed away by this contraction.
    pub summed: Subscript,
    /// Labels only on the left, in left order.
    pub left_only: Subscript,
    /// Labels only on the right, in right order.
    pub right_only: Subscript,
}

impl PairLabels {
    /// Labels of the result: batch, then left-only, then right-only.
    pub fn result(&self) -> Subscript {
        self.batch
            .iter()
            .chain(self.left_only.iter())
            .chain(self.right_only.iter())
            .collect()
    }
}

/// Splits the labels of `left` and `right`; shared labels for which `keep`
/// is false are summed.
///
/// Both sides must have distinct labels.
pub fn split_pair(
    left: &Subscript,
    right: &Subscript,
    keep: impl Fn(Label) -> bool,
) -> PairLabels {
    let mut pair = PairLabels::default();
    for c in left.iter() {
        if !right.contains(c) {
            pair.left_only.push(c);
        } else if keep(c) {
            pair.batch.push(c);
        } else {
            pair.summed.push(c);
        }
    }
    for c in right.iter().filter(|&c| !left.contains(c)) {
        pair.right_only.push(c);
    }
    pair
}

/// A single step in a contraction path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractionStep {
    /// Ids of the tensors to contract.
    pub inputs: (TensorId, TensorId),
    /// Label split of this contraction.
    pub labels: PairLabels,
    /// Estimated cost of this step.
    pub estimated_flops: u64,
}

impl ContractionStep {
    pub fn new(inputs: (TensorId, TensorId), labels: PairLabels, estimated_flops: u64) -> Self {
        Self {
            inputs,
            labels,
            estimated_flops,
        }
    }

    /// Labels of the tensor this step produces.
    pub fn result_indices(&self) -> Subscript {
        self.labels.result()
    }
}

/// A complete contraction path.
#[derive(Debug, Clone)]
pub struct ContractionPath {
    /// Steps to execute in order.
    steps: Vec<ContractionStep>,
    /// Total estimated FLOPs.
    total_flops: u64,
}

impl ContractionPath {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            total_flops: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
            total_flops: 0,
        }
    }

    pub fn push(&mut self, step: ContractionStep) {
        self.total_flops = self.total_flops.saturating_add(step.estimated_flops);
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[ContractionStep] {
        &self.steps
    }

    pub fn total_flops(&self) -> u64 {
        self.total_flops
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Converts path to the list of contracted id pairs.
    pub fn to_pairs(&self) -> Vec<(TensorId, TensorId)> {
        self.steps.iter().map(|s| s.inputs).collect()
    }
}

impl Default for ContractionPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Live tensors during path search.
#[derive(Debug, Clone)]
pub struct TensorState {
    /// Labels of every id ever created; `None` once consumed.
    labels: Vec<Option<Subscript>>,
    /// Ids not yet consumed, in creation order.
    live: Vec<TensorId>,
}

impl TensorState {
    pub fn new(terms: &[Subscript]) -> Self {
        Self {
            labels: terms.iter().cloned().map(Some).collect(),
            live: (0..terms.len()).collect(),
        }
    }

    /// Number of tensors remaining.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn live(&self) -> &[TensorId] {
        &self.live
    }

    /// Labels of a live tensor.
    pub fn labels(&self, id: TensorId) -> &Subscript {
        self.labels[id]
            .as_ref()
            .expect("tensor id was already consumed")
    }

    /// Labels needed by anything other than `a` and `b`.
    pub fn kept_outside(&self, a: TensorId, b: TensorId, output: &Subscript) -> BTreeSet<Label> {
        let mut kept: BTreeSet<Label> = output.iter().collect();
        for &id in self.live.iter().filter(|&&id| id != a && id != b) {
            kept.extend(self.labels(id).iter());
        }
        kept
    }

    /// Label split for contracting `a` with `b` given the final output.
    pub fn pair_labels(&self, a: TensorId, b: TensorId, output: &Subscript) -> PairLabels {
        let kept = self.kept_outside(a, b, output);
        split_pair(self.labels(a), self.labels(b), |c| kept.contains(&c))
    }

    /// Consumes `a` and `b` and returns the id of their result.
    pub fn contract(&mut self, a: TensorId, b: TensorId, result: Subscript) -> TensorId {
        self.live.retain(|&id| id != a && id != b);
        self.labels[a] = None;
        self.labels[b] = None;

        let id = self.labels.len();
        self.labels.push(Some(result));
        self.live.push(id);
        id
    }
}
