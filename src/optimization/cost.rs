//! Cost model for contraction operations.

use serde::{Deserialize, Serialize};

use super::path::PairLabels;
use crate::notation::{LabelSizeTable, Subscript};

/// Cost of a single contraction operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContractionCost {
    /// Number of multiply-add operations, counted as two FLOPs each.
    pub flops: u64,
    /// Memory traffic in elements.
    pub memory: u64,
    /// Combined cost using the cost model.
    pub total: u64,
}

impl ContractionCost {
    pub fn new(flops: u64, memory: u64, alpha: u64) -> Self {
        let total = flops.saturating_add(memory.saturating_mul(alpha));
        Self {
            flops,
            memory,
            total,
        }
    }

    pub fn zero() -> Self {
        Self {
            flops: 0,
            memory: 0,
            total: 0,
        }
    }

    /// A cost larger than any real one.
    pub fn infinite() -> Self {
        Self {
            flops: u64::MAX,
            memory: u64::MAX,
            total: u64::MAX,
        }
    }
}

impl std::ops::Add for ContractionCost {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            flops: self.flops.saturating_add(rhs.flops),
            memory: self.memory.saturating_add(rhs.memory),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

impl Ord for ContractionCost {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.total.cmp(&other.total)
    }
}

impl PartialOrd for ContractionCost {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for ContractionCost {}

/// Cost model for evaluating contraction operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostModel {
    /// Memory traffic penalty factor.
    /// Higher values favour orderings with small intermediates.
    pub alpha: u64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::cpu()
    }
}

impl CostModel {
    /// Cost model for host execution.
    pub fn cpu() -> Self {
        Self { alpha: 8 }
    }

    /// Counts FLOPs only.
    pub fn flops_only() -> Self {
        Self { alpha: 0 }
    }

    /// Cost of contracting two tensors from their volumes.
    ///
    /// `union_volume` is the product of every distinct label size on either
    /// side; each of those index combinations is one multiply-add.
    pub fn contraction_cost(
        &self,
        left_volume: u64,
        right_volume: u64,
        union_volume: u64,
        result_volume: u64,
    ) -> ContractionCost {
        let flops = union_volume.saturating_mul(2);
        let memory = left_volume
            .saturating_add(right_volume)
            .saturating_add(result_volume);
        ContractionCost::new(flops, memory, self.alpha)
    }

    /// Computes the cost of contracting two labelled tensors.
    pub fn compute_pairwise_cost(
        &self,
        sizes: &LabelSizeTable,
        left: &Subscript,
        right: &Subscript,
        pair: &PairLabels,
    ) -> ContractionCost {
        let result = pair.result();
        let union_volume = sizes
            .volume(result.iter())
            .saturating_mul(sizes.volume(pair.summed.iter()));

        self.contraction_cost(
            sizes.volume(left.iter()),
            sizes.volume(right.iter()),
            union_volume,
            sizes.volume(result.iter()),
        )
    }
}
