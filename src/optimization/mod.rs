//! Contraction planning for einsum.
//!
//! Implements multiple strategies for ordering pairwise contractions:
//! - Left to right: call order, no search
//! - Greedy: O(n³) fast heuristic
//! - Dynamic Programming: Optimal for small n
//!
//! and turns the chosen order into an [`ExecutionPlan`].

mod cost;
mod dynamic;
mod greedy;
mod path;
mod plan;

pub use cost::{ContractionCost, CostModel};
pub use dynamic::{MAX_DP_TENSORS, optimal_path};
pub use greedy::{greedy_path, left_to_right_path};
pub use path::{ContractionPath, ContractionStep, PairLabels, TensorId, TensorState, split_pair};
pub use plan::{ContractionStrategy, DiagonalGroup, ExecutionPlan, ExecutionStep, create_plan};
