//! Array backends.
//!
//! The evaluator never touches array storage itself. It decides which
//! primitives to run and hands them to a [`TensorBackend`], which owns
//! allocation and arithmetic.

mod host;

pub use host::NdArrayBackend;

use serde::{Deserialize, Serialize};

use crate::error::EinsumResult;

/// Axis mapping for a pairwise contraction.
///
/// The result layout is `[batch..., left_free..., right_free...]`, with
/// batch axes in `batch` order and free axes in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDims {
    /// `(left axis, right axis)` pairs kept in the result.
    pub batch: Vec<(usize, usize)>,
    /// `(left axis, right axis)` pairs multiplied and summed away.
    pub summed: Vec<(usize, usize)>,
    /// Left axes present only on the left.
    pub left_free: Vec<usize>,
    /// Right axes present only on the right.
    pub right_free: Vec<usize>,
}

impl ContractDims {
    /// True when nothing is shared: the contraction is an outer product.
    pub fn is_outer(&self) -> bool {
        self.batch.is_empty() && self.summed.is_empty()
    }
}

/// Elementary array capabilities the evaluator is built on.
///
/// Every method returns freshly allocated storage; implementations must
/// never return a value sharing memory with an argument. Inputs are only
/// read, so the evaluator may call methods from several threads at once.
pub trait TensorBackend: Sync {
    type Tensor: Send + Sync;
    type Elem: Copy;

    /// Dimension sizes of a tensor.
    fn shape<'t>(&self, tensor: &'t Self::Tensor) -> &'t [usize];

    /// Wraps a single value as a rank-0 tensor.
    fn scalar(&self, value: Self::Elem) -> Self::Tensor;

    /// Extracts the diagonal along each group of axes.
    ///
    /// Each group lists axes of equal size in ascending order. All axes of a
    /// group collapse onto the group's first axis; the remaining axes keep
    /// their relative order.
    fn diagonal(&self, tensor: &Self::Tensor, groups: &[Vec<usize>]) -> EinsumResult<Self::Tensor>;

    /// Reorders axes: result axis `i` is input axis `perm[i]`.
    fn permute(&self, tensor: &Self::Tensor, perm: &[usize]) -> EinsumResult<Self::Tensor>;

    /// Sums over the given axes, removing them.
    fn sum_axes(&self, tensor: &Self::Tensor, axes: &[usize]) -> EinsumResult<Self::Tensor>;

    /// Generalized batched multiply-and-sum of two tensors.
    ///
    /// Equivalent to matrix multiplication for one summed axis and one free
    /// axis per side, and to an outer product when nothing is shared.
    fn contract(
        &self,
        lhs: &Self::Tensor,
        rhs: &Self::Tensor,
        dims: &ContractDims,
    ) -> EinsumResult<Self::Tensor>;
}
