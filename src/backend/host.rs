//! Host backend over `ndarray` dynamic-rank arrays.

use std::marker::PhantomData;

use ndarray::linalg::general_mat_mul;
use ndarray::{Array3, ArrayD, Axis, IxDyn, LinalgScalar};

use super::{ContractDims, TensorBackend};
use crate::error::{EinsumError, EinsumResult};

/// Reference backend evaluating on the host with [`ndarray::ArrayD`].
///
/// Works for any `LinalgScalar` element: `f32`, `f64`, integers and
/// `half::f16`.
#[derive(Debug, Clone, Copy)]
pub struct NdArrayBackend<T> {
    _elem: PhantomData<fn() -> T>,
}

impl<T> NdArrayBackend<T> {
    pub fn new() -> Self {
        Self { _elem: PhantomData }
    }
}

impl<T> Default for NdArrayBackend<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LinalgScalar + Send + Sync> TensorBackend for NdArrayBackend<T> {
    type Tensor = ArrayD<T>;
    type Elem = T;

    fn shape<'t>(&self, tensor: &'t ArrayD<T>) -> &'t [usize] {
        tensor.shape()
    }

    fn scalar(&self, value: T) -> ArrayD<T> {
        ArrayD::from_elem(IxDyn(&[]), value)
    }

    fn diagonal(&self, tensor: &ArrayD<T>, groups: &[Vec<usize>]) -> EinsumResult<ArrayD<T>> {
        let shape = tensor.shape();
        let ndim = shape.len();

        // Result axis of every input axis.
        let mut target: Vec<Option<usize>> = vec![None; ndim];
        for group in groups {
            let Some(&first) = group.first() else {
                continue;
            };
            for &axis in group {
                if axis >= ndim {
                    return Err(EinsumError::backend(format!(
                        "diagonal axis {} out of range for rank {}",
                        axis, ndim
                    )));
                }
                if shape[axis] != shape[first] {
                    return Err(EinsumError::backend(format!(
                        "diagonal axes {} and {} differ in size ({} vs {})",
                        first, axis, shape[first], shape[axis]
                    )));
                }
                if axis != first {
                    target[axis] = Some(first);
                }
            }
        }

        let kept: Vec<usize> = (0..ndim).filter(|&a| target[a].is_none()).collect();
        let position = |axis: usize| kept.iter().position(|&k| k == axis).unwrap_or(0);
        let source: Vec<usize> = (0..ndim)
            .map(|a| position(target[a].unwrap_or(a)))
            .collect();
        let out_shape: Vec<usize> = kept.iter().map(|&a| shape[a]).collect();

        let mut index = vec![0usize; ndim];
        let out = ArrayD::from_shape_fn(IxDyn(&out_shape), |out_index| {
            for (a, &s) in source.iter().enumerate() {
                index[a] = out_index[s];
            }
            tensor[index.as_slice()]
        });
        Ok(out)
    }

    fn permute(&self, tensor: &ArrayD<T>, perm: &[usize]) -> EinsumResult<ArrayD<T>> {
        check_permutation(perm, tensor.ndim())?;
        Ok(tensor
            .view()
            .permuted_axes(IxDyn(perm))
            .as_standard_layout()
            .into_owned())
    }

    fn sum_axes(&self, tensor: &ArrayD<T>, axes: &[usize]) -> EinsumResult<ArrayD<T>> {
        let mut sorted = axes.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        if let Some(&axis) = sorted.first().filter(|&&a| a >= tensor.ndim()) {
            return Err(EinsumError::backend(format!(
                "reduction axis {} out of range for rank {}",
                axis,
                tensor.ndim()
            )));
        }

        // Highest axis first so the remaining indices stay valid.
        let mut reduced: Option<ArrayD<T>> = None;
        for &axis in &sorted {
            reduced = Some(match reduced {
                None => tensor.sum_axis(Axis(axis)),
                Some(acc) => acc.sum_axis(Axis(axis)),
            });
        }
        Ok(reduced.unwrap_or_else(|| tensor.to_owned()))
    }

    fn contract(
        &self,
        lhs: &ArrayD<T>,
        rhs: &ArrayD<T>,
        dims: &ContractDims,
    ) -> EinsumResult<ArrayD<T>> {
        let lhs_shape = lhs.shape();
        let rhs_shape = rhs.shape();

        for &(l, r) in dims.batch.iter().chain(dims.summed.iter()) {
            if l >= lhs_shape.len() || r >= rhs_shape.len() || lhs_shape[l] != rhs_shape[r] {
                return Err(EinsumError::backend(format!(
                    "cannot pair lhs axis {} with rhs axis {} (shapes {:?} and {:?})",
                    l, r, lhs_shape, rhs_shape
                )));
            }
        }

        let lhs_batch: Vec<usize> = dims.batch.iter().map(|&(l, _)| l).collect();
        let rhs_batch: Vec<usize> = dims.batch.iter().map(|&(_, r)| r).collect();
        let lhs_summed: Vec<usize> = dims.summed.iter().map(|&(l, _)| l).collect();
        let rhs_summed: Vec<usize> = dims.summed.iter().map(|&(_, r)| r).collect();

        // Layout [batch, M, K] x [batch, K, N] -> [batch, M, N]
        let lhs_perm = [
            lhs_batch.as_slice(),
            dims.left_free.as_slice(),
            lhs_summed.as_slice(),
        ]
        .concat();
        let rhs_perm = [
            rhs_batch.as_slice(),
            rhs_summed.as_slice(),
            dims.right_free.as_slice(),
        ]
        .concat();
        check_permutation(&lhs_perm, lhs_shape.len())?;
        check_permutation(&rhs_perm, rhs_shape.len())?;

        let extent =
            |shape: &[usize], axes: &[usize]| axes.iter().map(|&a| shape[a]).product::<usize>();
        let batch = extent(lhs_shape, &lhs_batch);
        let m = extent(lhs_shape, &dims.left_free);
        let k = extent(lhs_shape, &lhs_summed);
        let n = extent(rhs_shape, &dims.right_free);

        let a = to_batched_matrix(lhs, &lhs_perm, (batch, m, k))?;
        let b = to_batched_matrix(rhs, &rhs_perm, (batch, k, n))?;

        let mut out = Array3::<T>::zeros((batch, m, n));
        for i in 0..batch {
            let mut c = out.index_axis_mut(Axis(0), i);
            general_mat_mul(
                T::one(),
                &a.index_axis(Axis(0), i),
                &b.index_axis(Axis(0), i),
                T::zero(),
                &mut c,
            );
        }

        let out_shape: Vec<usize> = lhs_batch
            .iter()
            .chain(&dims.left_free)
            .map(|&a| lhs_shape[a])
            .chain(dims.right_free.iter().map(|&a| rhs_shape[a]))
            .collect();
        out.into_shape_with_order(IxDyn(&out_shape))
            .map_err(|e| EinsumError::backend(format!("contraction reshape failed: {}", e)))
    }
}

/// Permutes `tensor` and flattens it into a contiguous `[batch, rows, cols]` block.
fn to_batched_matrix<T: LinalgScalar>(
    tensor: &ArrayD<T>,
    perm: &[usize],
    shape: (usize, usize, usize),
) -> EinsumResult<Array3<T>> {
    tensor
        .view()
        .permuted_axes(IxDyn(perm))
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order(shape)
        .map_err(|e| EinsumError::backend(format!("contraction reshape failed: {}", e)))
}

fn check_permutation(perm: &[usize], ndim: usize) -> EinsumResult<()> {
    let mut seen = vec![false; ndim];
    let valid = perm.len() == ndim
        && perm
            .iter()
            .all(|&p| p < ndim && !std::mem::replace(&mut seen[p], true));
    if valid {
        Ok(())
    } else {
        Err(EinsumError::backend(format!(
            "{:?} is not a permutation of {} axes",
            perm, ndim
        )))
    }
}
