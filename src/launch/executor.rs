//! Einsum execution engine.
//!
//! Orchestrates parsing, validation, planning and backend dispatch.

use tracing::{debug, trace};

use super::config::EinsumConfig;
use crate::backend::TensorBackend;
use crate::error::{EinsumError, EinsumResult};
use crate::notation::{parse_einsum, validate_shapes};
use crate::optimization::{ExecutionPlan, ExecutionStep, TensorId, create_plan};

/// Evaluates an einsum expression with the default configuration.
///
/// # Example
///
/// ```
/// use einsum_eval::{NdArrayBackend, einsum};
/// use ndarray::array;
///
/// let a = array![[1.0, 2.0], [3.0, 4.0]].into_dyn();
/// let b = array![[5.0, 6.0], [7.0, 8.0]].into_dyn();
///
/// let c = einsum(&NdArrayBackend::new(), "ij,jk->ik", &[&a, &b]).unwrap();
/// assert_eq!(c, array![[19.0, 22.0], [43.0, 50.0]].into_dyn());
/// ```
pub fn einsum<B: TensorBackend>(
    backend: &B,
    subscripts: &str,
    operands: &[&B::Tensor],
) -> EinsumResult<B::Tensor> {
    einsum_with_config(backend, subscripts, operands, &EinsumConfig::default())
}

/// Evaluates an einsum expression.
///
/// Everything is validated before the first backend primitive runs, so a
/// rejected call has no effect.
pub fn einsum_with_config<B: TensorBackend>(
    backend: &B,
    subscripts: &str,
    operands: &[&B::Tensor],
    config: &EinsumConfig,
) -> EinsumResult<B::Tensor> {
    let shapes: Vec<&[usize]> = operands.iter().map(|t| backend.shape(t)).collect();
    let plan = plan_einsum(subscripts, &shapes, config)?;
    execute_plan(backend, &plan, operands, config)
}

/// Parses, validates and plans an expression for operands of `shapes`.
///
/// Useful when the same expression is evaluated many times.
pub fn plan_einsum(
    subscripts: &str,
    shapes: &[&[usize]],
    config: &EinsumConfig,
) -> EinsumResult<ExecutionPlan> {
    let notation = parse_einsum(subscripts, shapes.len())?;
    debug!(%notation, operands = shapes.len(), "parsed einsum");

    let validated = validate_shapes(&notation, shapes)?;
    debug!(
        naive_flops = validated.compute_flops(),
        elements = validated.compute_memory_elements(shapes),
        "validated einsum"
    );
    let plan = create_plan(
        &notation,
        &validated,
        shapes,
        config.strategy,
        &config.cost_model,
    );
    debug!(
        strategy = %plan.strategy(),
        steps = plan.num_steps(),
        contractions = plan.num_contractions(),
        flops = plan.total_flops(),
        output_shape = ?plan.output_shape(),
        "planned einsum"
    );
    Ok(plan)
}

/// Executes a plan on operands of the shapes it was built for.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn execute_plan<B: TensorBackend>(
    backend: &B,
    plan: &ExecutionPlan,
    operands: &[&B::Tensor],
    config: &EinsumConfig,
) -> EinsumResult<B::Tensor> {
    check_operands(backend, plan, operands)?;

    #[cfg(feature = "parallel")]
    if config.parallel && plan.num_contractions() > 1 {
        return parallel::execute_tree(backend, plan, operands);
    }

    execute_sequential(backend, plan, operands)
}

fn check_operands<B: TensorBackend>(
    backend: &B,
    plan: &ExecutionPlan,
    operands: &[&B::Tensor],
) -> EinsumResult<()> {
    if operands.len() != plan.num_inputs() {
        return Err(EinsumError::OperandCountMismatch {
            groups: plan.num_inputs(),
            operands: operands.len(),
        });
    }
    for (operand, (tensor, expected)) in operands.iter().zip(plan.input_shapes()).enumerate() {
        let got = backend.shape(tensor);
        if got != expected.as_slice() {
            return Err(EinsumError::PlanShapeMismatch {
                operand,
                expected: expected.clone(),
                got: got.to_vec(),
            });
        }
    }
    Ok(())
}

/// A tensor value during execution.
enum Slot<'a, T> {
    /// Caller operand; read only.
    Borrowed(&'a T),
    Owned(T),
    /// Intermediate already consumed and dropped.
    Consumed,
}

impl<'a, T> Slot<'a, T> {
    fn get(&self, id: TensorId) -> EinsumResult<&T> {
        match self {
            Slot::Borrowed(t) => Ok(*t),
            Slot::Owned(t) => Ok(t),
            Slot::Consumed => Err(EinsumError::backend(format!(
                "tensor t{} was read after being consumed",
                id
            ))),
        }
    }
}

/// Runs the steps in order, dropping each intermediate after its last use.
fn execute_sequential<B: TensorBackend>(
    backend: &B,
    plan: &ExecutionPlan,
    operands: &[&B::Tensor],
) -> EinsumResult<B::Tensor> {
    let num_inputs = operands.len();
    let mut uses = vec![0usize; plan.num_tensors()];
    for step in plan.steps() {
        for id in step.inputs() {
            if let Some(count) = uses.get_mut(id) {
                *count += 1;
            }
        }
    }

    let mut slots: Vec<Slot<'_, B::Tensor>> =
        operands.iter().map(|&t| Slot::Borrowed(t)).collect();
    slots.reserve(plan.num_steps());

    for step in plan.steps() {
        trace!(%step, "executing step");
        let inputs = step.inputs();
        let value = {
            let args = inputs
                .iter()
                .map(|&id| lookup(&slots, id))
                .collect::<EinsumResult<Vec<_>>>()?;
            apply(backend, step, &args)?
        };

        for id in inputs {
            uses[id] -= 1;
            if uses[id] == 0 && id >= num_inputs {
                slots[id] = Slot::Consumed;
            }
        }
        slots.push(Slot::Owned(value));
    }

    let result = plan.result();
    match slots.get_mut(result).map(|s| std::mem::replace(s, Slot::Consumed)) {
        Some(Slot::Owned(t)) => Ok(t),
        Some(Slot::Borrowed(t)) => fresh_copy(backend, t),
        _ => Err(EinsumError::backend(format!(
            "plan result t{} was never produced",
            result
        ))),
    }
}

fn lookup<'s, T>(slots: &'s [Slot<'_, T>], id: TensorId) -> EinsumResult<&'s T> {
    slots
        .get(id)
        .ok_or_else(|| EinsumError::backend(format!("tensor t{} does not exist", id)))
        .and_then(|slot| slot.get(id))
}

/// Copies an operand so the result never shares the caller's storage.
fn fresh_copy<B: TensorBackend>(backend: &B, tensor: &B::Tensor) -> EinsumResult<B::Tensor> {
    let identity: Vec<usize> = (0..backend.shape(tensor).len()).collect();
    backend.permute(tensor, &identity)
}

/// Runs one step on its already evaluated inputs.
fn apply<B: TensorBackend>(
    backend: &B,
    step: &ExecutionStep,
    args: &[&B::Tensor],
) -> EinsumResult<B::Tensor> {
    let arg = |i: usize| {
        args.get(i).copied().ok_or_else(|| {
            EinsumError::backend(format!("{} step is missing input {}", step.name(), i))
        })
    };
    match step {
        ExecutionStep::Diagonalize { groups, .. } => {
            let axes: Vec<Vec<usize>> = groups.iter().map(|g| g.axes.clone()).collect();
            backend.diagonal(arg(0)?, &axes)
        }
        ExecutionStep::ReduceSum { axes, .. } => backend.sum_axes(arg(0)?, axes),
        ExecutionStep::Contract { dims, .. } => backend.contract(arg(0)?, arg(1)?, dims),
        ExecutionStep::Permute { perm, .. } => backend.permute(arg(0)?, perm),
    }
}

#[cfg(feature = "parallel")]
mod parallel {
    //! Tree evaluation with independent subtrees joined on the rayon pool.

    use tracing::trace;

    use super::{Slot, apply, fresh_copy};
    use crate::backend::TensorBackend;
    use crate::error::{EinsumError, EinsumResult};
    use crate::optimization::{ExecutionPlan, ExecutionStep, TensorId};

    pub(super) fn execute_tree<B: TensorBackend>(
        backend: &B,
        plan: &ExecutionPlan,
        operands: &[&B::Tensor],
    ) -> EinsumResult<B::Tensor> {
        match evaluate(backend, plan, operands, plan.result())? {
            Slot::Owned(t) => Ok(t),
            Slot::Borrowed(t) => fresh_copy(backend, t),
            Slot::Consumed => Err(EinsumError::backend("plan result was never produced")),
        }
    }

    /// Evaluates tensor `id`; every id in a plan is read by exactly one step.
    fn evaluate<'a, B: TensorBackend>(
        backend: &B,
        plan: &ExecutionPlan,
        operands: &[&'a B::Tensor],
        id: TensorId,
    ) -> EinsumResult<Slot<'a, B::Tensor>> {
        if let Some(&tensor) = operands.get(id) {
            return Ok(Slot::Borrowed(tensor));
        }
        let step = plan
            .producer(id)
            .ok_or_else(|| EinsumError::backend(format!("tensor t{} does not exist", id)))?;

        let value = match step {
            ExecutionStep::Contract { left, right, .. } => {
                let (lhs, rhs) = rayon::join(
                    || evaluate(backend, plan, operands, *left),
                    || evaluate(backend, plan, operands, *right),
                );
                let (lhs, rhs) = (lhs?, rhs?);
                trace!(%step, "executing step");
                apply(backend, step, &[lhs.get(*left)?, rhs.get(*right)?])?
            }
            ExecutionStep::Diagonalize { input, .. }
            | ExecutionStep::ReduceSum { input, .. }
            | ExecutionStep::Permute { input, .. } => {
                let arg = evaluate(backend, plan, operands, *input)?;
                trace!(%step, "executing step");
                apply(backend, step, &[arg.get(*input)?])?
            }
        };
        Ok(Slot::Owned(value))
    }
}
