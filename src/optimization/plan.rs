//! Execution plan for einsum operations.
//!
//! A plan is a flat list of steps in single-assignment form. Operands are
//! tensors `0..n`; step `k` reads earlier tensors and defines tensor `n + k`.
//! The last step's result (or operand 0 when there are no steps) is the
//! value of the expression.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::cost::CostModel;
use super::dynamic::{MAX_DP_TENSORS, optimal_path};
use super::greedy::{greedy_path, left_to_right_path};
use super::path::{ContractionPath, PairLabels, TensorId};
use crate::backend::ContractDims;
use crate::notation::{EinsumNotation, Label, Subscript, ValidationResult};

/// Largest operand count for which `Auto` runs the exact search.
const AUTO_OPTIMAL_LIMIT: usize = 4;

/// Strategy for finding contraction paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractionStrategy {
    /// Operands in call order: `((a b) c) d`.
    LeftToRight,
    /// Greedy algorithm - fast O(n³) heuristic.
    Greedy,
    /// Optimal dynamic programming - exponential but optimal for small n.
    Optimal,
    /// Automatically choose based on problem size.
    #[default]
    Auto,
}

impl ContractionStrategy {
    /// Parses the names accepted by the `optimize` keyword.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left_to_right" => Some(Self::LeftToRight),
            "greedy" => Some(Self::Greedy),
            "optimal" => Some(Self::Optimal),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::LeftToRight => "left_to_right",
            Self::Greedy => "greedy",
            Self::Optimal => "optimal",
            Self::Auto => "auto",
        }
    }

    /// Concrete strategy used for `num_terms` operands.
    pub fn resolve(self, num_terms: usize) -> Self {
        match self {
            Self::Auto if num_terms <= AUTO_OPTIMAL_LIMIT => Self::Optimal,
            Self::Auto => Self::Greedy,
            Self::Optimal if num_terms > MAX_DP_TENSORS => Self::Greedy,
            other => other,
        }
    }

    /// Finds a pairwise contraction order for `terms`.
    pub fn find_path(
        self,
        terms: &[Subscript],
        validated: &ValidationResult,
        cost_model: &CostModel,
    ) -> ContractionPath {
        let sizes = &validated.sizes;
        let output = &validated.output;
        match self.resolve(terms.len()) {
            Self::LeftToRight => left_to_right_path(terms, sizes, output, cost_model),
            Self::Optimal => optimal_path(terms, sizes, output, cost_model),
            Self::Greedy | Self::Auto => greedy_path(terms, sizes, output, cost_model),
        }
    }
}

impl fmt::Display for ContractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axes of one operand that carry the same label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagonalGroup {
    pub label: Label,
    /// Ascending axis positions; the first one survives.
    pub axes: Vec<usize>,
}

/// A single step in the execution plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStep {
    /// Collapse repeated labels of one tensor onto their first axis.
    Diagonalize {
        input: TensorId,
        groups: Vec<DiagonalGroup>,
        output: Subscript,
        result: TensorId,
    },
    /// Sum away labels needed nowhere else.
    ReduceSum {
        input: TensorId,
        /// Axes of the input to sum, ascending.
        axes: Vec<usize>,
        summed: Subscript,
        output: Subscript,
        result: TensorId,
    },
    /// Multiply two tensors and sum their shared, no longer needed labels.
    Contract {
        left: TensorId,
        right: TensorId,
        labels: PairLabels,
        dims: ContractDims,
        output: Subscript,
        result: TensorId,
        /// Estimated FLOPs.
        flops: u64,
    },
    /// Reorder axes to the requested output order.
    Permute {
        input: TensorId,
        perm: Vec<usize>,
        output: Subscript,
        result: TensorId,
    },
}

impl ExecutionStep {
    /// Id of the tensor this step defines.
    pub fn result(&self) -> TensorId {
        match self {
            Self::Diagonalize { result, .. }
            | Self::ReduceSum { result, .. }
            | Self::Contract { result, .. }
            | Self::Permute { result, .. } => *result,
        }
    }

    /// Labels of the tensor this step defines.
    pub fn output(&self) -> &Subscript {
        match self {
            Self::Diagonalize { output, .. }
            | Self::ReduceSum { output, .. }
            | Self::Contract { output, .. }
            | Self::Permute { output, .. } => output,
        }
    }

    /// Ids of the tensors this step reads.
    pub fn inputs(&self) -> Vec<TensorId> {
        match self {
            Self::Diagonalize { input, .. }
            | Self::ReduceSum { input, .. }
            | Self::Permute { input, .. } => vec![*input],
            Self::Contract { left, right, .. } => vec![*left, *right],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Diagonalize { .. } => "diagonalize",
            Self::ReduceSum { .. } => "reduce_sum",
            Self::Contract { .. } => "contract",
            Self::Permute { .. } => "permute",
        }
    }
}

impl fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagonalize {
                input,
                groups,
                output,
                result,
            } => {
                write!(f, "t{} = diagonalize(t{}", result, input)?;
                for group in groups {
                    write!(f, ", {}{:?}", group.label, group.axes)?;
                }
                write!(f, ") -> {}", output)
            }
            Self::ReduceSum {
                input,
                summed,
                output,
                result,
                ..
            } => write!(f, "t{} = sum(t{}, {}) -> {}", result, input, summed, output),
            Self::Contract {
                left,
                right,
                labels,
                output,
                result,
                ..
            } => write!(
                f,
                "t{} = contract(t{}, t{}, sum {}) -> {}",
                result, left, right, labels.summed, output
            ),
            Self::Permute {
                input,
                perm,
                output,
                result,
            } => write!(f, "t{} = permute(t{}, {:?}) -> {}", result, input, perm, output),
        }
    }
}

/// Complete execution plan for an einsum operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    steps: Vec<ExecutionStep>,
    /// Operand subscripts as written.
    inputs: Vec<Subscript>,
    /// Operand shapes the plan was built for.
    input_shapes: Vec<Vec<usize>>,
    output: Subscript,
    output_shape: Vec<usize>,
    /// Strategy that ordered the contractions.
    strategy: ContractionStrategy,
    total_flops: u64,
}

impl ExecutionPlan {
    /// Returns the execution steps.
    pub fn steps(&self) -> &[ExecutionStep] {
        &self.steps
    }

    pub fn num_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of tensor ids used: operands plus one per step.
    pub fn num_tensors(&self) -> usize {
        self.inputs.len() + self.steps.len()
    }

    pub fn inputs(&self) -> &[Subscript] {
        &self.inputs
    }

    pub fn input_shapes(&self) -> &[Vec<usize>] {
        &self.input_shapes
    }

    pub fn output(&self) -> &Subscript {
        &self.output
    }

    /// Returns the output shape.
    pub fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    pub fn strategy(&self) -> ContractionStrategy {
        self.strategy
    }

    /// Returns the total estimated FLOPs of the contractions.
    pub fn total_flops(&self) -> u64 {
        self.total_flops
    }

    /// Id holding the final value.
    pub fn result(&self) -> TensorId {
        self.steps.last().map_or(0, ExecutionStep::result)
    }

    /// The step defining `id`, or `None` for an operand.
    pub fn producer(&self, id: TensorId) -> Option<&ExecutionStep> {
        id.checked_sub(self.inputs.len())
            .and_then(|k| self.steps.get(k))
    }

    /// Number of contraction steps.
    pub fn num_contractions(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, ExecutionStep::Contract { .. }))
            .count()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(|s| s.to_string()).collect();
        writeln!(f, "{}->{} ({})", inputs.join(","), self.output, self.strategy)?;
        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }
        Ok(())
    }
}

/// Builds plans in single-assignment form.
struct PlanBuilder {
    steps: Vec<ExecutionStep>,
    next: TensorId,
}

impl PlanBuilder {
    fn new(num_inputs: usize) -> Self {
        Self {
            steps: Vec::new(),
            next: num_inputs,
        }
    }

    fn push(&mut self, make: impl FnOnce(TensorId) -> ExecutionStep) -> TensorId {
        let id = self.next;
        self.steps.push(make(id));
        self.next += 1;
        id
    }
}

/// Creates an execution plan for a validated einsum expression.
///
/// This is the main entry point for planning. It:
/// 1. Extracts diagonals of operands with repeated labels
/// 2. Sums labels that only one operand carries and the output lacks
/// 3. Contracts operands pairwise in the order `strategy` picks
/// 4. Sums anything left over and permutes to the output order
pub fn create_plan(
    notation: &EinsumNotation,
    validated: &ValidationResult,
    shapes: &[&[usize]],
    strategy: ContractionStrategy,
    cost_model: &CostModel,
) -> ExecutionPlan {
    let n = notation.num_inputs();
    let output = &validated.output;
    let mut builder = PlanBuilder::new(n);

    // Current id and (distinct) labels of every operand.
    let mut current: Vec<(TensorId, Subscript)> = notation
        .inputs()
        .iter()
        .cloned()
        .enumerate()
        .collect();

    for (id, labels) in current.iter_mut() {
        let groups: Vec<DiagonalGroup> = labels
            .repeated_groups()
            .into_iter()
            .map(|(label, axes)| DiagonalGroup { label, axes })
            .collect();
        if groups.is_empty() {
            continue;
        }
        let distinct = labels.distinct();
        let input = *id;
        *id = builder.push(|result| ExecutionStep::Diagonalize {
            input,
            groups,
            output: distinct.clone(),
            result,
        });
        *labels = distinct;
    }

    for i in 0..current.len() {
        let summed: Subscript = current[i]
            .1
            .iter()
            .filter(|&c| !output.contains(c))
            .filter(|&c| {
                !current
                    .iter()
                    .enumerate()
                    .any(|(j, (_, other))| j != i && other.contains(c))
            })
            .collect();
        if summed.is_empty() {
            continue;
        }
        let (id, labels) = &mut current[i];
        *id = reduce(&mut builder, *id, labels, &summed);
    }

    let terms: Vec<Subscript> = current.iter().map(|(_, l)| l.clone()).collect();
    let path = strategy.find_path(&terms, validated, cost_model);

    // Path ids are local: 0..terms for operands, then one per path step.
    let mut ids: Vec<TensorId> = current.iter().map(|&(id, _)| id).collect();
    let mut labels: Vec<Subscript> = terms;
    let mut total_flops = 0u64;
    for step in path.steps() {
        let (a, b) = step.inputs;
        let result_labels = step.result_indices();
        let dims = contract_dims(&labels[a], &labels[b], &step.labels);
        let (left, right) = (ids[a], ids[b]);
        let flops = step.estimated_flops;
        total_flops = total_flops.saturating_add(flops);

        let id = builder.push(|result| ExecutionStep::Contract {
            left,
            right,
            labels: step.labels.clone(),
            dims,
            output: result_labels.clone(),
            result,
            flops,
        });
        ids.push(id);
        labels.push(result_labels);
    }

    let mut id = ids.last().copied().unwrap_or(0);
    let mut final_labels = labels.last().cloned().unwrap_or_default();

    let dangling: Subscript = final_labels
        .iter()
        .filter(|&c| !output.contains(c))
        .collect();
    if !dangling.is_empty() {
        id = reduce(&mut builder, id, &mut final_labels, &dangling);
    }

    let perm: Vec<usize> = output
        .iter()
        .filter_map(|c| final_labels.position(c))
        .collect();
    debug_assert_eq!(perm.len(), final_labels.len());
    let is_identity = perm.iter().enumerate().all(|(i, &p)| i == p);
    // The result must be a fresh tensor, never an operand.
    if !is_identity || id < n {
        let input = id;
        builder.push(|result| ExecutionStep::Permute {
            input,
            perm,
            output: output.clone(),
            result,
        });
    }

    ExecutionPlan {
        steps: builder.steps,
        inputs: notation.inputs().to_vec(),
        input_shapes: shapes.iter().map(|s| s.to_vec()).collect(),
        output: output.clone(),
        output_shape: validated.output_shape.clone(),
        strategy: strategy.resolve(n),
        total_flops,
    }
}

/// Emits a `ReduceSum` of `summed` out of `labels`; updates `labels`.
fn reduce(
    builder: &mut PlanBuilder,
    input: TensorId,
    labels: &mut Subscript,
    summed: &Subscript,
) -> TensorId {
    let axes: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|&(_, c)| summed.contains(c))
        .map(|(axis, _)| axis)
        .collect();
    let kept: Subscript = labels.iter().filter(|&c| !summed.contains(c)).collect();
    *labels = kept.clone();
    builder.push(|result| ExecutionStep::ReduceSum {
        input,
        axes,
        summed: summed.clone(),
        output: kept,
        result,
    })
}

/// Axis positions for a pairwise contraction of `left` with `right`.
fn contract_dims(left: &Subscript, right: &Subscript, pair: &PairLabels) -> ContractDims {
    let both = |c: Label| left.position(c).zip(right.position(c));
    ContractDims {
        batch: pair.batch.iter().filter_map(both).collect(),
        summed: pair.summed.iter().filter_map(both).collect(),
        left_free: pair
            .left_only
            .iter()
            .filter_map(|c| left.position(c))
            .collect(),
        right_free: pair
            .right_only
            .iter()
            .filter_map(|c| right.position(c))
            .collect(),
    }
}
