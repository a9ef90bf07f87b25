//! Configuration for einsum operations.

use serde::{Deserialize, Serialize};

use crate::optimization::{ContractionStrategy, CostModel};

/// Configuration options for einsum execution.
///
/// None of the options change the value of a result beyond floating-point
/// rounding; they only trade planning time against evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EinsumConfig {
    /// Strategy for finding contraction paths.
    pub strategy: ContractionStrategy,
    /// Cost model guiding the cost-aware strategies.
    pub cost_model: CostModel,
    /// Whether to run independent contractions on the rayon pool.
    /// Ignored without the `parallel` feature.
    pub parallel: bool,
}

impl Default for EinsumConfig {
    fn default() -> Self {
        Self {
            strategy: ContractionStrategy::Auto,
            cost_model: CostModel::default(),
            parallel: false,
        }
    }
}

impl EinsumConfig {
    /// Creates a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the contraction strategy.
    pub fn with_strategy(mut self, strategy: ContractionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Enables or disables parallel evaluation of independent branches.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Cheap planning, parallel evaluation.
    pub fn fast() -> Self {
        Self {
            strategy: ContractionStrategy::Greedy,
            cost_model: CostModel::default(),
            parallel: true,
        }
    }

    /// Exact planning, sequential evaluation in a fixed order.
    pub fn safe() -> Self {
        Self {
            strategy: ContractionStrategy::Optimal,
            cost_model: CostModel::default(),
            parallel: false,
        }
    }
}
