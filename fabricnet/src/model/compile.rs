use serde::{Deserialize, Serialize};

use crate::config::{LossKind, Metric, OptimizerConfig};

/// Training-time settings attached to a built graph.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CompileConfig {
    pub optimizer: OptimizerConfig,
    pub loss: LossKind,
    pub metrics: Vec<Metric>,
}

impl CompileConfig {
    /// Adam at `learning_rate` with the fixed metric set.
    pub fn new(
        loss: LossKind,
        learning_rate: f32,
    ) -> Self {
        Self {
            optimizer: OptimizerConfig::adam(learning_rate),
            loss,
            metrics: Metric::default_set(),
        }
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(Metric::name).collect()
    }
}
