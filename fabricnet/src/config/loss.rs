use std::{fmt, str::FromStr};

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::{ConfigError, OutputActivation};
use crate::backends::cpu::ExecutionError;

const PROBABILITY_EPSILON: f32 = 1e-7;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    #[default]
    BinaryCrossentropy,
    CategoricalCrossentropy,
}

impl LossKind {
    pub fn name(&self) -> &'static str {
        match self {
            LossKind::BinaryCrossentropy => "binary_crossentropy",
            LossKind::CategoricalCrossentropy => "categorical_crossentropy",
        }
    }

    pub fn output_activation(&self) -> OutputActivation {
        match self {
            LossKind::BinaryCrossentropy => OutputActivation::Sigmoid,
            LossKind::CategoricalCrossentropy => OutputActivation::Softmax,
        }
    }

    /// Mean loss over a batch of activated model outputs.
    ///
    /// `predictions` and `targets` are `[batch, classes]`; probabilities are
    /// clipped to `[eps, 1 - eps]` before taking logarithms.
    pub fn compute(
        &self,
        predictions: ArrayView2<f32>,
        targets: ArrayView2<f32>,
    ) -> Result<f32, ExecutionError> {
        if predictions.shape() != targets.shape() {
            return Err(ExecutionError::TargetShapeMismatch {
                expected: predictions.shape().into(),
                actual: targets.shape().into(),
            });
        }
        let batch_size = predictions.nrows();
        if batch_size == 0 {
            return Ok(0.0);
        }
        let clip = |p: f32| {
            p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON)
        };

        let total: f32 = match self {
            LossKind::BinaryCrossentropy => predictions
                .outer_iter()
                .zip(targets.outer_iter())
                .map(|(prediction, target)| {
                    let row: f32 = prediction
                        .iter()
                        .zip(target.iter())
                        .map(|(&p, &t)| {
                            let p = clip(p);
                            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
                        })
                        .sum();
                    row / prediction.len().max(1) as f32
                })
                .sum(),
            LossKind::CategoricalCrossentropy => predictions
                .outer_iter()
                .zip(targets.outer_iter())
                .map(|(prediction, target)| {
                    let norm: f32 = prediction.sum().max(PROBABILITY_EPSILON);
                    prediction
                        .iter()
                        .zip(target.iter())
                        .map(|(&p, &t)| -t * clip(p / norm).ln())
                        .sum::<f32>()
                })
                .sum(),
        };
        Ok(total / batch_size as f32)
    }
}

impl FromStr for LossKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary_crossentropy" => Ok(LossKind::BinaryCrossentropy),
            "categorical_crossentropy" => Ok(LossKind::CategoricalCrossentropy),
            other => Err(ConfigError::UnsupportedLoss(other.to_string())),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}
