use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigError, LossKind, WeightsSource};

pub const DEFAULT_FLOWS: usize = 7;
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;
pub const DEFAULT_SEED: u64 = 42;
pub const MAX_FLOWS: usize = 9;

fn default_flows() -> usize {
    DEFAULT_FLOWS
}

fn default_ensemble() -> String {
    crate::descriptor::DEFAULT_ENSEMBLE.to_string()
}

fn default_learning_rate() -> f32 {
    DEFAULT_LEARNING_RATE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Everything the assembler needs to build one compiled model.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ModelConfig {
    /// Per-sample input shape, height × width × channels.
    pub input_shape: [usize; 3],
    pub classes: usize,
    /// Number of trunk block-flows kept before branching, 1..=9.
    #[serde(default = "default_flows")]
    pub flows: usize,
    /// Branch architecture descriptor; empty selects the fallback branch.
    #[serde(default = "default_ensemble")]
    pub ensemble: String,
    #[serde(default)]
    pub loss: LossKind,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    #[serde(default)]
    pub weights: WeightsSource,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl ModelConfig {
    pub fn new(
        input_shape: [usize; 3],
        classes: usize,
    ) -> Self {
        Self {
            input_shape,
            classes,
            flows: DEFAULT_FLOWS,
            ensemble: default_ensemble(),
            loss: LossKind::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            weights: WeightsSource::default(),
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_flows(
        mut self,
        flows: usize,
    ) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_ensemble(
        mut self,
        ensemble: impl Into<String>,
    ) -> Self {
        self.ensemble = ensemble.into();
        self
    }

    pub fn with_loss(
        mut self,
        loss: LossKind,
    ) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_learning_rate(
        mut self,
        learning_rate: f32,
    ) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_weights(
        mut self,
        weights: WeightsSource,
    ) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_seed(
        mut self,
        seed: u64,
    ) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Checks the build preconditions. Nothing is constructed if this fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_FLOWS).contains(&self.flows) {
            return Err(ConfigError::FlowsOutOfRange(self.flows));
        }
        if self.classes == 0 {
            return Err(ConfigError::InvalidClasses(self.classes));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }
        if self.input_shape.iter().any(|&dim| dim == 0) {
            return Err(ConfigError::InvalidInputShape(self.input_shape));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::from_str;

    use super::*;

    #[test]
    fn test_model_config_defaults() {
        let config: ModelConfig = from_str(
            r#"
            {
                "input_shape": [32, 32, 3],
                "classes": 10
            }
            "#,
        )
        .unwrap();

        assert_eq!(config, ModelConfig::new([32, 32, 3], 10));
        assert_eq!(config.flows, 7);
        assert_eq!(config.ensemble, "S16,3,2_R_D_S32,3,2_R_D");
        assert_eq!(config.loss, LossKind::BinaryCrossentropy);
        assert_eq!(config.weights, WeightsSource::Random);
    }

    #[test]
    fn test_model_config_full() {
        let config: ModelConfig = from_str(
            r#"
            {
                "input_shape": [32, 32, 3],
                "classes": 10,
                "flows": 1,
                "ensemble": "S4,3,2_S16,3,2",
                "loss": "categorical_crossentropy",
                "learning_rate": 0.01,
                "weights": { "safetensors": "xception.safetensors" },
                "seed": 7
            }
            "#,
        )
        .unwrap();

        let expected = ModelConfig::new([32, 32, 3], 10)
            .with_flows(1)
            .with_ensemble("S4,3,2_S16,3,2")
            .with_loss(LossKind::CategoricalCrossentropy)
            .with_learning_rate(0.01)
            .with_weights(WeightsSource::Safetensors(PathBuf::from(
                "xception.safetensors",
            )))
            .with_seed(7);
        assert_eq!(config, expected);
    }

    #[test]
    fn test_rejects_unknown_loss() {
        let result = ModelConfig::from_json_str(
            r#"{ "input_shape": [32, 32, 3], "classes": 10, "loss": "mse" }"#,
        );
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_validate_flows() {
        for flows in [0, 10] {
            let config = ModelConfig::new([32, 32, 3], 2).with_flows(flows);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::FlowsOutOfRange(f)) if f == flows
            ));
        }
        for flows in 1..=9 {
            let config = ModelConfig::new([32, 32, 3], 2).with_flows(flows);
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validate_other_preconditions() {
        assert!(matches!(
            ModelConfig::new([32, 32, 3], 0).validate(),
            Err(ConfigError::InvalidClasses(0))
        ));
        assert!(matches!(
            ModelConfig::new([32, 32, 3], 2)
                .with_learning_rate(0.0)
                .validate(),
            Err(ConfigError::InvalidLearningRate(_))
        ));
        assert!(matches!(
            ModelConfig::new([32, 0, 3], 2).validate(),
            Err(ConfigError::InvalidInputShape(_))
        ));
    }
}
