use std::path::PathBuf;

use clap::Args;
use fabricnet::{
    LossKind, ModelConfig, WeightsSource, config::ConfigError,
};

pub const DEFAULT_INPUT_SHAPE: [usize; 3] = [299, 299, 3];
const DEFAULT_CLASSES: usize = 2;

/// Parses `H,W,C`.
pub fn parse_shape(text: &str) -> Result<[usize; 3], String> {
    let dimensions = text
        .split(',')
        .map(|dimension| dimension.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| format!("invalid shape \"{text}\": {error}"))?;
    <[usize; 3]>::try_from(dimensions)
        .map_err(|_| format!("expected H,W,C, got \"{text}\""))
}

#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// JSON model configuration; flags below override its fields
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Input shape as H,W,C
    #[arg(long, value_parser = parse_shape)]
    pub input_shape: Option<[usize; 3]>,
    /// Number of classes, one branch each
    #[arg(long)]
    pub classes: Option<usize>,
    /// Trunk depth, 1 to 9
    #[arg(long)]
    pub flows: Option<usize>,
    /// Branch architecture descriptor, e.g. S16,3,2_R_D_S32,3,2_R_D
    #[arg(long)]
    pub ensemble: Option<String>,
    /// binary_crossentropy or categorical_crossentropy
    #[arg(long)]
    pub loss: Option<LossKind>,
    #[arg(long)]
    pub learning_rate: Option<f32>,
    /// Safetensors file with trunk weights, or "random"
    #[arg(long)]
    pub weights: Option<WeightsSource>,
    /// Initialisation seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ModelArgs {
    pub fn into_config(self) -> Result<ModelConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_file(path)?,
            None => ModelConfig::new(
                self.input_shape.unwrap_or(DEFAULT_INPUT_SHAPE),
                self.classes.unwrap_or(DEFAULT_CLASSES),
            ),
        };
        if let Some(input_shape) = self.input_shape {
            config.input_shape = input_shape;
        }
        if let Some(classes) = self.classes {
            config.classes = classes;
        }
        if let Some(flows) = self.flows {
            config.flows = flows;
        }
        if let Some(ensemble) = self.ensemble {
            config.ensemble = ensemble;
        }
        if let Some(loss) = self.loss {
            config.loss = loss;
        }
        if let Some(learning_rate) = self.learning_rate {
            config.learning_rate = learning_rate;
        }
        if let Some(weights) = self.weights {
            config.weights = weights;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}
