use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The number of flows should be between [1-9], got {0}")]
    FlowsOutOfRange(usize),
    #[error(
        "loss can be either 'binary_crossentropy' or 'categorical_crossentropy', got '{0}'"
    )]
    UnsupportedLoss(String),
    #[error("The number of classes must be positive, got {0}")]
    InvalidClasses(usize),
    #[error("Learning rate must be a positive finite number, got {0}")]
    InvalidLearningRate(f32),
    #[error("Input shape must have three positive dimensions, got {0:?}")]
    InvalidInputShape([usize; 3]),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}
