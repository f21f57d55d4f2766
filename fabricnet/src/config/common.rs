use serde::{Deserialize, Serialize};

/// Activation applied to the concatenated per-class logits.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum OutputActivation {
    Sigmoid,
    Softmax,
}

impl OutputActivation {
    pub fn name(&self) -> &'static str {
        match self {
            OutputActivation::Sigmoid => "sigmoid",
            OutputActivation::Softmax => "softmax",
        }
    }
}
