use serde::{Deserialize, Serialize};

/// Metrics the compiled model reports to the external training loop.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metric {
    CategoricalAccuracy,
    BinaryAccuracy,
    Precision,
    Recall,
    TopKCategoricalAccuracy {
        k: usize,
    },
    Auc {
        num_thresholds: usize,
        multi_label: bool,
    },
    TruePositives,
    FalsePositives,
}

impl Metric {
    pub fn default_set() -> Vec<Metric> {
        vec![
            Metric::CategoricalAccuracy,
            Metric::BinaryAccuracy,
            Metric::Precision,
            Metric::Recall,
            Metric::TopKCategoricalAccuracy {
                k: 5,
            },
            Metric::Auc {
                num_thresholds: 200,
                multi_label: true,
            },
            Metric::TruePositives,
            Metric::FalsePositives,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::CategoricalAccuracy => "categorical_accuracy",
            Metric::BinaryAccuracy => "binary_accuracy",
            Metric::Precision => "precision",
            Metric::Recall => "recall",
            Metric::TopKCategoricalAccuracy {
                ..
            } => "top_k_categorical_accuracy",
            Metric::Auc {
                ..
            } => "auc",
            Metric::TruePositives => "true_positives",
            Metric::FalsePositives => "false_positives",
        }
    }
}
