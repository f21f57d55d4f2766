use ndarray::ShapeError;
use thiserror::Error;

use crate::graph::GraphConstructionError;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Node {node_name} has no parameter \"{parameter}\"")]
    MissingParameter {
        node_name: String,
        parameter: &'static str,
    },
    #[error("Expected an input batch of shape {expected:?}, got {actual:?}")]
    InputShapeMismatch {
        expected: Box<[usize]>,
        actual: Box<[usize]>,
    },
    #[error("Expected targets of shape {expected:?}, got {actual:?}")]
    TargetShapeMismatch {
        expected: Box<[usize]>,
        actual: Box<[usize]>,
    },
    #[error("Node {0} was evaluated before its inputs")]
    MissingActivation(String),
    #[error(transparent)]
    GraphConstructionError(#[from] GraphConstructionError),
    #[error("Kernel shape error: {0}")]
    ShapeError(#[from] ShapeError),
}
