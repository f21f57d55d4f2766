use thiserror::Error;

use super::{NodeId, TensorShape};
use crate::{descriptor::DescriptorError, parameters::ParameterLoaderError};

#[derive(Debug, Error)]
pub enum GraphConstructionError {
    #[error("Malformed token: {0}")]
    MalformedToken(#[from] DescriptorError),
    #[error("Failed to load weights: {0}")]
    ParameterLoaderError(#[from] ParameterLoaderError),
    #[error("Duplicate node name \"{0}\"")]
    DuplicateName(String),
    #[error("Node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("Node {node_name} expects {expected} input(s), got {actual}")]
    InputCountMismatch {
        node_name: String,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Node {node_name} expects an input of rank {expected}, got shape {actual}"
    )]
    RankMismatch {
        node_name: String,
        expected: usize,
        actual: TensorShape,
    },
    #[error(
        "Incompatible shapes. Node {node_name} expected to have shape {expected} but got {actual}"
    )]
    IncompatibleShapes {
        node_name: String,
        expected: TensorShape,
        actual: TensorShape,
    },
    #[error("Node {node_name} produces an empty output of shape {shape}")]
    EmptyOutput {
        node_name: String,
        shape: TensorShape,
    },
    #[error("Node {node_name} needs a tensor too large to allocate")]
    SizeOverflow {
        node_name: String,
    },
    #[error("Graph has no {0} node")]
    MissingEndpoint(&'static str),
}
