mod context;
mod error;
#[allow(clippy::module_inception)]
mod graph;
mod layer;
mod shape;

pub use context::GraphContext;
pub use error::GraphConstructionError;
pub use graph::{Graph, Node, NodeId};
pub use layer::{
    BATCH_NORM_EPSILON, DROPOUT_RATE, Layer, Padding, ParameterSpec,
};
pub use shape::{MAX_ELEMENTS, TensorShape, checked_num_elements};
