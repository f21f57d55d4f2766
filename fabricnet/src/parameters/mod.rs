mod loader;
mod safetensors_metadata;

pub use loader::{ParameterLoader, ParameterLoaderError, ParameterTree};
pub use safetensors_metadata::{
    Dtype, HashMetadata, HeaderLoadingError, TensorInfo,
    read_metadata as read_safetensors_metadata,
};
