mod argmax;
mod error;
mod executor;
pub mod kernel;
mod parameters;

pub use argmax::argmax;
pub use error::ExecutionError;
pub use executor::{ActivationTrace, CpuExecutor};
pub use parameters::CpuParameters;
