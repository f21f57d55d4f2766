mod architecture;
mod error;
mod presets;
mod token;

pub use architecture::{ArchitectureDescriptor, TOKEN_DELIMITER};
pub use error::DescriptorError;
pub use presets::{DEFAULT_ENSEMBLE, ENSEMBLE_PRESETS};
pub use token::{OpCode, Token};
