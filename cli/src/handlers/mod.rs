mod check;
mod model_args;
mod predict;
mod presets;
mod summary;

pub use check::handle_check;
pub use model_args::{DEFAULT_INPUT_SHAPE, ModelArgs, parse_shape};
pub use predict::handle_predict;
pub use presets::handle_presets;
pub use summary::handle_summary;

pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;
