//! Branch topologies that are known to train well on small inputs.

/// Used when no descriptor is configured.
pub const DEFAULT_ENSEMBLE: &str = "S16,3,2_R_D_S32,3,2_R_D";

pub const ENSEMBLE_PRESETS: [&str; 5] = [
    "S64,3,2_R_D_S64,3,2_R_D",
    "S32,3,2_R_D_S64,3,2_R_D",
    "S16,3,2_R_D_S32,3,2_R_D",
    "S8,3,2_R_D_S8,3,2_R_D",
    "S4,3,2_S16,3,2",
];
