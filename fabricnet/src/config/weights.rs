use std::{convert::Infallible, fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

/// Where the trunk's pretrained parameters come from.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightsSource {
    /// Seeded initialisation, no pretrained parameters.
    #[default]
    Random,
    /// A safetensors file keyed by trunk layer name.
    Safetensors(PathBuf),
}

impl FromStr for WeightsSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" | "random" => Ok(WeightsSource::Random),
            _ => Ok(WeightsSource::Safetensors(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for WeightsSource {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            WeightsSource::Random => f.write_str("random"),
            WeightsSource::Safetensors(path) => {
                write!(f, "{}", path.display())
            },
        }
    }
}
