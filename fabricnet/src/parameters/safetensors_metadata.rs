// Header layout follows the safetensors format: an 8-byte little-endian
// header length, a JSON header, then the raw tensor bytes.

use std::{collections::HashMap, fs::File, os::unix::fs::FileExt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DataType;

#[derive(Debug, Error)]
pub enum HeaderLoadingError {
    #[error("The header is an invalid UTF-8 string and cannot be read.")]
    InvalidHeader,
    #[error(
        "The header does contain a valid string, but it is not valid JSON."
    )]
    InvalidHeaderDeserialization,
    #[error("The header is larger than 100MB.")]
    HeaderTooLarge,
    #[error("The header is smaller than 8 bytes.")]
    HeaderTooSmall,
    #[error("The header length is invalid.")]
    InvalidHeaderLength,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HashMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "__metadata__")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(flatten)]
    pub tensors: HashMap<String, TensorInfo>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TensorInfo {
    pub dtype: Dtype,
    pub shape: Vec<usize>,
    pub data_offsets: (usize, usize),
}

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Ord, PartialOrd,
)]
#[non_exhaustive]
pub enum Dtype {
    BOOL,
    U8,
    I8,
    I16,
    U16,
    F16,
    BF16,
    I32,
    U32,
    F32,
    F64,
    I64,
    U64,
}

impl Dtype {
    /// Parameter tensors must hold floating point values.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Dtype::F16 => Some(DataType::F16),
            Dtype::BF16 => Some(DataType::BF16),
            Dtype::F32 => Some(DataType::F32),
            Dtype::F64 => Some(DataType::F64),
            _ => None,
        }
    }
}

const MAX_HEADER_SIZE: usize = 100_000_000;

pub fn read_metadata(
    file: &File
) -> Result<(usize, HashMetadata), HeaderLoadingError> {
    let mut header_buffer = [0u8; size_of::<u64>()];
    file.read_exact_at(&mut header_buffer, 0)
        .map_err(|_| HeaderLoadingError::HeaderTooSmall)?;
    let metadata_size: usize = u64::from_le_bytes(header_buffer)
        .try_into()
        .map_err(|_| HeaderLoadingError::HeaderTooLarge)?;
    if metadata_size > MAX_HEADER_SIZE {
        return Err(HeaderLoadingError::InvalidHeaderLength);
    }

    let stop = metadata_size
        .checked_add(8)
        .ok_or(HeaderLoadingError::InvalidHeaderLength)?;
    let mut json_buffer = vec![0u8; metadata_size];
    file.read_exact_at(&mut json_buffer, 8)
        .map_err(|_| HeaderLoadingError::InvalidHeader)?;
    let string = core::str::from_utf8(&json_buffer)
        .map_err(|_| HeaderLoadingError::InvalidHeader)?;
    let metadata: HashMetadata = serde_json::from_str(string)
        .map_err(|_| HeaderLoadingError::InvalidHeaderDeserialization)?;
    Ok((stop, metadata))
}
