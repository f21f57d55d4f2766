use std::{
    collections::{HashMap, hash_map::Keys},
    fs::File,
    os::unix::fs::FileExt,
    path::Path,
};

use ndarray::{ArrayD, IxDyn};
use thiserror::Error;

use super::safetensors_metadata::{
    Dtype, HashMetadata as STMetadata, HeaderLoadingError,
    read_metadata as read_st_metadata,
};
use crate::DataType;

#[derive(Debug, Error)]
pub enum ParameterLoaderError {
    #[error("Array with key \"{0}\" not found.")]
    KeyNotFound(String),
    #[error("Couldn't find any arrays with prefix \"{0}\".")]
    SubtreeNotFound(String),
    #[error("Array with key \"{key}\" has unsupported data type {dtype:?}.")]
    UnsupportedDataType {
        key: String,
        dtype: Dtype,
    },
    #[error(
        "Size mismatch: array of shape {shape:?} and data type \
        {data_type:?} expected to be {expected_size} bytes, got {actual_size} bytes."
    )]
    SizeMismatch {
        data_type: DataType,
        shape: Box<[usize]>,
        expected_size: usize,
        actual_size: usize,
    },
    #[error("Failed to read header: {0}")]
    HeaderLoadingError(#[from] HeaderLoadingError),
    #[error("Failed to read data")]
    ArrayLoadingError(#[from] std::io::Error),
}

pub struct ParameterMetadata {
    shape: Box<[usize]>,
    dtype: Dtype,
    offset: usize,
    size: usize,
}

fn st_metadata_into_index(
    global_offset: usize,
    st_metadata: STMetadata,
) -> HashMap<String, ParameterMetadata> {
    st_metadata
        .tensors
        .into_iter()
        .map(|(key, value)| {
            let (local_begin, local_end) = value.data_offsets;
            let weight_metadata = ParameterMetadata {
                shape: value.shape.into(),
                dtype: value.dtype,
                offset: global_offset + local_begin,
                size: local_end.saturating_sub(local_begin),
            };
            (key, weight_metadata)
        })
        .collect()
}

/// Reads `f32` arrays out of a safetensors file on demand.
pub struct ParameterLoader {
    file: File,
    index: HashMap<String, ParameterMetadata>,
}

impl ParameterLoader {
    pub fn new(file: File) -> Result<Self, ParameterLoaderError> {
        let (global_offset, st_metadata) = read_st_metadata(&file)?;
        let index = st_metadata_into_index(global_offset, st_metadata);
        Ok(ParameterLoader {
            file,
            index,
        })
    }

    pub fn open(path: &Path) -> Result<Self, ParameterLoaderError> {
        Self::new(File::open(path)?)
    }

    pub fn keys(&self) -> Keys<'_, String, ParameterMetadata> {
        self.index.keys()
    }

    pub fn shape(
        &self,
        key: &str,
    ) -> Option<&[usize]> {
        self.index.get(key).map(|metadata| metadata.shape.as_ref())
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Result<ArrayD<f32>, ParameterLoaderError> {
        let metadata_entry = self
            .index
            .get(key)
            .ok_or(ParameterLoaderError::KeyNotFound(key.to_string()))?;
        let data_type = metadata_entry.dtype.data_type().ok_or(
            ParameterLoaderError::UnsupportedDataType {
                key: key.to_string(),
                dtype: metadata_entry.dtype,
            },
        )?;
        let num_elements: usize = metadata_entry.shape.iter().product();
        let expected_size = num_elements * data_type.size_in_bytes();
        if expected_size != metadata_entry.size {
            return Err(ParameterLoaderError::SizeMismatch {
                data_type,
                shape: metadata_entry.shape.to_owned(),
                expected_size,
                actual_size: metadata_entry.size,
            });
        }

        let mut buffer = vec![0u8; metadata_entry.size];
        self.file.read_exact_at(&mut buffer, metadata_entry.offset as u64)?;
        let values = data_type.decode_f32(&buffer);
        let array =
            ArrayD::from_shape_vec(IxDyn(&metadata_entry.shape), values)
                .map_err(|_| ParameterLoaderError::SizeMismatch {
                    data_type,
                    shape: metadata_entry.shape.to_owned(),
                    expected_size,
                    actual_size: metadata_entry.size,
                })?;
        Ok(array)
    }

    pub fn tree(&self) -> ParameterTree<'_> {
        ParameterTree::new(self)
    }
}

/// Prefix-scoped view of a loader; keys are joined with `.`.
pub struct ParameterTree<'loader> {
    loader: &'loader ParameterLoader,
    prefix: Option<String>,
}

impl<'loader> ParameterTree<'loader> {
    pub fn new(loader: &'loader ParameterLoader) -> Self {
        Self {
            loader,
            prefix: None,
        }
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn join_prefix(
        &self,
        name: &str,
    ) -> String {
        self.prefix
            .as_ref()
            .map_or_else(|| name.to_string(), |p| format!("{p}.{name}"))
    }

    pub fn subtree(
        &self,
        name: &str,
    ) -> Result<Self, ParameterLoaderError> {
        let new_prefix = self.join_prefix(name);
        let key_prefix = format!("{new_prefix}.");
        let has_children =
            self.loader.keys().any(|key| key.starts_with(&key_prefix));
        if has_children {
            Ok(Self {
                loader: self.loader,
                prefix: Some(new_prefix),
            })
        } else {
            Err(ParameterLoaderError::SubtreeNotFound(new_prefix))
        }
    }

    pub fn leaf(
        &self,
        name: &str,
    ) -> Result<ArrayD<f32>, ParameterLoaderError> {
        self.loader.get(&self.join_prefix(name))
    }
}
