use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Largest element count an `f32` tensor can be allocated with.
pub const MAX_ELEMENTS: usize = isize::MAX as usize / std::mem::size_of::<f32>();

/// Element count of `dimensions`, or `None` past [`MAX_ELEMENTS`].
pub fn checked_num_elements(dimensions: &[usize]) -> Option<usize> {
    dimensions
        .iter()
        .try_fold(1usize, |total, &dim| total.checked_mul(dim))
        .filter(|&total| total <= MAX_ELEMENTS)
}

/// Per-sample tensor shape; the batch axis is implicit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TensorShape(Box<[usize]>);

impl TensorShape {
    pub fn new(dimensions: impl Into<Box<[usize]>>) -> Self {
        Self(dimensions.into())
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Last axis.
    pub fn channels(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Every axis but the last.
    pub fn spatial(&self) -> &[usize] {
        match self.0.split_last() {
            Some((_, spatial)) => spatial,
            None => &[],
        }
    }

    pub fn num_elements(&self) -> usize {
        self.0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().any(|&dim| dim == 0)
    }

    pub fn with_batch(
        &self,
        batch_size: usize,
    ) -> Vec<usize> {
        std::iter::once(batch_size).chain(self.0.iter().copied()).collect()
    }
}

impl From<&[usize]> for TensorShape {
    fn from(dimensions: &[usize]) -> Self {
        Self(dimensions.into())
    }
}

impl<const N: usize> From<[usize; N]> for TensorShape {
    fn from(dimensions: [usize; N]) -> Self {
        Self(Box::new(dimensions))
    }
}

impl fmt::Display for TensorShape {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "(None, {})", self.0.iter().join(", "))
    }
}
