mod activation;
mod conv;
mod matmul;
mod norm;
mod pooling;
mod tensor;

pub use activation::{relu, sigmoid, softmax};
pub use conv::{conv2d, separable_conv2d};
pub use matmul::dense;
pub use norm::batch_norm;
pub use pooling::max_pool2d;
pub use tensor::{add, concatenate, flatten};

use crate::graph::Padding;

/// Output extent and leading padding of one spatial axis, matching the
/// framework's `same`/`valid` conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub output: usize,
    pub pad_before: usize,
}

impl Window {
    pub fn new(
        extent: usize,
        kernel_size: usize,
        stride: usize,
        padding: Padding,
    ) -> Self {
        match padding {
            Padding::Same => {
                let output = extent.div_ceil(stride);
                let pad_total = ((output.saturating_sub(1)) * stride + kernel_size)
                    .saturating_sub(extent);
                Self {
                    output,
                    pad_before: pad_total / 2,
                }
            },
            Padding::Valid => Self {
                output: if extent < kernel_size {
                    0
                } else {
                    (extent - kernel_size) / stride + 1
                },
                pad_before: 0,
            },
        }
    }

    /// Input coordinate read by output `position` at kernel `offset`, if it
    /// falls inside the unpadded input.
    pub fn source(
        &self,
        position: usize,
        offset: usize,
        stride: usize,
        extent: usize,
    ) -> Option<usize> {
        (position * stride + offset)
            .checked_sub(self.pad_before)
            .filter(|&source| source < extent)
    }
}
