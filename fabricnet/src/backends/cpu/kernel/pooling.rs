use ndarray::{Array4, ArrayView4, Zip};

use super::conv::tap;
use crate::graph::Padding;

/// Max pooling; padded positions never win.
pub fn max_pool2d(
    input: ArrayView4<f32>,
    pool_size: usize,
    stride: usize,
    padding: Padding,
) -> Array4<f32> {
    let mut output: Option<Array4<f32>> = None;
    for row in 0..pool_size {
        for col in 0..pool_size {
            let patch = tap(
                &input,
                row,
                col,
                pool_size,
                stride,
                padding,
                f32::NEG_INFINITY,
            );
            match output.as_mut() {
                Some(output) => Zip::from(output)
                    .and(&patch)
                    .for_each(|output, &value| *output = output.max(value)),
                None => output = Some(patch),
            }
        }
    }
    output.unwrap_or_else(|| Array4::zeros((0, 0, 0, 0)))
}
