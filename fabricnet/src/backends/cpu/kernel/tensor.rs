use ndarray::{Array2, ArrayD, ArrayViewD, Axis, ErrorKind, ShapeError};

fn incompatible_shapes() -> ShapeError {
    ShapeError::from_kind(ErrorKind::IncompatibleShape)
}

/// Element-wise sum of equally shaped tensors.
pub fn add(inputs: &[&ArrayD<f32>]) -> Result<ArrayD<f32>, ShapeError> {
    let (first, rest) = inputs.split_first().ok_or_else(incompatible_shapes)?;
    let mut output = (*first).clone();
    for input in rest {
        if input.shape() != output.shape() {
            return Err(incompatible_shapes());
        }
        output += *input;
    }
    Ok(output)
}

/// Collapses every axis after the batch axis, in row-major order.
pub fn flatten(input: &ArrayD<f32>) -> Result<Array2<f32>, ShapeError> {
    let batch = input.shape().first().copied().unwrap_or(0);
    let features: usize = input.shape().iter().skip(1).product();
    input
        .as_standard_layout()
        .into_owned()
        .into_shape_with_order((batch, features))
}

/// Joins tensors along the last axis.
pub fn concatenate(
    inputs: &[ArrayViewD<f32>]
) -> Result<ArrayD<f32>, ShapeError> {
    let last_axis = inputs
        .first()
        .map(|input| input.ndim().saturating_sub(1))
        .ok_or_else(incompatible_shapes)?;
    ndarray::concatenate(Axis(last_axis), inputs)
}
