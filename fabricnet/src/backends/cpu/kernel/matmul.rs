use ndarray::{Array2, ArrayView1, ArrayView2};

/// `[n, i] x [i, u] + bias`.
pub fn dense(
    input: ArrayView2<f32>,
    kernel: ArrayView2<f32>,
    bias: Option<ArrayView1<f32>>,
) -> Array2<f32> {
    let mut output = input.dot(&kernel);
    if let Some(bias) = bias {
        output += &bias;
    }
    output
}
