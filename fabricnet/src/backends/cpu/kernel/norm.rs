use ndarray::{ArrayD, ArrayView1, Axis, Zip};

/// Inference-mode batch normalization over the last axis.
pub fn batch_norm(
    input: &ArrayD<f32>,
    gamma: ArrayView1<f32>,
    beta: ArrayView1<f32>,
    moving_mean: ArrayView1<f32>,
    moving_variance: ArrayView1<f32>,
    epsilon: f32,
) -> ArrayD<f32> {
    let scale = Zip::from(&gamma)
        .and(&moving_variance)
        .map_collect(|&gamma, &variance| gamma / (variance + epsilon).sqrt());
    let shift = Zip::from(&beta)
        .and(&moving_mean)
        .and(&scale)
        .map_collect(|&beta, &mean, &scale| beta - mean * scale);

    let mut output = input.clone();
    let last_axis = Axis(output.ndim().saturating_sub(1));
    for mut lane in output.lanes_mut(last_axis) {
        Zip::from(&mut lane)
            .and(&scale)
            .and(&shift)
            .for_each(|value, &scale, &shift| *value = *value * scale + shift);
    }
    output
}
