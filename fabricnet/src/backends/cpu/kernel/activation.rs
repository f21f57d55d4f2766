use ndarray::{ArrayD, Axis, Zip};
use num_traits::Float;

pub fn relu(input: &ArrayD<f32>) -> ArrayD<f32> {
    input.mapv(|value| value.max(0.0))
}

fn logistic<T: Float>(value: T) -> T {
    T::one() / (T::one() + (-value).exp())
}

pub fn sigmoid(input: &ArrayD<f32>) -> ArrayD<f32> {
    input.mapv(logistic)
}

/// Softmax over the last axis.
pub fn softmax(input: &ArrayD<f32>) -> ArrayD<f32> {
    let mut output = input.clone();
    let last_axis = Axis(output.ndim().saturating_sub(1));
    for mut lane in output.lanes_mut(last_axis) {
        let max = lane.fold(f32::NEG_INFINITY, |acc, &value| acc.max(value));
        lane.mapv_inplace(|value| (value - max).exp());
        let sum = lane.sum();
        Zip::from(&mut lane).for_each(|value| *value /= sum);
    }
    output
}
