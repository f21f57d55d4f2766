use num_traits::Float;

/// Index of the largest value; the first one wins ties. NaN never wins.
pub fn argmax<T: Float>(input: &[T]) -> usize {
    let mut max_value = T::neg_infinity();
    let mut max_index = 0;
    for (index, &value) in input.iter().enumerate() {
        if value > max_value {
            max_value = value;
            max_index = index;
        }
    }
    max_index
}
