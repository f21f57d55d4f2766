use ndarray::{
    Array4, ArrayView1, ArrayView2, ArrayView4, Axis, ShapeError, Zip, s,
};

use super::Window;
use crate::graph::Padding;

/// Output geometry of a strided 2D window over an NHWC batch.
struct Geometry {
    rows: Window,
    cols: Window,
    stride: usize,
    height: usize,
    width: usize,
}

impl Geometry {
    fn new(
        input: &ArrayView4<f32>,
        kernel_size: usize,
        stride: usize,
        padding: Padding,
    ) -> Self {
        let (_, height, width, _) = input.dim();
        Self {
            rows: Window::new(height, kernel_size, stride, padding),
            cols: Window::new(width, kernel_size, stride, padding),
            stride,
            height,
            width,
        }
    }
}

/// Input values seen by kernel tap `(row, col)` at every output position;
/// positions that fall into padding read `fill`.
pub(super) fn tap(
    input: &ArrayView4<f32>,
    row: usize,
    col: usize,
    kernel_size: usize,
    stride: usize,
    padding: Padding,
    fill: f32,
) -> Array4<f32> {
    let geometry = Geometry::new(input, kernel_size, stride, padding);
    let (batch, _, _, channels) = input.dim();
    let mut patch = Array4::from_elem(
        (batch, geometry.rows.output, geometry.cols.output, channels),
        fill,
    );
    for output_row in 0..geometry.rows.output {
        let Some(source_row) = geometry.rows.source(
            output_row,
            row,
            geometry.stride,
            geometry.height,
        ) else {
            continue;
        };
        for output_col in 0..geometry.cols.output {
            let Some(source_col) = geometry.cols.source(
                output_col,
                col,
                geometry.stride,
                geometry.width,
            ) else {
                continue;
            };
            patch
                .slice_mut(s![.., output_row, output_col, ..])
                .assign(&input.slice(s![.., source_row, source_col, ..]));
        }
    }
    patch
}

fn add_bias(
    output: &mut Array4<f32>,
    bias: Option<ArrayView1<f32>>,
) {
    if let Some(bias) = bias {
        for mut lane in output.lanes_mut(Axis(3)) {
            lane += &bias;
        }
    }
}

/// Pointwise projection of the channel axis: `[n, h, w, c] x [c, f]`.
fn pointwise(
    input: &Array4<f32>,
    kernel: ArrayView2<f32>,
) -> Result<Array4<f32>, ShapeError> {
    let (batch, height, width, channels) = input.dim();
    let rows = input
        .view()
        .into_shape_with_order((batch * height * width, channels))?;
    rows.dot(&kernel)
        .into_shape_with_order((batch, height, width, kernel.ncols()))
}

/// Depthwise convolution with kernel `[k, k, c, 1]` followed by a pointwise
/// projection with kernel `[1, 1, c, f]`.
pub fn separable_conv2d(
    input: ArrayView4<f32>,
    depthwise_kernel: ArrayView4<f32>,
    pointwise_kernel: ArrayView4<f32>,
    bias: Option<ArrayView1<f32>>,
    stride: usize,
    padding: Padding,
) -> Result<Array4<f32>, ShapeError> {
    let (kernel_size, _, channels, _) = depthwise_kernel.dim();
    let mut depthwise: Option<Array4<f32>> = None;
    for row in 0..kernel_size {
        for col in 0..kernel_size {
            let mut patch =
                tap(&input, row, col, kernel_size, stride, padding, 0.0);
            let weights = depthwise_kernel.slice(s![row, col, .., 0]);
            for mut lane in patch.lanes_mut(Axis(3)) {
                lane *= &weights;
            }
            match depthwise.as_mut() {
                Some(accumulator) => *accumulator += &patch,
                None => depthwise = Some(patch),
            }
        }
    }
    let depthwise = depthwise.unwrap_or_else(|| {
        let (batch, height, width, _) = input.dim();
        Array4::zeros((batch, height, width, channels))
    });

    let projection = pointwise_kernel.slice(s![0, 0, .., ..]);
    let mut output = pointwise(&depthwise, projection)?;
    add_bias(&mut output, bias);
    Ok(output)
}

/// Regular convolution with kernel `[k, k, c, f]`.
pub fn conv2d(
    input: ArrayView4<f32>,
    kernel: ArrayView4<f32>,
    bias: Option<ArrayView1<f32>>,
    stride: usize,
    padding: Padding,
) -> Result<Array4<f32>, ShapeError> {
    let (kernel_size, _, _, filters) = kernel.dim();
    let geometry = Geometry::new(&input, kernel_size, stride, padding);
    let (batch, ..) = input.dim();
    let mut output = Array4::zeros((
        batch,
        geometry.rows.output,
        geometry.cols.output,
        filters,
    ));
    for row in 0..kernel_size {
        for col in 0..kernel_size {
            let patch =
                tap(&input, row, col, kernel_size, stride, padding, 0.0);
            let weights = kernel.slice(s![row, col, .., ..]);
            let contribution = pointwise(&patch, weights)?;
            Zip::from(&mut output)
                .and(&contribution)
                .for_each(|output, &value| *output += value);
        }
    }
    add_bias(&mut output, bias);
    Ok(output)
}
