use ndarray::{
    Array2, ArrayD, ArrayView1, ArrayView4, ArrayViewD, Ix1, Ix2, Ix4,
};
use tracing::{debug, trace};

use super::{CpuParameters, ExecutionError, kernel};
use crate::{
    config::OutputActivation,
    graph::{Graph, Layer, Node, NodeId},
};

/// Activation of every node from one forward pass, indexed by node id.
#[derive(Debug, Clone)]
pub struct ActivationTrace {
    activations: Vec<ArrayD<f32>>,
}

impl ActivationTrace {
    pub fn get(
        &self,
        id: NodeId,
    ) -> Option<&ArrayD<f32>> {
        self.activations.get(id.index())
    }

    pub fn by_name(
        &self,
        graph: &Graph,
        name: &str,
    ) -> Option<&ArrayD<f32>> {
        graph.node_by_name(name).and_then(|node| self.get(node.id))
    }

    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }
}

/// Inference-only evaluation of a graph on NHWC batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuExecutor;

impl CpuExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the `[batch, outputs]` activation of the graph output.
    pub fn forward(
        &self,
        graph: &Graph,
        parameters: &CpuParameters,
        batch: ArrayView4<f32>,
    ) -> Result<Array2<f32>, ExecutionError> {
        let output_id = graph.output()?.id;
        let mut trace = self.forward_trace(graph, parameters, batch)?;
        let output = trace
            .activations
            .get_mut(output_id.index())
            .map(std::mem::take)
            .ok_or_else(|| {
                ExecutionError::MissingActivation(format!("{output_id:?}"))
            })?;
        Ok(output.into_dimensionality::<Ix2>()?)
    }

    pub fn forward_trace(
        &self,
        graph: &Graph,
        parameters: &CpuParameters,
        batch: ArrayView4<f32>,
    ) -> Result<ActivationTrace, ExecutionError> {
        let input = graph.input()?;
        let expected = input.output_shape.with_batch(batch.shape()[0]);
        if batch.shape() != expected.as_slice() {
            return Err(ExecutionError::InputShapeMismatch {
                expected: expected.into(),
                actual: batch.shape().into(),
            });
        }

        let mut activations: Vec<ArrayD<f32>> = Vec::with_capacity(graph.len());
        for node in graph.nodes() {
            let output = if node.id == input.id {
                batch.to_owned().into_dyn()
            } else {
                let inputs = node
                    .inputs
                    .iter()
                    .map(|id| {
                        activations.get(id.index()).ok_or_else(|| {
                            ExecutionError::MissingActivation(node.name.clone())
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                evaluate(node, &inputs, parameters)?
            };
            trace!(node = %node.name, shape = ?output.shape(), "evaluated");
            activations.push(output);
        }
        debug!(batch = batch.shape()[0], nodes = activations.len(), "forward pass");
        Ok(ActivationTrace {
            activations,
        })
    }
}

fn first_input<'a>(
    node: &Node,
    inputs: &[&'a ArrayD<f32>],
) -> Result<&'a ArrayD<f32>, ExecutionError> {
    inputs
        .first()
        .copied()
        .ok_or_else(|| ExecutionError::MissingActivation(node.name.clone()))
}

fn vector<'a>(
    node: &Node,
    parameters: &'a CpuParameters,
    name: &'static str,
) -> Result<ArrayView1<'a, f32>, ExecutionError> {
    Ok(parameters.get(node, name)?.into_dimensionality::<Ix1>()?)
}

fn bias<'a>(
    node: &Node,
    parameters: &'a CpuParameters,
    use_bias: bool,
) -> Result<Option<ArrayView1<'a, f32>>, ExecutionError> {
    if !use_bias {
        return Ok(None);
    }
    vector(node, parameters, "bias").map(Some)
}

fn evaluate(
    node: &Node,
    inputs: &[&ArrayD<f32>],
    parameters: &CpuParameters,
) -> Result<ArrayD<f32>, ExecutionError> {
    let output = match &node.layer {
        Layer::Input {
            ..
        } => return Err(ExecutionError::MissingActivation(node.name.clone())),
        Layer::SeparableConv2D {
            stride,
            padding,
            use_bias,
            ..
        } => {
            let input = first_input(node, inputs)?.view().into_dimensionality::<Ix4>()?;
            let depthwise = parameters
                .get(node, "depthwise_kernel")?
                .into_dimensionality::<Ix4>()?;
            let pointwise = parameters
                .get(node, "pointwise_kernel")?
                .into_dimensionality::<Ix4>()?;
            kernel::separable_conv2d(
                input,
                depthwise,
                pointwise,
                bias(node, parameters, *use_bias)?,
                *stride,
                *padding,
            )?
            .into_dyn()
        },
        Layer::Conv2D {
            stride,
            padding,
            use_bias,
            ..
        } => {
            let input = first_input(node, inputs)?.view().into_dimensionality::<Ix4>()?;
            let weights =
                parameters.get(node, "kernel")?.into_dimensionality::<Ix4>()?;
            kernel::conv2d(
                input,
                weights,
                bias(node, parameters, *use_bias)?,
                *stride,
                *padding,
            )?
            .into_dyn()
        },
        Layer::MaxPool2D {
            pool_size,
            stride,
            padding,
        } => {
            let input = first_input(node, inputs)?.view().into_dimensionality::<Ix4>()?;
            kernel::max_pool2d(input, *pool_size, *stride, *padding).into_dyn()
        },
        Layer::ReLU => kernel::relu(first_input(node, inputs)?),
        // Inference mode: dropout passes values through unchanged.
        Layer::Dropout {
            ..
        } => first_input(node, inputs)?.clone(),
        Layer::BatchNormalization {
            epsilon,
        } => {
            kernel::batch_norm(
                first_input(node, inputs)?,
                vector(node, parameters, "gamma")?,
                vector(node, parameters, "beta")?,
                vector(node, parameters, "moving_mean")?,
                vector(node, parameters, "moving_variance")?,
                *epsilon,
            )
        },
        Layer::Add => kernel::add(inputs)?,
        Layer::Flatten => kernel::flatten(first_input(node, inputs)?)?.into_dyn(),
        Layer::Dense {
            use_bias,
            ..
        } => {
            let input = first_input(node, inputs)?.view().into_dimensionality::<Ix2>()?;
            let weights =
                parameters.get(node, "kernel")?.into_dimensionality::<Ix2>()?;
            kernel::dense(input, weights, bias(node, parameters, *use_bias)?)
                .into_dyn()
        },
        Layer::Concatenate => {
            let views: Vec<ArrayViewD<f32>> =
                inputs.iter().map(|input| input.view()).collect();
            kernel::concatenate(&views)?
        },
        Layer::Activation(OutputActivation::Sigmoid) => {
            kernel::sigmoid(first_input(node, inputs)?)
        },
        Layer::Activation(OutputActivation::Softmax) => {
            kernel::softmax(first_input(node, inputs)?)
        },
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array4, IxDyn};

    use super::*;
    use crate::graph::{Padding, TensorShape};

    fn graph_with_head(activation: OutputActivation) -> Graph {
        let mut graph = Graph::new();
        let input = graph
            .add_node(
                "input".to_string(),
                Layer::Input {
                    shape: TensorShape::from([2, 2, 1]),
                },
                &[],
            )
            .unwrap();
        let pool = graph
            .add_node(
                "pool".to_string(),
                Layer::MaxPool2D {
                    pool_size: 2,
                    stride: 2,
                    padding: Padding::Valid,
                },
                &[input],
            )
            .unwrap();
        let flatten = graph
            .add_node("flatten".to_string(), Layer::Flatten, &[pool])
            .unwrap();
        let dense = graph
            .add_node(
                "dense".to_string(),
                Layer::Dense {
                    units: 2,
                    use_bias: true,
                },
                &[flatten],
            )
            .unwrap();
        let head = graph
            .add_node(
                "activation".to_string(),
                Layer::Activation(activation),
                &[dense],
            )
            .unwrap();
        graph.set_output(head).unwrap();
        graph
    }

    fn batch() -> Array4<f32> {
        Array4::from_shape_vec((2, 2, 2, 1), vec![1., 4., 2., 3., -1., -2., -3., -4.])
            .unwrap()
    }

    #[test]
    fn test_forward_through_dense_head() {
        let graph = graph_with_head(OutputActivation::Softmax);
        let mut parameters = CpuParameters::initialize(&graph, 0);
        let dense = graph.node_by_name("dense").unwrap().id;
        parameters
            .set(
                &graph,
                dense,
                "kernel",
                ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![1.0, -1.0]).unwrap(),
            )
            .unwrap();

        let executor = CpuExecutor::new();
        let trace = executor
            .forward_trace(&graph, &parameters, batch().view())
            .unwrap();
        let pooled = trace.by_name(&graph, "pool").unwrap();
        assert_eq!(pooled.as_slice().unwrap(), &[4.0, -1.0]);

        let output = executor.forward(&graph, &parameters, batch().view()).unwrap();
        assert_eq!(output.dim(), (2, 2));
        for row in output.rows() {
            assert!(is_close!(row.sum(), 1.0, abs_tol = 1e-6));
        }
        // Logits [4, -4] for the first sample.
        assert!(output[[0, 0]] > 0.99);
    }

    #[test]
    fn test_sigmoid_head_bounds() {
        let graph = graph_with_head(OutputActivation::Sigmoid);
        let parameters = CpuParameters::initialize(&graph, 1);
        let output = CpuExecutor::new()
            .forward(&graph, &parameters, batch().view())
            .unwrap();
        assert!(output.iter().all(|&value| value > 0.0 && value < 1.0));
    }

    #[test]
    fn test_batch_shape_is_checked() {
        let graph = graph_with_head(OutputActivation::Sigmoid);
        let parameters = CpuParameters::initialize(&graph, 1);
        let wrong = Array4::<f32>::zeros((1, 3, 3, 1));
        assert!(matches!(
            CpuExecutor::new().forward(&graph, &parameters, wrong.view()),
            Err(ExecutionError::InputShapeMismatch { .. })
        ));
    }
}
