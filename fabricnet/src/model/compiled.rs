use ndarray::{Array2, ArrayView2, ArrayView4};

use super::{CompileConfig, ModelSummary};
use crate::{
    backends::cpu::{ActivationTrace, CpuExecutor, CpuParameters, ExecutionError},
    graph::{Graph, GraphConstructionError, TensorShape},
    parameters::ParameterLoader,
    trunk::TrunkOutput,
};

/// A built graph with its parameters and training settings.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub(super) graph: Graph,
    pub(super) parameters: CpuParameters,
    pub(super) compile_config: CompileConfig,
    pub(super) trunk: TrunkOutput,
}

impl CompiledModel {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn parameters(&self) -> &CpuParameters {
        &self.parameters
    }

    pub fn compile_config(&self) -> &CompileConfig {
        &self.compile_config
    }

    pub fn trunk(&self) -> &TrunkOutput {
        &self.trunk
    }

    pub fn parameter_count(&self) -> usize {
        self.graph.parameter_count()
    }

    pub fn input_shape(&self) -> Option<&TensorShape> {
        self.graph.input().ok().map(|node| &node.output_shape)
    }

    /// Length of each output vector; one entry per class.
    pub fn output_len(&self) -> usize {
        self.graph.output().map_or(0, |node| node.output_shape.num_elements())
    }

    /// Replaces the trunk's parameters with pretrained ones.
    pub fn load_trunk_weights(
        &mut self,
        loader: &ParameterLoader,
    ) -> Result<usize, GraphConstructionError> {
        self.parameters.load_trunk(&self.graph, &self.trunk, &loader.tree())
    }

    /// Runs inference on an NHWC batch; returns `[batch, classes]`.
    pub fn predict(
        &self,
        batch: ArrayView4<f32>,
    ) -> Result<Array2<f32>, ExecutionError> {
        CpuExecutor::new().forward(&self.graph, &self.parameters, batch)
    }

    pub fn predict_trace(
        &self,
        batch: ArrayView4<f32>,
    ) -> Result<ActivationTrace, ExecutionError> {
        CpuExecutor::new().forward_trace(&self.graph, &self.parameters, batch)
    }

    /// Mean compiled loss of the predictions for `batch` against `targets`.
    pub fn evaluate_loss(
        &self,
        batch: ArrayView4<f32>,
        targets: ArrayView2<f32>,
    ) -> Result<f32, ExecutionError> {
        let predictions = self.predict(batch)?;
        self.compile_config.loss.compute(predictions.view(), targets)
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary::from_graph(&self.graph)
    }
}
