use tracing::{debug, info};

use super::{CompileConfig, CompiledModel, ModelBuildError};
use crate::{
    backends::cpu::CpuParameters,
    branch::branch_subgraph,
    config::{ModelConfig, WeightsSource},
    descriptor::ArchitectureDescriptor,
    graph::{GraphContext, Layer, NodeId, TensorShape},
    parameters::ParameterLoader,
    trunk::trunk_subgraph,
};

pub const INPUT_NAME: &str = "input";

/// Assembles trunk, one branch per class, concatenation and output
/// activation into a compiled model.
///
/// Preconditions and the descriptor are checked before any node exists.
/// Every call uses a fresh [`GraphContext`], so repeated builds produce
/// identical names.
pub fn build_model(config: &ModelConfig) -> Result<CompiledModel, ModelBuildError> {
    config.validate()?;
    let descriptor = ArchitectureDescriptor::parse(&config.ensemble)?;

    let mut context = GraphContext::new();
    let input = context.apply(
        INPUT_NAME,
        Layer::Input {
            shape: TensorShape::from(config.input_shape),
        },
        &[],
    )?;
    let trunk = trunk_subgraph(&mut context, input, config.flows)?;

    let logits = (0..config.classes)
        .map(|class| {
            branch_subgraph(&mut context, &descriptor, trunk.features, class)
        })
        .collect::<Result<Vec<NodeId>, _>>()?;
    debug!(classes = config.classes, ensemble = %descriptor, "branches built");

    let concatenated = context.apply_unnamed(Layer::Concatenate, &logits)?;
    let output = context.apply_unnamed(
        Layer::Activation(config.loss.output_activation()),
        &[concatenated],
    )?;
    let mut graph = context.into_graph();
    graph.set_output(output)?;

    let parameters = CpuParameters::initialize(&graph, config.seed);
    let mut model = CompiledModel {
        graph,
        parameters,
        compile_config: CompileConfig::new(config.loss, config.learning_rate),
        trunk,
    };
    if let WeightsSource::Safetensors(path) = &config.weights {
        let loader = ParameterLoader::open(path)?;
        let loaded = model.load_trunk_weights(&loader)?;
        info!(path = %path.display(), loaded, "pretrained trunk weights loaded");
    }

    info!(
        parameters = model.parameter_count(),
        classes = config.classes,
        flows = config.flows,
        loss = config.loss.name(),
        "model compiled"
    );
    Ok(model)
}
