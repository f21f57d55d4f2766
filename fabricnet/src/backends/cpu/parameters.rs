use std::collections::HashMap;

use indexmap::IndexMap;
use ndarray::{ArrayD, ArrayViewD, IxDyn};
use rand::{Rng, SeedableRng, distributions::Uniform, rngs::StdRng};
use tracing::debug;

use super::ExecutionError;
use crate::{
    graph::{
        Graph, GraphConstructionError, Node, NodeId, ParameterSpec,
        TensorShape,
    },
    parameters::ParameterTree,
    trunk::TrunkOutput,
};

/// Fan-in and fan-out of a kernel laid out as `[.., in, out]`.
fn fans(shape: &[usize]) -> (usize, usize) {
    match *shape {
        [fan_in, fan_out] => (fan_in, fan_out),
        [ref receptive @ .., fan_in, fan_out] => {
            let receptive: usize = receptive.iter().product();
            (receptive * fan_in, receptive * fan_out)
        },
        _ => (1, 1),
    }
}

fn initial_value(
    spec: &ParameterSpec,
    rng: &mut StdRng,
) -> ArrayD<f32> {
    let shape = IxDyn(&spec.shape);
    match spec.name {
        "kernel" | "depthwise_kernel" | "pointwise_kernel" => {
            let (fan_in, fan_out) = fans(&spec.shape);
            let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
            let distribution = Uniform::new_inclusive(-limit, limit);
            ArrayD::from_shape_simple_fn(shape, || rng.sample(distribution))
        },
        "gamma" | "moving_variance" => ArrayD::ones(shape),
        _ => ArrayD::zeros(shape),
    }
}

/// Weight arrays of every parameterized node, keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct CpuParameters {
    arrays: HashMap<NodeId, IndexMap<&'static str, ArrayD<f32>>>,
}

impl CpuParameters {
    /// Glorot-uniform kernels, zero biases and unit batch norm statistics,
    /// drawn in node order from a generator seeded with `seed`.
    pub fn initialize(
        graph: &Graph,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut arrays = HashMap::new();
        for node in graph.nodes() {
            let Some(input_shape) = node.input_shape(graph) else {
                continue;
            };
            let specs = node.layer.parameter_specs(input_shape);
            if specs.is_empty() {
                continue;
            }
            let values = specs
                .iter()
                .map(|spec| (spec.name, initial_value(spec, &mut rng)))
                .collect();
            arrays.insert(node.id, values);
        }
        Self {
            arrays,
        }
    }

    pub fn get(
        &self,
        node: &Node,
        parameter: &'static str,
    ) -> Result<ArrayViewD<'_, f32>, ExecutionError> {
        self.arrays
            .get(&node.id)
            .and_then(|values| values.get(parameter))
            .map(|value| value.view())
            .ok_or_else(|| ExecutionError::MissingParameter {
                node_name: node.name.clone(),
                parameter,
            })
    }

    pub fn contains(
        &self,
        node: NodeId,
        parameter: &str,
    ) -> bool {
        self.arrays
            .get(&node)
            .is_some_and(|values| values.contains_key(parameter))
    }

    /// Replaces one parameter, keeping its declared shape.
    pub fn set(
        &mut self,
        graph: &Graph,
        id: NodeId,
        parameter: &str,
        value: ArrayD<f32>,
    ) -> Result<(), GraphConstructionError> {
        let node = graph.node(id)?;
        let slot = self
            .arrays
            .get_mut(&id)
            .and_then(|values| values.get_mut(parameter))
            .ok_or_else(|| GraphConstructionError::IncompatibleShapes {
                node_name: node.name.clone(),
                expected: TensorShape::new(Vec::new()),
                actual: TensorShape::from(value.shape()),
            })?;
        if slot.shape() != value.shape() {
            return Err(GraphConstructionError::IncompatibleShapes {
                node_name: node.name.clone(),
                expected: TensorShape::from(slot.shape()),
                actual: TensorShape::from(value.shape()),
            });
        }
        *slot = value;
        Ok(())
    }

    /// Overwrites every parameterized trunk layer with the arrays stored
    /// under `{source_name}.{parameter}`. Returns the number of arrays read.
    pub fn load_trunk(
        &mut self,
        graph: &Graph,
        trunk: &TrunkOutput,
        tree: &ParameterTree,
    ) -> Result<usize, GraphConstructionError> {
        let mut loaded = 0;
        for layer in &trunk.layers {
            let node = graph.node(layer.id)?;
            let Some(input_shape) = node.input_shape(graph) else {
                continue;
            };
            let specs = node.layer.parameter_specs(input_shape);
            if specs.is_empty() {
                continue;
            }
            let subtree = tree.subtree(&layer.source_name)?;
            for spec in specs {
                let value = subtree.leaf(spec.name)?;
                self.set(graph, layer.id, spec.name, value)?;
                loaded += 1;
            }
        }
        debug!(loaded, "trunk weights loaded");
        Ok(loaded)
    }

    pub fn num_elements(&self) -> usize {
        self.arrays
            .values()
            .flat_map(|values| values.values())
            .map(|value| value.len())
            .sum()
    }
}
