//! Pretrained Xception feature extractor shared by every branch.

mod plan;

pub use plan::{TRUNK_INPUT_INDEX, TrunkLayerPlan, xception_plan};
use thiserror::Error;
use tracing::debug;

use crate::graph::{GraphConstructionError, GraphContext, NodeId};

/// Absolute extractor layer index whose output feeds the branches, per
/// flows depth `1..=9`.
pub const FLOWS_BREAK_INDEX: [usize; 9] = [36, 46, 56, 66, 76, 86, 96, 106, 116];

/// Appended to every extractor layer name.
pub const TRUNK_SUFFIX: &str = "_head";

/// Generated names taken by the exit-flow residual (`conv2d`,
/// `batch_normalization`, `add`), which lies past every break index.
const EXIT_FLOW_GENERATED_NAMES: [&str; 3] =
    ["conv2d", "batch_normalization", "add"];

#[derive(Debug, Error)]
pub enum TrunkError {
    #[error("Flows depth must be between 1 and 9, got {0}")]
    FlowsOutOfRange(usize),
    #[error(transparent)]
    GraphConstructionError(#[from] GraphConstructionError),
}

/// A built extractor layer and the name its pretrained weights are stored
/// under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrunkLayer {
    pub id: NodeId,
    pub source_name: String,
}

#[derive(Debug, Clone)]
pub struct TrunkOutput {
    pub features: NodeId,
    pub layers: Vec<TrunkLayer>,
}

pub fn break_index(flows: usize) -> Result<usize, TrunkError> {
    flows
        .checked_sub(1)
        .and_then(|index| FLOWS_BREAK_INDEX.get(index).copied())
        .ok_or(TrunkError::FlowsOutOfRange(flows))
}

/// Builds extractor layers `0..=FLOWS_BREAK_INDEX[flows - 1]` on top of
/// `input`, which becomes layer 0, then suffixes every layer name.
///
/// Generated-name counters advance as if the whole extractor had been
/// instantiated, so layers added afterwards are numbered independently of
/// `flows`.
pub fn trunk_subgraph(
    context: &mut GraphContext,
    input: NodeId,
    flows: usize,
) -> Result<TrunkOutput, TrunkError> {
    let break_index = break_index(flows)?;

    let input_name = context.graph().node(input)?.name.clone();
    let mut layers = vec![TrunkLayer {
        id: input,
        source_name: input_name,
    }];
    let mut plan = xception_plan();
    let unbuilt = plan.split_off(break_index);
    for entry in plan {
        let inputs: Vec<NodeId> =
            entry.inputs.iter().map(|&index| layers[index].id).collect();
        let source_name = match entry.name {
            Some(name) => name,
            None => context.unique_name(entry.layer.default_name()),
        };
        let id = context.apply(source_name.clone(), entry.layer, &inputs)?;
        layers.push(TrunkLayer {
            id,
            source_name,
        });
    }

    let unbuilt_generated = unbuilt
        .iter()
        .filter(|entry| entry.name.is_none())
        .map(|entry| entry.layer.default_name())
        .chain(EXIT_FLOW_GENERATED_NAMES);
    for base in unbuilt_generated {
        context.unique_name(base);
    }

    for layer in &layers {
        let name = format!("{}{TRUNK_SUFFIX}", layer.source_name);
        context.graph_mut().rename(layer.id, name)?;
    }

    let features = layers[break_index].id;
    debug!(flows, break_index, layers = layers.len(), "trunk built");
    Ok(TrunkOutput {
        features,
        layers,
    })
}
