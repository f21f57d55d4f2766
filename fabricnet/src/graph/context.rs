use std::collections::HashMap;

use tracing::trace;

use super::{Graph, GraphConstructionError, Layer, NodeId};

/// State shared by every step of one model build.
///
/// Owns the graph under construction and the counters used to name layers
/// that were not given an explicit name. A fresh context per build keeps
/// generated names deterministic across repeated builds.
#[derive(Debug, Default)]
pub struct GraphContext {
    graph: Graph,
    name_counters: HashMap<&'static str, usize>,
}

impl GraphContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free name for `base`: `base`, `base_1`, `base_2`, ...
    pub fn unique_name(
        &mut self,
        base: &'static str,
    ) -> String {
        let counter = self.name_counters.entry(base).or_insert(0);
        loop {
            let candidate = if *counter == 0 {
                base.to_string()
            } else {
                format!("{base}_{counter}")
            };
            *counter += 1;
            if !self.graph.contains_name(&candidate) {
                return candidate;
            }
        }
    }

    pub fn apply(
        &mut self,
        name: impl Into<String>,
        layer: Layer,
        inputs: &[NodeId],
    ) -> Result<NodeId, GraphConstructionError> {
        let name = name.into();
        trace!(name = %name, layer = layer.type_name(), "adding node");
        self.graph.add_node(name, layer, inputs)
    }

    pub fn apply_unnamed(
        &mut self,
        layer: Layer,
        inputs: &[NodeId],
    ) -> Result<NodeId, GraphConstructionError> {
        let name = self.unique_name(layer.default_name());
        self.apply(name, layer, inputs)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }
}
