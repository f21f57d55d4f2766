use indexmap::IndexMap;

use super::{GraphConstructionError, Layer, MAX_ELEMENTS, TensorShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub layer: Layer,
    pub inputs: Box<[NodeId]>,
    pub output_shape: TensorShape,
    pub parameter_count: usize,
}

impl Node {
    /// Shape of the first input, which is what the layer's parameters are
    /// sized against.
    pub fn input_shape<'graph>(
        &self,
        graph: &'graph Graph,
    ) -> Option<&'graph TensorShape> {
        self.inputs.first().map(|id| &graph.nodes[id.0].output_shape)
    }
}

/// Directed acyclic graph with a single input and a single output.
///
/// Nodes are stored in construction order, which is also a valid
/// topological order because a node can only reference existing nodes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    names: IndexMap<String, NodeId>,
    input: Option<NodeId>,
    output: Option<NodeId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        name: String,
        layer: Layer,
        inputs: &[NodeId],
    ) -> Result<NodeId, GraphConstructionError> {
        if self.names.contains_key(&name) {
            return Err(GraphConstructionError::DuplicateName(name));
        }
        let input_shapes = inputs
            .iter()
            .map(|id| self.node(*id).map(|node| &node.output_shape))
            .collect::<Result<Vec<_>, _>>()?;
        let output_shape = layer.output_shape(&name, &input_shapes)?;
        let parameter_count = match input_shapes.first() {
            Some(shape) => layer.parameter_count(&name, shape)?,
            None => 0,
        };
        self.parameter_count()
            .checked_add(parameter_count)
            .filter(|&total| total <= MAX_ELEMENTS)
            .ok_or_else(|| GraphConstructionError::SizeOverflow {
                node_name: name.clone(),
            })?;

        let id = NodeId(self.nodes.len());
        if matches!(layer, Layer::Input { .. }) && self.input.is_none() {
            self.input = Some(id);
        }
        self.names.insert(name.clone(), id);
        self.nodes.push(Node {
            id,
            name,
            layer,
            inputs: inputs.into(),
            output_shape,
            parameter_count,
        });
        Ok(id)
    }

    pub fn rename(
        &mut self,
        id: NodeId,
        new_name: String,
    ) -> Result<(), GraphConstructionError> {
        let old_name = self.node(id)?.name.clone();
        if old_name == new_name {
            return Ok(());
        }
        if self.names.contains_key(&new_name) {
            return Err(GraphConstructionError::DuplicateName(new_name));
        }
        self.names.shift_remove(&old_name);
        self.names.insert(new_name.clone(), id);
        self.nodes[id.0].name = new_name;
        Ok(())
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> Result<&Node, GraphConstructionError> {
        self.nodes.get(id.0).ok_or(GraphConstructionError::UnknownNode(id))
    }

    pub fn node_by_name(
        &self,
        name: &str,
    ) -> Option<&Node> {
        self.names.get(name).map(|id| &self.nodes[id.0])
    }

    pub fn contains_name(
        &self,
        name: &str,
    ) -> bool {
        self.names.contains_key(name)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn input(&self) -> Result<&Node, GraphConstructionError> {
        let id =
            self.input.ok_or(GraphConstructionError::MissingEndpoint("input"))?;
        self.node(id)
    }

    pub fn output(&self) -> Result<&Node, GraphConstructionError> {
        let id = self
            .output
            .ok_or(GraphConstructionError::MissingEndpoint("output"))?;
        self.node(id)
    }

    pub fn set_output(
        &mut self,
        id: NodeId,
    ) -> Result<(), GraphConstructionError> {
        self.node(id)?;
        self.output = Some(id);
        Ok(())
    }

    pub fn parameter_count(&self) -> usize {
        self.nodes.iter().map(|node| node.parameter_count).sum()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|node| node.name.as_str())
    }
}
