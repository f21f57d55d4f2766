use std::fmt;

use itertools::Itertools;

use crate::graph::{Graph, TensorShape};

const NAME_WIDTH: usize = 40;
const SHAPE_WIDTH: usize = 24;
const PARAMS_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub type_name: &'static str,
    pub output_shape: TensorShape,
    pub parameter_count: usize,
    pub inputs: Vec<String>,
}

/// Layer-by-layer description of a built model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub rows: Vec<SummaryRow>,
    pub total_parameters: usize,
    pub non_trainable_parameters: usize,
}

impl ModelSummary {
    pub fn from_graph(graph: &Graph) -> Self {
        let rows = graph
            .nodes()
            .iter()
            .map(|node| SummaryRow {
                name: node.name.clone(),
                type_name: node.layer.type_name(),
                output_shape: node.output_shape.clone(),
                parameter_count: node.parameter_count,
                inputs: node
                    .inputs
                    .iter()
                    .filter_map(|id| graph.node(*id).ok())
                    .map(|input| input.name.clone())
                    .collect(),
            })
            .collect();
        // Moving statistics of batch normalization are not trained.
        let non_trainable_parameters = graph
            .nodes()
            .iter()
            .filter_map(|node| {
                node.input_shape(graph).map(|shape| {
                    node.layer
                        .parameter_specs(shape)
                        .iter()
                        .filter(|spec| spec.name.starts_with("moving_"))
                        .map(|spec| spec.num_elements())
                        .sum::<usize>()
                })
            })
            .sum();
        Self {
            rows,
            total_parameters: graph.parameter_count(),
            non_trainable_parameters,
        }
    }

    pub fn trainable_parameters(&self) -> usize {
        self.total_parameters - self.non_trainable_parameters
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let rule_width = NAME_WIDTH + SHAPE_WIDTH + PARAMS_WIDTH + 20;
        writeln!(
            f,
            "{:<NAME_WIDTH$}{:<SHAPE_WIDTH$}{:<PARAMS_WIDTH$}Connected to",
            "Layer (type)", "Output Shape", "Param #"
        )?;
        writeln!(f, "{}", "=".repeat(rule_width))?;
        for row in &self.rows {
            let label = format!("{} ({})", row.name, row.type_name);
            writeln!(
                f,
                "{:<NAME_WIDTH$}{:<SHAPE_WIDTH$}{:<PARAMS_WIDTH$}{}",
                label,
                row.output_shape.to_string(),
                row.parameter_count,
                row.inputs.iter().join(", ")
            )?;
        }
        writeln!(f, "{}", "=".repeat(rule_width))?;
        writeln!(f, "Total params: {}", self.total_parameters)?;
        writeln!(f, "Trainable params: {}", self.trainable_parameters())?;
        write!(f, "Non-trainable params: {}", self.non_trainable_parameters)
    }
}
