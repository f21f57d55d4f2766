use console::Style;
use fabricnet::{
    ArchitectureDescriptor,
    branch::branch_subgraph,
    graph::{GraphContext, Layer, TensorShape},
    model::ModelSummary,
};

use super::HandlerResult;

const FEATURES_NAME: &str = "features";

/// Builds one branch on a stand-in feature tensor and prints its layers.
pub fn handle_check(
    ensemble: String,
    features: [usize; 3],
    class: usize,
) -> HandlerResult {
    let descriptor = ArchitectureDescriptor::parse(&ensemble)?;
    let style_header = Style::new().bold();
    if descriptor.is_fallback() {
        println!("{}", style_header.apply_to("Empty descriptor: fallback branch"));
    } else {
        let tokens: Vec<String> =
            descriptor.tokens().iter().map(ToString::to_string).collect();
        println!("{}", style_header.apply_to(tokens.join(" -> ")));
    }

    let mut context = GraphContext::new();
    let input = context.apply(
        FEATURES_NAME,
        Layer::Input {
            shape: TensorShape::from(features),
        },
        &[],
    )?;
    let logit = branch_subgraph(&mut context, &descriptor, input, class)?;
    let mut graph = context.into_graph();
    graph.set_output(logit)?;

    println!("{}", ModelSummary::from_graph(&graph));
    let residuals = graph
        .nodes()
        .iter()
        .filter(|node| node.layer == Layer::Add)
        .count();
    println!(
        "{}",
        Style::new().dim().apply_to(format!("{residuals} residual connection(s)"))
    );
    Ok(())
}
