//! Per-class tails attached to the shared trunk output.

use tracing::debug;

use crate::{
    descriptor::{ArchitectureDescriptor, Token},
    graph::{GraphConstructionError, GraphContext, Layer, NodeId},
    operators::operator_for,
};

const FALLBACK_STAGES: [(usize, usize); 2] = [(1, 16), (2, 8)];
const FALLBACK_KERNEL_SIZE: usize = 3;
const FALLBACK_STRIDE: usize = 2;

pub fn flatten_name(class: usize) -> String {
    format!("flatten_{class}")
}

/// Running state of one branch: the latest tensor and the latest
/// convolution output a following convolution may be summed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchState {
    pub current: NodeId,
    pub past: Option<NodeId>,
}

impl BranchState {
    pub fn new(input: NodeId) -> Self {
        Self {
            current: input,
            past: None,
        }
    }

    pub fn step(
        self,
        context: &mut GraphContext,
        token: &Token,
        index: usize,
        class: usize,
    ) -> Result<Self, GraphConstructionError> {
        let operator = operator_for(context, token, index, class);
        let mut current = operator.apply(context, self.current)?;
        if !token.is_convolution() {
            return Ok(Self {
                current,
                ..self
            });
        }

        if let Some(past) = self.past {
            let graph = context.graph();
            let current_channels = graph.node(current)?.output_shape.channels();
            let past_channels = graph.node(past)?.output_shape.channels();
            // Only the channel axis is compared; spatial mismatches are left
            // to the Add shape check.
            if current_channels == past_channels {
                current = context.apply_unnamed(Layer::Add, &[current, past])?;
                debug!(index, class, "residual added");
            } else {
                debug!(
                    index,
                    class,
                    ?current_channels,
                    ?past_channels,
                    "residual skipped"
                );
            }
        }
        Ok(Self {
            current,
            past: Some(current),
        })
    }
}

fn fallback_subgraph(
    context: &mut GraphContext,
    input: NodeId,
    class: usize,
) -> Result<NodeId, GraphConstructionError> {
    FALLBACK_STAGES.iter().try_fold(input, |current, &(index, filters)| {
        let convolution = Token::SeparableConv {
            filters,
            kernel_size: FALLBACK_KERNEL_SIZE,
            stride: FALLBACK_STRIDE,
        };
        let current = operator_for(context, &convolution, index, class)
            .apply(context, current)?;
        operator_for(context, &Token::ReLU, index, class).apply(context, current)
    })
}

/// Builds the branch for `class` on top of `input` and returns its
/// single-unit logit node. No activation is applied to the logit.
pub fn branch_subgraph(
    context: &mut GraphContext,
    descriptor: &ArchitectureDescriptor,
    input: NodeId,
    class: usize,
) -> Result<NodeId, GraphConstructionError> {
    let features = match descriptor {
        ArchitectureDescriptor::Fallback => {
            fallback_subgraph(context, input, class)?
        },
        ArchitectureDescriptor::Tokens(tokens) => {
            tokens
                .iter()
                .enumerate()
                .try_fold(BranchState::new(input), |state, (index, token)| {
                    state.step(context, token, index, class)
                })?
                .current
        },
    };

    let flattened = context.apply(flatten_name(class), Layer::Flatten, &[features])?;
    context.apply_unnamed(
        Layer::Dense {
            units: 1,
            use_bias: true,
        },
        &[flattened],
    )
}
