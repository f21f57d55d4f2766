//! Translation of descriptor tokens into named layer instances.

use crate::{
    descriptor::Token,
    graph::{
        BATCH_NORM_EPSILON, DROPOUT_RATE, GraphConstructionError, GraphContext,
        Layer, NodeId, Padding,
    },
};

/// A layer bound to its identity in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub layer: Layer,
}

impl Operator {
    pub fn apply(
        self,
        context: &mut GraphContext,
        input: NodeId,
    ) -> Result<NodeId, GraphConstructionError> {
        context.apply(self.name, self.layer, &[input])
    }
}

pub fn separable_conv_name(
    index: usize,
    class: usize,
) -> String {
    format!("sepconv2d_d{index}_c{class}")
}

pub fn max_pool_name(
    index: usize,
    class: usize,
) -> String {
    format!("MaxPool2D_d{index}_c{class}")
}

pub fn relu_name(
    index: usize,
    class: usize,
) -> String {
    format!("ReLU_d{index}_c{class}")
}

pub fn dropout_name(
    index: usize,
    class: usize,
) -> String {
    format!("dropout_d{index}_c{class}")
}

/// Builds the operator for `token` at position `index` of the branch for
/// `class`.
///
/// Batch normalization carries no positional name; it takes the next
/// generated `batch_normalization` name from the context.
pub fn operator_for(
    context: &mut GraphContext,
    token: &Token,
    index: usize,
    class: usize,
) -> Operator {
    match *token {
        Token::SeparableConv {
            filters,
            kernel_size,
            stride,
        } => Operator {
            name: separable_conv_name(index, class),
            layer: Layer::SeparableConv2D {
                filters,
                kernel_size,
                stride,
                padding: Padding::Same,
                use_bias: true,
            },
        },
        Token::MaxPool {
            pool_size,
        } => Operator {
            name: max_pool_name(index, class),
            layer: Layer::MaxPool2D {
                pool_size,
                stride: pool_size,
                padding: Padding::Valid,
            },
        },
        Token::ReLU => Operator {
            name: relu_name(index, class),
            layer: Layer::ReLU,
        },
        Token::Dropout => Operator {
            name: dropout_name(index, class),
            layer: Layer::Dropout {
                rate: DROPOUT_RATE,
            },
        },
        Token::BatchNorm => {
            let layer = Layer::BatchNormalization {
                epsilon: BATCH_NORM_EPSILON,
            };
            Operator {
                name: context.unique_name(layer.default_name()),
                layer,
            }
        },
    }
}

/// Parses `text` and builds its operator; malformed tokens are errors,
/// never skipped.
pub fn operator_from_text(
    context: &mut GraphContext,
    text: &str,
    index: usize,
    class: usize,
) -> Result<Operator, GraphConstructionError> {
    let token = Token::parse(text)?;
    Ok(operator_for(context, &token, index, class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorError;

    #[test]
    fn test_separable_conv_operator() {
        let mut context = GraphContext::new();
        let operator =
            operator_from_text(&mut context, "S64,3,2", 0, 3).unwrap();
        assert_eq!(operator.name, "sepconv2d_d0_c3");
        assert_eq!(
            operator.layer,
            Layer::SeparableConv2D {
                filters: 64,
                kernel_size: 3,
                stride: 2,
                padding: Padding::Same,
                use_bias: true,
            }
        );
    }

    #[test]
    fn test_named_operators() {
        let mut context = GraphContext::new();
        let cases = [
            ("P2", "MaxPool2D_d1_c0"),
            ("R", "ReLU_d1_c0"),
            ("D", "dropout_d1_c0"),
        ];
        for (text, name) in cases {
            let operator =
                operator_from_text(&mut context, text, 1, 0).unwrap();
            assert_eq!(operator.name, name);
        }
        let dropout = operator_from_text(&mut context, "D", 0, 0).unwrap();
        assert_eq!(
            dropout.layer,
            Layer::Dropout {
                rate: 0.1
            }
        );
        let pool = operator_from_text(&mut context, "P3", 0, 0).unwrap();
        assert_eq!(
            pool.layer,
            Layer::MaxPool2D {
                pool_size: 3,
                stride: 3,
                padding: Padding::Valid,
            }
        );
    }

    #[test]
    fn test_batch_norm_takes_generated_names() {
        let mut context = GraphContext::new();
        let first = operator_from_text(&mut context, "N", 0, 0).unwrap();
        let second = operator_from_text(&mut context, "N", 0, 1).unwrap();
        assert_eq!(first.name, "batch_normalization");
        assert_eq!(second.name, "batch_normalization_1");
    }

    #[test]
    fn test_unknown_opcode_is_an_error() {
        let mut context = GraphContext::new();
        let result = operator_from_text(&mut context, "Q1", 0, 0);
        assert!(matches!(
            result,
            Err(GraphConstructionError::MalformedToken(
                DescriptorError::UnknownOpCode { .. }
            ))
        ));
    }
}
