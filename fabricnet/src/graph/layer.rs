use serde::{Deserialize, Serialize};

use super::{
    GraphConstructionError, MAX_ELEMENTS, TensorShape, checked_num_elements,
};
use crate::config::OutputActivation;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Copy, Clone)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    Same,
    Valid,
}

impl Padding {
    fn output_extent(
        &self,
        extent: usize,
        window: usize,
        stride: usize,
    ) -> usize {
        match self {
            Padding::Same => extent.div_ceil(stride),
            Padding::Valid => {
                if extent < window {
                    0
                } else {
                    (extent - window) / stride + 1
                }
            },
        }
    }
}

/// A named parameter tensor owned by a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub shape: Box<[usize]>,
}

impl ParameterSpec {
    fn new(
        name: &'static str,
        shape: impl Into<Box<[usize]>>,
    ) -> Self {
        Self {
            name,
            shape: shape.into(),
        }
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }
}

pub const DROPOUT_RATE: f32 = 0.1;
pub const BATCH_NORM_EPSILON: f32 = 1e-3;

/// Every operator kind a model graph can contain.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Input {
        shape: TensorShape,
    },
    SeparableConv2D {
        filters: usize,
        kernel_size: usize,
        stride: usize,
        padding: Padding,
        use_bias: bool,
    },
    Conv2D {
        filters: usize,
        kernel_size: usize,
        stride: usize,
        padding: Padding,
        use_bias: bool,
    },
    MaxPool2D {
        pool_size: usize,
        stride: usize,
        padding: Padding,
    },
    ReLU,
    Dropout {
        rate: f32,
    },
    BatchNormalization {
        epsilon: f32,
    },
    Add,
    Flatten,
    Dense {
        units: usize,
        use_bias: bool,
    },
    Concatenate,
    Activation(OutputActivation),
}

impl Layer {
    pub fn type_name(&self) -> &'static str {
        match self {
            Layer::Input {
                ..
            } => "InputLayer",
            Layer::SeparableConv2D {
                ..
            } => "SeparableConv2D",
            Layer::Conv2D {
                ..
            } => "Conv2D",
            Layer::MaxPool2D {
                ..
            } => "MaxPooling2D",
            Layer::ReLU => "ReLU",
            Layer::Dropout {
                ..
            } => "Dropout",
            Layer::BatchNormalization {
                ..
            } => "BatchNormalization",
            Layer::Add => "Add",
            Layer::Flatten => "Flatten",
            Layer::Dense {
                ..
            } => "Dense",
            Layer::Concatenate => "Concatenate",
            Layer::Activation(_) => "Activation",
        }
    }

    /// Prefix used when the context has to invent a name for this layer.
    pub fn default_name(&self) -> &'static str {
        match self {
            Layer::Input {
                ..
            } => "input",
            Layer::SeparableConv2D {
                ..
            } => "separable_conv2d",
            Layer::Conv2D {
                ..
            } => "conv2d",
            Layer::MaxPool2D {
                ..
            } => "max_pooling2d",
            Layer::ReLU => "re_lu",
            Layer::Dropout {
                ..
            } => "dropout",
            Layer::BatchNormalization {
                ..
            } => "batch_normalization",
            Layer::Add => "add",
            Layer::Flatten => "flatten",
            Layer::Dense {
                ..
            } => "dense",
            Layer::Concatenate => "concatenate",
            Layer::Activation(_) => "activation",
        }
    }

    pub fn is_convolution(&self) -> bool {
        matches!(
            self,
            Layer::SeparableConv2D { .. } | Layer::Conv2D { .. }
        )
    }

    fn input_count(&self) -> Option<usize> {
        match self {
            Layer::Input {
                ..
            } => Some(0),
            Layer::Add | Layer::Concatenate => None,
            _ => Some(1),
        }
    }

    /// Shape of the single output given the shapes of the inputs.
    pub fn output_shape(
        &self,
        node_name: &str,
        inputs: &[&TensorShape],
    ) -> Result<TensorShape, GraphConstructionError> {
        match self.input_count() {
            Some(expected) if expected != inputs.len() => {
                return Err(GraphConstructionError::InputCountMismatch {
                    node_name: node_name.to_string(),
                    expected,
                    actual: inputs.len(),
                });
            },
            None if inputs.is_empty() => {
                return Err(GraphConstructionError::InputCountMismatch {
                    node_name: node_name.to_string(),
                    expected: 1,
                    actual: 0,
                });
            },
            _ => {},
        }

        let shape = match self {
            Layer::Input {
                shape,
            } => shape.clone(),
            Layer::SeparableConv2D {
                filters,
                kernel_size,
                stride,
                padding,
                ..
            }
            | Layer::Conv2D {
                filters,
                kernel_size,
                stride,
                padding,
                ..
            } => {
                let [height, width, _] = image_dimensions(node_name, inputs[0])?;
                TensorShape::from([
                    padding.output_extent(height, *kernel_size, *stride),
                    padding.output_extent(width, *kernel_size, *stride),
                    *filters,
                ])
            },
            Layer::MaxPool2D {
                pool_size,
                stride,
                padding,
            } => {
                let [height, width, channels] =
                    image_dimensions(node_name, inputs[0])?;
                TensorShape::from([
                    padding.output_extent(height, *pool_size, *stride),
                    padding.output_extent(width, *pool_size, *stride),
                    channels,
                ])
            },
            Layer::ReLU
            | Layer::Dropout {
                ..
            }
            | Layer::BatchNormalization {
                ..
            }
            | Layer::Activation(_) => inputs[0].clone(),
            Layer::Add => {
                let expected = inputs[0];
                if let Some(actual) =
                    inputs.iter().find(|shape| **shape != expected)
                {
                    return Err(GraphConstructionError::IncompatibleShapes {
                        node_name: node_name.to_string(),
                        expected: expected.clone(),
                        actual: (*actual).clone(),
                    });
                }
                expected.clone()
            },
            Layer::Flatten => TensorShape::from([inputs[0].num_elements()]),
            Layer::Dense {
                units,
                ..
            } => {
                if inputs[0].rank() != 1 {
                    return Err(GraphConstructionError::RankMismatch {
                        node_name: node_name.to_string(),
                        expected: 1,
                        actual: inputs[0].clone(),
                    });
                }
                TensorShape::from([*units])
            },
            Layer::Concatenate => {
                let expected = inputs[0];
                let mut channels = 0;
                for input in inputs {
                    if input.spatial() != expected.spatial() {
                        return Err(GraphConstructionError::IncompatibleShapes {
                            node_name: node_name.to_string(),
                            expected: expected.clone(),
                            actual: (*input).clone(),
                        });
                    }
                    channels += input.channels().unwrap_or(0);
                }
                let mut dimensions = expected.spatial().to_vec();
                dimensions.push(channels);
                TensorShape::new(dimensions)
            },
        };

        if shape.rank() == 0 || shape.is_empty() {
            return Err(GraphConstructionError::EmptyOutput {
                node_name: node_name.to_string(),
                shape,
            });
        }
        if checked_num_elements(shape.dimensions()).is_none() {
            return Err(GraphConstructionError::SizeOverflow {
                node_name: node_name.to_string(),
            });
        }
        Ok(shape)
    }

    /// Parameter tensors in the layout the pretrained weights use.
    pub fn parameter_specs(
        &self,
        input: &TensorShape,
    ) -> Vec<ParameterSpec> {
        let channels = input.channels().unwrap_or(0);
        match self {
            Layer::SeparableConv2D {
                filters,
                kernel_size,
                use_bias,
                ..
            } => {
                let mut specs = vec![
                    ParameterSpec::new(
                        "depthwise_kernel",
                        [*kernel_size, *kernel_size, channels, 1],
                    ),
                    ParameterSpec::new(
                        "pointwise_kernel",
                        [1, 1, channels, *filters],
                    ),
                ];
                if *use_bias {
                    specs.push(ParameterSpec::new("bias", [*filters]));
                }
                specs
            },
            Layer::Conv2D {
                filters,
                kernel_size,
                use_bias,
                ..
            } => {
                let mut specs = vec![ParameterSpec::new(
                    "kernel",
                    [*kernel_size, *kernel_size, channels, *filters],
                )];
                if *use_bias {
                    specs.push(ParameterSpec::new("bias", [*filters]));
                }
                specs
            },
            Layer::BatchNormalization {
                ..
            } => ["gamma", "beta", "moving_mean", "moving_variance"]
                .into_iter()
                .map(|name| ParameterSpec::new(name, [channels]))
                .collect(),
            Layer::Dense {
                units,
                use_bias,
            } => {
                let mut specs = vec![ParameterSpec::new(
                    "kernel",
                    [input.num_elements(), *units],
                )];
                if *use_bias {
                    specs.push(ParameterSpec::new("bias", [*units]));
                }
                specs
            },
            _ => Vec::new(),
        }
    }

    /// Total parameter elements; fails when any parameter tensor, or their
    /// sum, exceeds [`MAX_ELEMENTS`].
    pub fn parameter_count(
        &self,
        node_name: &str,
        input: &TensorShape,
    ) -> Result<usize, GraphConstructionError> {
        self.parameter_specs(input)
            .iter()
            .try_fold(0usize, |total, spec| {
                checked_num_elements(&spec.shape)
                    .and_then(|count| total.checked_add(count))
                    .filter(|&total| total <= MAX_ELEMENTS)
            })
            .ok_or_else(|| GraphConstructionError::SizeOverflow {
                node_name: node_name.to_string(),
            })
    }
}

fn image_dimensions(
    node_name: &str,
    shape: &TensorShape,
) -> Result<[usize; 3], GraphConstructionError> {
    match *shape.dimensions() {
        [height, width, channels] => Ok([height, width, channels]),
        _ => Err(GraphConstructionError::RankMismatch {
            node_name: node_name.to_string(),
            expected: 3,
            actual: shape.clone(),
        }),
    }
}
