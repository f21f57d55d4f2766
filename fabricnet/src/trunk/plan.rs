use crate::graph::{BATCH_NORM_EPSILON, Layer, Padding};

/// Absolute index of the trunk input in the layer order.
pub const TRUNK_INPUT_INDEX: usize = 0;

const ENTRY_BLOCKS: [(usize, usize); 3] = [(2, 128), (3, 256), (4, 728)];
const MIDDLE_BLOCKS: std::ops::RangeInclusive<usize> = 5..=12;
const MIDDLE_FILTERS: usize = 728;
const SEPARABLE_KERNEL_SIZE: usize = 3;
const STEM_CONVOLUTIONS: [(usize, usize); 2] = [(32, 2), (64, 1)];

/// One pretrained extractor layer in the framework's layer order.
///
/// `name` is `None` for layers that take a generated name (`conv2d`,
/// `batch_normalization`, `add`). `inputs` are absolute layer indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TrunkLayerPlan {
    pub name: Option<String>,
    pub layer: Layer,
    pub inputs: Box<[usize]>,
}

#[derive(Debug, Default)]
struct PlanBuilder {
    layers: Vec<TrunkLayerPlan>,
}

impl PlanBuilder {
    fn push(
        &mut self,
        name: Option<String>,
        layer: Layer,
        inputs: &[usize],
    ) -> usize {
        self.layers.push(TrunkLayerPlan {
            name,
            layer,
            inputs: inputs.into(),
        });
        self.layers.len()
    }

    fn named(
        &mut self,
        name: String,
        layer: Layer,
        input: usize,
    ) -> usize {
        self.push(Some(name), layer, &[input])
    }

    fn batch_norm(
        &mut self,
        name: Option<String>,
        input: usize,
    ) -> usize {
        self.push(
            name,
            Layer::BatchNormalization {
                epsilon: BATCH_NORM_EPSILON,
            },
            &[input],
        )
    }

    fn separable(
        &mut self,
        name: String,
        filters: usize,
        input: usize,
    ) -> usize {
        self.named(
            name,
            Layer::SeparableConv2D {
                filters,
                kernel_size: SEPARABLE_KERNEL_SIZE,
                stride: 1,
                padding: Padding::Same,
                use_bias: false,
            },
            input,
        )
    }

    fn stem(&mut self) -> usize {
        let mut current = TRUNK_INPUT_INDEX;
        for (index, (filters, stride)) in STEM_CONVOLUTIONS.into_iter().enumerate() {
            let name = format!("block1_conv{}", index + 1);
            current = self.named(
                name.clone(),
                Layer::Conv2D {
                    filters,
                    kernel_size: 3,
                    stride,
                    padding: Padding::Valid,
                    use_bias: false,
                },
                current,
            );
            current = self.batch_norm(Some(format!("{name}_bn")), current);
            current = self.named(format!("{name}_act"), Layer::ReLU, current);
        }
        current
    }

    fn entry_block(
        &mut self,
        block: usize,
        filters: usize,
        input: usize,
    ) -> usize {
        let mut current = input;
        for index in 1..=2 {
            // The first entry block starts from an activated tensor.
            if index == 2 || block != 2 {
                current = self.named(
                    format!("block{block}_sepconv{index}_act"),
                    Layer::ReLU,
                    current,
                );
            }
            current = self.separable(
                format!("block{block}_sepconv{index}"),
                filters,
                current,
            );
            let bn_name = format!("block{block}_sepconv{index}_bn");
            current = self.batch_norm(Some(bn_name), current);
        }

        let shortcut = self.push(
            None,
            Layer::Conv2D {
                filters,
                kernel_size: 1,
                stride: 2,
                padding: Padding::Same,
                use_bias: false,
            },
            &[input],
        );
        let pooled = self.named(
            format!("block{block}_pool"),
            Layer::MaxPool2D {
                pool_size: 3,
                stride: 2,
                padding: Padding::Same,
            },
            current,
        );
        let shortcut = self.batch_norm(None, shortcut);
        self.push(None, Layer::Add, &[pooled, shortcut])
    }

    fn middle_block(
        &mut self,
        block: usize,
        input: usize,
    ) -> usize {
        let mut current = input;
        for index in 1..=3 {
            current = self.named(
                format!("block{block}_sepconv{index}_act"),
                Layer::ReLU,
                current,
            );
            current = self.separable(
                format!("block{block}_sepconv{index}"),
                MIDDLE_FILTERS,
                current,
            );
            let bn_name = format!("block{block}_sepconv{index}_bn");
            current = self.batch_norm(Some(bn_name), current);
        }
        self.push(None, Layer::Add, &[current, input])
    }
}

/// Layers `1..=116` of the Xception feature extractor; entry `i` of the
/// returned vector is absolute layer `i + 1`.
pub fn xception_plan() -> Vec<TrunkLayerPlan> {
    let mut builder = PlanBuilder::default();
    let mut current = builder.stem();
    for (block, filters) in ENTRY_BLOCKS {
        current = builder.entry_block(block, filters, current);
    }
    for block in MIDDLE_BLOCKS {
        current = builder.middle_block(block, current);
    }
    builder.named(
        format!("block{}_sepconv1_act", MIDDLE_BLOCKS.end() + 1),
        Layer::ReLU,
        current,
    );
    builder.layers
}
