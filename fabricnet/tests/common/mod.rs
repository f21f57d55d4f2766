#![allow(dead_code)]

use std::{io::Write, path::Path};

use fabricnet::{
    CompiledModel, ModelConfig, build_model,
    graph::{Graph, Node},
};
use ndarray::{Array4, ArrayD};
use rand::{Rng, SeedableRng, rngs::StdRng};

pub const INPUT_SHAPE: [usize; 3] = [32, 32, 3];

/// Shallowest trunk on a small input; features are `2 x 2 x 728`.
pub fn small_config(
    classes: usize,
    ensemble: &str,
) -> ModelConfig {
    ModelConfig::new(INPUT_SHAPE, classes)
        .with_flows(1)
        .with_ensemble(ensemble)
}

pub fn build_small(
    classes: usize,
    ensemble: &str,
) -> CompiledModel {
    build_model(&small_config(classes, ensemble)).expect("build model")
}

pub fn random_batch(
    batch_size: usize,
    seed: u64,
) -> Array4<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let [height, width, channels] = INPUT_SHAPE;
    Array4::from_shape_simple_fn((batch_size, height, width, channels), || {
        rng.gen_range(0.0..1.0)
    })
}

pub fn node<'a>(
    graph: &'a Graph,
    name: &str,
) -> &'a Node {
    graph
        .node_by_name(name)
        .unwrap_or_else(|| panic!("missing node {name}"))
}

/// Names of the nodes that consume `name`.
pub fn consumers(
    graph: &Graph,
    name: &str,
) -> Vec<String> {
    let id = node(graph, name).id;
    graph
        .nodes()
        .iter()
        .filter(|candidate| candidate.inputs.contains(&id))
        .map(|candidate| candidate.name.clone())
        .collect()
}

/// Writes `tensors` as an F32 safetensors file.
pub fn write_safetensors(
    path: &Path,
    tensors: &[(String, ArrayD<f32>)],
) {
    let mut header = serde_json::Map::new();
    let mut data: Vec<u8> = Vec::new();
    for (name, array) in tensors {
        let begin = data.len();
        data.extend(array.iter().flat_map(|value| value.to_le_bytes()));
        header.insert(
            name.clone(),
            serde_json::json!({
                "dtype": "F32",
                "shape": array.shape(),
                "data_offsets": [begin, data.len()],
            }),
        );
    }
    let header = serde_json::to_vec(&header).expect("serialize header");
    let mut file = std::fs::File::create(path).expect("create weights file");
    file.write_all(&(header.len() as u64).to_le_bytes()).unwrap();
    file.write_all(&header).unwrap();
    file.write_all(&data).unwrap();
}
