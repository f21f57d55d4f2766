mod common;

use common::{INPUT_SHAPE, random_batch, small_config, write_safetensors};
use fabricnet::{
    ModelBuildError, WeightsSource, build_model,
    graph::GraphConstructionError,
    parameters::{ParameterLoader, ParameterLoaderError},
};
use ndarray::{ArrayD, IxDyn};

/// Every parameter of every trunk layer at flows 1, filled with `value`.
fn trunk_tensors(value: f32) -> Vec<(String, ArrayD<f32>)> {
    let model = build_model(&small_config(1, "R")).unwrap();
    let graph = model.graph();
    let mut tensors = Vec::new();
    for layer in &model.trunk().layers {
        let node = graph.node(layer.id).unwrap();
        let Some(input_shape) = node.input_shape(graph) else {
            continue;
        };
        for spec in node.layer.parameter_specs(input_shape) {
            tensors.push((
                format!("{}.{}", layer.source_name, spec.name),
                ArrayD::from_elem(IxDyn(&spec.shape), value),
            ));
        }
    }
    tensors
}

#[test]
fn test_pretrained_trunk_weights_are_used() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("xception.safetensors");
    let tensors = trunk_tensors(0.01);
    write_safetensors(&path, &tensors);

    let loader = ParameterLoader::open(&path).unwrap();
    assert_eq!(loader.keys().count(), tensors.len());
    let gamma = loader
        .tree()
        .subtree("block1_conv1_bn")
        .unwrap()
        .leaf("gamma")
        .unwrap();
    assert_eq!(gamma.shape(), &[32]);

    let random = build_model(&small_config(1, "R")).unwrap();
    let weights = WeightsSource::Safetensors(path.clone());
    let pretrained =
        build_model(&small_config(1, "R").with_weights(weights)).unwrap();

    let graph = pretrained.graph();
    let conv = graph.node_by_name("block1_conv1_head").unwrap();
    let kernel = pretrained.parameters().get(conv, "kernel").unwrap();
    assert_eq!(kernel.shape(), &[3, 3, INPUT_SHAPE[2], 32]);
    assert!(kernel.iter().all(|&value| value == 0.01));
    let shortcut = graph.node_by_name("conv2d_head").unwrap();
    let kernel = pretrained.parameters().get(shortcut, "kernel").unwrap();
    assert!(kernel.iter().all(|&value| value == 0.01));

    // Branch parameters keep their seeded initialisation.
    let dense = graph.node_by_name("dense").unwrap();
    assert_eq!(
        pretrained.parameters().get(dense, "kernel").unwrap(),
        random.parameters().get(dense, "kernel").unwrap()
    );

    let batch = random_batch(1, 2);
    assert_ne!(
        pretrained.predict(batch.view()).unwrap(),
        random.predict(batch.view()).unwrap()
    );
}

#[test]
fn test_mismatched_weight_shape_is_rejected() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("broken.safetensors");
    let mut tensors = trunk_tensors(0.5);
    let (_, kernel) = tensors
        .iter_mut()
        .find(|(name, _)| name == "block1_conv1.kernel")
        .unwrap();
    *kernel = ArrayD::zeros(IxDyn(&[3, 3, 3, 16]));
    write_safetensors(&path, &tensors);

    let config =
        small_config(1, "R").with_weights(WeightsSource::Safetensors(path));
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::GraphConstructionError(
            GraphConstructionError::IncompatibleShapes { node_name, .. }
        )) if node_name == "block1_conv1_head"
    ));
}

#[test]
fn test_missing_layer_is_reported() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("partial.safetensors");
    let tensors: Vec<_> = trunk_tensors(0.5)
        .into_iter()
        .filter(|(name, _)| !name.starts_with("block2_sepconv1."))
        .collect();
    write_safetensors(&path, &tensors);

    let config =
        small_config(1, "R").with_weights(WeightsSource::Safetensors(path));
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::GraphConstructionError(
            GraphConstructionError::ParameterLoaderError(
                ParameterLoaderError::SubtreeNotFound(prefix)
            )
        )) if prefix == "block2_sepconv1"
    ));
}

#[test]
fn test_missing_file_fails_the_build() {
    let directory = tempfile::tempdir().unwrap();
    let config = small_config(1, "R").with_weights(WeightsSource::Safetensors(
        directory.path().join("absent.safetensors"),
    ));
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::ParameterLoaderError(_))
    ));
}
