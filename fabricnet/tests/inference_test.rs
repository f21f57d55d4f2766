mod common;

use common::{build_small, consumers, node, random_batch};
use fabricnet::{LossKind, build_model, graph::Layer};
use is_close::is_close;
use ndarray::Array2;

#[test]
fn test_predictions_have_one_column_per_class() {
    let model = build_small(3, "S16,3,2_R_D_S32,3,2_R_D");
    let output = model.predict(random_batch(2, 0).view()).unwrap();
    assert_eq!(output.dim(), (2, 3));
    assert!(output.iter().all(|value| (0.0..=1.0).contains(value)));
}

#[test]
fn test_softmax_outputs_sum_to_one() {
    let config = common::small_config(4, "S8,3,1_R")
        .with_loss(LossKind::CategoricalCrossentropy);
    let model = build_model(&config).unwrap();
    let output = model.predict(random_batch(3, 1).view()).unwrap();
    for row in output.rows() {
        assert!(is_close!(row.sum(), 1.0, abs_tol = 1e-5));
    }
}

#[test]
fn test_predictions_are_deterministic() {
    let batch = random_batch(2, 5);
    let first = build_small(2, "S8,3,1_N_R").predict(batch.view()).unwrap();
    let second = build_small(2, "S8,3,1_N_R").predict(batch.view()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_equal_channels_sum_with_previous_convolution() {
    let model = build_small(1, "S8,3,1_S8,3,1");
    let graph = model.graph();
    let add_name = consumers(graph, "sepconv2d_d1_c0");
    assert_eq!(add_name.len(), 1);
    let add = node(graph, &add_name[0]);
    assert_eq!(add.layer, Layer::Add);
    assert_eq!(consumers(graph, &add.name), vec!["flatten_0".to_string()]);

    let trace = model.predict_trace(random_batch(2, 3).view()).unwrap();
    let first = trace.by_name(graph, "sepconv2d_d0_c0").unwrap();
    let second = trace.by_name(graph, "sepconv2d_d1_c0").unwrap();
    let sum = trace.get(add.id).unwrap();
    for ((a, b), total) in first.iter().zip(second.iter()).zip(sum.iter()) {
        assert!(is_close!(a + b, *total, abs_tol = 1e-5));
    }
}

#[test]
fn test_unequal_channels_skip_the_residual() {
    let model = build_small(1, "S8,3,1_S16,3,1");
    let graph = model.graph();
    assert_eq!(
        consumers(graph, "sepconv2d_d1_c0"),
        vec!["flatten_0".to_string()]
    );
    let branch_adds = graph
        .nodes()
        .iter()
        .filter(|node| {
            node.layer == Layer::Add && !node.name.ends_with("_head")
        })
        .count();
    assert_eq!(branch_adds, 0);
}

#[test]
fn test_residual_chains_through_successive_convolutions() {
    let model = build_small(1, "S8,3,1_S8,3,1_R_S8,3,1");
    let graph = model.graph();
    let first_add = consumers(graph, "sepconv2d_d1_c0");
    assert_eq!(first_add.len(), 1);
    let second_add = consumers(graph, "sepconv2d_d3_c0");
    assert_eq!(second_add.len(), 1);
    // The second sum reuses the first sum, not the raw convolution.
    let second = node(graph, &second_add[0]);
    assert_eq!(second.inputs[1], node(graph, &first_add[0]).id);
}

#[test]
fn test_evaluate_loss() {
    let model = build_small(2, "S8,3,1_R");
    let batch = random_batch(2, 9);
    let predictions = model.predict(batch.view()).unwrap();
    let targets =
        Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let loss = model.evaluate_loss(batch.view(), targets.view()).unwrap();
    let expected = LossKind::BinaryCrossentropy
        .compute(predictions.view(), targets.view())
        .unwrap();
    assert!(is_close!(loss, expected));
    assert!(loss > 0.0);

    let wrong = Array2::<f32>::zeros((2, 3));
    assert!(model.evaluate_loss(batch.view(), wrong.view()).is_err());
}
