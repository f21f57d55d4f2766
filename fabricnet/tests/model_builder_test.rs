mod common;

use common::{build_small, consumers, node, small_config};
use fabricnet::{
    LossKind, ModelBuildError, build_model,
    config::{ConfigError, Metric, OptimizerConfig},
    descriptor::DescriptorError,
    graph::{GraphConstructionError, Layer},
    trunk::{FLOWS_BREAK_INDEX, TRUNK_SUFFIX},
};

#[test]
fn test_output_length_matches_classes() {
    for classes in 1..=4 {
        let model = build_small(classes, "S16,3,2_R_D_S32,3,2_R_D");
        assert_eq!(model.output_len(), classes);
        let flattens = model
            .graph()
            .nodes()
            .iter()
            .filter(|node| node.layer == Layer::Flatten)
            .count();
        assert_eq!(flattens, classes);
    }
}

#[test]
fn test_repeated_builds_are_identical() {
    let config = small_config(3, "S8,3,1_N_S8,3,1_R_P2");
    let first = build_model(&config).unwrap();
    let second = build_model(&config).unwrap();
    let first_names: Vec<&str> = first.graph().names().collect();
    let second_names: Vec<&str> = second.graph().names().collect();
    assert_eq!(first_names, second_names);
    assert_eq!(first.parameter_count(), second.parameter_count());
    assert_eq!(first.summary(), second.summary());
}

#[test]
fn test_invalid_flows_fail_before_construction() {
    for flows in [0, 10] {
        let config = small_config(2, "").with_flows(flows);
        assert!(matches!(
            build_model(&config),
            Err(ModelBuildError::ConfigError(
                ConfigError::FlowsOutOfRange(f)
            )) if f == flows
        ));
    }
}

#[test]
fn test_unsupported_loss_is_rejected() {
    assert!(matches!(
        "mse".parse::<LossKind>(),
        Err(ConfigError::UnsupportedLoss(loss)) if loss == "mse"
    ));
    let json = r#"{"input_shape": [32, 32, 3], "classes": 2, "loss": "mse"}"#;
    assert!(fabricnet::ModelConfig::from_json_str(json).is_err());
}

#[test]
fn test_malformed_ensemble_fails_the_build() {
    let config = small_config(2, "S8,3,1_X_R");
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::DescriptorError(DescriptorError::AtPosition {
            position: 1,
            ..
        }))
    ));
}

#[test]
fn test_collapsing_branch_is_a_shape_error() {
    // Features are 2 x 2; a 4 x 4 pool leaves nothing.
    let config = small_config(1, "P4");
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::GraphConstructionError(_))
    ));
}

#[test]
fn test_oversized_kernel_is_a_size_error() {
    let config = small_config(1, "S8,4294967296,1");
    assert!(matches!(
        build_model(&config),
        Err(ModelBuildError::GraphConstructionError(
            GraphConstructionError::SizeOverflow { node_name }
        )) if node_name == "sepconv2d_d0_c0"
    ));
}

#[test]
fn test_fallback_topology_for_every_class() {
    for classes in [1, 3] {
        let model = build_small(classes, "");
        let graph = model.graph();
        for class in 0..classes {
            let sequence = [
                (format!("sepconv2d_d1_c{class}"), Some(16)),
                (format!("ReLU_d1_c{class}"), None),
                (format!("sepconv2d_d2_c{class}"), Some(8)),
                (format!("ReLU_d2_c{class}"), None),
                (format!("flatten_{class}"), None),
            ];
            for window in sequence.windows(2) {
                assert_eq!(
                    consumers(graph, &window[0].0),
                    vec![window[1].0.clone()]
                );
            }
            for (name, filters) in &sequence {
                if let Some(filters) = filters {
                    assert!(matches!(
                        node(graph, name).layer,
                        Layer::SeparableConv2D {
                            filters: f,
                            kernel_size: 3,
                            stride: 2,
                            ..
                        } if f == *filters
                    ));
                }
            }
            assert_eq!(
                node(graph, &format!("sepconv2d_d1_c{class}")).inputs.as_ref(),
                &[model.trunk().features]
            );
        }
    }
}

#[test]
fn test_fallback_branch_parameter_count() {
    let classes = 2;
    let model = build_small(classes, "");
    let graph = model.graph();
    let trunk_parameters: usize = model
        .trunk()
        .layers
        .iter()
        .map(|layer| graph.node(layer.id).unwrap().parameter_count)
        .sum();
    // sepconv 16 on 728 channels, sepconv 8 on 16, dense on 8 features
    let branch = (9 * 728 + 728 * 16 + 16) + (9 * 16 + 16 * 8 + 8) + (8 + 1);
    assert_eq!(model.parameter_count(), trunk_parameters + classes * branch);
}

#[test]
fn test_trunk_layers_are_suffixed() {
    for flows in [1, 4, 9] {
        let config = small_config(1, "R").with_flows(flows);
        let model = build_model(&config).unwrap();
        let trunk = model.trunk();
        assert_eq!(trunk.layers.len(), FLOWS_BREAK_INDEX[flows - 1] + 1);
        let graph = model.graph();
        for layer in &trunk.layers {
            let name = &graph.node(layer.id).unwrap().name;
            assert_eq!(name, &format!("{}{TRUNK_SUFFIX}", layer.source_name));
        }
        assert_eq!(
            graph.node(trunk.features).unwrap().name,
            format!("block{}_sepconv1_act_head", flows + 4)
        );
        assert_eq!(graph.input().unwrap().name, "input_head");
    }
}

#[test]
fn test_branch_names_continue_generated_counters() {
    let model = build_small(2, "S8,3,1_N_S8,3,1");
    let graph = model.graph();
    // The full extractor has twelve adds and four unnamed batch norms.
    assert!(graph.node_by_name("add_12").is_some());
    assert!(graph.node_by_name("add_13").is_some());
    assert!(graph.node_by_name("batch_normalization_4").is_some());
    assert!(graph.node_by_name("batch_normalization_5").is_some());
    assert!(graph.node_by_name("add_3").is_none());
    assert!(graph.node_by_name("dense").is_some());
    assert!(graph.node_by_name("dense_1").is_some());
    assert_eq!(consumers(graph, "dense"), vec!["concatenate".to_string()]);
    assert_eq!(consumers(graph, "concatenate"), vec!["activation".to_string()]);
}

#[test]
fn test_compile_settings() {
    let config = small_config(2, "")
        .with_loss(LossKind::CategoricalCrossentropy)
        .with_learning_rate(0.01);
    let model = build_model(&config).unwrap();
    let compile = model.compile_config();
    assert_eq!(compile.loss, LossKind::CategoricalCrossentropy);
    assert_eq!(compile.optimizer, OptimizerConfig::adam(0.01));
    assert_eq!(compile.metrics, Metric::default_set());
    let output = model.graph().output().unwrap();
    assert_eq!(
        output.layer,
        Layer::Activation(fabricnet::config::OutputActivation::Softmax)
    );
}

#[test]
fn test_summary_lists_every_layer() {
    let model = build_small(1, "S8,3,1_R");
    let summary = model.summary();
    assert_eq!(summary.rows.len(), model.graph().len());
    assert_eq!(summary.total_parameters, model.parameter_count());
    let text = summary.to_string();
    assert!(text.contains("block1_conv1_head (Conv2D)"));
    assert!(text.contains("sepconv2d_d0_c0 (SeparableConv2D)"));
    assert!(text.contains(&format!("Total params: {}", model.parameter_count())));
}
