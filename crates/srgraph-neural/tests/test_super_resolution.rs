use srgraph_core::{Result, Tensor, TensorError};
use srgraph_neural::init::init_parameters;
use srgraph_neural::verify::seeded_input;
use srgraph_neural::{Model, ParameterStore, SuperResolutionConfig, SuperResolutionNet};

fn net(r: usize) -> SuperResolutionNet {
    SuperResolutionNet::initialized(SuperResolutionConfig::new(r), 42).unwrap()
}

#[test]
fn test_shape_law() -> Result<()> {
    for (r, n, h, w) in [(1, 1, 5, 7), (2, 2, 6, 4), (3, 1, 9, 11), (4, 3, 3, 2)] {
        let input = seeded_input(&[n, 1, h, w], r as u64);
        let output = net(r).forward(&input)?;
        assert_eq!(output.dims(), &[n, 1, h * r, w * r], "r = {r}");
    }
    Ok(())
}

#[test]
fn test_upscale_three_at_224() -> Result<()> {
    let net = net(3);
    let conv4 = net.conv_layers().last().map(|(_, conv)| conv.spec()).unwrap();
    assert_eq!(conv4.out_channels, 9);

    let output = net.forward(&seeded_input(&[1, 1, 224, 224], 0))?;
    assert_eq!(output.dims(), &[1, 1, 672, 672]);
    assert!(output.is_finite());
    Ok(())
}

#[test]
fn test_forward_is_deterministic() -> Result<()> {
    let net = net(3);
    let input = seeded_input(&[2, 1, 16, 12], 3);
    let first = net.forward(&input)?;
    let second = net.forward(&input)?;
    let bits = |t: &Tensor<f32>| t.to_vec().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));

    // A second network built from the same seed computes the same thing.
    let rebuilt = SuperResolutionNet::initialized(SuperResolutionConfig::new(3), 42)?;
    assert_eq!(bits(&rebuilt.forward(&input)?), bits(&first));
    Ok(())
}

#[test]
fn test_relu_law() -> Result<()> {
    let net = net(3);
    // Negative inputs make a negative conv4 output overwhelmingly likely.
    let input = Tensor::from_array(seeded_input(&[1, 1, 20, 20], 8).array().mapv(|v| v - 0.5));
    let stages = net.forward_with_intermediates(&input)?;

    let names: Vec<_> = stages.iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["conv1", "conv2", "conv3", "conv4", "pixel_shuffle"]);
    for stage in &stages[..3] {
        assert!(stage.tensor.all_non_negative(), "{} has negatives", stage.name);
    }
    assert!(!stages[3].tensor.all_non_negative());
    assert_eq!(stages[3].tensor.dims(), &[1, 9, 20, 20]);

    let direct = net.forward(&input)?;
    assert_eq!(stages[4].tensor, direct);

    let features = net.extract_features(&input)?.unwrap();
    assert_eq!(features.len(), 5);
    Ok(())
}

#[test]
fn test_wrong_channel_count_is_shape_error() {
    let input = Tensor::<f32>::zeros(&[1, 3, 8, 8]);
    match net(2).forward(&input) {
        Err(TensorError::ShapeError {
            layer,
            expected,
            actual,
        }) => {
            assert_eq!(layer, "conv1");
            assert_eq!(expected, 1);
            assert_eq!(actual, 3);
        }
        other => panic!("expected ShapeError, got {other:?}"),
    }
}

#[test]
fn test_missing_parameter_fails_construction() {
    let config = SuperResolutionConfig::new(3);
    let mut params = init_parameters(&config, 0).unwrap();
    params.remove("conv3.bias");

    match SuperResolutionNet::new(config, &params) {
        Err(TensorError::ParameterError { parameter, .. }) => assert_eq!(parameter, "conv3.bias"),
        other => panic!("expected ParameterError, got {other:?}"),
    }
}

#[test]
fn test_misshapen_parameter_fails_construction() {
    let config = SuperResolutionConfig::new(3);
    let mut params = init_parameters(&config, 0).unwrap();
    // r = 2 weights for conv4 do not fit an r = 3 network.
    params.insert("conv4.weight", Tensor::zeros(&[4, 32, 3, 3]));

    let err = SuperResolutionNet::new(config, &params).unwrap_err();
    assert!(err.is_parameter_error());
    assert_eq!(err.operation(), "conv4.weight");
}

#[test]
fn test_non_finite_parameter_rejected() {
    let config = SuperResolutionConfig::new(2);
    let mut params = init_parameters(&config, 0).unwrap();
    params.insert("conv1.bias", Tensor::full(&[64], f32::NAN));
    assert!(SuperResolutionNet::new(config, &params)
        .unwrap_err()
        .is_parameter_error());
}

#[test]
fn test_zero_upscale_factor_rejected() {
    assert!(SuperResolutionNet::new(SuperResolutionConfig::new(0), &ParameterStore::new()).is_err());
}

#[test]
fn test_parameter_store_round_trip() -> Result<()> {
    let net = net(2);
    let store = net.parameter_store();
    assert_eq!(store.len(), 8);
    assert_eq!(store.num_elements(), net.parameters().iter().map(|p| p.numel()).sum::<usize>());

    let rebuilt = SuperResolutionNet::new(*net.config(), &store)?;
    let input = seeded_input(&[1, 1, 6, 6], 1);
    assert_eq!(rebuilt.forward(&input)?, net.forward(&input)?);
    Ok(())
}

#[test]
fn test_model_is_shareable_across_threads() {
    let net = net(2);
    let input = seeded_input(&[1, 1, 8, 8], 4);
    let expected = net.forward(&input).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| net.forward(&input).unwrap())).collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
