use srgraph_core::{Result, Tensor};
use srgraph_neural::init::init_parameters;
use srgraph_neural::verify::seeded_input;
use srgraph_neural::{
    LoadConfig, ParameterStore, SuperResolutionConfig, SuperResolutionNet, WeightLoader,
};

#[test]
fn test_safetensors_round_trip_rebuilds_same_network() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.safetensors");
    let config = SuperResolutionConfig::new(3);
    let original = SuperResolutionNet::initialized(config, 21)?;

    WeightLoader::new().save_to_file(&original.parameter_store(), &path)?;
    let loaded = WeightLoader::new().load_from_file(&path)?;
    assert_eq!(loaded.num_loaded, 8);
    assert_eq!(loaded.num_skipped, 0);
    assert_eq!(loaded.total_bytes, loaded.weights.num_elements() * 4);

    let restored = SuperResolutionNet::new(config, &loaded.weights)?;
    let input = seeded_input(&[1, 1, 10, 10], 0);
    assert_eq!(restored.forward(&input)?, original.forward(&input)?);
    Ok(())
}

#[test]
fn test_json_round_trip() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    let params = init_parameters(&SuperResolutionConfig::new(2), 4)?;

    WeightLoader::new().save_to_file(&params, &path)?;
    let loaded = WeightLoader::new().load_from_file(&path)?.into_store();
    assert_eq!(loaded, params);
    Ok(())
}

#[test]
fn test_prefixed_checkpoint_with_extra_tensors() -> Result<()> {
    // A checkpoint written by a training job: parameters under a "model."
    // prefix alongside optimizer state the network does not use.
    let config = SuperResolutionConfig::new(2);
    let mut checkpoint = ParameterStore::new();
    for (name, tensor) in init_parameters(&config, 9)? {
        checkpoint.insert(format!("model.{name}"), tensor);
    }
    checkpoint.insert("optimizer.step", Tensor::from_scalar(100.0));

    let loader = WeightLoader::new();
    let bytes = loader.to_safetensors_bytes(&checkpoint)?;

    let load_config = LoadConfig::new()
        .include("model.".to_string())
        .with_mapping("model.conv1.weight".to_string(), "conv1.weight".to_string());
    let result = loader.load_safetensors_bytes(&bytes, &load_config)?;
    assert_eq!(result.num_loaded, 8);
    assert_eq!(result.num_skipped, 1);
    assert!(result.get("conv1.weight").is_some());
    assert!(result.get("model.conv2.weight").is_some());
    Ok(())
}

#[test]
fn test_missing_tensor_in_file_is_parameter_error() -> Result<()> {
    let config = SuperResolutionConfig::new(3);
    let mut params = init_parameters(&config, 0)?;
    params.remove("conv2.weight");

    let loader = WeightLoader::new();
    let bytes = loader.to_safetensors_bytes(&params)?;
    let loaded = loader.load_safetensors_bytes(&bytes, loader.config())?;

    let err = SuperResolutionNet::new(config, &loaded.weights).unwrap_err();
    assert!(err.is_parameter_error());
    assert_eq!(err.operation(), "conv2.weight");
    Ok(())
}

#[test]
fn test_unknown_extension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.bin");
    assert!(WeightLoader::new()
        .save_to_file(&ParameterStore::new(), &path)
        .is_err());
    assert!(WeightLoader::new().load_from_file(&path).is_err());
}
