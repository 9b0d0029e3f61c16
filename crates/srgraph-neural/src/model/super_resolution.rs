//! Sub-pixel convolutional super-resolution network
//!
//! A fixed pipeline of four convolutions followed by a pixel shuffle, mapping
//! a luminance tensor `(N, 1, H, W)` to `(N, 1, H·r, W·r)`:
//!
//! | stage   | op           | channels | kernel | pad | activation |
//! |---------|--------------|----------|--------|-----|------------|
//! | conv1   | Conv2D       | 1 → 64   | 5×5    | 2   | ReLU       |
//! | conv2   | Conv2D       | 64 → 64  | 3×3    | 1   | ReLU       |
//! | conv3   | Conv2D       | 64 → 32  | 3×3    | 1   | ReLU       |
//! | conv4   | Conv2D       | 32 → r²  | 3×3    | 1   | none       |
//! | shuffle | PixelShuffle | r² → 1   |        |     |            |
//!
//! The table is static ([`stage_descriptors`]); exporters and the network
//! itself both read from it, so there is no tracing step.

use crate::config::SuperResolutionConfig;
use crate::layers::{Conv2D, ConvSpec, Layer, PixelShuffle, ReLU};
use crate::model::Model;
use crate::serialization::ParameterStore;
use srgraph_core::{Result, Tensor, TensorError};
use tracing::{debug, info, warn};

/// Operation performed by a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Conv(ConvSpec),
    PixelShuffle { upscale_factor: usize },
}

/// One row of the static pipeline table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDescriptor {
    pub name: &'static str,
    pub kind: StageKind,
    /// Whether a ReLU follows the operation
    pub relu: bool,
}

/// The pipeline for upscale factor `r`
pub fn stage_descriptors(upscale_factor: usize) -> [StageDescriptor; 5] {
    let r = upscale_factor;
    [
        StageDescriptor {
            name: "conv1",
            kind: StageKind::Conv(ConvSpec::same(1, 64, 5)),
            relu: true,
        },
        StageDescriptor {
            name: "conv2",
            kind: StageKind::Conv(ConvSpec::same(64, 64, 3)),
            relu: true,
        },
        StageDescriptor {
            name: "conv3",
            kind: StageKind::Conv(ConvSpec::same(64, 32, 3)),
            relu: true,
        },
        StageDescriptor {
            name: "conv4",
            kind: StageKind::Conv(ConvSpec::same(32, r * r, 3)),
            relu: false,
        },
        StageDescriptor {
            name: "pixel_shuffle",
            kind: StageKind::PixelShuffle { upscale_factor: r },
            relu: false,
        },
    ]
}

/// Output of one stage, after its activation
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub name: &'static str,
    pub tensor: Tensor<f32>,
}

#[derive(Debug, Clone)]
struct ConvStage {
    descriptor: StageDescriptor,
    conv: Conv2D<f32>,
    activation: Option<ReLU>,
}

/// Super-resolution network with bound parameters
///
/// Construction reads all eight parameters (`conv{1..4}.{weight,bias}`) from a
/// [`ParameterStore`] and fails immediately if any is missing or mis-shaped.
/// After that the network is immutable: [`forward`](Self::forward) is a pure
/// function of the input and the model can be shared across threads.
#[derive(Debug, Clone)]
pub struct SuperResolutionNet {
    config: SuperResolutionConfig,
    convs: Vec<ConvStage>,
    shuffle: PixelShuffle,
}

impl SuperResolutionNet {
    pub fn new(config: SuperResolutionConfig, parameters: &ParameterStore) -> Result<Self> {
        config.validate()?;
        let r = config.upscale_factor;

        let mut convs = Vec::with_capacity(4);
        let mut expected_names = Vec::with_capacity(8);
        for descriptor in stage_descriptors(r) {
            let StageKind::Conv(spec) = descriptor.kind else {
                continue;
            };
            let weight_name = format!("{}.weight", descriptor.name);
            let bias_name = format!("{}.bias", descriptor.name);

            let weight = parameters.require(&weight_name, &spec.weight_shape())?.clone();
            let bias = parameters.require(&bias_name, &spec.bias_shape())?.clone();
            let conv = Conv2D::from_parameters(descriptor.name, spec, weight, bias)?;

            convs.push(ConvStage {
                descriptor,
                conv,
                activation: descriptor
                    .relu
                    .then(|| ReLU::new(format!("{}.relu", descriptor.name))),
            });
            expected_names.push(weight_name);
            expected_names.push(bias_name);
        }

        for name in parameters.names() {
            if !expected_names.iter().any(|n| n == name) {
                warn!(parameter = name, "ignoring parameter not used by the network");
            }
        }

        info!(upscale_factor = r, "built super-resolution network");
        Ok(Self {
            config,
            convs,
            shuffle: PixelShuffle::new("pixel_shuffle", r),
        })
    }

    /// Build with freshly initialised parameters
    pub fn initialized(config: SuperResolutionConfig, seed: u64) -> Result<Self> {
        let parameters = crate::init::init_parameters(&config, seed)?;
        Self::new(config, &parameters)
    }

    pub fn config(&self) -> &SuperResolutionConfig {
        &self.config
    }

    pub fn upscale_factor(&self) -> usize {
        self.config.upscale_factor
    }

    /// The static stage table for this network
    pub fn stages(&self) -> [StageDescriptor; 5] {
        stage_descriptors(self.config.upscale_factor)
    }

    /// The four convolution layers in order
    pub fn conv_layers(&self) -> impl Iterator<Item = (&StageDescriptor, &Conv2D<f32>)> {
        self.convs.iter().map(|s| (&s.descriptor, &s.conv))
    }

    /// Copy of all parameters under their canonical names
    pub fn parameter_store(&self) -> ParameterStore {
        let mut store = ParameterStore::new();
        for stage in &self.convs {
            store.insert(format!("{}.weight", stage.descriptor.name), stage.conv.weight().clone());
            store.insert(format!("{}.bias", stage.descriptor.name), stage.conv.bias().clone());
        }
        store
    }

    /// Shape of the output for a given input shape, without computing it
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>> {
        let (n, c, h, w) = check_input_shape(input_shape)?;
        if c != 1 {
            return Err(TensorError::shape_error("conv1", 1, c));
        }
        let r = self.config.upscale_factor;
        Ok(vec![n, 1, h * r, w * r])
    }

    pub fn forward(&self, input: &Tensor<f32>) -> Result<Tensor<f32>> {
        check_input_shape(input.dims())?;
        let mut x = self.run_conv(&self.convs[0], input)?;
        for stage in &self.convs[1..] {
            x = self.run_conv(stage, &x)?;
        }
        self.shuffle.forward(&x)
    }

    /// Run the pipeline and keep every stage's output
    ///
    /// Entries are in stage order; the last one is the network output.
    pub fn forward_with_intermediates(&self, input: &Tensor<f32>) -> Result<Vec<StageOutput>> {
        check_input_shape(input.dims())?;
        let mut outputs: Vec<StageOutput> = Vec::with_capacity(self.convs.len() + 1);
        for stage in &self.convs {
            let x = outputs.last().map_or(input, |o| &o.tensor);
            let tensor = self.run_conv(stage, x)?;
            outputs.push(StageOutput {
                name: stage.descriptor.name,
                tensor,
            });
        }

        let last = outputs.last().map_or(input, |o| &o.tensor);
        let tensor = self.shuffle.forward(last)?;
        outputs.push(StageOutput {
            name: "pixel_shuffle",
            tensor,
        });
        Ok(outputs)
    }

    fn run_conv(&self, stage: &ConvStage, input: &Tensor<f32>) -> Result<Tensor<f32>> {
        let mut x = stage.conv.forward(input)?;
        if let Some(relu) = &stage.activation {
            x = relu.forward(&x)?;
        }
        debug!(stage = stage.descriptor.name, shape = ?x.dims(), "stage complete");
        Ok(x)
    }
}

fn check_input_shape(dims: &[usize]) -> Result<(usize, usize, usize, usize)> {
    match *dims {
        [n, c, h, w] if n > 0 && h > 0 && w > 0 => Ok((n, c, h, w)),
        _ => Err(TensorError::invalid_shape(
            "super_resolution",
            "expected a non-empty (N, 1, H, W) tensor",
            dims,
        )),
    }
}

impl Model<f32> for SuperResolutionNet {
    fn forward(&self, input: &Tensor<f32>) -> Result<Tensor<f32>> {
        SuperResolutionNet::forward(self, input)
    }

    fn parameters(&self) -> Vec<&Tensor<f32>> {
        self.convs
            .iter()
            .flat_map(|s| Layer::<f32>::parameters(&s.conv))
            .collect()
    }

    fn extract_features(&self, input: &Tensor<f32>) -> Result<Option<Vec<Tensor<f32>>>> {
        let outputs = self.forward_with_intermediates(input)?;
        Ok(Some(outputs.into_iter().map(|o| o.tensor).collect()))
    }
}
