use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use srgraph_neural::onnx::{OnnxExport, OnnxFormat, OnnxModel};
use srgraph_neural::verify::{seeded_input, verify_cross_engine};
use srgraph_neural::{
    init_parameters, ConfigLoader, ParameterStore, PipelineConfig, ShuffleLowering,
    SuperResolutionConfig, SuperResolutionNet, WeightLoader,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "srgraph",
    version,
    about = "Sub-pixel super-resolution graph tooling",
    arg_required_else_help = true,
    after_help = "Examples:\n  srgraph init --upscale-factor 3 --output weights.safetensors\n  srgraph export --weights weights.safetensors --output model.onnx\n  srgraph verify --weights weights.safetensors --tolerance 1e-3\n  srgraph inspect --model model.onnx"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write orthogonally initialised parameters.
    Init(InitArgs),
    /// Export a network to an ONNX (.onnx) or JSON (.json) graph.
    Export(ExportArgs),
    /// Compare the native forward pass with the exported graph.
    Verify(VerifyArgs),
    /// Print the node list and inferred shapes of an exported graph.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
struct ModelArgs {
    /// Parameter file (.safetensors or .json).
    #[arg(short = 'w', long = "weights")]
    weights: PathBuf,

    /// Upscale factor; inferred from the weights when omitted.
    #[arg(short = 'r', long = "upscale-factor")]
    upscale_factor: Option<usize>,

    /// Pipeline configuration (.toml or .json).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(short = 'r', long = "upscale-factor", default_value_t = 3)]
    upscale_factor: usize,

    #[arg(long = "seed", default_value_t = 0)]
    seed: u64,

    /// Destination (.safetensors or .json).
    #[arg(short = 'o', long = "output")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Destination; `.json` writes JSON, anything else protobuf, unless
    /// `--format` or the config's `export.format` says otherwise.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    #[arg(long = "format", value_enum)]
    format: Option<FormatArg>,

    #[arg(long = "height", default_value_t = 224)]
    height: usize,

    #[arg(long = "width", default_value_t = 224)]
    width: usize,

    #[arg(long = "lowering", value_enum)]
    lowering: Option<LoweringArg>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[command(flatten)]
    model: ModelArgs,

    #[arg(long = "height")]
    height: Option<usize>,

    #[arg(long = "width")]
    width: Option<usize>,

    /// Seed of the synthetic input.
    #[arg(long = "seed")]
    seed: Option<u64>,

    /// Largest accepted absolute difference.
    #[arg(long = "tolerance")]
    tolerance: Option<f32>,

    /// Check a single lowering instead of both.
    #[arg(long = "lowering", value_enum)]
    lowering: Option<LoweringArg>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Exported graph (.onnx or .json).
    #[arg(short = 'm', long = "model")]
    model: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LoweringArg {
    ReshapeTranspose,
    DepthToSpace,
}

impl From<LoweringArg> for ShuffleLowering {
    fn from(arg: LoweringArg) -> Self {
        match arg {
            LoweringArg::ReshapeTranspose => ShuffleLowering::ReshapeTranspose,
            LoweringArg::DepthToSpace => ShuffleLowering::DepthToSpace,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Onnx,
    Json,
}

impl From<FormatArg> for OnnxFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Onnx => OnnxFormat::Protobuf,
            FormatArg::Json => OnnxFormat::Json,
        }
    }
}

/// Returned when the engines disagree, as opposed to failing to run.
const EXIT_DIVERGED: u8 = 2;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => run_init(args).map(|()| true),
        Commands::Export(args) => run_export(args).map(|()| true),
        Commands::Verify(args) => run_verify(args),
        Commands::Inspect(args) => run_inspect(args).map(|()| true),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_DIVERGED),
        Err(err) => {
            error!("command failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let ansi_enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_ansi(ansi_enabled)
        .init();
}

fn run_init(args: InitArgs) -> Result<()> {
    let config = SuperResolutionConfig::new(args.upscale_factor);
    let params = init_parameters(&config, args.seed).context("failed to initialise parameters")?;
    WeightLoader::new()
        .save_to_file(&params, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "wrote {} tensors ({} values) to {}",
        params.len(),
        params.num_elements(),
        args.output.display()
    );
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let (net, mut config) = load_network(&args.model)?;
    if let Some(lowering) = args.lowering {
        config.export.shuffle_lowering = lowering.into();
    }
    if let Some(format) = args.format {
        config.export.format = Some(format.into());
    }
    let format = config.export.format_for(&args.output);

    let model = net
        .to_onnx_with_config(&[1, 1, args.height, args.width], &config.export)
        .context("export failed")?;
    model
        .save_to_file(&args.output, format)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "exported {} nodes to {} ({format:?})",
        model.graph.nodes.len(),
        args.output.display()
    );
    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<bool> {
    let (net, config) = load_network(&args.model)?;
    let mut verification = config.verification;
    if let Some(height) = args.height {
        verification.input_height = height;
    }
    if let Some(width) = args.width {
        verification.input_width = width;
    }
    if let Some(seed) = args.seed {
        verification.seed = seed;
    }
    if let Some(tolerance) = args.tolerance {
        verification.tolerance = tolerance;
    }
    verification.validate().context("invalid verification settings")?;

    let lowerings = match args.lowering {
        Some(lowering) => vec![lowering.into()],
        None => vec![ShuffleLowering::ReshapeTranspose, ShuffleLowering::DepthToSpace],
    };

    let input = seeded_input(&verification.input_shape(), verification.seed);
    let mut all_passed = true;
    for lowering in lowerings {
        let export = config.export.clone().with_lowering(lowering);
        let report = verify_cross_engine(&net, &input, &export, verification.tolerance)
            .with_context(|| format!("cross-engine check failed to run ({lowering:?})"))?;
        let verdict = if report.passed { "ok" } else { "DIVERGED" };
        println!("{lowering:?}: {verdict}: {report}");
        all_passed &= report.passed;
    }
    Ok(all_passed)
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let model = OnnxModel::from_file(&args.model)
        .with_context(|| format!("failed to read {}", args.model.display()))?;
    let topology = model.graph.topology().context("graph is not well formed")?;

    println!(
        "{} (ir {}, opset {}, producer {})",
        model.graph.name, model.ir_version, model.opset_version, model.producer_name
    );
    for input in &model.graph.inputs {
        println!("input  {} {:?}", input.name, input.shape);
    }
    for node in &topology {
        println!("  {node}");
    }
    for output in &model.graph.outputs {
        println!("output {} {:?}", output.name, output.shape);
    }
    let parameters: usize = model
        .graph
        .initializers
        .iter()
        .filter_map(|t| t.shape().ok())
        .map(|dims| dims.iter().product::<usize>())
        .sum();
    println!(
        "{} nodes, {} initializers, {parameters} values",
        topology.len(),
        model.graph.initializers.len()
    );
    Ok(())
}

fn load_network(args: &ModelArgs) -> Result<(SuperResolutionNet, PipelineConfig)> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::new()
            .load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let params = load_weights(&args.weights)?;
    let upscale_factor = match args.upscale_factor {
        Some(r) => r,
        None => infer_upscale_factor(&params).unwrap_or(config.model.upscale_factor),
    };
    config.model.upscale_factor = upscale_factor;

    let net = SuperResolutionNet::new(config.model, &params)
        .with_context(|| format!("weights do not fit an upscale factor {upscale_factor} network"))?;
    info!(upscale_factor, weights = %args.weights.display(), "network ready");
    Ok((net, config))
}

fn load_weights(path: &Path) -> Result<ParameterStore> {
    let result = WeightLoader::new()
        .load_from_file(path)
        .with_context(|| format!("failed to load weights {}", path.display()))?;
    if !result.is_success() {
        bail!("{} contains no tensors", path.display());
    }
    Ok(result.into_store())
}

/// `conv4` emits `r²` channels
fn infer_upscale_factor(params: &ParameterStore) -> Option<usize> {
    let channels = *params.get("conv4.weight")?.dims().first()?;
    let r = (channels as f64).sqrt().round() as usize;
    (r * r == channels).then_some(r)
}
