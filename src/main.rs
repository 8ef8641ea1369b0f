use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use clip_prep::core::ClipTransformer;
use clip_prep::dataset;
use clip_prep::logging::init_logging;
use clip_prep::{BackendKind, PrepConfig, Size};

#[derive(Parser)]
#[command(author, version, about = "Prepare labeled video clips for classifier training", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split the source folders and write context/fovea clips for every clip
    Prepare {
        #[command(flatten)]
        dataset: DatasetArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        jobs: Option<usize>,
        #[arg(short, long, value_enum, default_value_t = BackendKind::Ffmpeg)]
        backend: BackendKind,
        /// Keep the downsampled, -center and -gray intermediates
        #[arg(long, default_value_t = false)]
        keep_intermediates: bool,
    },
    /// Print the train/test split that `prepare` would use, without processing
    Split {
        #[command(flatten)]
        dataset: DatasetArgs,
    },
    /// Print a clip's frame rate, frame count and geometry
    Probe {
        clip: PathBuf,
        #[arg(short, long, value_enum, default_value_t = BackendKind::Ffmpeg)]
        backend: BackendKind,
    },
    /// Run a single transform on one clip
    Transform {
        #[arg(short, long, value_enum, default_value_t = BackendKind::Ffmpeg, global = true)]
        backend: BackendKind,
        #[command(subcommand)]
        op: TransformOp,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(short, long)]
    seed: Option<u64>,
    #[arg(long)]
    test_fraction: Option<f64>,
}

#[derive(Subcommand)]
enum TransformOp {
    /// Reduce the frame rate with the every-second/third-frame policy
    Downsample {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = 20.0, value_parser = parse_fps)]
        fps: f64,
    },
    /// Convert to single-channel luma
    Grayscale { input: PathBuf, output: PathBuf },
    /// Centered crop, clamped to the source frame
    Crop {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
    },
    /// Area-interpolated resize
    Resize {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        width: u32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        height: u32,
    },
}

fn parse_fps(value: &str) -> std::result::Result<f64, String> {
    let fps: f64 = value.parse().map_err(|e| format!("{}", e))?;
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(format!("frame rate must be positive, got {}", value))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    match &cli.command {
        Commands::Prepare {
            dataset: args,
            output,
            jobs,
            backend,
            keep_intermediates,
        } => {
            let mut config = load_config(args)?;
            if let Some(output) = output {
                config.output_root = output.clone();
            }
            if let Some(jobs) = jobs {
                config.jobs = *jobs;
            }
            config.keep_intermediates |= *keep_intermediates;
            prepare(&config, *backend)?;
        }
        Commands::Split { dataset: args } => {
            let config = load_config(args)?;
            let plan = dataset::plan(&config).context("Failed to plan dataset split")?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Commands::Probe { clip, backend } => {
            let backend = backend.create()?;
            let info = backend
                .probe(clip)
                .with_context(|| format!("Failed to probe {}", clip.display()))?;
            println!("{}", json!({ "clip": clip, "info": info }));
        }
        Commands::Transform { backend, op } => {
            run_transform(*backend, op)?;
        }
    }

    Ok(())
}

fn load_config(args: &DatasetArgs) -> Result<PrepConfig> {
    let mut config = match &args.config {
        Some(path) => PrepConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PrepConfig::default(),
    };
    if let Some(input) = &args.input {
        config.input_root = input.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(fraction) = args.test_fraction {
        config.test_fraction = fraction;
    }
    config.validate()?;
    Ok(config)
}

fn prepare(config: &PrepConfig, backend: BackendKind) -> Result<()> {
    let backend = backend.create()?;
    let report = dataset::run(backend.as_ref(), config).context("Dataset preparation aborted")?;

    info!(
        seed = report.seed,
        clips = report.artifacts.len(),
        failed = report.failures.len(),
        "dataset ready in {}",
        config.output_root.display()
    );

    if !report.succeeded() {
        for failure in &report.failures {
            eprintln!("{} [{}/{}]: {}", failure.clip, failure.label, failure.split, failure.error);
        }
        anyhow::bail!("{} clip(s) failed", report.failures.len());
    }
    Ok(())
}

fn run_transform(backend: BackendKind, op: &TransformOp) -> Result<()> {
    let backend = backend.create()?;
    let transformer = ClipTransformer::new(backend.as_ref());

    let (input, stats) = match op {
        TransformOp::Downsample { input, output, fps } => (input, transformer.downsample(input, output, *fps)),
        TransformOp::Grayscale { input, output } => (input, transformer.grayscale(input, output)),
        TransformOp::Crop {
            input,
            output,
            width,
            height,
        } => (input, transformer.crop(input, Size::new(*width, *height), output)),
        TransformOp::Resize {
            input,
            output,
            width,
            height,
        } => (input, transformer.resize(input, Size::new(*width, *height), output)),
    };

    let stats = stats.with_context(|| format!("Transform failed for {}", input.display()))?;
    println!("{}", serde_json::to_string(&stats)?);
    Ok(())
}
