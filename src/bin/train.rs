//! `semicrf-train` — the learner entry point (§6.3): training data, an
//! optional initial weight file, and an output weight path, driven by the
//! configured optimizer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use semi_crf::config::{self, TrainingConfig};
use semi_crf::corpus;
use semi_crf::driver::{Learner, LearnerConfig};
use semi_crf::flags::Flags;
use semi_crf::weights::Weights;
use semi_crf::CrfError;

#[derive(Parser, Debug)]
#[command(name = "semicrf-train")]
#[command(about = "Train a Semi-Markov CRF model from a labeled corpus")]
#[command(version)]
struct CliArgs {
    /// Path to the training corpus (JSON, §6.2), with ground-truth segments.
    #[arg(long)]
    data: PathBuf,

    /// Path to write the trained weight file (§4.7/§6.1).
    #[arg(long)]
    output: PathBuf,

    /// Optional initial weight file to warm-start training from.
    #[arg(long)]
    init_weights: Option<PathBuf>,

    /// Optional TOML hyperparameter file; falls back to built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optimizer name: "bfgs" or "steepest_decent".
    #[arg(long)]
    optimizer: Option<String>,

    /// Initial optimizer step size.
    #[arg(long)]
    e0: Option<f64>,

    /// Maximum segment duration considered at any position.
    #[arg(long)]
    max_length: Option<usize>,

    /// L2 regularization coefficient.
    #[arg(long)]
    l2: Option<f64>,

    /// Maximum optimizer iterations.
    #[arg(long)]
    max_iteration: Option<usize>,

    #[arg(long)]
    disable_wg_cache: bool,

    #[arg(long)]
    disable_regularization: bool,

    #[arg(long)]
    disable_adagrad: bool,

    /// Compute the regularized log-likelihood once and stop, skipping
    /// optimization entirely.
    #[arg(long)]
    likelihood_only: bool,

    #[arg(long)]
    disable_date_version: bool,
}

fn run(args: CliArgs) -> Result<(), CrfError> {
    let training_config = TrainingConfig::load(args.config.as_deref())?;
    config::init(training_config.clone());

    let mut flags = Flags::empty();
    flags.set(
        Flags::DISABLE_WG_CACHE,
        args.disable_wg_cache || training_config.disable_wg_cache,
    );
    flags.set(
        Flags::DISABLE_REGULARIZATION,
        args.disable_regularization || training_config.disable_regularization,
    );
    flags.set(
        Flags::DISABLE_ADAGRAD,
        args.disable_adagrad || training_config.disable_adagrad,
    );
    flags.set(Flags::ENABLE_LIKELIHOOD_ONLY, args.likelihood_only);
    flags.set(Flags::DISABLE_DATE_VERSION, args.disable_date_version);

    if !flags.has(Flags::DISABLE_DATE_VERSION) {
        info!("semicrf 0.1.0");
    }

    let dataset = corpus::load(&args.data, true)
        .map_err(|e| CrfError::Input(format!("failed to load training data: {e}")))?;

    let initial_weights = args
        .init_weights
        .as_deref()
        .map(Weights::load)
        .transpose()?;

    let learner_config = LearnerConfig {
        optimizer_name: args
            .optimizer
            .unwrap_or_else(|| training_config.optimizer.clone()),
        e0: args.e0.unwrap_or(training_config.e0),
        re: training_config.re,
        ae: training_config.ae,
        max_iteration: args.max_iteration.unwrap_or(training_config.max_iteration),
        l2_coefficient: args.l2.unwrap_or(training_config.l2_coefficient),
        max_length: args.max_length.unwrap_or(training_config.max_length),
        flags,
    };

    let mut learner = Learner::new(dataset, learner_config, initial_weights)?;
    learner.compute()?;
    learner.save_weights(&args.output)?;

    info!(output = %args.output.display(), "weights written");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::from(0),
        Err(err) => {
            tracing::error!(error = %err, "training failed");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
