//! `semicrf-predict` — the predictor entry point (§6.3): weights path,
//! input data, output path.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use semi_crf::corpus;
use semi_crf::driver::Predictor;
use semi_crf::flags::Flags;
use semi_crf::weights::Weights;
use semi_crf::CrfError;

#[derive(Parser, Debug)]
#[command(name = "semicrf-predict")]
#[command(about = "Viterbi-decode a corpus with a trained Semi-Markov CRF model")]
#[command(version)]
struct CliArgs {
    /// Path to the trained weight file (§4.7/§6.1).
    #[arg(long)]
    weights: PathBuf,

    /// Path to the input corpus (JSON, §6.2); ground-truth segments, if
    /// present, are ignored.
    #[arg(long)]
    data: PathBuf,

    /// Path to write the decoded predictions (JSON, same page shape).
    #[arg(long)]
    output: PathBuf,

    /// Override the maximum segment duration recorded in the weight file.
    #[arg(long)]
    max_length: Option<usize>,

    #[arg(long)]
    disable_wg_cache: bool,

    /// Log each sequence's best-path score as it is decoded.
    #[arg(long)]
    likelihood_only: bool,

    #[arg(long)]
    disable_date_version: bool,
}

fn run(args: CliArgs) -> Result<(), CrfError> {
    let mut flags = Flags::empty();
    flags.set(Flags::DISABLE_WG_CACHE, args.disable_wg_cache);
    flags.set(Flags::ENABLE_LIKELIHOOD_ONLY, args.likelihood_only);
    flags.set(Flags::DISABLE_DATE_VERSION, args.disable_date_version);

    if !flags.has(Flags::DISABLE_DATE_VERSION) {
        info!("semicrf 0.1.0");
    }

    let weights = Weights::load(&args.weights)?;
    let dataset = corpus::load(&args.data, false)
        .map_err(|e| CrfError::Input(format!("failed to load input data: {e}")))?;

    let mut predictor = Predictor::new(dataset, weights, args.max_length, flags)?;
    predictor.compute()?;
    let decoded = predictor.into_dataset();

    corpus::write_predictions(&decoded, &args.output)
        .map_err(|e| CrfError::Input(format!("failed to write predictions: {e}")))?;

    info!(output = %args.output.display(), "predictions written");
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
            tracing::error!(error = %err, "prediction failed");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
