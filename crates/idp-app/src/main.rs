// IDP forecast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to stderr; results go to files)
// 2. Resolve the base directory (first argument, else the working directory)
// 3. Load config, copying defaults/ into config/ when missing
// 4. Run the pipeline and write predictions

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use idp_forecast::config;
use idp_forecast::pipeline;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("IDP forecast starting up");

    // 2. Resolve base directory
    let base_dir = match std::env::args_os().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir().context("failed to read working directory")?,
    };

    // 3. Load config
    let config = config::load_config(&base_dir).context("failed to load configuration")?;
    info!(
        "Config loaded from {}: {} seasons, {} training pairs, predicting {}",
        base_dir.display(),
        config.seasons.len(),
        config.training.pairs.len(),
        config.prediction.target_season
    );

    // 4. Run
    let outcome = pipeline::run_and_write(&config)?;
    if let Some(holdout) = &outcome.report.holdout {
        info!(
            "Holdout rmse {:.3} over {} rows",
            holdout.metrics.rmse, holdout.test_rows
        );
    }
    info!("Done: {} players predicted", outcome.predictions.len());

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("idp_forecast=info,idp_core=info,idp_model=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
