mod app;
mod cli;
mod pointer;

use anyhow::Context;
use app::App;
use clap::Parser;
use cli::Cli;
use trajex_experiment::{ExperimentConfig, Session};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = ExperimentConfig::load(&cli.config)
        .with_context(|| format!("loading experiment {}", cli.config.display()))?;
    let base_dir = cli
        .config
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let session = Session::from_config(&config, &base_dir)?;
    tracing::info!(
        config = %cli.config.display(),
        trials = session.remaining(),
        platform = std::env::consts::OS,
        "experiment loaded"
    );

    App::new(session, &cli)?.run()
}
