#![forbid(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use essentials_demo::AppState;
use essentials_demo::cli::{Cli, DemoError};
use essentials_demo::simulation;
use essentials_runtime::ObservableViewModel;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), DemoError> {
    let app = AppState::with_config(cli.host_environment(), cli.scheduler_config()?);
    let report = simulation::run(&app, cli.plan());
    tracing::info!(%report, "simulation finished");
    app.dispose();
    Ok(())
}
