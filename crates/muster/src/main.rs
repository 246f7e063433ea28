mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use muster_api::HttpConnector;
use muster_config::load_config;
use muster_core::{ConsoleWriter, Database, DatabaseWriter, Orchestrator};

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), muster_config::ConfigError> {
    let config = load_config(&cli.config)?;
    if config.controllers.is_empty() {
        tracing::warn!(config = %cli.config.display(), "no controllers configured, nothing to do");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(HttpConnector::default(), config.ip_selection.clone());

    for entry in &config.controllers {
        let endpoint = match entry.to_endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::error!(controller = %entry.controller, "invalid controller entry: {e}");
                continue;
            }
        };

        let outcome = if cli.console {
            let mut writer = ConsoleWriter::new();
            orchestrator.run(&endpoint, &mut writer).await
        } else {
            let db = match Database::connect(&config.database.path, entry.owner_id) {
                Ok(db) => db,
                Err(e) => {
                    tracing::error!(controller = %entry.controller, "failed to open store: {e}");
                    continue;
                }
            };
            let mut writer = DatabaseWriter::new(db);
            orchestrator.run(&endpoint, &mut writer).await
        };

        // A failed run never stops the batch; the next controller still runs.
        if let Err(e) = outcome {
            tracing::error!(controller = %entry.controller, "run failed: {e}");
        }
    }

    Ok(())
}
