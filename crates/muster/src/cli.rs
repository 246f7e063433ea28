use std::path::PathBuf;

use clap::Parser;

/// Collect cluster inventory from configured controllers and reconcile
/// it into the relational store.
#[derive(Debug, Parser)]
#[command(name = "muster", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "MUSTER_CONFIG",
        default_value = "muster.toml"
    )]
    pub config: PathBuf,

    /// Render collected inventory as log output instead of writing the store.
    #[arg(long)]
    pub console: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
