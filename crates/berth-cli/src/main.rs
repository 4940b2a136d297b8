//! berth - deployment packaging CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use berth_cli::cmd;
use berth_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let quiet = cli.quiet;

    match cli.command {
        Commands::Pack {
            project,
            out,
            webroot,
            webroot_out,
            runtime,
            runtime_home,
            packages,
        } => cmd::pack::pack(
            &project,
            &out,
            webroot,
            webroot_out,
            runtime,
            runtime_home,
            packages,
            quiet,
        ),
    }
}
