use anyhow::Result;
use clap::Parser;

use idf_dataset::cli::{Cli, Commands};
use idf_dataset::commands;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Units => commands::units(&cli),
        Commands::Zones => commands::zones(&cli),
        Commands::Split(args) => commands::split(&cli, args),
        Commands::Dataset(args) => commands::dataset(&cli, args),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
