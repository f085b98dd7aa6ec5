use std::path::PathBuf;

/// Dataset pipeline CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "idf-dataset", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path configuration file (JSON)
    #[arg(short, long, default_value = "paths.json", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build the per-commune feature table
    Units,

    /// Roll the commune table up to fused zones
    Zones,

    /// Emit the deterministic train/test assignment
    Split(SplitArgs),

    /// Project the zone and results tables into train/test matrices
    Dataset(DatasetArgs),
}

#[derive(clap::Args, Debug)]
pub struct SplitArgs {
    /// Output assignment table, defaults to "./split.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DatasetArgs {
    /// Output directory for the four matrix files
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub out_dir: PathBuf,

    /// Feature columns, in matrix order (defaults to the zone schema)
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Target columns from the results table, in matrix order
    #[arg(long, value_delimiter = ',', required = true)]
    pub targets: Vec<String>,

    /// Standardize features: (x - mean) / std over all zones
    #[arg(long)]
    pub norm_features: bool,

    /// Standardize targets the same way
    #[arg(long)]
    pub norm_targets: bool,
}
