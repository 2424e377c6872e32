//! Command-line interface of the `electrack` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Household device energy monitor", propagate_version = true)]
#[must_use]
pub struct Cli {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Overrides `storage.data_dir` from the configuration.
    #[arg(long, env = "ELECTRACK_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args)]
pub struct ConfigSource {
    /// TOML configuration file.
    #[arg(long, conflicts_with = "preset", global = true)]
    pub config: Option<PathBuf>,

    /// Built-in configuration preset (`household`, `empty`).
    #[arg(long, global = true)]
    pub preset: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Track devices until interrupted, then print the usage summary (default).
    Run,

    /// Show the stored electricity rate, or set it.
    Rate {
        /// New rate in $/kWh (0-10).
        value: Option<String>,
    },

    /// Write stored history to a CSV file.
    Export(ExportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output path.
    #[arg(long)]
    pub out: PathBuf,

    /// Bucket by day instead of by hour.
    #[arg(long, conflicts_with = "raw")]
    pub daily: bool,

    /// Write raw snapshots instead of chart buckets.
    #[arg(long)]
    pub raw: bool,

    /// Look-back in hours (or days with `--daily`). Defaults to 24 hours or 7 days.
    #[arg(long)]
    pub range: Option<u32>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Run)
    }
}
