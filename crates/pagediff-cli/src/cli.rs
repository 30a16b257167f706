use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use pagediff_diff::DiffAlgorithm;
use pagediff_types::FileKind;

#[derive(Parser)]
#[command(
    name = "pagediff",
    about = "Paginated document comparison with similarity analytics",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a dev document against its prod counterpart
    Compare(CompareArgs),
    /// Summarize stored analytics snapshots
    Summarize(SummarizeArgs),
}

#[derive(Args)]
pub struct CompareArgs {
    /// Dev-side file
    pub dev: PathBuf,
    /// Prod-side file
    pub prod: PathBuf,
    /// Input format: text, pdf (form-feed separated page text) or excel (JSON workbook)
    #[arg(long, default_value = "text")]
    pub kind: FileKind,
    /// Lines per unit, overriding the configured size for this kind
    #[arg(long)]
    pub unit_lines: Option<usize>,
    /// Number of concurrent unit workers
    #[arg(long)]
    pub workers: Option<usize>,
    /// Line diff algorithm: myers, patience or lcs
    #[arg(long)]
    pub algorithm: Option<DiffAlgorithm>,
    /// Engine configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Directory to store the analytics snapshot in
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Print the edit script of every changed unit
    #[arg(long)]
    pub show_diff: bool,
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Directory of stored snapshots
    pub dir: PathBuf,
}
