//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Download comic books chapter by chapter, resuming where the last run stopped.
///
/// Each book gets its own directory with a `progress.json` listing finished
/// chapters; re-running the same URL only fetches what is missing.
#[derive(Parser, Debug)]
#[command(name = "comic-dl")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (JSON); defaults to $XDG_CONFIG_HOME/comic-dl/config.json
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download (or resume) one book from its catalog URL
    Download(DownloadArgs),
    /// Re-run every book already downloaded under the output directory
    Update(UpdateArgs),
}

/// Flags shared by both subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Output directory holding one folder per book [default: comic-dist]
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Chapters downloaded at once (1-100) [default: 6]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub chapter_concurrency: Option<u8>,

    /// Images downloaded at once per chapter (1-100) [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub asset_concurrency: Option<u8>,

    /// Maximum attempts per image (1-10) [default: 3]
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: Option<u32>,

    /// Minimum delay between requests to the same host in milliseconds (0 disables, max 60000)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: Option<u64>,

    /// Drop progress records for chapters that changed upstream on every run
    #[arg(long)]
    pub always_reconcile: bool,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Catalog page URL of the book
    pub url: String,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Only update books with this name (repeatable)
    #[arg(long = "book", value_name = "NAME")]
    pub books: Vec<String>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

impl Command {
    /// Returns the tuning flags of either subcommand.
    pub fn tuning(&self) -> &TuningArgs {
        match self {
            Self::Download(args) => &args.tuning,
            Self::Update(args) => &args.tuning,
        }
    }
}
