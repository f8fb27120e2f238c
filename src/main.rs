//! CLI entry point for comic-dl.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use comic_dl_core::{
    BookDownloader, HttpFetcher, RunRequest, build_default_adapter_registry, scan_books,
};
use tracing::{debug, info, warn};

mod cli;
mod config;
mod output;

use cli::{Cli, Command};
use config::{Settings, load_file_config};
use output::{ConsoleObserver, ProcessExit, determine_exit_outcome};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let exit = match run(&args).await {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ProcessExit::Failure
        }
    };
    ExitCode::from(exit.code())
}

async fn run(args: &Cli) -> Result<ProcessExit> {
    let file_config = load_file_config(args.config.as_deref())?;
    let settings = Settings::resolve(file_config, args.command.tuning());
    debug!(?settings, "effective settings");

    let registry = build_default_adapter_registry().context("Failed to build catalog adapters")?;
    let fetcher =
        HttpFetcher::new(&settings.fetcher).context("Failed to create HTTP client")?;
    let downloader = BookDownloader::new(Arc::new(registry), Arc::new(fetcher), settings.run.clone())
        .context("Invalid run configuration")?;
    let observer = ConsoleObserver::new(args.quiet);

    match &args.command {
        Command::Download(download) => {
            let request = RunRequest::new(download.url.clone(), settings.output_dir.clone())
                .with_ignore(settings.ignore.clone());
            let outcome = downloader.run(&request, &observer).await?;
            Ok(determine_exit_outcome(&outcome))
        }
        Command::Update(update) => {
            let books = scan_books(&settings.output_dir).await;
            let selected: Vec<_> = books
                .into_iter()
                .filter(|book| {
                    update.books.is_empty()
                        || update
                            .books
                            .iter()
                            .any(|name| *name == book.name || *name == book.path_name)
                })
                .collect();

            if selected.is_empty() {
                warn!(dir = %settings.output_dir.display(), "no downloaded books to update");
                return Ok(ProcessExit::Success);
            }
            info!(books = selected.len(), "updating books");

            let mut exit = ProcessExit::Success;
            for book in selected {
                let request = RunRequest::new(book.url.clone(), settings.output_dir.clone())
                    .with_ignore(settings.ignore.clone());
                let outcome = downloader
                    .run(&request, &observer)
                    .await
                    .with_context(|| format!("Update of '{}' failed", book.name))?;
                exit = exit.worst(determine_exit_outcome(&outcome));
            }
            Ok(exit)
        }
    }
}
