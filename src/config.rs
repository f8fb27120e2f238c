//! File configuration and the effective settings of one invocation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use comic_dl_core::{
    DEFAULT_ASSET_CONCURRENCY, DEFAULT_CHAPTER_CONCURRENCY, FetcherConfig, IgnoreRule, RunConfig,
};
use serde::Deserialize;

use crate::cli::TuningArgs;

/// Output directory used when neither the CLI nor the config file sets one.
pub const DEFAULT_OUTPUT_DIR: &str = "comic-dist";

/// JSON-backed file configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Default output directory.
    pub output_dir: Option<PathBuf>,
    pub chapter_concurrency: Option<usize>,
    pub asset_concurrency: Option<usize>,
    /// Maximum attempts per asset.
    pub max_retries: Option<u32>,
    /// Per-host minimum delay in milliseconds.
    pub rate_limit_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub always_reconcile: Option<bool>,
    /// Books or chapters never downloaded.
    pub ignore: Vec<IgnoreRule>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_range("chapter_concurrency", self.chapter_concurrency, 1, 100)?;
        validate_range("asset_concurrency", self.asset_concurrency, 1, 100)?;
        validate_range("max_retries", self.max_retries, 1, 10)?;
        validate_range("rate_limit_ms", self.rate_limit_ms, 0, 60_000)?;
        validate_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        validate_range("read_timeout_secs", self.read_timeout_secs, 1, 3600)?;

        for rule in &self.ignore {
            if rule.name.trim().is_empty() {
                bail!("Invalid config value for `ignore`: rule with an empty book name");
            }
        }
        Ok(())
    }
}

fn validate_range<T>(field: &str, value: Option<T>, min: T, max: T) -> Result<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    let Some(value) = value else {
        return Ok(());
    };
    if value < min || value > max {
        bail!("Invalid config value for `{field}`: {value}. Expected range: {min}..={max}");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/comic-dl/config.json`
/// 2. `$HOME/.config/comic-dl/config.json`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("comic-dl")
                .join("config.json"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("comic-dl")
            .join("config.json"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist. The default path is optional; when it does
/// not exist `None` is returned.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match resolve_default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(config))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = serde_json::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Effective settings after merging CLI flags over file values over defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub run: RunConfig,
    pub fetcher: FetcherConfig,
    pub ignore: Vec<IgnoreRule>,
}

impl Settings {
    /// Merges `tuning` over `file` over built-in defaults.
    #[must_use]
    pub fn resolve(file: Option<FileConfig>, tuning: &TuningArgs) -> Self {
        let file = file.unwrap_or_default();
        let fetcher_defaults = FetcherConfig::default();

        Self {
            output_dir: tuning
                .output_dir
                .clone()
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            run: RunConfig {
                chapter_concurrency: tuning
                    .chapter_concurrency
                    .map(usize::from)
                    .or(file.chapter_concurrency)
                    .unwrap_or(DEFAULT_CHAPTER_CONCURRENCY),
                asset_concurrency: tuning
                    .asset_concurrency
                    .map(usize::from)
                    .or(file.asset_concurrency)
                    .unwrap_or(DEFAULT_ASSET_CONCURRENCY),
                always_reconcile: tuning.always_reconcile
                    || file.always_reconcile.unwrap_or(false),
            },
            fetcher: FetcherConfig {
                connect_timeout_secs: file
                    .connect_timeout_secs
                    .unwrap_or(fetcher_defaults.connect_timeout_secs),
                read_timeout_secs: file
                    .read_timeout_secs
                    .unwrap_or(fetcher_defaults.read_timeout_secs),
                max_retries: tuning
                    .max_retries
                    .or(file.max_retries)
                    .unwrap_or(fetcher_defaults.max_retries),
                rate_limit_ms: tuning
                    .rate_limit
                    .or(file.rate_limit_ms)
                    .unwrap_or(fetcher_defaults.rate_limit_ms),
            },
            ignore: file.ignore,
        }
    }
}
