// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetpipe",
    version,
    about = "Run a declarative front-end asset pipeline once or in watch mode.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run, e.g. `build`, `styles` or `watchFiles`.
    ///
    /// Without a task the manifest's default task runs.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the manifest (TOML).
    ///
    /// Default: `Assetpipe.toml` in the current working directory, falling
    /// back to the built-in manifest when that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root that stage paths and watch globs are relative to.
    ///
    /// Default: the directory containing the manifest.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the manifest and print the stages the task would run,
    /// without running them.
    #[arg(long)]
    pub dry_run: bool,

    /// List tasks and watch entries, then exit.
    #[arg(long)]
    pub list: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
