//! Command-line interface module for filetidy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading and rule compilation
//! - Source listing and destination resolution
//! - Running the organizer and reporting the result

use crate::config::{ConfigError, FileTidyConfig};
use crate::file_organizer::{FileOrganizer, MoveSummary, OrganizeError};
use crate::output::{Reporter, Verbosity};
use crate::paths::{ListError, ResolveError, expand_path, list_files};
use clap::Parser;
use std::path::PathBuf;

/// Sort files from the configured source directories into the destination tree.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "filetidy", version, about)]
pub struct Cli {
    /// Print every file checked, every rule matched and every directory created.
    #[arg(short, long)]
    pub debug: bool,

    /// Print errors only.
    #[arg(short, long, conflicts_with = "debug")]
    pub quiet: bool,

    /// Configuration file. Defaults to ./filetidy.toml, then ~/.config/filetidy/config.toml.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The output level selected by the flags.
    pub fn verbosity(&self) -> Verbosity {
        if self.debug {
            Verbosity::Debug
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

/// Any failure that ends a run.
#[derive(Debug)]
pub enum CliError {
    /// The configuration could not be found, read, decoded or validated.
    Config(ConfigError),
    /// The destination path could not be expanded.
    Resolve(ResolveError),
    /// A source directory could not be listed.
    List(ListError),
    /// Creating a directory or moving a file failed.
    Organize(OrganizeError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Error loading configuration: {}", e),
            Self::Resolve(e) => write!(f, "Error resolving destination: {}", e),
            Self::List(e) => write!(f, "Error listing source files: {}", e),
            Self::Organize(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::List(e) => Some(e),
            Self::Organize(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

impl From<ListError> for CliError {
    fn from(e: ListError) -> Self {
        Self::List(e)
    }
}

impl From<OrganizeError> for CliError {
    fn from(e: OrganizeError) -> Self {
        Self::Organize(e)
    }
}

/// Runs one organization pass.
///
/// This function:
/// 1. Loads the configuration and compiles its rules
/// 2. Prints the configuration in debug mode
/// 3. Lists the files of every source directory
/// 4. Resolves the destination root
/// 5. Moves every file a rule applies to
/// 6. Prints a summary of what moved where
///
/// Nothing is moved if the configuration is invalid. Once moving starts, the
/// first failure stops the run.
///
/// # Examples
///
/// ```no_run
/// use filetidy::cli::{Cli, run_cli};
///
/// match run_cli(&Cli::default()) {
///     Ok(summary) => println!("Moved {} files", summary.moved()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<MoveSummary, CliError> {
    let reporter = Reporter::new(cli.verbosity());

    let config = FileTidyConfig::load(cli.config.as_deref())?;
    let rules = config.compile()?;
    reporter.debug_pretty("Configuration", &config);

    let files = list_files(&config.sourcepath)?;
    let destination = expand_path(&config.destinationpath)?;

    if files.is_empty() {
        reporter.warning("No files found in the source directories.");
    }
    reporter.info(&format!(
        "Organizing {} files into {}",
        files.len(),
        destination.display()
    ));

    let organizer = FileOrganizer::new(&rules, destination, reporter);
    let summary = organizer.run(&files)?;

    if !summary.in_place.is_empty() {
        reporter.info(&format!(
            "{} files were already in place",
            summary.in_place.len()
        ));
    }
    reporter.summary_table(
        &summary.destination_counts(),
        summary.moved(),
        summary.unmatched.len(),
    );
    reporter.success("Organization complete!");

    Ok(summary)
}
