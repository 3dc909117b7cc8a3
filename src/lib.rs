//! filetidy - sort files into a destination tree by filename pattern or extension
//!
//! This library provides path expansion and source listing, routing rules
//! loaded from a TOML configuration, a cross-device safe file move, and the
//! batch driver that ties them together.

pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod output;
pub mod paths;
pub mod rules;

pub use config::{ConfigError, FileTidyConfig};
pub use file_organizer::{FileOrganizer, MoveSummary, OrganizeError};
pub use output::{Reporter, Verbosity};
pub use rules::{Classification, RuleSet};

pub use cli::{Cli, CliError, run_cli};
