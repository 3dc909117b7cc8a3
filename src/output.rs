//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored notices,
//! progress tracking, and the end-of-run summary table. Every notice goes
//! through a [`Reporter`] so the verbosity is decided once, by the caller,
//! instead of by a process-wide flag.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;

/// How much output a [`Reporter`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Only errors are printed.
    Quiet,
    /// Headers, results and a progress bar.
    #[default]
    Normal,
    /// Everything in `Normal` plus per-file diagnostic notices.
    Debug,
}

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Debug notices (dimmed, only in [`Verbosity::Debug`])
/// - Progress bars for the move batch
/// - Summary tables with statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter {
    verbosity: Verbosity,
}

impl Reporter {
    /// Creates a reporter with the given verbosity.
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// A reporter that prints nothing but errors. Handy for library callers and tests.
    pub fn quiet() -> Self {
        Self::new(Verbosity::Quiet)
    }

    /// Returns the configured verbosity.
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Returns true when diagnostic notices are enabled.
    pub fn is_debug(&self) -> bool {
        self.verbosity == Verbosity::Debug
    }

    fn is_quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filetidy::output::Reporter;
    /// Reporter::default().success("Moved 3 files");
    /// ```
    pub fn success(&self, message: &str) {
        if !self.is_quiet() {
            println!("{} {}", "✓".green(), message);
        }
    }

    /// Prints an error message in red with an X mark.
    ///
    /// Errors are printed regardless of verbosity.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            println!("{} {}", "⚠".yellow(), message);
        }
    }

    /// Prints an info message in cyan.
    pub fn info(&self, message: &str) {
        if !self.is_quiet() {
            println!("{}", message.cyan());
        }
    }

    /// Prints a section header.
    pub fn header(&self, header: &str) {
        if !self.is_quiet() {
            println!("\n{}", header.bold());
        }
    }

    /// Prints a diagnostic notice, only in debug mode.
    pub fn debug(&self, message: &str) {
        if self.is_debug() {
            println!("{} {}", "[debug]".dimmed(), message);
        }
    }

    /// Pretty-prints any serializable value as JSON, only in debug mode.
    ///
    /// Values that fail to serialize are reported as a debug notice instead.
    pub fn debug_pretty<T: Serialize>(&self, label: &str, value: &T) {
        if !self.is_debug() {
            return;
        }
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{} {}:\n{}", "[debug]".dimmed(), label, json),
            Err(e) => self.debug(&format!("{} could not be rendered: {}", label, e)),
        }
    }

    /// Creates a progress bar for the move batch.
    ///
    /// The bar is only drawn in [`Verbosity::Normal`]; in debug mode the
    /// per-file notices replace it and in quiet mode nothing is drawn.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filetidy::output::Reporter;
    /// let pb = Reporter::default().progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("done");
    /// ```
    pub fn progress_bar(&self, total: u64) -> ProgressBar {
        if self.verbosity != Verbosity::Normal {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints a summary table with the number of files moved per destination.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filetidy::output::Reporter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("photos".to_string(), 8);
    /// counts.insert("invoices".to_string(), 2);
    /// Reporter::default().summary_table(&counts, 10, 4);
    /// ```
    pub fn summary_table(
        &self,
        destination_counts: &HashMap<String, usize>,
        total_moved: usize,
        unmatched: usize,
    ) {
        if self.is_quiet() {
            return;
        }
        self.header("SUMMARY");

        let mut destinations: Vec<_> = destination_counts.iter().collect();
        destinations.sort_by_key(|&(name, _)| name);

        let width = destinations
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("Destination".len());

        println!(
            "{:<width$} | {}",
            "Destination".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (destination, count) in &destinations {
            println!(
                "{:<width$} | {} {}",
                destination,
                count.to_string().green(),
                file_word(**count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Moved".bold(),
            total_moved.to_string().green().bold(),
            file_word(total_moved),
            width = width
        );
        println!(
            "{:<width$} | {} {}",
            "Left in place",
            unmatched.to_string().yellow(),
            file_word(unmatched),
            width = width
        );
    }
}

fn file_word(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reporter_is_normal() {
        let reporter = Reporter::default();
        assert_eq!(reporter.verbosity(), Verbosity::Normal);
        assert!(!reporter.is_debug());
    }

    #[test]
    fn test_progress_bar_hidden_outside_normal_mode() {
        assert!(Reporter::quiet().progress_bar(10).is_hidden());
        assert!(Reporter::new(Verbosity::Debug).progress_bar(10).is_hidden());
    }

    #[test]
    fn test_verbosity_ordering() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Debug);
    }

    #[test]
    fn test_file_word() {
        assert_eq!(file_word(1), "file");
        assert_eq!(file_word(0), "files");
        assert_eq!(file_word(2), "files");
    }
}
