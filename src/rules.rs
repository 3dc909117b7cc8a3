//! Classification rules.
//!
//! A [`RuleSet`] holds the two ways a file can be routed to a destination:
//! ordered filename-pattern rules, whose first capturing group becomes an
//! extra directory level, and an extension table. Pattern rules always win
//! over the extension table, and among pattern rules the first one in
//! configured order wins.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A compiled pattern rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    destination: String,
}

impl PatternRule {
    /// Creates a rule from an already compiled regex.
    pub fn new(regex: Regex, destination: impl Into<String>) -> Self {
        Self {
            regex,
            destination: destination.into(),
        }
    }

    /// The source pattern text.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// The destination subpath this rule routes to.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Matches against the full path text and returns the first group's text.
    ///
    /// A group that took no part in the match yields an empty segment.
    fn capture(&self, subject: &str) -> Option<String> {
        self.regex.captures(subject).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
    }
}

/// The outcome of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A pattern rule matched; `captured` is the first group's text.
    Pattern {
        destination: String,
        captured: String,
    },
    /// No pattern matched but the extension is mapped.
    Extension { destination: String },
    /// No rule applies; the file stays where it is.
    NoMatch,
}

impl Classification {
    /// The configured destination subpath, if any rule matched.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Self::Pattern { destination, .. } | Self::Extension { destination } => {
                Some(destination.as_str())
            }
            Self::NoMatch => None,
        }
    }

    /// The path of `file` relative to the destination root.
    ///
    /// Returns `None` for [`Classification::NoMatch`] or when `file` has no
    /// name component.
    pub fn target_subpath(&self, file: &Path) -> Option<PathBuf> {
        let name = file.file_name()?;
        let mut subpath = match self {
            Self::Pattern {
                destination,
                captured,
            } => {
                let mut p = relative_segment(destination);
                p.push(relative_segment(captured));
                p
            }
            Self::Extension { destination } => relative_segment(destination),
            Self::NoMatch => return None,
        };
        subpath.push(name);
        Some(subpath)
    }
}

/// Treats configured or captured text as a relative path so it can never
/// replace the destination root when joined.
fn relative_segment(text: &str) -> PathBuf {
    PathBuf::from(text.trim_start_matches(['/', std::path::MAIN_SEPARATOR]))
}

/// Ordered pattern rules plus the extension table.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    patterns: Vec<PatternRule>,
    extensions: HashMap<String, String>,
}

impl RuleSet {
    /// Creates a rule set. Pattern order is preserved and decides precedence.
    pub fn new(patterns: Vec<PatternRule>, extensions: HashMap<String, String>) -> Self {
        Self {
            patterns,
            extensions,
        }
    }

    /// The pattern rules, in precedence order.
    pub fn patterns(&self) -> &[PatternRule] {
        &self.patterns
    }

    /// The extension table.
    pub fn extensions(&self) -> &HashMap<String, String> {
        &self.extensions
    }

    /// Decides where `file` should go.
    ///
    /// Pattern rules are matched against the whole path, not just the file
    /// name, so a rule may key on a parent directory. The extension is the
    /// text after the last `.` of the file name and is looked up exactly,
    /// case included.
    ///
    /// # Examples
    ///
    /// ```
    /// use filetidy::rules::{Classification, PatternRule, RuleSet};
    /// use regex::Regex;
    /// use std::collections::HashMap;
    /// use std::path::Path;
    ///
    /// let rule = PatternRule::new(Regex::new(r"invoice_(\d{4})\.pdf$").unwrap(), "invoices");
    /// let rules = RuleSet::new(vec![rule], HashMap::new());
    ///
    /// assert_eq!(
    ///     rules.classify(Path::new("/src/invoice_2023.pdf")),
    ///     Classification::Pattern {
    ///         destination: "invoices".to_string(),
    ///         captured: "2023".to_string(),
    ///     }
    /// );
    /// ```
    pub fn classify(&self, file: &Path) -> Classification {
        let subject = file.to_string_lossy();

        for rule in &self.patterns {
            if let Some(captured) = rule.capture(&subject) {
                return Classification::Pattern {
                    destination: rule.destination.clone(),
                    captured,
                };
            }
        }

        let extension = file_extension(file);
        match self.extensions.get(extension.as_str()) {
            Some(destination) => Classification::Extension {
                destination: destination.clone(),
            },
            None => Classification::NoMatch,
        }
    }
}

/// Text after the last `.` of the file name, or empty when there is none.
///
/// Unlike [`Path::extension`], a leading-dot name such as `.bashrc` yields
/// `bashrc`.
fn file_extension(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_default()
}
