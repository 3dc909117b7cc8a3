//! Path expansion and source directory listing.
//!
//! Configured paths may start with `~` or be relative to the working
//! directory. [`expand_path`] turns them into absolute, lexically normalized
//! paths without touching the filesystem; [`list_files`] enumerates the
//! non-directory entries of each source directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur while expanding a configured path.
#[derive(Debug)]
pub enum ResolveError {
    /// The path uses `~` but the home directory could not be determined.
    HomeDirUnavailable { path: String },
    /// The current working directory could not be queried.
    WorkingDirUnavailable { path: String, source: std::io::Error },
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomeDirUnavailable { path } => {
                write!(f, "Cannot expand '{}': home directory is unknown", path)
            }
            Self::WorkingDirUnavailable { path, source } => {
                write!(
                    f,
                    "Cannot make '{}' absolute: working directory unavailable: {}",
                    path, source
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HomeDirUnavailable { .. } => None,
            Self::WorkingDirUnavailable { source, .. } => Some(source),
        }
    }
}

/// Errors that can occur while listing source directories.
#[derive(Debug)]
pub enum ListError {
    /// A source directory path could not be expanded.
    Resolve(ResolveError),
    /// A source directory could not be read.
    ReadDir { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for ListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolve(e) => write!(f, "{}", e),
            Self::ReadDir { path, source } => {
                write!(f, "Error reading directory {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve(e) => Some(e),
            Self::ReadDir { source, .. } => Some(source),
        }
    }
}

impl From<ResolveError> for ListError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

/// Expands `~` to the home directory and makes the path absolute.
///
/// The home directory comes from [`dirs::home_dir`]. The working directory
/// is only queried when the expanded path is still relative.
///
/// # Examples
///
/// ```
/// use filetidy::paths::expand_path;
///
/// let downloads = expand_path("/data/./in/../Downloads").unwrap();
/// assert_eq!(downloads, std::path::PathBuf::from("/data/Downloads"));
/// ```
pub fn expand_path(path: &str) -> Result<PathBuf, ResolveError> {
    let home = dirs::home_dir();
    resolve(path, home.as_deref(), std::env::current_dir)
}

/// Same as [`expand_path`] but with the home and working directories supplied
/// by the caller, so no process state is consulted.
pub fn expand_path_with(
    path: &str,
    home: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf, ResolveError> {
    resolve(path, home, || Ok(cwd.to_path_buf()))
}

fn resolve(
    path: &str,
    home: Option<&Path>,
    current_dir: impl FnOnce() -> std::io::Result<PathBuf>,
) -> Result<PathBuf, ResolveError> {
    let expanded = if path.starts_with('~') {
        let home = home.ok_or_else(|| ResolveError::HomeDirUnavailable {
            path: path.to_string(),
        })?;
        join_home(home, path)
    } else {
        PathBuf::from(path)
    };

    if expanded.is_absolute() {
        return Ok(normalize(&expanded));
    }

    let cwd = current_dir().map_err(|e| ResolveError::WorkingDirUnavailable {
        path: path.to_string(),
        source: e,
    })?;
    Ok(normalize(&cwd.join(expanded)))
}

/// Replaces the leading `~` with `home`. Separators right after the marker
/// are dropped so the remainder is joined under `home` rather than replacing it.
fn join_home(home: &Path, path: &str) -> PathBuf {
    let rest = path[1..].trim_start_matches(['/', std::path::MAIN_SEPARATOR]);
    if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    }
}

/// Lexically removes `.` and resolves `..` components. Symlinks are not followed.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if !at_root {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Lists every non-directory entry of the given source directories.
///
/// Directories are processed in the order given; entries within one
/// directory are sorted by file name. Each directory path is expanded with
/// [`expand_path`] first, so the returned paths are absolute. A file reached
/// through a repeated directory is listed once, at its first position.
///
/// # Errors
///
/// Fails on the first directory that cannot be expanded or read.
pub fn list_files<S: AsRef<str>>(dirs: &[S]) -> Result<Vec<PathBuf>, ListError> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for dir in dirs {
        let expanded = expand_path(dir.as_ref())?;
        for file in list_dir(&expanded)? {
            if seen.insert(file.clone()) {
                files.push(file);
            }
        }
    }
    Ok(files)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ListError> {
    let read_err = |e| ListError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        if !file_type.is_dir() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
