/// Moving classified files into the destination tree.
///
/// This module provides the directory preparation, the cross-device safe
/// move (copy, verify, copy permissions, remove source) and the batch driver
/// that classifies each file and moves it. The batch is fail-fast: the first
/// error stops it and later files are left alone.
use crate::output::Reporter;
use crate::rules::RuleSet;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Represents a single completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The original path of the file before organization.
    pub original_path: PathBuf,
    /// The new path of the file after organization.
    pub new_path: PathBuf,
    /// The configured destination subpath the file was routed to.
    pub destination: String,
}

/// What a batch run did.
#[derive(Debug, Clone, Default)]
pub struct MoveSummary {
    /// Moves performed, in processing order.
    pub operations: Vec<Operation>,
    /// Files no rule applied to. They were not touched.
    pub unmatched: Vec<PathBuf>,
    /// Files whose target is the file itself. They were not touched.
    pub in_place: Vec<PathBuf>,
}

impl MoveSummary {
    /// Number of files moved.
    pub fn moved(&self) -> usize {
        self.operations.len()
    }

    /// Number of moves per configured destination subpath.
    pub fn destination_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for op in &self.operations {
            *counts.entry(op.destination.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// The step of a move that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// Opening the source for reading.
    OpenSource,
    /// Creating or truncating the target.
    CreateTarget,
    /// Copying the bytes, including the length check afterwards.
    Copy,
    /// Reading the source permissions or applying them to the target.
    CopyPermissions,
    /// Removing the source. The file now exists in both places.
    RemoveSource,
}

impl std::fmt::Display for MoveStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            Self::OpenSource => "open source",
            Self::CreateTarget => "create target",
            Self::Copy => "copy contents",
            Self::CopyPermissions => "copy permissions",
            Self::RemoveSource => "remove source",
        };
        f.write_str(step)
    }
}

/// Errors that can occur during file organization operations.
#[derive(Debug)]
pub enum OrganizeError {
    /// Failed to create the directory a file is moved into.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A step of moving a file failed.
    MoveFailed {
        step: MoveStep,
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// A file path has no name component and cannot be placed anywhere.
    InvalidFilePath { path: PathBuf },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::MoveFailed {
                step,
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {} ({}): {}",
                    source.display(),
                    destination.display(),
                    step,
                    source_error
                )
            }
            Self::InvalidFilePath { path } => {
                write!(f, "File path has no name component: {}", path.display())
            }
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. } => Some(source),
            Self::MoveFailed { source_error, .. } => Some(source_error),
            Self::InvalidFilePath { .. } => None,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Makes sure the directory `target` will be written into exists.
///
/// Creates the whole chain when the parent is missing. A parent that shows
/// up concurrently is not an error.
pub fn ensure_parent_dir(target: &Path, reporter: &Reporter) -> OrganizeResult<()> {
    let Some(parent) = target.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.is_dir() {
        return Ok(());
    }

    reporter.debug(&format!(
        "Destination directory {} does not exist, creating it",
        parent.display()
    ));

    match fs::create_dir_all(parent) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
        Err(e) => Err(OrganizeError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}

/// Returns true when `a` and `b` name the same file on disk.
///
/// Both paths must exist. On unix, hard links to one inode count as the
/// same file; elsewhere the canonical paths are compared.
#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

/// Returns true when `a` and `b` name the same file on disk.
#[cfg(not(unix))]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => ca == cb,
        _ => false,
    }
}

/// Moves `source` to `target` by copying and then removing the source.
///
/// A plain rename cannot cross devices, so the bytes are always copied. An
/// existing file at `target` is overwritten, unless it is `source` itself:
/// that is refused at the `CreateTarget` step before anything is truncated.
/// The target must be on a path whose parent already exists (see
/// [`ensure_parent_dir`]).
///
/// Nothing is rolled back on failure: a failed copy may leave a partial
/// target, and a failed removal leaves the file in both places.
///
/// # Examples
///
/// ```no_run
/// use filetidy::file_organizer::move_file;
/// use filetidy::output::Reporter;
/// use std::path::Path;
///
/// move_file(
///     Path::new("/mnt/usb/photo.jpg"),
///     Path::new("/home/me/photos/photo.jpg"),
///     &Reporter::default(),
/// )
/// .unwrap();
/// ```
pub fn move_file(source: &Path, target: &Path, reporter: &Reporter) -> OrganizeResult<()> {
    reporter.debug(&format!(
        "Moving {} to {}",
        source.display(),
        target.display()
    ));

    let fail = move |step: MoveStep| {
        move |e: io::Error| OrganizeError::MoveFailed {
            step,
            source: source.to_path_buf(),
            destination: target.to_path_buf(),
            source_error: e,
        }
    };

    let mut reader = File::open(source).map_err(fail(MoveStep::OpenSource))?;
    let expected = reader
        .metadata()
        .map_err(fail(MoveStep::OpenSource))?
        .len();

    if same_file(source, target) {
        return Err(fail(MoveStep::CreateTarget)(io::Error::new(
            io::ErrorKind::InvalidInput,
            "source and target are the same file",
        )));
    }
    let writer = File::create(target).map_err(fail(MoveStep::CreateTarget))?;

    let mut writer = BufWriter::new(writer);
    let copied = io::copy(&mut reader, &mut writer).map_err(fail(MoveStep::Copy))?;
    writer.flush().map_err(fail(MoveStep::Copy))?;
    drop(writer);
    drop(reader);

    if copied != expected {
        return Err(fail(MoveStep::Copy)(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("copied {} of {} bytes", copied, expected),
        )));
    }

    let permissions = fs::metadata(source)
        .map_err(fail(MoveStep::CopyPermissions))?
        .permissions();
    fs::set_permissions(target, permissions).map_err(fail(MoveStep::CopyPermissions))?;

    fs::remove_file(source).map_err(fail(MoveStep::RemoveSource))?;

    Ok(())
}

/// Routes files into the destination tree according to a [`RuleSet`].
pub struct FileOrganizer<'a> {
    rules: &'a RuleSet,
    destination_root: PathBuf,
    reporter: Reporter,
}

impl<'a> FileOrganizer<'a> {
    /// Creates an organizer. `destination_root` should already be absolute.
    pub fn new(rules: &'a RuleSet, destination_root: impl Into<PathBuf>, reporter: Reporter) -> Self {
        Self {
            rules,
            destination_root: destination_root.into(),
            reporter,
        }
    }

    /// Classifies and moves each file in order.
    ///
    /// Files no rule applies to are recorded in [`MoveSummary::unmatched`]
    /// and left in place. Files already sitting at their target, which
    /// happens when a source directory lies inside the destination tree,
    /// are recorded in [`MoveSummary::in_place`]. The first failure aborts
    /// the run; files after it are not processed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use filetidy::file_organizer::FileOrganizer;
    /// use filetidy::output::Reporter;
    /// use filetidy::rules::RuleSet;
    /// use std::path::PathBuf;
    ///
    /// let rules = RuleSet::default();
    /// let organizer = FileOrganizer::new(&rules, "/home/me/Sorted", Reporter::default());
    /// let summary = organizer.run(&[PathBuf::from("/home/me/Downloads/a.jpg")]).unwrap();
    /// println!("moved {}", summary.moved());
    /// ```
    pub fn run(&self, files: &[PathBuf]) -> OrganizeResult<MoveSummary> {
        let mut summary = MoveSummary::default();
        let pb = self.reporter.progress_bar(files.len() as u64);

        for file in files {
            self.reporter.debug(&format!("Checking {}", file.display()));

            let classification = self.rules.classify(file);
            let Some(destination) = classification.destination() else {
                summary.unmatched.push(file.clone());
                pb.inc(1);
                continue;
            };

            let subpath = classification
                .target_subpath(file)
                .ok_or_else(|| OrganizeError::InvalidFilePath { path: file.clone() })?;
            let target = self.destination_root.join(subpath);

            self.reporter.debug(&format!(
                "Matched {:?}, target is {}",
                classification,
                target.display()
            ));

            if same_file(file, &target) {
                self.reporter
                    .debug(&format!("{} is already in place", file.display()));
                summary.in_place.push(file.clone());
                pb.inc(1);
                continue;
            }

            ensure_parent_dir(&target, &self.reporter)?;
            move_file(file, &target, &self.reporter)?;

            summary.operations.push(Operation {
                original_path: file.clone(),
                new_path: target,
                destination: destination.to_string(),
            });
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PatternRule;
    use regex::Regex;
    use tempfile::TempDir;

    fn rules() -> RuleSet {
        let patterns = vec![PatternRule::new(
            Regex::new(r"invoice_(\d{4})\.pdf$").unwrap(),
            "invoices",
        )];
        let extensions = [("jpg".to_string(), "photos".to_string())]
            .into_iter()
            .collect();
        RuleSet::new(patterns, extensions)
    }

    #[test]
    fn test_ensure_parent_dir_creates_chain() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path().join("a").join("b").join("c").join("file.txt");

        ensure_parent_dir(&target, &Reporter::quiet()).expect("Failed to create directories");

        assert!(temp_dir.path().join("a/b/c").is_dir());
        assert!(!target.exists());
    }

    #[test]
    fn test_ensure_parent_dir_existing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("file.txt");
        assert!(ensure_parent_dir(&target, &Reporter::quiet()).is_ok());
    }

    #[test]
    fn test_ensure_parent_dir_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photos"), "not a dir").unwrap();
        let target = temp_dir.path().join("photos").join("x.jpg");

        let result = ensure_parent_dir(&target, &Reporter::quiet());
        assert!(matches!(
            result,
            Err(OrganizeError::DirectoryCreationFailed { .. })
        ));
    }

    #[test]
    fn test_move_file_copies_and_removes() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src.bin");
        let target = temp_dir.path().join("dst.bin");
        fs::write(&source, b"payload").unwrap();

        move_file(&source, &target, &Reporter::quiet()).expect("Failed to move file");

        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"payload");
    }

    #[test]
    fn test_move_file_overwrites_existing_target() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("new.txt");
        let target = temp_dir.path().join("old.txt");
        fs::write(&source, "new").unwrap();
        fs::write(&target, "older and longer").unwrap();

        move_file(&source, &target, &Reporter::quiet()).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn test_move_file_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("gone.txt");
        let target = temp_dir.path().join("dst.txt");

        match move_file(&source, &target, &Reporter::quiet()) {
            Err(OrganizeError::MoveFailed { step, .. }) => assert_eq!(step, MoveStep::OpenSource),
            other => panic!("expected OpenSource failure, got {:?}", other),
        }
        assert!(!target.exists());
    }

    #[test]
    fn test_move_file_missing_target_dir() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, "a").unwrap();
        let target = temp_dir.path().join("missing").join("a.txt");

        match move_file(&source, &target, &Reporter::quiet()) {
            Err(OrganizeError::MoveFailed { step, .. }) => {
                assert_eq!(step, MoveStep::CreateTarget)
            }
            other => panic!("expected CreateTarget failure, got {:?}", other),
        }
        assert!(source.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_move_file_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("script.sh");
        let target = temp_dir.path().join("moved.sh");
        fs::write(&source, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o750)).unwrap();

        move_file(&source, &target, &Reporter::quiet()).unwrap();

        let mode = fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[test]
    fn test_move_file_onto_itself_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "precious data").unwrap();
        let same = temp_dir.path().join(".").join("notes.txt");

        match move_file(&source, &same, &Reporter::quiet()) {
            Err(OrganizeError::MoveFailed { step, .. }) => {
                assert_eq!(step, MoveStep::CreateTarget)
            }
            other => panic!("expected CreateTarget failure, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&source).unwrap(), "precious data");
    }

    #[cfg(unix)]
    #[test]
    fn test_move_file_onto_hard_link_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        let link = temp_dir.path().join("b.txt");
        fs::write(&source, "linked").unwrap();
        fs::hard_link(&source, &link).unwrap();

        assert!(same_file(&source, &link));
        assert!(move_file(&source, &link, &Reporter::quiet()).is_err());
        assert_eq!(fs::read_to_string(&link).unwrap(), "linked");
    }

    #[test]
    fn test_same_file_distinguishes_files() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a");
        let b = temp_dir.path().join("b");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "x").unwrap();

        assert!(same_file(&a, &a));
        assert!(!same_file(&a, &b));
        assert!(!same_file(&a, &temp_dir.path().join("missing")));
    }

    #[test]
    fn test_run_leaves_file_already_at_target() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("sorted");
        let inbox = dest.join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        let file = inbox.join("notes.txt");
        fs::write(&file, "precious data").unwrap();

        let patterns = Vec::new();
        let extensions = [("txt".to_string(), "inbox".to_string())]
            .into_iter()
            .collect();
        let rules = RuleSet::new(patterns, extensions);
        let summary = FileOrganizer::new(&rules, &dest, Reporter::quiet())
            .run(&[file.clone()])
            .expect("run failed");

        assert_eq!(summary.moved(), 0);
        assert_eq!(summary.in_place, vec![file.clone()]);
        assert_eq!(fs::read_to_string(&file).unwrap(), "precious data");
    }

    #[test]
    fn test_run_moves_and_skips() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("invoice_2023.pdf"), "inv").unwrap();
        fs::write(src.join("vacation.jpg"), "jpg").unwrap();
        fs::write(src.join("readme.txt"), "txt").unwrap();

        let files = vec![
            src.join("invoice_2023.pdf"),
            src.join("readme.txt"),
            src.join("vacation.jpg"),
        ];
        let rules = rules();
        let summary = FileOrganizer::new(&rules, &dest, Reporter::quiet())
            .run(&files)
            .expect("run failed");

        assert_eq!(summary.moved(), 2);
        assert_eq!(summary.unmatched, vec![src.join("readme.txt")]);
        assert!(dest.join("invoices/2023/invoice_2023.pdf").is_file());
        assert!(dest.join("photos/vacation.jpg").is_file());
        assert!(src.join("readme.txt").is_file());

        let counts = summary.destination_counts();
        assert_eq!(counts.get("invoices"), Some(&1));
        assert_eq!(counts.get("photos"), Some(&1));
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("b.jpg"), "b").unwrap();

        // a.jpg vanished between listing and moving
        let files = vec![src.join("a.jpg"), src.join("b.jpg")];
        let rules = rules();
        let result = FileOrganizer::new(&rules, &dest, Reporter::quiet()).run(&files);

        assert!(matches!(
            result,
            Err(OrganizeError::MoveFailed {
                step: MoveStep::OpenSource,
                ..
            })
        ));
        assert!(src.join("b.jpg").is_file());
        assert!(!dest.join("photos/b.jpg").exists());
    }
}
