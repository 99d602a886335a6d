/// Moving files into category folders.
///
/// An [`Organizer`] runs one of three passes over a target directory:
///
/// - [`Organizer::organize`]: the directory's own files go into category
///   folders created inside it. Subdirectories are not touched.
/// - [`Organizer::organize_recursive`]: the same, for every directory of the
///   tree. Each directory gets its own category folders.
/// - [`Organizer::organize_flatten`]: every file of the tree goes into a
///   category folder directly under the root, and the emptied directories
///   are removed.
///
/// The filesystem is the only result: moves are applied one at a time and
/// nothing is rolled back when a step fails.
use crate::backup::{ArchiveFormat, create_backup, is_backup_file_name};
use crate::classifier::Classifier;
use crate::error::{OrganizeError, OrganizeResult};
use crate::output::{RUN_LOG_FILE, RunLog};
use crate::traverser::{DirListing, Entry, ExclusionSet, Traversal, list_dir};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Returns true for the tool's own files: the saved run log and backup archives.
pub fn is_reserved_file_name(name: &str) -> bool {
    name == RUN_LOG_FILE || is_backup_file_name(name)
}

/// Fails with [`OrganizeError::InvalidBasePath`] unless `root` is an existing directory.
pub fn check_root(root: &Path) -> OrganizeResult<()> {
    let metadata = fs::metadata(root).map_err(|e| OrganizeError::InvalidBasePath {
        path: root.to_path_buf(),
        source: e,
    })?;
    if !metadata.is_dir() {
        return Err(OrganizeError::InvalidBasePath {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }
    Ok(())
}

/// Checks that `root` is a directory and writes the backup archive if one is requested.
///
/// Runs before any other filesystem change of an operation.
pub fn prepare_root(
    root: &Path,
    backup: Option<ArchiveFormat>,
    log: &RunLog,
) -> OrganizeResult<()> {
    check_root(root)?;

    if let Some(format) = backup {
        log.info(&format!("Creating {} backup of {}", format.extension(), root.display()));
        let archive = create_backup(root, format)?;
        log.success(&format!("Backup written to {}", archive.display()));
    }

    Ok(())
}

/// Counts of what a run did, for the closing summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub moved_files: usize,
    pub skipped_files: usize,
    pub moved_dirs: usize,
    pub created_dirs: usize,
    pub removed_dirs: usize,
}

/// Why a file is or is not organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eligibility {
    /// The run log or a backup archive. Always left alone, without a log line.
    Reserved,
    /// Hidden, and hidden files are not being organized.
    Hidden,
    /// Matches an excluded extension or name pattern.
    Excluded,
    Eligible,
}

/// Applies classification results to a directory tree.
pub struct Organizer<'a> {
    classifier: &'a Classifier,
    exclusions: &'a ExclusionSet,
    log: &'a RunLog,
    include_hidden: bool,
    backup: Option<ArchiveFormat>,
}

impl<'a> Organizer<'a> {
    pub fn new(classifier: &'a Classifier, exclusions: &'a ExclusionSet, log: &'a RunLog) -> Self {
        Self {
            classifier,
            exclusions,
            log,
            include_hidden: false,
            backup: None,
        }
    }

    /// Organize hidden files into the hidden folder instead of skipping them.
    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Archive the target directory before the first change.
    pub fn with_backup(mut self, backup: Option<ArchiveFormat>) -> Self {
        self.backup = backup;
        self
    }

    /// Sorts the immediate files of `root` into category folders inside `root`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::classifier::Classifier;
    /// use dirsort::output::RunLog;
    /// use dirsort::organizer::Organizer;
    /// use dirsort::traverser::ExclusionSet;
    /// use std::path::Path;
    ///
    /// let classifier = Classifier::default();
    /// let exclusions = ExclusionSet::from_lists(Some(".part"), None);
    /// let log = RunLog::console();
    ///
    /// let summary = Organizer::new(&classifier, &exclusions, &log)
    ///     .organize(Path::new("/home/user/Downloads"))
    ///     .expect("organize failed");
    /// println!("moved {} files", summary.moved_files);
    /// ```
    pub fn organize(&self, root: &Path) -> OrganizeResult<RunSummary> {
        prepare_root(root, self.backup, self.log)?;

        let mut summary = RunSummary::default();
        self.log.info(&format!("Organizing {}", root.display()));
        let listing = list_dir(root)?;
        self.sort_in_place(&listing, &mut summary)?;
        Ok(summary)
    }

    /// Sorts every directory of the tree into its own category folders.
    ///
    /// Hidden and excluded directories are skipped. Category folders created
    /// during the run are not descended into; folders that existed before
    /// the run are ordinary directories and are organized like any other.
    pub fn organize_recursive(&self, root: &Path) -> OrganizeResult<RunSummary> {
        prepare_root(root, self.backup, self.log)?;

        let mut summary = RunSummary::default();
        for visit in Traversal::new(root, self.exclusions) {
            let visit = visit?;
            self.log
                .info(&format!("Inside {}", visit.listing.dir.display()));

            self.sort_in_place(&visit.listing, &mut summary)?;
            for dir in &visit.pruned {
                self.log.info(&format!("Skipping directory {}", dir.name));
            }
        }
        Ok(summary)
    }

    /// Moves every file of the tree into category folders directly under `root`.
    ///
    /// Hidden (when not organized) and excluded files are moved to `root`
    /// itself. Hidden and excluded directories are moved to `root` without
    /// being looked into. Once the walk is done the visited directories are
    /// removed bottom-up, except `root` and first-level directories named
    /// like a category folder.
    pub fn organize_flatten(&self, root: &Path) -> OrganizeResult<RunSummary> {
        prepare_root(root, self.backup, self.log)?;

        let mut summary = RunSummary::default();
        let mut visited: Vec<(PathBuf, usize)> = Vec::new();
        let category_names = self.classifier.category_names();

        for visit in Traversal::new(root, self.exclusions) {
            let visit = visit?;
            self.log
                .info(&format!("Inside {}", visit.listing.dir.display()));

            for file in &visit.listing.files {
                match self.eligibility(file) {
                    Eligibility::Reserved => {}
                    Eligibility::Hidden | Eligibility::Excluded => {
                        let destination = root.join(file.file_name());
                        if self.move_entry(&file.path, &destination)? {
                            self.log
                                .info(&format!("Moving {} to the root directory", file.name));
                            summary.moved_files += 1;
                        } else {
                            self.log.info(&format!("Skipping {}", file.name));
                            summary.skipped_files += 1;
                        }
                    }
                    Eligibility::Eligible => {
                        let folder = self.ensure_category_folder(root, file, &mut summary)?;
                        self.move_into(file, &folder, &mut summary)?;
                    }
                }
            }

            for dir in &visit.pruned {
                let destination = root.join(dir.file_name());
                if self.move_entry(&dir.path, &destination)? {
                    self.log.info(&format!(
                        "Skipping directory {} and moving it to the root directory",
                        dir.name
                    ));
                    summary.moved_dirs += 1;
                } else {
                    self.log.info(&format!("Skipping directory {}", dir.name));
                }
            }

            visited.push((visit.listing.dir, visit.depth));
        }

        // Reverse pre-order: every directory comes after all of its descendants.
        for (dir, depth) in visited.into_iter().rev() {
            if keeps_dir(&dir, depth, &category_names) {
                continue;
            }
            self.log.info(&format!("Removing {}", dir.display()));
            fs::remove_dir(&dir).map_err(|e| OrganizeError::DirectoryRemovalFailed {
                path: dir.clone(),
                source: e,
            })?;
            summary.removed_dirs += 1;
        }

        Ok(summary)
    }

    /// Sorts the files of one listing into category folders inside the listed directory.
    fn sort_in_place(&self, listing: &DirListing, summary: &mut RunSummary) -> OrganizeResult<()> {
        for file in &listing.files {
            match self.eligibility(file) {
                Eligibility::Reserved => {}
                Eligibility::Hidden | Eligibility::Excluded => {
                    self.log.info(&format!("Skipping {}", file.name));
                    summary.skipped_files += 1;
                }
                Eligibility::Eligible => {
                    let folder = self.ensure_category_folder(&listing.dir, file, summary)?;
                    self.move_into(file, &folder, summary)?;
                }
            }
        }
        Ok(())
    }

    fn eligibility(&self, file: &Entry) -> Eligibility {
        if is_reserved_file_name(&file.name) {
            Eligibility::Reserved
        } else if file.is_hidden && !self.include_hidden {
            Eligibility::Hidden
        } else if self.exclusions.excludes_file(file) {
            Eligibility::Excluded
        } else {
            Eligibility::Eligible
        }
    }

    /// Returns the category folder for `file` under `parent`, creating it if needed.
    fn ensure_category_folder(
        &self,
        parent: &Path,
        file: &Entry,
        summary: &mut RunSummary,
    ) -> OrganizeResult<PathBuf> {
        let folder = parent.join(self.classifier.classify(&file.name, file.is_hidden));
        if !folder.exists() {
            self.log
                .info(&format!("Creating folder {}", folder.display()));
            fs::create_dir(&folder).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: folder.clone(),
                source: e,
            })?;
            summary.created_dirs += 1;
        }
        Ok(folder)
    }

    fn move_into(&self, file: &Entry, folder: &Path, summary: &mut RunSummary) -> OrganizeResult<()> {
        let destination = folder.join(file.file_name());
        if self.move_entry(&file.path, &destination)? {
            self.log
                .info(&format!("Moving {} to {}", file.name, folder.display()));
            summary.moved_files += 1;
        } else {
            self.log
                .info(&format!("{} is already in {}", file.name, folder.display()));
        }
        Ok(())
    }

    /// Moves a file or directory without overwriting anything.
    ///
    /// Returns `Ok(false)` when `from` already is `to`.
    fn move_entry(&self, from: &Path, to: &Path) -> OrganizeResult<bool> {
        if from == to {
            return Ok(false);
        }

        let move_error = |e| OrganizeError::FileMoveFailure {
            source: from.to_path_buf(),
            destination: to.to_path_buf(),
            source_error: e,
        };

        if fs::symlink_metadata(to).is_ok() {
            return Err(move_error(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            )));
        }

        fs::rename(from, to).map_err(move_error)?;
        Ok(true)
    }
}

/// The flatten pass never removes the root or a first-level category folder.
fn keeps_dir(dir: &Path, depth: usize, category_names: &BTreeSet<&str>) -> bool {
    match depth {
        0 => true,
        1 => dir
            .file_name()
            .is_some_and(|name| category_names.contains(&*name.to_string_lossy())),
        _ => false,
    }
}
