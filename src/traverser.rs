//! Directory listing and depth-first traversal.
//!
//! [`list_dir`] produces a fresh listing of one directory. [`Traversal`]
//! walks a whole tree, root first, yielding one [`Visit`] per directory. A
//! directory is listed only when the walk reaches it, so changes the caller
//! makes while handling one visit are seen by the listings that follow.

use crate::classifier::{extension_of, normalize_extension};
use crate::error::{OrganizeError, OrganizeResult};
use glob::Pattern;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// A file or directory found in a listing.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File name, lossily converted to UTF-8.
    pub name: String,
    /// Full path to the entry.
    pub path: PathBuf,
    /// True if the entry is a directory.
    pub is_dir: bool,
    /// True if the name starts with `.`.
    pub is_hidden: bool,
    /// Extension including the leading dot, empty if none.
    pub extension: String,
}

impl Entry {
    fn new(path: PathBuf, is_dir: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = if is_dir {
            String::new()
        } else {
            extension_of(&name).to_string()
        };

        Self {
            is_hidden: name.starts_with('.'),
            extension,
            name,
            path,
            is_dir,
        }
    }

    /// The raw file name, used when building destination paths.
    pub fn file_name(&self) -> &OsStr {
        self.path
            .file_name()
            .unwrap_or_else(|| OsStr::new(&self.name))
    }
}

/// The immediate contents of one directory.
#[derive(Debug, Clone)]
pub struct DirListing {
    pub dir: PathBuf,
    /// Regular files (and symlinks to files), in listing order.
    pub files: Vec<Entry>,
    /// Subdirectories, in listing order.
    pub subdirs: Vec<Entry>,
}

/// Lists the immediate files and subdirectories of `dir`.
///
/// Entries come back in the order the OS returns them. Symlinks count as
/// files when they point at a file; symlinks to directories, broken links
/// and special files are left out.
pub fn list_dir(dir: &Path) -> OrganizeResult<DirListing> {
    let read_error = |source| OrganizeError::DirectoryReadFailed {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut subdirs = Vec::new();

    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let file_type = entry.file_type().map_err(read_error)?;
        let path = entry.path();

        if file_type.is_file() {
            files.push(Entry::new(path, false));
        } else if file_type.is_dir() {
            subdirs.push(Entry::new(path, true));
        } else if file_type.is_symlink()
            && let Ok(target) = fs::metadata(&path)
            && target.is_file()
        {
            files.push(Entry::new(path, false));
        }
    }

    Ok(DirListing {
        dir: dir.to_path_buf(),
        files,
        subdirs,
    })
}

/// Splits a comma-separated list, dropping blank items.
pub fn split_list(list: Option<&str>) -> Vec<String> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Files and directories that are left out of organization.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    extensions: HashSet<String>,
    directories: HashSet<String>,
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an exclusion set from comma-separated extension and directory lists.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::traverser::ExclusionSet;
    ///
    /// let exclusions = ExclusionSet::from_lists(Some(".log,tmp"), Some("node_modules"));
    /// assert!(exclusions.excludes_extension(".tmp"));
    /// assert!(exclusions.excludes_dir_name("node_modules"));
    /// ```
    pub fn from_lists(extensions: Option<&str>, directories: Option<&str>) -> Self {
        let mut set = Self::new();
        set.extend_from_lists(extensions, directories);
        set
    }

    /// Adds the items of comma-separated extension and directory lists.
    pub fn extend_from_lists(&mut self, extensions: Option<&str>, directories: Option<&str>) {
        for ext in split_list(extensions) {
            self.add_extension(&ext);
        }
        for dir in split_list(directories) {
            self.add_directory(&dir);
        }
    }

    pub fn add_extension(&mut self, ext: &str) {
        let ext = normalize_extension(ext);
        if !ext.is_empty() {
            self.extensions.insert(ext);
        }
    }

    pub fn add_directory(&mut self, name: &str) {
        self.directories.insert(name.to_string());
    }

    /// Adds a file-name glob pattern; matching files count as excluded.
    pub fn add_pattern(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    pub fn excludes_extension(&self, ext: &str) -> bool {
        !ext.is_empty() && self.extensions.contains(&normalize_extension(ext))
    }

    pub fn excludes_dir_name(&self, name: &str) -> bool {
        self.directories.contains(name)
    }

    /// Returns true if a file is excluded by extension or name pattern.
    pub fn excludes_file(&self, entry: &Entry) -> bool {
        self.excludes_extension(&entry.extension)
            || self.patterns.iter().any(|p| p.matches(&entry.name))
    }

    /// Returns true if a subdirectory must not be descended into.
    pub fn prunes_dir(&self, entry: &Entry) -> bool {
        entry.is_hidden || self.excludes_dir_name(&entry.name)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.directories.is_empty() && self.patterns.is_empty()
    }
}

/// One directory reached by a [`Traversal`].
#[derive(Debug, Clone)]
pub struct Visit {
    pub listing: DirListing,
    /// Hidden or excluded subdirectories that will not be visited.
    pub pruned: Vec<Entry>,
    /// 0 for the root, 1 for its children, and so on.
    pub depth: usize,
}

/// Depth-first, pre-order walk over a directory tree.
///
/// Children are visited in listing order. The subdirectories of a directory
/// are captured when it is listed, so folders created while a visit is being
/// handled are not walked in the same traversal. The walk stops after the
/// first listing error.
pub struct Traversal<'a> {
    exclusions: &'a ExclusionSet,
    pending: Vec<(PathBuf, usize)>,
}

impl<'a> Traversal<'a> {
    pub fn new(root: &Path, exclusions: &'a ExclusionSet) -> Self {
        Self {
            exclusions,
            pending: vec![(root.to_path_buf(), 0)],
        }
    }
}

impl Iterator for Traversal<'_> {
    type Item = OrganizeResult<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        let (dir, depth) = self.pending.pop()?;

        let listing = match list_dir(&dir) {
            Ok(listing) => listing,
            Err(e) => {
                self.pending.clear();
                return Some(Err(e));
            }
        };

        let (pruned, descend): (Vec<Entry>, Vec<Entry>) = listing
            .subdirs
            .iter()
            .cloned()
            .partition(|entry| self.exclusions.prunes_dir(entry));

        // Reversed so the first listed child is popped first.
        self.pending.extend(
            descend
                .into_iter()
                .rev()
                .map(|entry| (entry.path, depth + 1)),
        );

        Some(Ok(Visit {
            listing,
            pruned,
            depth,
        }))
    }
}
