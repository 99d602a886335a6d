//! Duplicate detection and merging.
//!
//! Files of one directory are grouped by the SHA-1 digest of their content.
//! Each group of two or more files is merged down to one survivor: the
//! lexicographically smallest name, optionally renamed by the operator. The
//! other members are deleted.
//!
//! Equal digests are taken to mean equal content; there is no byte-by-byte
//! comparison afterwards.

use crate::backup::ArchiveFormat;
use crate::error::{OrganizeError, OrganizeResult};
use crate::organizer::{is_reserved_file_name, prepare_root};
use crate::output::RunLog;
use crate::traverser::{Entry, list_dir};
use sha1::{Digest, Sha1};
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 8192;

/// Printed between groups in the duplicate summary.
const GROUP_DELIMITER: &str = "--------------------";

/// SHA-1 digest of a file's full content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 20]);

impl ContentDigest {
    /// Digests everything `reader` yields, 8 KiB at a time.
    pub fn from_reader<R: Read>(mut reader: R) -> std::io::Result<Self> {
        let mut hasher = Sha1::new();
        let mut buffer = [0u8; BUFFER_SIZE];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hasher.finalize());
        Ok(Self(bytes))
    }

    /// Digests the content of the file at `path`.
    pub fn of_file(path: &Path) -> OrganizeResult<Self> {
        let read_error = |source| OrganizeError::FileReadFailed {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(read_error)?;
        Self::from_reader(BufReader::with_capacity(BUFFER_SIZE, file)).map_err(read_error)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Two or more files of one directory with the same content digest.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    digest: ContentDigest,
    /// Sorted by name; never fewer than two.
    members: Vec<Entry>,
}

impl DuplicateGroup {
    /// Builds a group from the files sharing `digest`. `None` unless there are at least two.
    fn new(digest: ContentDigest, mut members: Vec<Entry>) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Some(Self { digest, members })
    }

    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// The member that is kept.
    pub fn survivor(&self) -> &Entry {
        &self.members[0]
    }

    /// The members that are deleted.
    pub fn redundant(&self) -> &[Entry] {
        &self.members[1..]
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name.as_str()).collect()
    }
}

/// Source of survivor names in interactive mode.
pub trait RenamePrompt {
    /// Asks for the name the group's survivor should end up with.
    fn target_name(&mut self, group: &DuplicateGroup) -> OrganizeResult<String>;
}

/// Asks on the terminal.
pub struct TerminalPrompt;

impl RenamePrompt for TerminalPrompt {
    fn target_name(&mut self, group: &DuplicateGroup) -> OrganizeResult<String> {
        dialoguer::Input::<String>::new()
            .with_prompt(format!("Merge [{}] into", group.names().join(", ")))
            .default(group.survivor().name.clone())
            .interact_text()
            .map_err(|e| OrganizeError::PromptFailed {
                reason: e.to_string(),
            })
    }
}

/// What a resolve run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupSummary {
    pub groups: usize,
    pub renamed_survivors: usize,
    pub removed_files: usize,
    pub skipped_files: usize,
}

/// Finds and merges duplicate files in a single directory.
pub struct DuplicateResolver<'a> {
    log: &'a RunLog,
    include_hidden: bool,
    backup: Option<ArchiveFormat>,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(log: &'a RunLog) -> Self {
        Self {
            log,
            include_hidden: false,
            backup: None,
        }
    }

    /// Hash hidden files too instead of skipping them.
    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    /// Archive the directory before anything is renamed or deleted.
    pub fn with_backup(mut self, backup: Option<ArchiveFormat>) -> Self {
        self.backup = backup;
        self
    }

    /// Groups the immediate files of `dir` by content, without changing anything.
    ///
    /// Groups are returned sorted by their survivor's name, members sorted by name.
    pub fn find_duplicates(&self, dir: &Path) -> OrganizeResult<Vec<DuplicateGroup>> {
        Ok(self.scan(dir)?.0)
    }

    fn scan(&self, dir: &Path) -> OrganizeResult<(Vec<DuplicateGroup>, usize)> {
        let listing = list_dir(dir)?;
        let pb = self.log.progress_bar(listing.files.len() as u64);
        pb.set_message("hashing");

        let mut skipped = 0;
        let mut by_digest: HashMap<ContentDigest, Vec<Entry>> = HashMap::new();
        for file in listing.files {
            pb.inc(1);
            if is_reserved_file_name(&file.name) {
                continue;
            }
            if file.is_hidden && !self.include_hidden {
                pb.suspend(|| self.log.info(&format!("Skipping {}", file.name)));
                skipped += 1;
                continue;
            }

            let digest = match ContentDigest::of_file(&file.path) {
                Ok(digest) => digest,
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            };
            by_digest.entry(digest).or_default().push(file);
        }
        pb.finish_and_clear();

        let mut groups: Vec<DuplicateGroup> = by_digest
            .into_iter()
            .filter_map(|(digest, members)| DuplicateGroup::new(digest, members))
            .collect();
        groups.sort_by(|a, b| a.survivor().name.cmp(&b.survivor().name));

        Ok((groups, skipped))
    }

    /// Merges every duplicate group of `dir` down to its survivor.
    ///
    /// With a prompt, the operator picks the survivor's final name; any
    /// answer is used as given, and a file already at that name is
    /// replaced. Without a prompt the survivor keeps its name. All other
    /// members are deleted.
    pub fn resolve(
        &self,
        dir: &Path,
        mut prompt: Option<&mut dyn RenamePrompt>,
    ) -> OrganizeResult<DedupSummary> {
        prepare_root(dir, self.backup, self.log)?;

        let (groups, skipped_files) = self.scan(dir)?;
        let mut summary = DedupSummary {
            groups: groups.len(),
            skipped_files,
            ..DedupSummary::default()
        };

        if groups.is_empty() {
            self.log
                .info(&format!("No duplicate files found in {}", dir.display()));
            return Ok(summary);
        }

        self.log
            .header(&format!("Duplicate files in {}:", dir.display()));
        for group in &groups {
            for name in group.names() {
                self.log.info(name);
            }
            self.log.info(GROUP_DELIMITER);
        }

        for group in &groups {
            let survivor = group.survivor();
            let target_name = match prompt.as_deref_mut() {
                Some(prompt) => prompt.target_name(group)?,
                None => survivor.name.clone(),
            };
            let target_path = dir.join(&target_name);

            self.log.info(&format!("Merging files into {}", target_name));
            if target_path != survivor.path {
                let replaces_other_file = fs::symlink_metadata(&target_path).is_ok()
                    && !group.members.iter().any(|m| m.path == target_path);
                if replaces_other_file {
                    self.log.warning(&format!(
                        "{} already exists and will be replaced",
                        target_path.display()
                    ));
                }
                fs::rename(&survivor.path, &target_path).map_err(|e| {
                    OrganizeError::FileMoveFailure {
                        source: survivor.path.clone(),
                        destination: target_path.clone(),
                        source_error: e,
                    }
                })?;
                summary.renamed_survivors += 1;
            }

            for member in group.redundant() {
                // The survivor may have been renamed onto one of its own duplicates.
                if member.path == target_path {
                    continue;
                }
                fs::remove_file(&member.path).map_err(|e| OrganizeError::FileRemovalFailed {
                    path: member.path.clone(),
                    source: e,
                })?;
                summary.removed_files += 1;
            }
        }

        Ok(summary)
    }
}
