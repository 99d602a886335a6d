/// Backup archives taken before a run mutates anything.
///
/// The archive is written inside the target directory and stores the tree
/// under the directory's own name, so extracting it next to the original
/// recreates the directory as it was.
use crate::config::ConfigError;
use crate::error::{OrganizeError, OrganizeResult};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use walkdir::WalkDir;

/// Base name of backup archives. `dirsort_backup.zip`, `.tar` or `.tar.gz`.
pub const BACKUP_BASE_NAME: &str = "dirsort_backup";

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    GzTar,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 3] = [ArchiveFormat::Zip, ArchiveFormat::Tar, ArchiveFormat::GzTar];

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::GzTar => "tar.gz",
        }
    }

    /// File name of the backup archive in this format.
    pub fn file_name(&self) -> String {
        format!("{}.{}", BACKUP_BASE_NAME, self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "gztar" | "tar.gz" | "tgz" => Ok(ArchiveFormat::GzTar),
            _ => Err(ConfigError::UnknownArchiveFormat(s.to_string())),
        }
    }
}

/// Returns true if `name` is the file name of a backup archive.
pub fn is_backup_file_name(name: &str) -> bool {
    ArchiveFormat::ALL
        .iter()
        .any(|format| format.file_name() == name)
}

/// Archives `root` into `root/dirsort_backup.<ext>` and returns the archive path.
///
/// An existing archive with the same name is replaced. The archive never
/// contains itself.
pub fn create_backup(root: &Path, format: ArchiveFormat) -> OrganizeResult<PathBuf> {
    let archive_path = root.join(format.file_name());
    let backup_error = |source| OrganizeError::BackupFailed {
        path: archive_path.clone(),
        source,
    };

    let root = fs::canonicalize(root).map_err(backup_error)?;
    let base_name = root
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(BACKUP_BASE_NAME));
    let archive_path = root.join(format.file_name());

    let file = File::create(&archive_path).map_err(backup_error)?;
    let result = match format {
        ArchiveFormat::Zip => write_zip(&root, &base_name, &archive_path, file),
        ArchiveFormat::Tar => write_tar(&root, &base_name, &archive_path, file).map(|_| ()),
        ArchiveFormat::GzTar => {
            let encoder = GzEncoder::new(file, Compression::default());
            write_tar(&root, &base_name, &archive_path, encoder)
                .and_then(|encoder| encoder.finish().map(|_| ()))
        }
    };

    match result {
        Ok(()) => Ok(archive_path),
        Err(e) => {
            let _ = fs::remove_file(&archive_path);
            Err(backup_error(e))
        }
    }
}

/// Regular files and directories under `root`, sorted by name, minus the archive.
fn archive_entries(root: &Path, archive_path: &Path) -> io::Result<Vec<(PathBuf, PathBuf, bool)>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if path == archive_path {
            continue;
        }

        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_dir() {
            continue;
        }

        let relative = path.strip_prefix(root).map_err(io::Error::other)?;
        entries.push((path.to_path_buf(), relative.to_path_buf(), file_type.is_dir()));
    }
    Ok(entries)
}

fn write_zip(root: &Path, base_name: &Path, archive_path: &Path, file: File) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (path, relative, is_dir) in archive_entries(root, archive_path)? {
        let name = base_name
            .join(relative)
            .to_string_lossy()
            .replace('\\', "/");
        if is_dir {
            zip.add_directory(format!("{}/", name.trim_end_matches('/')), options)
                .map_err(io::Error::other)?;
        } else {
            zip.start_file(name, options).map_err(io::Error::other)?;
            let mut source = File::open(&path)?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    zip.finish().map_err(io::Error::other)?;
    Ok(())
}

fn write_tar<W: io::Write>(
    root: &Path,
    base_name: &Path,
    archive_path: &Path,
    writer: W,
) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    for (path, relative, _) in archive_entries(root, archive_path)? {
        builder.append_path_with_name(&path, base_name.join(relative))?;
    }
    builder.into_inner()
}
