/// Errors raised while organizing, flattening or deduplicating a directory.
///
/// Every filesystem variant carries the path(s) involved and the underlying
/// `io::Error`, so the OS description reaches the user unchanged.
use std::path::PathBuf;

#[derive(Debug)]
pub enum OrganizeError {
    /// The target directory is missing or is not a directory.
    InvalidBasePath {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to list a directory.
    DirectoryReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove an emptied directory.
    DirectoryRemovalFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file or directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to delete a duplicate file.
    FileRemovalFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a file while computing its digest.
    FileReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the backup archive.
    BackupFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to open the saved run log.
    RunLogFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The interactive prompt could not read an answer.
    PromptFailed { reason: String },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::DirectoryReadFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DirectoryRemovalFailed { path, source } => {
                write!(
                    f,
                    "Failed to remove directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::FileRemovalFailed { path, source } => {
                write!(f, "Failed to remove {}: {}", path.display(), source)
            }
            Self::FileReadFailed { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            Self::BackupFailed { path, source } => {
                write!(
                    f,
                    "Failed to create backup archive {}: {}",
                    path.display(),
                    source
                )
            }
            Self::RunLogFailed { path, source } => {
                write!(f, "Failed to open run log {}: {}", path.display(), source)
            }
            Self::PromptFailed { reason } => write!(f, "Prompt failed: {}", reason),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBasePath { source, .. }
            | Self::DirectoryReadFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::DirectoryRemovalFailed { source, .. }
            | Self::FileRemovalFailed { source, .. }
            | Self::FileReadFailed { source, .. }
            | Self::BackupFailed { source, .. }
            | Self::RunLogFailed { source, .. } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            Self::PromptFailed { .. } => None,
        }
    }
}

/// Result type for organize, flatten and dedup operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
