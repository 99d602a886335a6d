//! dirsort - sort a directory tree into category folders
//!
//! This library classifies files by extension, moves them into category
//! folders (per directory, or collected at the root of a flattened tree),
//! and merges duplicate files by content digest. Classification and
//! exclusion rules can be configured through TOML files.

pub mod backup;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod organizer;
pub mod output;
pub mod traverser;

pub use backup::ArchiveFormat;
pub use classifier::Classifier;
pub use config::{CompiledRules, ConfigError, DirsortConfig};
pub use duplicates::{ContentDigest, DuplicateGroup, DuplicateResolver, RenamePrompt};
pub use error::{OrganizeError, OrganizeResult};
pub use organizer::{Organizer, RunSummary};
pub use output::RunLog;
pub use traverser::{ExclusionSet, Traversal};

pub use cli::{OrganizeCommand, RunOptions, run_cli, run_cli_with_config};
