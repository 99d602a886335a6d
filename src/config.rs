//! Classification and filtering configuration.
//!
//! This module loads the rules a run works with from a TOML file and
//! compiles them into a [`Classifier`] and an [`ExclusionSet`]. Every field
//! is optional; anything left out keeps the built-in default.
//!
//! # Configuration File Format
//!
//! ```toml
//! [classify]
//! hidden_folder = "hidden"
//! default_folder = "misc"
//! builtin_targets = true
//!
//! [classify.targets]
//! ".log" = "logs"
//! "psd" = "img"
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! extensions = ["bak", ".tmp"]
//! directories = ["node_modules", "target"]
//! patterns = ["*.part", "~$*"]
//! ```

use crate::classifier::{Classifier, DEFAULT_HIDDEN_FOLDER, DEFAULT_MISC_FOLDER};
use crate::traverser::ExclusionSet;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling configuration.
///
/// All of them are raised before the target directory is touched.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// A folder name that cannot be used as a single directory level.
    InvalidFolderName(String),
    /// Unsupported backup archive format.
    UnknownArchiveFormat(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidFolderName(name) => {
                write!(
                    f,
                    "Invalid folder name '{}': expected a single, non-empty directory name",
                    name
                )
            }
            ConfigError::UnknownArchiveFormat(format) => {
                write!(
                    f,
                    "Unknown archive format '{}': expected zip, tar or gztar",
                    format
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirsortConfig {
    #[serde(default)]
    pub classify: ClassifyRules,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Where files go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRules {
    /// Folder for hidden files when hidden files are organized.
    #[serde(default = "default_hidden_folder")]
    pub hidden_folder: String,

    /// Folder for files whose extension has no mapping.
    #[serde(default = "default_misc_folder")]
    pub default_folder: String,

    /// Start from the built-in extension map. Defaults to true.
    #[serde(default = "default_builtin_targets")]
    pub builtin_targets: bool,

    /// Extra or overriding extension to folder mappings.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

fn default_hidden_folder() -> String {
    DEFAULT_HIDDEN_FOLDER.to_string()
}

fn default_misc_folder() -> String {
    DEFAULT_MISC_FOLDER.to_string()
}

fn default_builtin_targets() -> bool {
    true
}

impl Default for ClassifyRules {
    fn default() -> Self {
        Self {
            hidden_folder: default_hidden_folder(),
            default_folder: default_misc_folder(),
            builtin_targets: true,
            targets: BTreeMap::new(),
        }
    }
}

/// What is left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to organize hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files and directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// File extensions to exclude (e.g., "bak", ".tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Directory names that are never descended into.
    #[serde(default)]
    pub directories: Vec<String>,

    /// Glob patterns matched against file names (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl DirsortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.dirsortrc.toml` in the current directory
    /// 3. Look for `~/.config/dirsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate the configuration and build the run's classifier and exclusions.
    ///
    /// # Errors
    ///
    /// Returns an error if a folder name is not a single directory level or a
    /// glob pattern is invalid.
    pub fn compile(self) -> Result<CompiledRules, ConfigError> {
        let ClassifyRules {
            hidden_folder,
            default_folder,
            builtin_targets,
            targets,
        } = self.classify;

        validate_folder_name(&hidden_folder)?;
        validate_folder_name(&default_folder)?;

        let mut classifier = if builtin_targets {
            let mut classifier = Classifier::new();
            classifier.set_hidden_folder(&hidden_folder);
            classifier.set_default_folder(&default_folder);
            classifier
        } else {
            Classifier::empty(&hidden_folder, &default_folder)
        };
        for (ext, folder) in &targets {
            validate_folder_name(folder)?;
            classifier.add_target(ext, folder);
        }

        let mut exclusions = ExclusionSet::new();
        for ext in &self.filters.exclude.extensions {
            exclusions.add_extension(ext);
        }
        for dir in &self.filters.exclude.directories {
            exclusions.add_directory(dir);
        }
        for pattern in &self.filters.exclude.patterns {
            let compiled = Pattern::new(pattern)
                .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))?;
            exclusions.add_pattern(compiled);
        }

        Ok(CompiledRules {
            classifier,
            exclusions,
            enable_hidden_files: self.filters.enable_hidden_files,
        })
    }
}

fn validate_folder_name(name: &str) -> Result<(), ConfigError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(ConfigError::InvalidFolderName(name.to_string()));
    }
    Ok(())
}

/// Validated rules, ready to hand to the organizer and the duplicate resolver.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub classifier: Classifier,
    pub exclusions: ExclusionSet,
    pub enable_hidden_files: bool,
}

impl CompiledRules {
    /// Adds comma-separated extension and directory exclusions from the command line.
    pub fn with_cli_exclusions(
        mut self,
        extensions: Option<&str>,
        directories: Option<&str>,
    ) -> Self {
        self.exclusions.extend_from_lists(extensions, directories);
        self
    }

    /// Hidden files are organized if either the config or the command line asks for it.
    pub fn include_hidden(&self, cli_hidden: bool) -> bool {
        cli_hidden || self.enable_hidden_files
    }
}

impl Default for CompiledRules {
    fn default() -> Self {
        Self {
            classifier: Classifier::default(),
            exclusions: ExclusionSet::default(),
            enable_hidden_files: false,
        }
    }
}
