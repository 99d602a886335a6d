//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading and validation
//! - Run log setup
//! - Dispatching to the organizer and the duplicate resolver

use crate::backup::ArchiveFormat;
use crate::config::{CompiledRules, DirsortConfig};
use crate::duplicates::{DuplicateResolver, RenamePrompt, TerminalPrompt};
use crate::organizer::{Organizer, RunSummary, check_root};
use crate::output::RunLog;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "dirsort")]
#[command(about = "Sort files into category folders, flatten nested folders and merge duplicates", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'q', global = true, help = "Suppress console output")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Sort the files of a directory into category folders")]
    Organize {
        #[arg(help = "Directory to organize")]
        dir_path: PathBuf,

        #[arg(long, help = "Comma-separated extensions to leave alone, e.g. .log,.tmp")]
        exclude: Option<String>,

        #[arg(long, help = "Organize hidden files too")]
        hidden: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    #[command(about = "Sort every directory of a tree, optionally flattening it")]
    OrganizeRecursive {
        #[arg(help = "Root of the tree to organize")]
        dir_path: PathBuf,

        #[arg(long, help = "Comma-separated extensions to leave alone, e.g. .log,.tmp")]
        exclude: Option<String>,

        #[arg(long, help = "Comma-separated directory names to leave alone")]
        exclude_dir: Option<String>,

        #[arg(long, help = "Collect everything into category folders at the root")]
        flat: bool,

        #[arg(long, help = "Organize hidden files too")]
        hidden: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    #[command(about = "Find and merge duplicate files in a directory")]
    Dedup {
        #[arg(help = "Directory to deduplicate")]
        dir_path: PathBuf,

        #[arg(long, short = 'i', help = "Ask for the name to keep for each group")]
        interactive: bool,

        #[arg(long, help = "Consider hidden files too")]
        hidden: bool,

        #[command(flatten)]
        run: RunArgs,
    },
}

/// Options shared by every mutating command.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    #[arg(long, help = "Archive the directory before changing anything")]
    pub backup: bool,

    #[arg(long, default_value = "zip", help = "Backup archive format: zip, tar or gztar")]
    pub archive_format: String,

    #[arg(long, help = "Save the run log to a file")]
    pub save: bool,

    #[arg(long, help = "Directory for the saved run log (defaults to the target directory)")]
    pub output: Option<PathBuf>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone)]
pub enum OrganizeCommand {
    /// Sort the immediate files of a directory.
    Organize {
        exclude: Option<String>,
        hidden: bool,
    },
    /// Sort every directory of a tree, or flatten it.
    OrganizeRecursive {
        exclude: Option<String>,
        exclude_dir: Option<String>,
        flat: bool,
        hidden: bool,
    },
    /// Merge duplicate files of a directory.
    Dedup { interactive: bool, hidden: bool },
}

/// Run-wide options that are not specific to one command.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Archive format to back up with, as typed by the user. `None` means no backup.
    pub backup: Option<String>,
    /// Save the run log to `output` (or the target directory).
    pub save: bool,
    pub output: Option<PathBuf>,
    /// Suppress console output.
    pub quiet: bool,
}

impl Cli {
    /// Splits parsed arguments into the command, its target and the run options.
    pub fn into_parts(self) -> (OrganizeCommand, PathBuf, RunOptions, Option<PathBuf>) {
        let quiet = self.quiet;
        let to_options = |run: RunArgs| RunOptions {
            backup: run.backup.then_some(run.archive_format),
            save: run.save,
            output: run.output,
            quiet,
        };

        let (command, dir_path, options) = match self.command {
            Commands::Organize {
                dir_path,
                exclude,
                hidden,
                run,
            } => (
                OrganizeCommand::Organize { exclude, hidden },
                dir_path,
                to_options(run),
            ),
            Commands::OrganizeRecursive {
                dir_path,
                exclude,
                exclude_dir,
                flat,
                hidden,
                run,
            } => (
                OrganizeCommand::OrganizeRecursive {
                    exclude,
                    exclude_dir,
                    flat,
                    hidden,
                },
                dir_path,
                to_options(run),
            ),
            Commands::Dedup {
                dir_path,
                interactive,
                hidden,
                run,
            } => (
                OrganizeCommand::Dedup {
                    interactive,
                    hidden,
                },
                dir_path,
                to_options(run),
            ),
        };

        (command, dir_path, options, self.config)
    }
}

/// Runs the CLI application with the given command and directory path.
///
/// Configuration is looked up in the default locations.
///
/// # Examples
///
/// ```no_run
/// use dirsort::cli::{run_cli, OrganizeCommand, RunOptions};
/// use std::path::Path;
///
/// let command = OrganizeCommand::Organize { exclude: None, hidden: false };
/// match run_cli(command, Path::new("/path/to/directory"), &RunOptions::default()) {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    command: OrganizeCommand,
    dir_path: &Path,
    options: &RunOptions,
) -> Result<(), String> {
    run_cli_with_config(command, dir_path, options, None)
}

/// Runs the CLI application with an optional configuration file.
///
/// Configuration problems (unreadable file, invalid TOML, bad glob, unknown
/// archive format) are reported before the target directory is touched.
pub fn run_cli_with_config(
    command: OrganizeCommand,
    dir_path: &Path,
    options: &RunOptions,
    config_path: Option<&Path>,
) -> Result<(), String> {
    let config = DirsortConfig::load(config_path)
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let rules = config
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;
    let backup = options
        .backup
        .as_deref()
        .map(str::parse::<ArchiveFormat>)
        .transpose()
        .map_err(|e| format!("Error: {}", e))?;

    check_root(dir_path).map_err(|e| format!("Error: {}", e))?;
    let log = open_log(dir_path, options)?;

    match command {
        OrganizeCommand::Organize { exclude, hidden } => {
            let rules = rules.with_cli_exclusions(exclude.as_deref(), None);
            organize(&rules, &log, dir_path, hidden, backup, Mode::Flat)
        }
        OrganizeCommand::OrganizeRecursive {
            exclude,
            exclude_dir,
            flat,
            hidden,
        } => {
            let rules = rules.with_cli_exclusions(exclude.as_deref(), exclude_dir.as_deref());
            let mode = if flat { Mode::Flatten } else { Mode::Recursive };
            organize(&rules, &log, dir_path, hidden, backup, mode)
        }
        OrganizeCommand::Dedup {
            interactive,
            hidden,
        } => dedup(&rules, &log, dir_path, interactive, hidden, backup),
    }
}

fn open_log(dir_path: &Path, options: &RunOptions) -> Result<RunLog, String> {
    let log = if options.quiet {
        RunLog::quiet()
    } else {
        RunLog::console()
    };

    if !options.save {
        return Ok(log);
    }
    let output_dir = options.output.as_deref().unwrap_or(dir_path);
    log.save_to(output_dir).map_err(|e| format!("Error: {}", e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Recursive,
    Flatten,
}

fn organize(
    rules: &CompiledRules,
    log: &RunLog,
    dir_path: &Path,
    hidden: bool,
    backup: Option<ArchiveFormat>,
    mode: Mode,
) -> Result<(), String> {
    let organizer = Organizer::new(&rules.classifier, &rules.exclusions, log)
        .include_hidden(rules.include_hidden(hidden))
        .with_backup(backup);

    let result = match mode {
        Mode::Flat => organizer.organize(dir_path),
        Mode::Recursive => organizer.organize_recursive(dir_path),
        Mode::Flatten => organizer.organize_flatten(dir_path),
    };

    match result {
        Ok(summary) => {
            print_summary(log, &summary);
            Ok(())
        }
        Err(e) => {
            log.error(&e.to_string());
            Err(format!("Error: {}", e))
        }
    }
}

fn dedup(
    rules: &CompiledRules,
    log: &RunLog,
    dir_path: &Path,
    interactive: bool,
    hidden: bool,
    backup: Option<ArchiveFormat>,
) -> Result<(), String> {
    let resolver = DuplicateResolver::new(log)
        .include_hidden(rules.include_hidden(hidden))
        .with_backup(backup);

    let mut terminal = TerminalPrompt;
    let prompt: Option<&mut dyn RenamePrompt> = if interactive {
        Some(&mut terminal)
    } else {
        None
    };

    match resolver.resolve(dir_path, prompt) {
        Ok(summary) => {
            if summary.groups > 0 {
                log.success(&format!(
                    "Merged {} duplicate {}, removed {} {}",
                    summary.groups,
                    if summary.groups == 1 { "group" } else { "groups" },
                    summary.removed_files,
                    if summary.removed_files == 1 { "file" } else { "files" },
                ));
            }
            Ok(())
        }
        Err(e) => {
            log.error(&e.to_string());
            Err(format!("Error: {}", e))
        }
    }
}

fn print_summary(log: &RunLog, summary: &RunSummary) {
    log.header("SUMMARY");
    log.info(&format!("Moved files:         {}", summary.moved_files));
    log.info(&format!("Skipped files:       {}", summary.skipped_files));
    if summary.moved_dirs > 0 {
        log.info(&format!("Moved directories:   {}", summary.moved_dirs));
    }
    log.info(&format!("Created folders:     {}", summary.created_dirs));
    if summary.removed_dirs > 0 {
        log.info(&format!("Removed directories: {}", summary.removed_dirs));
    }
    log.success("Organization complete!");
}
