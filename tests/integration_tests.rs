use dirsort::cli::{OrganizeCommand, RunOptions, run_cli_with_config};
/// Integration tests for dirsort
///
/// These tests drive the library through the same entry point as the
/// binary, against real temporary directory trees.
///
/// Test categories:
/// 1. Flat organization
/// 2. Recursive organization
/// 3. Flattening
/// 4. Exclusions
/// 5. Duplicate resolution
/// 6. Configuration, run log and backups
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary target directory plus a separate directory for config files,
/// so no run ever picks up the user's own configuration.
struct TestFixture {
    temp_dir: TempDir,
    config_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_dir = TempDir::new().expect("Failed to create config directory");
        TestFixture {
            temp_dir,
            config_dir,
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content, creating parent directories as needed.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, rel_path: &str, content: &str) {
        self.create_file(rel_path, content.as_bytes());
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    /// Write a config file and return its path.
    fn write_config(&self, content: &str) -> PathBuf {
        let path = self.config_dir.path().join("dirsort.toml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// Run a command quietly with the given config text (empty means defaults).
    fn run(&self, command: OrganizeCommand, config: &str) -> Result<(), String> {
        self.run_with(command, &RunOptions::default(), config)
    }

    fn run_with(
        &self,
        command: OrganizeCommand,
        options: &RunOptions,
        config: &str,
    ) -> Result<(), String> {
        let config_path = self.write_config(config);
        let options = RunOptions {
            quiet: true,
            ..options.clone()
        };
        run_cli_with_config(command, self.path(), &options, Some(&config_path))
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// All files of the tree, relative to the root, sorted.
    fn list_files_recursive(&self) -> Vec<String> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(root: &Path, dir: &Path, files: &mut Vec<String>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    let rel = path.strip_prefix(root).expect("path under root");
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                } else if path.is_dir() {
                    Self::walk_dir(root, &path, files);
                }
            }
        }
    }
}

fn organize() -> OrganizeCommand {
    OrganizeCommand::Organize {
        exclude: None,
        hidden: false,
    }
}

fn recursive(flat: bool) -> OrganizeCommand {
    OrganizeCommand::OrganizeRecursive {
        exclude: None,
        exclude_dir: None,
        flat,
        hidden: false,
    }
}

fn dedup() -> OrganizeCommand {
    OrganizeCommand::Dedup {
        interactive: false,
        hidden: false,
    }
}

/// The sample tree from the user guide: D/{a.txt, b.jpg, .hidden, S/c.txt}.
fn sample_tree() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "alpha");
    fixture.create_text_file("b.jpg", "bravo");
    fixture.create_text_file(".hidden", "secret");
    fixture.create_text_file("S/c.txt", "charlie");
    fixture
}

// ============================================================================
// Test Suite 1: Flat Organization
// ============================================================================

#[test]
fn test_organize_sample_tree() {
    let fixture = sample_tree();

    fixture.run(organize(), "").unwrap();

    fixture.assert_file_exists("txt/a.txt");
    fixture.assert_file_exists("img/b.jpg");
    fixture.assert_file_exists(".hidden");
    fixture.assert_file_exists("S/c.txt");
    fixture.assert_not_exists("hidden");
    assert_eq!(fixture.read("txt/a.txt"), "alpha");
}

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    fixture.run(organize(), "").unwrap();

    assert!(fixture.list_files_recursive().is_empty());
    assert_eq!(fs::read_dir(fixture.path()).unwrap().count(), 0);
}

#[test]
fn test_organize_unknown_and_extensionless_go_to_misc() {
    let fixture = TestFixture::new();
    fixture.create_text_file("data.xyz", "x");
    fixture.create_text_file("Makefile", "all:");
    fixture.create_text_file("report.pdf", "pdf");

    fixture.run(organize(), "").unwrap();

    fixture.assert_file_exists("misc/data.xyz");
    fixture.assert_file_exists("misc/Makefile");
    fixture.assert_file_exists("docs/report.pdf");
}

#[test]
fn test_organize_hidden_files_when_enabled() {
    let fixture = sample_tree();

    fixture
        .run(
            OrganizeCommand::Organize {
                exclude: None,
                hidden: true,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("hidden/.hidden");
    fixture.assert_file_exists("txt/a.txt");
}

#[test]
fn test_organize_refuses_to_overwrite() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "new");
    fixture.create_text_file("txt/a.txt", "old");

    let result = fixture.run(organize(), "");

    assert!(result.is_err());
    assert_eq!(fixture.read("a.txt"), "new");
    assert_eq!(fixture.read("txt/a.txt"), "old");
}

#[test]
fn test_organize_missing_directory_fails() {
    let fixture = TestFixture::new();
    let config_path = fixture.write_config("");
    let missing = fixture.path().join("does-not-exist");

    let result = run_cli_with_config(
        organize(),
        &missing,
        &RunOptions {
            quiet: true,
            ..RunOptions::default()
        },
        Some(&config_path),
    );

    assert!(result.is_err());
}

// ============================================================================
// Test Suite 2: Recursive Organization
// ============================================================================

#[test]
fn test_recursive_sorts_every_directory() {
    let fixture = sample_tree();
    fixture.create_text_file("S/T/song.mp3", "la");

    fixture.run(recursive(false), "").unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            ".hidden",
            "S/T/audio/song.mp3",
            "S/txt/c.txt",
            "img/b.jpg",
            "txt/a.txt",
        ]
    );
}

#[test]
fn test_recursive_does_not_descend_into_created_folders() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    fixture.run(recursive(false), "").unwrap();

    fixture.assert_file_exists("txt/a.txt");
    fixture.assert_not_exists("txt/txt");
}

#[test]
fn test_recursive_skips_hidden_directories() {
    let fixture = TestFixture::new();
    fixture.create_text_file(".git/config.txt", "core");
    fixture.create_text_file("notes.txt", "n");

    fixture.run(recursive(false), "").unwrap();

    fixture.assert_file_exists(".git/config.txt");
    fixture.assert_file_exists("txt/notes.txt");
}

// ============================================================================
// Test Suite 3: Flattening
// ============================================================================

#[test]
fn test_flatten_sample_tree() {
    let fixture = sample_tree();

    fixture.run(recursive(true), "").unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec![".hidden", "img/b.jpg", "txt/a.txt", "txt/c.txt"]
    );
    fixture.assert_not_exists("S");
}

#[test]
fn test_flatten_leaves_only_category_folders() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one/two/three/deep.pdf", "d");
    fixture.create_text_file("one/pic.png", "p");
    fixture.create_text_file("other/tune.wav", "t");
    fixture.create_subdir("empty/inner");

    fixture.run(recursive(true), "").unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec!["audio/tune.wav", "docs/deep.pdf", "img/pic.png"]
    );
    let mut dirs: Vec<String> = fs::read_dir(fixture.path())
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    dirs.sort();
    assert_eq!(dirs, vec!["audio", "docs", "img"]);
}

#[test]
fn test_flatten_keeps_existing_category_folder() {
    let fixture = TestFixture::new();
    fixture.create_text_file("img/old.png", "o");
    fixture.create_text_file("nested/new.png", "n");

    fixture.run(recursive(true), "").unwrap();

    fixture.assert_file_exists("img/old.png");
    fixture.assert_file_exists("img/new.png");
    fixture.assert_not_exists("nested");
}

#[test]
fn test_flatten_moves_hidden_files_to_root() {
    let fixture = TestFixture::new();
    fixture.create_text_file("sub/.env", "KEY=1");

    fixture.run(recursive(true), "").unwrap();

    fixture.assert_file_exists(".env");
    fixture.assert_not_exists("sub");
}

// ============================================================================
// Test Suite 4: Exclusions
// ============================================================================

#[test]
fn test_exclude_extension_stays_in_place() {
    let fixture = TestFixture::new();
    fixture.create_text_file("draft.tmp", "t");
    fixture.create_text_file("notes.txt", "n");

    fixture
        .run(
            OrganizeCommand::Organize {
                exclude: Some(".tmp".to_string()),
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("draft.tmp");
    fixture.assert_file_exists("txt/keep.txt");
    fixture.assert_not_exists("misc");
}

#[test]
fn test_exclude_extension_without_dot() {
    let fixture = TestFixture::new();
    fixture.create_text_file("trace.log", "l");

    fixture
        .run(
            OrganizeCommand::Organize {
                exclude: Some("log, tmp".to_string()),
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("trace.log");
}

#[test]
fn test_extension_matching_is_case_sensitive() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.JPG", "p");
    fixture.create_text_file("KEEP.TXT", "k");
    fixture.create_text_file("notes.txt", "n");

    fixture
        .run(
            OrganizeCommand::Organize {
                exclude: Some(".txt".to_string()),
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("misc/photo.JPG");
    fixture.assert_file_exists("misc/KEEP.TXT");
    fixture.assert_file_exists("notes.txt");
    fixture.assert_not_exists("img");
}

#[test]
fn test_recursive_excluded_files_stay_where_they_are() {
    let fixture = TestFixture::new();
    fixture.create_text_file("sub/partial.tmp", "p");
    fixture.create_text_file("sub/done.txt", "d");

    fixture
        .run(
            OrganizeCommand::OrganizeRecursive {
                exclude: Some(".tmp".to_string()),
                exclude_dir: None,
                flat: false,
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("sub/partial.tmp");
    fixture.assert_file_exists("sub/txt/done.txt");
}

#[test]
fn test_flatten_moves_excluded_files_to_root() {
    let fixture = TestFixture::new();
    fixture.create_text_file("sub/partial.tmp", "p");
    fixture.create_text_file("sub/done.txt", "d");

    fixture
        .run(
            OrganizeCommand::OrganizeRecursive {
                exclude: Some(".tmp".to_string()),
                exclude_dir: None,
                flat: true,
                hidden: false,
            },
            "",
        )
        .unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec!["partial.tmp", "txt/done.txt"]
    );
    fixture.assert_not_exists("sub");
}

#[test]
fn test_recursive_excluded_directory_untouched() {
    let fixture = TestFixture::new();
    fixture.create_text_file("node_modules/pkg/index.js", "js");
    fixture.create_text_file("main.rs", "fn main() {}");

    fixture
        .run(
            OrganizeCommand::OrganizeRecursive {
                exclude: None,
                exclude_dir: Some("node_modules".to_string()),
                flat: false,
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("node_modules/pkg/index.js");
    fixture.assert_file_exists("code/main.rs");
}

#[test]
fn test_flatten_moves_pruned_directory_to_root_intact() {
    let fixture = TestFixture::new();
    fixture.create_text_file("project/vendor/lib.c", "c");
    fixture.create_text_file("project/readme.md", "r");

    fixture
        .run(
            OrganizeCommand::OrganizeRecursive {
                exclude: None,
                exclude_dir: Some("vendor".to_string()),
                flat: true,
                hidden: false,
            },
            "",
        )
        .unwrap();

    fixture.assert_file_exists("vendor/lib.c");
    fixture.assert_file_exists("txt/readme.md");
    fixture.assert_not_exists("project");
}

// ============================================================================
// Test Suite 5: Duplicate Resolution
// ============================================================================

#[test]
fn test_dedup_keeps_first_name_of_each_group() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a", "same");
    fixture.create_text_file("b", "same");
    fixture.create_text_file("c", "same");
    fixture.create_text_file("d", "different");

    fixture.run(dedup(), "").unwrap();

    assert_eq!(fixture.list_files_recursive(), vec!["a", "d"]);
    assert_eq!(fixture.read("a"), "same");
}

#[test]
fn test_dedup_is_deterministic() {
    let build = || {
        let fixture = TestFixture::new();
        for name in ["zeta.txt", "alpha.txt", "mid.txt", "x1.bin", "x0.bin"] {
            let content = if name.ends_with(".txt") { "text" } else { "bin" };
            fixture.create_text_file(name, content);
        }
        fixture
    };

    let first = build();
    let second = build();
    first.run(dedup(), "").unwrap();
    second.run(dedup(), "").unwrap();

    assert_eq!(first.list_files_recursive(), vec!["alpha.txt", "x0.bin"]);
    assert_eq!(first.list_files_recursive(), second.list_files_recursive());
}

#[test]
fn test_dedup_ignores_subdirectories_and_hidden_files() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "same");
    fixture.create_text_file(".a.txt", "same");
    fixture.create_text_file("sub/a.txt", "same");

    fixture.run(dedup(), "").unwrap();

    fixture.assert_file_exists("a.txt");
    fixture.assert_file_exists(".a.txt");
    fixture.assert_file_exists("sub/a.txt");
}

#[test]
fn test_dedup_without_duplicates_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one", "1");
    fixture.create_text_file("two", "2");

    fixture.run(dedup(), "").unwrap();

    assert_eq!(fixture.list_files_recursive(), vec!["one", "two"]);
}

// ============================================================================
// Test Suite 6: Configuration, Run Log and Backups
// ============================================================================

#[test]
fn test_config_custom_targets_and_folders() {
    let fixture = TestFixture::new();
    fixture.create_text_file("shot.png", "p");
    fixture.create_text_file("notes.org", "o");
    fixture.create_text_file("blob.qqq", "q");

    let config = r#"
[classify]
default_folder = "other"

[classify.targets]
".org" = "txt"
"png" = "pictures"
"#;
    fixture.run(organize(), config).unwrap();

    fixture.assert_file_exists("pictures/shot.png");
    fixture.assert_file_exists("txt/notes.org");
    fixture.assert_file_exists("other/blob.qqq");
}

#[test]
fn test_config_without_builtin_targets() {
    let fixture = TestFixture::new();
    fixture.create_text_file("song.mp3", "m");

    let config = r#"
[classify]
builtin_targets = false
"#;
    fixture.run(organize(), config).unwrap();

    fixture.assert_file_exists("misc/song.mp3");
}

#[test]
fn test_config_exclude_patterns_and_hidden() {
    let fixture = TestFixture::new();
    fixture.create_text_file("video.mp4.part", "p");
    fixture.create_text_file(".profile", "h");

    let config = r#"
[filters]
enable_hidden_files = true

[filters.exclude]
patterns = ["*.part"]
"#;
    fixture.run(organize(), config).unwrap();

    fixture.assert_file_exists("video.mp4.part");
    fixture.assert_file_exists("hidden/.profile");
}

#[test]
fn test_invalid_config_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let result = fixture.run(organize(), "[classify\nnot toml");

    assert!(result.is_err());
    fixture.assert_file_exists("a.txt");
    fixture.assert_not_exists("txt");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let result = run_cli_with_config(
        organize(),
        fixture.path(),
        &RunOptions {
            quiet: true,
            ..RunOptions::default()
        },
        Some(&fixture.config_dir.path().join("absent.toml")),
    );

    assert!(result.is_err());
    fixture.assert_file_exists("a.txt");
}

#[test]
fn test_unknown_archive_format_changes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    let options = RunOptions {
        backup: Some("rar".to_string()),
        ..RunOptions::default()
    };
    let result = fixture.run_with(organize(), &options, "");

    let message = result.unwrap_err();
    assert!(message.contains("rar"), "unexpected message: {}", message);
    assert_eq!(fixture.list_files_recursive(), vec!["a.txt"]);
}

#[test]
fn test_save_writes_run_log_in_target() {
    let fixture = sample_tree();

    let options = RunOptions {
        save: true,
        ..RunOptions::default()
    };
    fixture.run_with(organize(), &options, "").unwrap();

    fixture.assert_file_exists("dirsort.log");
    fixture.assert_file_exists("txt/a.txt");
    fixture.assert_not_exists("txt/dirsort.log");
    assert!(fixture.read("dirsort.log").contains("a.txt"));
}

#[test]
fn test_save_writes_run_log_to_output_directory() {
    let fixture = sample_tree();
    let output = TempDir::new().unwrap();

    let options = RunOptions {
        save: true,
        output: Some(output.path().to_path_buf()),
        ..RunOptions::default()
    };
    fixture.run_with(recursive(true), &options, "").unwrap();

    assert!(output.path().join("dirsort.log").is_file());
    fixture.assert_not_exists("dirsort.log");
}

#[test]
fn test_backup_is_written_before_organizing() {
    let fixture = sample_tree();

    let options = RunOptions {
        backup: Some("zip".to_string()),
        ..RunOptions::default()
    };
    fixture.run_with(recursive(true), &options, "").unwrap();

    fixture.assert_file_exists("dirsort_backup.zip");
    fixture.assert_not_exists("archives/dirsort_backup.zip");
    fixture.assert_file_exists("txt/c.txt");
    let size = fs::metadata(fixture.path().join("dirsort_backup.zip"))
        .unwrap()
        .len();
    assert!(size > 0);
}

#[test]
fn test_gztar_backup_before_dedup() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a", "same");
    fixture.create_text_file("b", "same");

    let options = RunOptions {
        backup: Some("gztar".to_string()),
        ..RunOptions::default()
    };
    fixture.run_with(dedup(), &options, "").unwrap();

    assert_eq!(
        fixture.list_files_recursive(),
        vec!["a", "dirsort_backup.tar.gz"]
    );
}

#[test]
fn test_rerun_leaves_organized_tree_in_place() {
    let fixture = sample_tree();

    fixture.run(organize(), "").unwrap();
    let first = fixture.list_files_recursive();
    fixture.run(organize(), "").unwrap();

    assert_eq!(fixture.list_files_recursive(), first);
    fixture.assert_dir_exists("txt");
    fixture.assert_dir_exists("img");
}

#[test]
fn test_recursive_rerun_renests_existing_category_folders() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a.txt", "a");

    fixture.run(recursive(false), "").unwrap();
    fixture.assert_file_exists("txt/a.txt");

    fixture.run(recursive(false), "").unwrap();

    assert_eq!(fixture.list_files_recursive(), vec!["txt/txt/a.txt"]);
}

#[test]
fn test_flatten_rerun_is_noop() {
    let fixture = TestFixture::new();
    fixture.create_text_file("S/b.txt", "b");
    fixture.create_text_file("c.png", "c");

    fixture.run(recursive(true), "").unwrap();
    let first = fixture.list_files_recursive();
    assert_eq!(first, vec!["img/c.png", "txt/b.txt"]);

    fixture.run(recursive(true), "").unwrap();

    assert_eq!(fixture.list_files_recursive(), first);
    fixture.assert_not_exists("txt/txt");
    fixture.assert_not_exists("S");
}

#[test]
fn test_save_with_missing_directory_reports_invalid_path() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("does-not-exist");
    let config_path = fixture.write_config("");

    let result = run_cli_with_config(
        organize(),
        &missing,
        &RunOptions {
            save: true,
            quiet: true,
            ..RunOptions::default()
        },
        Some(&config_path),
    );

    let message = result.unwrap_err();
    assert!(
        message.contains("Invalid base path"),
        "unexpected message: {}",
        message
    );
    assert!(!missing.exists());
}
