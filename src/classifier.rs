/// File classification by extension and hidden status.
///
/// A [`Classifier`] maps a file name to the name of the category folder it
/// belongs in. Hidden files always go to the hidden folder, known extensions
/// go to their mapped folder and everything else lands in the default folder.
///
/// # Examples
///
/// ```
/// use dirsort::classifier::Classifier;
///
/// let classifier = Classifier::default();
/// assert_eq!(classifier.classify("photo.jpg", false), "img");
/// assert_eq!(classifier.classify("notes.txt", false), "txt");
/// assert_eq!(classifier.classify("data.unknown", false), "misc");
/// assert_eq!(classifier.classify(".bashrc", true), "hidden");
/// ```
use std::collections::{BTreeSet, HashMap};

/// Folder that receives hidden files unless configured otherwise.
pub const DEFAULT_HIDDEN_FOLDER: &str = "hidden";

/// Folder that receives files with unmapped extensions unless configured otherwise.
pub const DEFAULT_MISC_FOLDER: &str = "misc";

/// Built-in file categories used to seed the extension map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Raster and vector images.
    Image,
    /// Audio files.
    Audio,
    /// Video files.
    Video,
    /// Plain text and markdown.
    Text,
    /// Office documents and PDFs.
    Document,
    /// Spreadsheets and tabular data.
    Spreadsheet,
    /// Slide decks.
    Presentation,
    /// Compressed archives.
    Archive,
    /// Source code and structured config files.
    Code,
    /// Font files.
    Font,
}

impl Category {
    /// Every built-in category, in the order their mappings are registered.
    pub const ALL: [Category; 10] = [
        Category::Image,
        Category::Audio,
        Category::Video,
        Category::Text,
        Category::Document,
        Category::Spreadsheet,
        Category::Presentation,
        Category::Archive,
        Category::Code,
        Category::Font,
    ];

    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::classifier::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "img");
    /// assert_eq!(Category::Text.dir_name(), "txt");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Image => "img",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Text => "txt",
            Category::Document => "docs",
            Category::Spreadsheet => "sheets",
            Category::Presentation => "slides",
            Category::Archive => "archives",
            Category::Code => "code",
            Category::Font => "fonts",
        }
    }

    /// Extensions (with leading dot) that belong to this category.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Category::Image => &[
                ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp", ".tiff", ".ico",
                ".heic",
            ],
            Category::Audio => &[".mp3", ".wav", ".ogg", ".flac", ".aac", ".m4a", ".wma"],
            Category::Video => &[".mp4", ".mkv", ".avi", ".mov", ".flv", ".wmv", ".webm", ".3gp"],
            Category::Text => &[".txt", ".md", ".rst", ".log"],
            Category::Document => &[".pdf", ".doc", ".docx", ".odt", ".rtf", ".epub"],
            Category::Spreadsheet => &[".csv", ".xls", ".xlsx", ".ods"],
            Category::Presentation => &[".ppt", ".pptx", ".odp", ".key"],
            Category::Archive => &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"],
            Category::Code => &[
                ".py", ".rs", ".c", ".cpp", ".h", ".hpp", ".java", ".js", ".ts", ".go", ".sh",
                ".json", ".xml", ".yaml", ".yml", ".toml", ".html", ".css",
            ],
            Category::Font => &[".ttf", ".otf", ".woff", ".woff2"],
        }
    }
}

/// Returns the extension of a file name, including the leading dot.
///
/// Leading dots of the name are not treated as extension separators, so
/// `.bashrc` has no extension while `.config.json` has `.json`. Returns an
/// empty string when there is no extension.
///
/// # Examples
///
/// ```
/// use dirsort::classifier::extension_of;
///
/// assert_eq!(extension_of("report.pdf"), ".pdf");
/// assert_eq!(extension_of("backup.tar.gz"), ".gz");
/// assert_eq!(extension_of("Makefile"), "");
/// assert_eq!(extension_of(".bashrc"), "");
/// ```
pub fn extension_of(file_name: &str) -> &str {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name[stem_start..].rfind('.') {
        Some(idx) => &file_name[stem_start + idx..],
        None => "",
    }
}

/// Normalizes a user-supplied extension to the dot-prefixed form.
///
/// `txt` and ` .txt ` both normalize to `.txt`. Case is kept, so `.TXT` is a
/// different extension. An empty input stays empty.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Maps file names to category folder names.
///
/// The classifier is built once per run and never mutated while files are
/// being organized.
#[derive(Debug, Clone)]
pub struct Classifier {
    targets: HashMap<String, String>,
    hidden_folder: String,
    default_folder: String,
}

impl Classifier {
    /// Creates a classifier with the built-in extension map.
    pub fn new() -> Self {
        let mut classifier = Self::empty(DEFAULT_HIDDEN_FOLDER, DEFAULT_MISC_FOLDER);
        for category in Category::ALL {
            for ext in category.extensions() {
                classifier.add_target(ext, category.dir_name());
            }
        }
        classifier
    }

    /// Creates a classifier with no extension mappings.
    pub fn empty(hidden_folder: &str, default_folder: &str) -> Self {
        Self {
            targets: HashMap::new(),
            hidden_folder: hidden_folder.to_string(),
            default_folder: default_folder.to_string(),
        }
    }

    /// Maps an extension (with or without the leading dot) to a folder.
    ///
    /// A later mapping for the same extension replaces the earlier one.
    pub fn add_target(&mut self, ext: &str, folder: &str) {
        self.targets
            .insert(normalize_extension(ext), folder.to_string());
    }

    /// Replaces the folder that receives hidden files.
    pub fn set_hidden_folder(&mut self, folder: &str) {
        self.hidden_folder = folder.to_string();
    }

    /// Replaces the folder that receives files with unmapped extensions.
    pub fn set_default_folder(&mut self, folder: &str) {
        self.default_folder = folder.to_string();
    }

    pub fn hidden_folder(&self) -> &str {
        &self.hidden_folder
    }

    pub fn default_folder(&self) -> &str {
        &self.default_folder
    }

    /// Looks up the folder mapped to an extension. Matching is case-sensitive.
    pub fn folder_for_extension(&self, ext: &str) -> Option<&str> {
        self.targets
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    /// Returns the category folder for a file.
    ///
    /// Hidden files go to the hidden folder whatever their extension.
    /// Never fails: unknown extensions resolve to the default folder.
    pub fn classify(&self, file_name: &str, is_hidden: bool) -> &str {
        if is_hidden {
            return &self.hidden_folder;
        }

        let ext = extension_of(file_name);
        if !ext.is_empty()
            && let Some(folder) = self.folder_for_extension(ext)
        {
            return folder;
        }

        &self.default_folder
    }

    /// Every folder name this classifier can produce.
    pub fn category_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.targets.values().map(String::as_str).collect();
        names.insert(self.hidden_folder.as_str());
        names.insert(self.default_folder.as_str());
        names
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
