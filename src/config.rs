use std::path::{Path, PathBuf};

use crate::error::Error;

/// Catalog file used when `.docid.toml` doesn't name one.
const DEFAULT_CATALOG: &str = "docid-catalog.toml";

/// File extensions scanned for crefs when `.docid.toml` doesn't list any.
const DEFAULT_EXTENSIONS: [&str; 3] = ["xml", "cs", "md"];

/// Project configuration loaded from `.docid.toml`.
/// Include/exclude patterns are path prefixes applied to documentation sources.
#[derive(Debug)]
pub struct Config {
    /// Catalog file, relative to the project root.
    catalog: PathBuf,
    /// Path prefixes never scanned.
    exclude: Vec<String>,
    /// Extensions (without the dot) of files that carry crefs.
    extensions: Vec<String>,
    /// Path prefixes scanned; empty means everything.
    include: Vec<String>,
}

impl Config {
    /// The catalog path, joined onto `root`.
    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        return root.join(&self.catalog);
    }

    /// Load config from `.docid.toml` in the given root directory.
    /// Returns defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed, never silently
    /// falling back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(".docid.toml");
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::scan_everything_by_default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let raw: DocidTomlConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        return Ok(Self {
            catalog: raw.catalog.unwrap_or_else(|| return PathBuf::from(DEFAULT_CATALOG)),
            exclude: raw.exclude,
            extensions: raw.extensions.unwrap_or_else(default_extensions),
            include: raw.include,
        });
    }

    /// Default config that includes everything and excludes nothing.
    fn scan_everything_by_default() -> Self {
        return Self {
            catalog: PathBuf::from(DEFAULT_CATALOG),
            exclude: Vec::new(),
            extensions: default_extensions(),
            include: Vec::new(),
        };
    }

    /// Whether a file extension marks a documentation source.
    pub fn scans_extension(&self, ext: &str) -> bool {
        return self.extensions.iter().any(|e| return e.eq_ignore_ascii_case(ext));
    }

    /// Check whether a documentation source path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }

    /// Replace the configured catalog path, as the `--catalog` flag does.
    #[must_use]
    pub fn with_catalog(self, catalog: PathBuf) -> Self {
        return Self { catalog, ..self };
    }
}

/// Raw TOML structure for `.docid.toml`.
#[derive(serde::Deserialize)]
struct DocidTomlConfig {
    /// Catalog file path.
    catalog: Option<PathBuf>,
    /// Excluded path prefixes.
    #[serde(default)]
    exclude: Vec<String>,
    /// Scanned file extensions.
    extensions: Option<Vec<String>>,
    /// Included path prefixes.
    #[serde(default)]
    include: Vec<String>,
}

/// The built-in extension list.
fn default_extensions() -> Vec<String> {
    return DEFAULT_EXTENSIONS.iter().map(|e| return (*e).to_string()).collect();
}
