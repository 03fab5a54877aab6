use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;

/// `cref="..."` or `cref='...'`, as written in XML doc comments.
#[allow(clippy::expect_used, reason = "the pattern is a literal")]
static CREF: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r#"cref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex"));

/// One cref attribute found in a documentation source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrefOccurrence {
    /// Source file, relative to the scan root.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: u32,
    /// The attribute value as written.
    pub text: String,
}

/// Extract every cref from one file's content, in order of appearance.
fn extract_crefs_from_content(content: &str, source: &Path) -> Vec<CrefOccurrence> {
    let mut found = Vec::new();
    for (line, text) in (1_u32..).zip(content.lines()) {
        for cap in CREF.captures_iter(text) {
            let Some(value) = cap.get(1).or_else(|| return cap.get(2)) else {
                continue;
            };
            found.push(CrefOccurrence { file: source.to_path_buf(), line, text: value.as_str().to_string() });
        }
    }
    return found;
}

/// Scan documentation sources under `root` and extract cref attributes.
/// Applies the config's extension list and include/exclude filters.
/// Files are visited in sorted path order so output is stable.
///
/// # Errors
///
/// Returns `Error::Io` if a matching file cannot be read.
pub fn scan(root: &Path, config: &Config) -> Result<Vec<CrefOccurrence>, Error> {
    let mut occurrences = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return e.path().extension().and_then(|ext| return ext.to_str()).is_some_and(|ext| return config.scans_extension(ext)))
    {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        if !config.should_scan(&relative.to_string_lossy()) {
            continue;
        }

        let content = std::fs::read_to_string(path)?;
        occurrences.extend(extract_crefs_from_content(&content, &relative));
    }

    tracing::debug!(count = occurrences.len(), "scanned crefs");
    return Ok(occurrences);
}
