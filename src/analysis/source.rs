// Content loading for scannable files
//
// Each file is read once and handed to every content-level detector.
// Failures are per-file and never abort the load.

use crate::analysis::filter::MAX_SCAN_BYTES;
use indicatif::ProgressBar;
use std::fmt;
use std::path::Path;

/// Decoded contents of one scanned file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Repository-relative path
    pub path: String,
    pub content: String,
}

impl SourceText {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Why a file was left out of content scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be opened or read
    Unreadable(String),
    /// The bytes are not valid UTF-8
    NotUtf8,
    /// The file grew past the scan ceiling after the walk
    TooLarge(u64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
            SkipReason::NotUtf8 => write!(f, "not valid UTF-8"),
            SkipReason::TooLarge(size) => write!(f, "too large ({} bytes)", size),
        }
    }
}

/// Read one repository-relative file as UTF-8 text
pub fn read_source(root: &Path, rel_path: &str) -> Result<SourceText, SkipReason> {
    let bytes = std::fs::read(root.join(rel_path))
        .map_err(|e| SkipReason::Unreadable(e.to_string()))?;

    if bytes.len() as u64 > MAX_SCAN_BYTES {
        return Err(SkipReason::TooLarge(bytes.len() as u64));
    }

    let content = String::from_utf8(bytes).map_err(|_| SkipReason::NotUtf8)?;
    Ok(SourceText::new(rel_path, content))
}

/// Files that loaded and files that were skipped, in input order
#[derive(Debug, Default)]
pub struct LoadedSources {
    pub files: Vec<SourceText>,
    pub skipped: Vec<(String, SkipReason)>,
}

/// Load every path, collecting skips instead of failing
pub fn load_sources(root: &Path, rel_paths: &[String], progress: Option<&ProgressBar>) -> LoadedSources {
    let mut loaded = LoadedSources::default();

    for rel_path in rel_paths {
        if let Some(pb) = progress {
            pb.set_message(rel_path.clone());
            pb.inc(1);
        }

        match read_source(root, rel_path) {
            Ok(source) => loaded.files.push(source),
            Err(reason) => {
                tracing::debug!("Skipping {}: {}", rel_path, reason);
                loaded.skipped.push((rel_path.clone(), reason));
            }
        }
    }

    loaded
}
