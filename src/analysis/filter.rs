// Path filtering shared by every traversal
//
// Decides which entries are ignored and which files are worth reading.

use glob::Pattern;
use std::path::{Component, Path};

/// Largest file, in bytes, that is read for content scanning
pub const MAX_SCAN_BYTES: u64 = 100_000;

/// Extensions (lowercase, without the dot) considered text for scanning
pub const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "go", "rs", "java", "kt", "html", "css", "json", "yaml", "yml",
    "toml", "md", "txt",
];

#[derive(Debug, Clone)]
struct IgnorePattern {
    raw: String,
    glob: Option<Pattern>,
}

/// Compiled form of the `ignore` config list
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreFilter {
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter(|p| !p.is_empty())
            .map(|raw| {
                let glob = if raw.contains(['*', '?', '[']) {
                    match Pattern::new(raw) {
                        Ok(p) => Some(p),
                        Err(e) => {
                            tracing::warn!("Ignore pattern '{}' is not a valid glob: {}", raw, e);
                            None
                        }
                    }
                } else {
                    None
                };
                IgnorePattern {
                    raw: raw.clone(),
                    glob,
                }
            })
            .collect();

        Self { patterns }
    }

    /// Check a repository-relative path (with `/` separators) and its file name.
    ///
    /// A pattern matches when it is a substring of the relative path, equals the
    /// file name, or matches the file name as a glob.
    pub fn is_ignored(&self, rel_path: &str, name: &str) -> bool {
        self.patterns.iter().any(|p| {
            name == p.raw
                || rel_path.contains(p.raw.as_str())
                || p.glob.as_ref().map_or(false, |g| g.matches(name))
        })
    }

    /// Add a pattern after construction
    pub fn push(&mut self, raw: impl Into<String>) {
        let raw = raw.into();
        if !raw.is_empty() {
            self.patterns.push(IgnorePattern { raw, glob: None });
        }
    }

    /// Whether a file is eligible for content scanning
    pub fn is_scannable(&self, path: &Path, rel_path: &str, name: &str) -> bool {
        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };

        if !metadata.is_file() || self.is_ignored(rel_path, name) {
            return false;
        }

        if metadata.len() > MAX_SCAN_BYTES {
            return false;
        }

        has_text_extension(name)
    }
}

/// Lowercased extension of a file name, without the dot.
///
/// Names starting with a dot and having no other dot (`.env`) have no extension.
pub fn extension_of(name: &str) -> Option<String> {
    let stem_start = if name.starts_with('.') { 1 } else { 0 };
    let dot = name[stem_start..].rfind('.')? + stem_start;
    if dot + 1 >= name.len() {
        return None;
    }
    Some(name[dot + 1..].to_ascii_lowercase())
}

pub fn has_text_extension(name: &str) -> bool {
    extension_of(name).map_or(false, |ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

/// Repository-relative path using `/` separators regardless of platform
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn default_filter() -> IgnoreFilter {
        IgnoreFilter::new(&Config::default().ignore)
    }

    #[test]
    fn test_ignores_directory_segments() {
        let filter = default_filter();
        assert!(filter.is_ignored("node_modules", "node_modules"));
        assert!(filter.is_ignored("node_modules/express/index.js", "index.js"));
        assert!(filter.is_ignored("web/node_modules/x.js", "x.js"));
        assert!(filter.is_ignored("dist", "dist"));
    }

    #[test]
    fn test_substring_matching() {
        let filter = default_filter();
        // "out" and "build" match anywhere in the path
        assert!(filter.is_ignored("src/layout.js", "layout.js"));
        assert!(filter.is_ignored("build_utils.py", "build_utils.py"));
        assert!(filter.is_ignored("routes/users.js", "users.js"));
        assert!(!filter.is_ignored("src/app.js", "app.js"));
        assert!(!filter.is_ignored("models/order.js", "order.js"));
    }

    #[test]
    fn test_glob_patterns_match_names() {
        let filter = default_filter();
        assert!(filter.is_ignored("pkg/module.pyc", "module.pyc"));
        assert!(!filter.is_ignored("pkg/module.py", "module.py"));
    }

    #[test]
    fn test_multi_segment_pattern() {
        let filter = IgnoreFilter::new(&["docs/generated".to_string()]);
        assert!(filter.is_ignored("docs/generated/api.md", "api.md"));
        assert!(filter.is_ignored("docs/generated_old/api.md", "api.md"));
        assert!(!filter.is_ignored("docs/api.md", "api.md"));
    }

    #[test]
    fn test_pushed_pattern() {
        let mut filter = IgnoreFilter::new(&[]);
        assert!(!filter.is_ignored("docs/index.html", "index.html"));
        filter.push("docs");
        filter.push("");
        assert!(filter.is_ignored("docs/index.html", "index.html"));
        assert!(filter.is_ignored("docs", "docs"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("main.PY"), Some("py".to_string()));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(extension_of("Makefile"), None);
        assert_eq!(extension_of(".env"), None);
        assert_eq!(extension_of(".eslintrc.json"), Some("json".to_string()));
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_is_scannable() {
        let dir = TempDir::new().unwrap();
        let filter = default_filter();

        let small = dir.path().join("app.py");
        fs::write(&small, "print('hi')").unwrap();
        assert!(filter.is_scannable(&small, "app.py", "app.py"));

        let binary = dir.path().join("logo.png");
        fs::write(&binary, [0u8; 16]).unwrap();
        assert!(!filter.is_scannable(&binary, "logo.png", "logo.png"));

        let large = dir.path().join("big.js");
        fs::write(&large, vec![b'a'; (MAX_SCAN_BYTES + 1) as usize]).unwrap();
        assert!(!filter.is_scannable(&large, "big.js", "big.js"));

        let at_limit = dir.path().join("edge.js");
        fs::write(&at_limit, vec![b'a'; MAX_SCAN_BYTES as usize]).unwrap();
        assert!(filter.is_scannable(&at_limit, "edge.js", "edge.js"));

        let sub = dir.path().join("src.js");
        fs::create_dir(&sub).unwrap();
        assert!(!filter.is_scannable(&sub, "src.js", "src.js"));
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/repo");
        assert_eq!(relative_path(root, Path::new("/repo/src/main.rs")), "src/main.rs");
        assert_eq!(relative_path(root, Path::new("/repo")), "");
    }
}
