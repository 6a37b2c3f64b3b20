// Entrypoint discovery
//
// Finds probable process start files by naming convention, then by sniffing
// small Python files for a shebang line.

use crate::analysis::filter::{relative_path, IgnoreFilter};
use crate::analysis::source::SkipReason;
use crate::error::Result;
use glob::{MatchOptions, Pattern};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Conventional entrypoint names, matched anywhere in the tree, in report order
pub const ENTRYPOINT_PATTERNS: &[&str] = &[
    "index.js",
    "index.ts",
    "index.mjs",
    "server.js",
    "server.ts",
    "app.js",
    "app.ts",
    "main.js",
    "main.ts",
    "main.py",
    "main.go",
    "main.rs",
    "wsgi.py",
    "asgi.py",
    "manage.py",
    "cmd/main.go",
    "src/main.rs",
    "src/main/java/**/Main.java",
    "src/main/kotlin/**/Main.kt",
];

/// Only Python files smaller than this are sniffed for a shebang
pub const SHEBANG_MAX_BYTES: u64 = 10_000;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled entrypoint pattern, matching at the root or below any directory
#[derive(Debug, Clone)]
struct EntrypointPattern {
    anchored: Pattern,
    nested: Pattern,
}

impl EntrypointPattern {
    fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            anchored: Pattern::new(pattern)?,
            nested: Pattern::new(&format!("**/{}", pattern))?,
        })
    }

    fn matches(&self, rel_path: &str) -> bool {
        self.anchored.matches_with(rel_path, MATCH_OPTIONS)
            || self.nested.matches_with(rel_path, MATCH_OPTIONS)
    }
}

#[derive(Debug)]
struct WalkedFile {
    rel_path: String,
    path: PathBuf,
    size: u64,
}

/// Entrypoints in discovery order plus any files that could not be sniffed
#[derive(Debug, Default)]
pub struct EntrypointReport {
    pub entrypoints: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl EntrypointReport {
    fn push(&mut self, rel_path: &str) {
        if !self.entrypoints.iter().any(|e| e == rel_path) {
            self.entrypoints.push(rel_path.to_string());
        }
    }
}

/// Locates likely entry files
#[derive(Debug, Clone)]
pub struct EntrypointFinder {
    patterns: Vec<EntrypointPattern>,
}

impl EntrypointFinder {
    pub fn new() -> Result<Self> {
        let patterns = ENTRYPOINT_PATTERNS
            .iter()
            .map(|p| EntrypointPattern::new(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn find(&self, root: &Path, filter: &IgnoreFilter) -> EntrypointReport {
        let files = walk_files(root, filter);
        let mut report = EntrypointReport::default();

        for pattern in &self.patterns {
            for file in files.iter().filter(|f| pattern.matches(&f.rel_path)) {
                report.push(&file.rel_path);
            }
        }

        for file in files
            .iter()
            .filter(|f| f.rel_path.ends_with(".py") && f.size < SHEBANG_MAX_BYTES)
        {
            match has_shebang(&file.path) {
                Ok(true) => report.push(&file.rel_path),
                Ok(false) => {}
                Err(reason) => {
                    tracing::debug!("Could not sniff {}: {}", file.rel_path, reason);
                    report.skipped.push((file.rel_path.clone(), reason));
                }
            }
        }

        report
    }
}

/// Every regular file under `root` that survives the ignore filter, sorted by path.
///
/// Ignored directories are pruned, which leaves the result unchanged since
/// their descendants would be ignored too.
fn walk_files(root: &Path, filter: &IgnoreFilter) -> Vec<WalkedFile> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let rel = relative_path(root, entry.path());
            let name = entry.file_name().to_string_lossy();
            !filter.is_ignored(&rel, &name)
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        let Ok(metadata) = std::fs::metadata(path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        files.push(WalkedFile {
            rel_path: relative_path(root, path),
            path: path.to_path_buf(),
            size: metadata.len(),
        });
    }

    files
}

/// Read just the first line and check for `#!`
fn has_shebang(path: &Path) -> std::result::Result<bool, SkipReason> {
    let file = File::open(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let mut first_line = String::new();
    BufReader::new(file)
        .read_line(&mut first_line)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => SkipReason::NotUtf8,
            _ => SkipReason::Unreadable(e.to_string()),
        })?;

    Ok(first_line.trim().starts_with("#!"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn find(root: &Path) -> EntrypointReport {
        let filter = IgnoreFilter::new(&Config::default().ignore);
        EntrypointFinder::new().unwrap().find(root, &filter)
    }

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_pattern_order_is_report_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "server.js", "");
        touch(dir.path(), "index.js", "");
        touch(dir.path(), "api/main.py", "");

        let report = find(dir.path());
        assert_eq!(report.entrypoints, vec!["index.js", "server.js", "api/main.py"]);
    }

    #[test]
    fn test_nested_and_java_patterns() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "cmd/main.go", "package main");
        touch(dir.path(), "src/main/java/com/acme/Main.java", "class Main {}");
        touch(dir.path(), "src/main/java/com/acme/Other.java", "class Other {}");

        let report = find(dir.path());
        assert_eq!(
            report.entrypoints,
            vec!["cmd/main.go", "src/main/java/com/acme/Main.java"]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/main.rs", "fn main() {}");
        touch(dir.path(), "main.py", "#!/usr/bin/env python3\n");

        let report = find(dir.path());
        assert_eq!(report.entrypoints, vec!["main.py", "src/main.rs"]);
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "node_modules/pkg/index.js", "");
        touch(dir.path(), "dist/server.js", "");

        let report = find(dir.path());
        assert!(report.entrypoints.is_empty());
    }

    #[test]
    fn test_shebang_detection() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "scripts/deploy.py", "#!/usr/bin/env python3\nprint('go')\n");
        touch(dir.path(), "scripts/lib.py", "import os\n");
        touch(dir.path(), "scripts/run.sh", "#!/bin/sh\n");

        let report = find(dir.path());
        assert_eq!(report.entrypoints, vec!["scripts/deploy.py"]);
    }

    #[test]
    fn test_large_python_files_are_not_sniffed() {
        let dir = TempDir::new().unwrap();
        let mut big = String::from("#!/usr/bin/env python3\n");
        big.push_str(&"x = 1\n".repeat(2_000));
        touch(dir.path(), "tool.py", &big);

        let report = find(dir.path());
        assert!(report.entrypoints.is_empty());
    }

    #[test]
    fn test_undecodable_first_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blob.py"), [0xffu8, 0xfe, b'\n']).unwrap();

        let report = find(dir.path());
        assert!(report.entrypoints.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].1, SkipReason::NotUtf8);
    }
}
