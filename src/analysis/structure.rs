// Bounded directory traversal
//
// Renders the project tree and collects the scannable files every later
// stage works from. This is the only full walk the pipeline makes.

use crate::analysis::filter::{relative_path, IgnoreFilter};
use crate::config::Config;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

/// Tree rendering and scan list from one walk
#[derive(Debug, Default, Clone)]
pub struct StructureReport {
    pub tree: String,
    pub scanned_files: Vec<String>,
    /// Directories that could not be listed
    pub warnings: Vec<String>,
}

#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Walks the repository down to `config.depth` levels
pub struct StructureWalker<'a> {
    root: &'a Path,
    depth: usize,
    max_items: usize,
    filter: &'a IgnoreFilter,
}

#[derive(Default)]
struct WalkState {
    lines: Vec<String>,
    scanned: Vec<String>,
    warnings: Vec<String>,
}

impl<'a> StructureWalker<'a> {
    pub fn new(root: &'a Path, config: &Config, filter: &'a IgnoreFilter) -> Self {
        Self {
            root,
            depth: config.depth,
            max_items: config.max_items_per_dir.max(1),
            filter,
        }
    }

    pub fn walk(&self) -> StructureReport {
        let mut state = WalkState::default();
        self.visit(self.root, "", 0, &mut state);

        StructureReport {
            tree: state.lines.join("\n"),
            scanned_files: state.scanned,
            warnings: state.warnings,
        }
    }

    fn visit(&self, dir: &Path, prefix: &str, depth: usize, state: &mut WalkState) {
        if depth >= self.depth {
            return;
        }

        let mut entries = match self.list(dir) {
            Ok(entries) => entries,
            Err(e) => {
                let label = if e.kind() == ErrorKind::PermissionDenied {
                    "[Permission denied]"
                } else {
                    "[Unreadable directory]"
                };
                state.lines.push(format!("{}{}{}", prefix, LAST_BRANCH, label));
                state.warnings.push(format!(
                    "Could not list {}: {}",
                    display_dir(self.root, dir),
                    e
                ));
                tracing::warn!("Could not list {}: {}", dir.display(), e);
                return;
            }
        };

        let total = entries.len();
        let truncated = total > self.max_items;
        entries.truncate(self.max_items);
        let kept = entries.len();

        for (i, entry) in entries.iter().enumerate() {
            let is_last = i + 1 == kept && !truncated;
            let connector = if is_last { LAST_BRANCH } else { BRANCH };

            if entry.is_dir {
                state
                    .lines
                    .push(format!("{}{}📁 {}/", prefix, connector, entry.name));
                let child_prefix = format!(
                    "{}{}",
                    prefix,
                    if is_last { SPACE_INDENT } else { PIPE_INDENT }
                );
                self.visit(&entry.path, &child_prefix, depth + 1, state);
            } else {
                state
                    .lines
                    .push(format!("{}{}📄 {}", prefix, connector, entry.name));
            }

            let rel = relative_path(self.root, &entry.path);
            if self.filter.is_scannable(&entry.path, &rel, &entry.name) {
                state.scanned.push(rel);
            }
        }

        if truncated {
            state.lines.push(format!(
                "{}{}... and {} more",
                prefix,
                LAST_BRANCH,
                total - self.max_items
            ));
        }
    }

    /// Visible, non-ignored entries of `dir`, sorted by name
    fn list(&self, dir: &Path) -> std::io::Result<Vec<Entry>> {
        let items = std::fs::read_dir(dir)?.map(|item| {
            item.map(|item| (item.file_name().to_string_lossy().into_owned(), item.path()))
        });
        Ok(self.visible(dir, items))
    }

    /// Filter and sort listed entries; entries that fail to read are skipped
    fn visible(
        &self,
        dir: &Path,
        items: impl IntoIterator<Item = std::io::Result<(String, PathBuf)>>,
    ) -> Vec<Entry> {
        let mut entries = Vec::new();

        for item in items {
            let (name, path) = match item {
                Ok(item) => item,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if name.starts_with('.') {
                continue;
            }

            let rel = relative_path(self.root, &path);
            if self.filter.is_ignored(&rel, &name) {
                continue;
            }

            entries.push(Entry {
                is_dir: path.is_dir(),
                name,
                path,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

fn display_dir(root: &Path, dir: &Path) -> String {
    let rel = relative_path(root, dir);
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn walk(root: &Path, config: &Config) -> StructureReport {
        let filter = IgnoreFilter::new(&config.ignore);
        StructureWalker::new(root, config, &filter).walk()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_renders_tree() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/app.js");
        touch(dir.path(), "README.md");

        let report = walk(dir.path(), &Config::default());
        let expected = "├── 📄 README.md\n└── 📁 src/\n    └── 📄 app.js";
        assert_eq!(report.tree, expected);
        assert_eq!(report.scanned_files, vec!["README.md", "src/app.js"]);
    }

    #[test]
    fn test_nested_prefixes() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/one.txt");
        touch(dir.path(), "a/two.txt");
        touch(dir.path(), "b.txt");

        let report = walk(dir.path(), &Config::default());
        let lines: Vec<&str> = report.tree.lines().collect();
        assert_eq!(
            lines,
            vec![
                "├── 📁 a/",
                "│   ├── 📄 one.txt",
                "│   └── 📄 two.txt",
                "└── 📄 b.txt",
            ]
        );
    }

    #[test]
    fn test_truncation_sentinel() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();
        for i in 0..config.max_items_per_dir + 5 {
            touch(dir.path(), &format!("file{:02}.txt", i));
        }

        let report = walk(dir.path(), &config);
        let lines: Vec<&str> = report.tree.lines().collect();
        assert_eq!(lines.len(), config.max_items_per_dir + 1);
        assert_eq!(lines.last().unwrap(), &"└── ... and 5 more");
        // The last kept child is not the final branch
        assert!(lines[config.max_items_per_dir - 1].starts_with("├── "));
        assert_eq!(report.scanned_files.len(), config.max_items_per_dir);
    }

    #[test]
    fn test_omitted_directories_are_not_descended() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.max_items_per_dir = 2;
        touch(dir.path(), "a/inner.txt");
        touch(dir.path(), "b/inner.txt");
        touch(dir.path(), "c/inner.txt");

        let report = walk(dir.path(), &config);
        assert!(report.tree.contains("... and 1 more"));
        assert!(!report.tree.contains("c/"));
        assert_eq!(report.scanned_files, vec!["a/inner.txt", "b/inner.txt"]);
    }

    #[test]
    fn test_sentinel_counts_filtered_entries() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.max_items_per_dir = 1;
        touch(dir.path(), "a.txt");
        touch(dir.path(), "b.txt");
        touch(dir.path(), ".hidden.txt");
        touch(dir.path(), "node_modules/x.js");

        let report = walk(dir.path(), &config);
        assert!(report.tree.ends_with("└── ... and 1 more"));
    }

    #[test]
    fn test_depth_limit() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.depth = 2;
        touch(dir.path(), "one/two/three.txt");
        touch(dir.path(), "one/shallow.txt");

        let report = walk(dir.path(), &config);
        // "two" is listed at the limit but not expanded
        assert!(report.tree.contains("📁 two/"));
        assert!(!report.tree.contains("three.txt"));
        assert_eq!(report.scanned_files, vec!["one/shallow.txt"]);
    }

    #[test]
    fn test_node_modules_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "index.js");
        for i in 0..1_000 {
            touch(dir.path(), &format!("node_modules/pkg/file{}.js", i));
        }

        let report = walk(dir.path(), &Config::default());
        assert_eq!(report.scanned_files, vec!["index.js"]);
        assert!(!report.tree.contains("node_modules"));
    }

    #[test]
    fn test_hidden_entries_are_dropped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".env.local.json");
        touch(dir.path(), ".config/settings.json");
        touch(dir.path(), "visible.json");

        let report = walk(dir.path(), &Config::default());
        assert_eq!(report.tree, "└── 📄 visible.json");
        assert_eq!(report.scanned_files, vec!["visible.json"]);
    }

    #[test]
    fn test_non_text_files_are_listed_but_not_scanned() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "logo.png");
        touch(dir.path(), "main.go");

        let report = walk(dir.path(), &Config::default());
        assert!(report.tree.contains("logo.png"));
        assert_eq!(report.scanned_files, vec!["main.go"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_subtree() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "locked/secret.txt");
        touch(dir.path(), "open.txt");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Running as root ignores permission bits
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let report = walk(dir.path(), &Config::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(report.tree.contains("│   └── [Permission denied]"));
        assert!(report.tree.contains("open.txt"));
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.scanned_files, vec!["open.txt"]);
    }

    #[test]
    fn test_failed_entry_keeps_siblings() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.js");
        touch(dir.path(), "a.js");
        let config = Config::default();
        let filter = IgnoreFilter::new(&config.ignore);
        let walker = StructureWalker::new(dir.path(), &config, &filter);

        let items = vec![
            Ok(("b.js".to_string(), dir.path().join("b.js"))),
            Err(std::io::Error::other("entry vanished")),
            Ok(("a.js".to_string(), dir.path().join("a.js"))),
        ];
        let names: Vec<String> = walker
            .visible(dir.path(), items)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.js", "b.js"]);
    }
}
