// File role classification
//
// Labels each scanned file with a likely purpose using path heuristics.
// The pattern table is evaluated top to bottom and the first hit wins, so
// its order is part of the behavior.

use crate::analysis::filter::extension_of;
use serde::Serialize;

/// Maximum number of classified files kept in the result
pub const MAX_ROLES: usize = 120;

/// A scanned file and its role, serialized as a `[path, role]` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "(String, String)")]
pub struct FileRole {
    pub path: String,
    pub role: String,
}

impl FileRole {
    pub fn new(path: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            role: role.into(),
        }
    }

    /// Marker appended when the list was cut at `MAX_ROLES`
    pub fn overflow() -> Self {
        Self::new("...", "and more files")
    }

    pub fn is_overflow(&self) -> bool {
        self.path == "..." && self.role == "and more files"
    }
}

impl From<FileRole> for (String, String) {
    fn from(role: FileRole) -> Self {
        (role.path, role.role)
    }
}

/// Ordered (pattern, role) table. Patterns ending in `/` name a directory.
pub const ROLE_PATTERNS: &[(&str, &str)] = &[
    // Backend
    ("routes/", "API Routes"),
    ("router/", "API Routes"),
    ("app.js", "Main Application"),
    ("server.js", "Server Entry Point"),
    ("index.js", "Entry Point"),
    ("main.js", "Entry Point"),
    ("controllers/", "Business Logic"),
    ("models/", "Data Models"),
    ("middleware/", "HTTP Middleware"),
    ("middlewares/", "HTTP Middleware"),
    ("services/", "Business Services"),
    ("utils/", "Utilities"),
    ("lib/", "Library Code"),
    ("helpers/", "Helper Functions"),
    ("config/", "Configuration"),
    ("settings/", "Configuration"),
    ("migrations/", "Database Migrations"),
    ("seeds/", "Database Seeds"),
    // Frontend
    ("components/", "UI Components"),
    ("views/", "UI Views"),
    ("pages/", "UI Pages"),
    ("templates/", "UI Templates"),
    ("static/", "Static Assets"),
    ("public/", "Public Assets"),
    ("assets/", "Assets"),
    ("styles/", "Styling"),
    ("css/", "Styling"),
    ("scss/", "Styling"),
    ("sass/", "Styling"),
    ("less/", "Styling"),
    // Tests
    ("tests/", "Tests"),
    ("test/", "Tests"),
    ("spec/", "Tests"),
    ("__tests__/", "Tests"),
    ("test_", "Test File"),
    (".test.", "Test File"),
    (".spec.", "Test File"),
    // Documentation
    ("readme", "Documentation"),
    ("docs/", "Documentation"),
    ("documentation/", "Documentation"),
    ("changelog", "Documentation"),
    ("license", "Documentation"),
    ("contributing", "Documentation"),
    // Configuration files
    ("package.json", "Package Configuration"),
    ("requirements.txt", "Dependencies"),
    ("pyproject.toml", "Python Configuration"),
    ("cargo.toml", "Rust Configuration"),
    ("go.mod", "Go Module"),
    ("pom.xml", "Maven Configuration"),
    ("build.gradle", "Gradle Configuration"),
    ("dockerfile", "Docker Configuration"),
    ("docker-compose", "Docker Configuration"),
    (".env", "Environment Configuration"),
    (".gitignore", "Git Configuration"),
    (".github/", "GitHub Configuration"),
    ("workflows/", "CI/CD Configuration"),
    // Build and deployment
    ("dist/", "Build Output"),
    ("build/", "Build Output"),
    ("out/", "Build Output"),
    ("target/", "Build Output"),
    ("coverage/", "Test Coverage"),
    ("node_modules/", "Dependencies"),
    // Database
    ("schema/", "Database Schema"),
    ("sql/", "SQL Scripts"),
];

const GENERAL_CODE: &str = "General Code";

/// Assigns role labels to scanned files
#[derive(Debug, Default)]
pub struct RoleClassifier;

impl RoleClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify every path, capping the list at `MAX_ROLES` plus a marker
    pub fn classify_all(&self, paths: &[String]) -> Vec<FileRole> {
        let mut roles: Vec<FileRole> = paths
            .iter()
            .map(|path| FileRole::new(path.clone(), self.classify(path)))
            .collect();

        if roles.len() > MAX_ROLES {
            roles.truncate(MAX_ROLES);
            roles.push(FileRole::overflow());
        }

        roles
    }

    /// Role for a single repository-relative path
    pub fn classify(&self, path: &str) -> &'static str {
        let rel = path.to_lowercase();
        let filename = rel.rsplit('/').next().unwrap_or(&rel).to_string();

        table_role(&rel, &filename).unwrap_or_else(|| extension_role(&filename))
    }
}

fn table_role(rel: &str, filename: &str) -> Option<&'static str> {
    let anchored = format!("/{}", rel);

    ROLE_PATTERNS
        .iter()
        .find(|(pattern, _)| {
            if pattern.ends_with('/') {
                anchored.contains(&format!("/{}", pattern))
            } else {
                filename.contains(pattern) || rel.contains(pattern)
            }
        })
        .map(|(_, role)| *role)
}

fn extension_role(filename: &str) -> &'static str {
    let has = |needle: &str| filename.contains(needle);
    let ext = extension_of(filename).unwrap_or_default();

    match ext.as_str() {
        "js" | "ts" | "jsx" | "tsx" => {
            if has("test") || has("spec") {
                "Test File"
            } else if has("config") || has("settings") {
                "Configuration"
            } else if has("index") || has("main") {
                "Entry Point"
            } else {
                "JavaScript/TypeScript Code"
            }
        }
        "py" => {
            if has("test") || has("spec") {
                "Test File"
            } else if has("config") || has("settings") {
                "Configuration"
            } else if has("main") || has("__init__") {
                "Entry Point"
            } else {
                "Python Code"
            }
        }
        "go" => {
            if has("test") {
                "Test File"
            } else if has("main") {
                "Entry Point"
            } else {
                "Go Code"
            }
        }
        "rs" => {
            if has("test") {
                "Test File"
            } else if has("main") {
                "Entry Point"
            } else {
                "Rust Code"
            }
        }
        "html" | "htm" => "HTML Template",
        "css" | "scss" | "sass" | "less" => "Styling",
        "json" => "Configuration/Data",
        "md" => "Documentation",
        "yml" | "yaml" => "Configuration",
        "sql" => "Database Script",
        "sh" | "bash" => "Shell Script",
        "dockerfile" | "dockerignore" => "Docker Configuration",
        _ => GENERAL_CODE,
    }
}
