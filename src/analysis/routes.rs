// HTTP route extraction
//
// Applies per-framework regular expressions to file contents. Routes are
// collected into an ordered set so duplicates collapse and the output is
// deterministic.

use crate::analysis::source::SourceText;
use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

/// One route declaration, serialized as `[framework, method, path, source]`.
///
/// Ordering is by framework, method, path, then source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "(String, String, String, String)")]
pub struct Route {
    pub framework: String,
    pub method: String,
    pub path: String,
    pub source: String,
}

impl Route {
    pub fn new(
        framework: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            framework: framework.into(),
            method: method.into(),
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<Route> for (String, String, String, String) {
    fn from(route: Route) -> Self {
        (route.framework, route.method, route.path, route.source)
    }
}

const HTTP_METHODS: &str = "get|post|put|delete|patch|options|head";

/// Framework id to its route expressions, in evaluation order
fn route_table() -> Vec<(&'static str, Vec<String>)> {
    vec![
        (
            "express",
            vec![
                format!(r#"(?:app|router)\.({})\s*\(\s*["']([^"']+)["']"#, HTTP_METHODS),
                format!(r"(?:app|router)\.({})\s*\(\s*`([^`]+)`", HTTP_METHODS),
            ],
        ),
        (
            "flask",
            vec![
                r#"@app\.route\s*\(\s*["']([^"']+)["']"#.to_string(),
                r"@app\.route\s*\(\s*`([^`]+)`".to_string(),
            ],
        ),
        (
            "fastapi",
            vec![
                format!(r#"@app\.({})\s*\(\s*["']([^"']+)["']"#, HTTP_METHODS),
                format!(r"@app\.({})\s*\(\s*`([^`]+)`", HTTP_METHODS),
            ],
        ),
        (
            "django",
            vec![
                r#"path\s*\(\s*["']([^"']+)["']"#.to_string(),
                r"path\s*\(\s*`([^`]+)`".to_string(),
            ],
        ),
        ("nextjs", vec![]),
    ]
}

#[derive(Debug, Clone)]
struct FrameworkPatterns {
    framework: &'static str,
    patterns: Vec<Regex>,
}

/// Extracts HTTP routes for the supported frameworks
#[derive(Debug, Clone)]
pub struct RouteExtractor {
    frameworks: Vec<FrameworkPatterns>,
}

impl RouteExtractor {
    pub fn new() -> Result<Self> {
        let frameworks = route_table()
            .into_iter()
            .map(|(framework, sources)| -> Result<FrameworkPatterns> {
                let patterns = sources
                    .iter()
                    .map(|s| Regex::new(s))
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(FrameworkPatterns {
                    framework,
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { frameworks })
    }

    /// Framework ids the extractor recognizes
    pub fn supported_frameworks(&self) -> Vec<&'static str> {
        self.frameworks.iter().map(|f| f.framework).collect()
    }

    /// Extract routes from every source, applying only the `enabled` frameworks
    pub fn extract(&self, sources: &[SourceText], enabled: &[String]) -> Vec<Route> {
        let mut routes = BTreeSet::new();
        for source in sources {
            self.extract_into(&mut routes, source, enabled);
        }
        routes.into_iter().collect()
    }

    fn extract_into(&self, routes: &mut BTreeSet<Route>, source: &SourceText, enabled: &[String]) {
        let active = self
            .frameworks
            .iter()
            .filter(|f| enabled.iter().any(|e| e == f.framework));

        for framework in active {
            for pattern in &framework.patterns {
                for caps in pattern.captures_iter(&source.content) {
                    let (method, raw_path) = if caps.len() == 3 {
                        (caps[1].to_uppercase(), &caps[2])
                    } else {
                        ("GET".to_string(), &caps[1])
                    };

                    let path = raw_path.trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
                    routes.insert(Route::new(framework.framework, method, path, &source.path));
                }
            }
        }
    }
}
