// Mermaid diagram generation
//
// Three small flowcharts: top-level layout, HTTP routes, and external systems.
// Each is capped so the rendered diagram stays readable.

use crate::analysis::AnalysisResult;
use std::collections::BTreeMap;

/// Top-level directories shown in the structure diagram
pub const MAX_STRUCTURE_DIRS: usize = 8;
/// Children shown under each directory
pub const MAX_FILES_PER_DIR: usize = 3;
pub const MAX_ROUTES: usize = 20;
pub const MAX_SYSTEMS: usize = 12;

/// Layout direction of every flowchart
const DIRECTION: &str = "TD";

/// Diagram generator for the onboarding flowcharts
pub struct DiagramGenerator;

impl DiagramGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Top-level directories of the scanned files and a few children each
    pub fn structure(&self, analysis: &AnalysisResult) -> String {
        let mut dirs: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for path in &analysis.scanned_files {
            let mut parts = path.split('/');
            let (Some(dir), Some(child)) = (parts.next(), parts.next()) else {
                continue;
            };
            let children = dirs.entry(dir).or_default();
            if !children.contains(&child) {
                children.push(child);
            }
        }

        let mut lines = self.open("Structure", "Project Structure");

        if dirs.is_empty() {
            lines.push("        none[No directories detected]".to_string());
        }

        for (i, (dir, children)) in dirs.iter().take(MAX_STRUCTURE_DIRS).enumerate() {
            let dir_id = format!("dir{}", i);
            lines.push(format!("        {}[\"{}/\"]", dir_id, escape_label(dir)));
            lines.push(format!("        Structure --> {}", dir_id));

            for (j, child) in children.iter().take(MAX_FILES_PER_DIR).enumerate() {
                let file_id = format!("file{}_{}", i, j);
                lines.push(format!("        {}[\"{}\"]", file_id, escape_label(child)));
                lines.push(format!("        {} --> {}", dir_id, file_id));
            }
        }

        close(lines)
    }

    /// One node per route, method and path
    pub fn routes(&self, analysis: &AnalysisResult) -> String {
        let mut lines = self.open("Routes", "HTTP Routes");

        if analysis.routes.is_empty() {
            lines.push("        none[No routes detected]".to_string());
        }

        for (i, route) in analysis.routes.iter().take(MAX_ROUTES).enumerate() {
            let route_id = format!("route{}", i);
            lines.push(format!(
                "        {}[\"{} {}\"]",
                route_id,
                route.method,
                escape_label(&route.path)
            ));
            lines.push(format!("        Routes --> {}", route_id));
        }

        close(lines)
    }

    /// The application linked to every external system node
    pub fn systems(&self, analysis: &AnalysisResult) -> String {
        let mut lines = self.open("Systems", "External Systems");

        if analysis.systems.nodes.is_empty() {
            lines.push("        none[No external systems detected]".to_string());
            return close(lines);
        }

        lines.push("        app[Application]".to_string());

        for (i, node) in analysis.systems.nodes.iter().take(MAX_SYSTEMS).enumerate() {
            let system_id = format!("sys{}", i);
            let label = match analysis.systems.kinds.get(node) {
                Some(info) if !info.description.is_empty() => format!(
                    "{}<br/>{}",
                    escape_label(node),
                    escape_label(&info.description)
                ),
                _ => escape_label(node),
            };
            lines.push(format!("        {}[\"{}\"]", system_id, label));
            lines.push(format!("        app --> {}", system_id));
        }

        close(lines)
    }

    fn open(&self, id: &str, title: &str) -> Vec<String> {
        vec![
            format!("graph {}", DIRECTION),
            format!("    subgraph {} [{}]", id, title),
        ]
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn close(mut lines: Vec<String>) -> String {
    lines.push("    end".to_string());
    lines.join("\n")
}

/// Make text safe inside a quoted Mermaid label
fn escape_label(s: &str) -> String {
    s.replace('"', "#quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Route, Stack, SystemInfo, SystemKind, Systems};

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            stack: Stack::default(),
            entrypoints: vec![],
            routes: vec![],
            roles: vec![],
            systems: Systems::default(),
            scanned_files: vec![],
            tree: String::new(),
            llm_explanation: None,
            diagnostics: vec![],
        }
    }

    #[test]
    fn test_empty_placeholders() {
        let gen = DiagramGenerator::new();
        let empty = analysis();

        assert!(gen.structure(&empty).contains("No directories detected"));
        assert_eq!(
            gen.routes(&empty),
            "graph TD\n    subgraph Routes [HTTP Routes]\n        none[No routes detected]\n    end"
        );
        assert!(gen.systems(&empty).contains("No external systems detected"));
    }

    #[test]
    fn test_structure_groups_top_level() {
        let mut a = analysis();
        a.scanned_files = ["README.md", "src/a.rs", "src/b.rs", "src/c.rs", "src/d.rs", "src/deep/x.rs", "api/main.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let out = DiagramGenerator::new().structure(&a);
        // Directories are sorted, so api comes first
        assert!(out.contains("dir0[\"api/\"]"));
        assert!(out.contains("dir1[\"src/\"]"));
        assert!(out.contains("file1_2[\"c.rs\"]"));
        assert!(!out.contains("d.rs"));
        assert!(!out.contains("README"));
    }

    #[test]
    fn test_structure_caps_directories() {
        let mut a = analysis();
        a.scanned_files = (0..12).map(|i| format!("d{:02}/f.txt", i)).collect();

        let out = DiagramGenerator::new().structure(&a);
        assert!(out.contains("dir7["));
        assert!(!out.contains("dir8["));
    }

    #[test]
    fn test_routes_capped() {
        let mut a = analysis();
        a.routes = (0..25)
            .map(|i| Route::new("express", "GET", format!("/r{:02}", i), "app.js"))
            .collect();

        let out = DiagramGenerator::new().routes(&a);
        assert!(out.contains("route0[\"GET /r00\"]"));
        assert!(out.contains("route19["));
        assert!(!out.contains("route20["));
    }

    #[test]
    fn test_systems_with_descriptions() {
        let mut a = analysis();
        a.systems.nodes.push("api.example.com".to_string());
        a.systems.kinds.insert(
            "api.example.com".to_string(),
            SystemInfo {
                kind: SystemKind::Url,
                description: "External API/Service".to_string(),
            },
        );

        let out = DiagramGenerator::new().systems(&a);
        assert!(out.contains("app[Application]"));
        assert!(out.contains("sys0[\"api.example.com<br/>External API/Service\"]"));
        assert!(out.contains("app --> sys0"));
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("say \"hi\""), "say #quot;hi#quot;");
    }
}
