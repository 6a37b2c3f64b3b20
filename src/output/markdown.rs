// Markdown overview
//
// Renders `repo_overview.md`, the human-readable summary that the HTML viewer
// also embeds.

use crate::analysis::systems::sdk_description;
use crate::analysis::AnalysisResult;
use std::fmt::Write;

const NOT_DETECTED: &str = "Not detected";

/// Render the full overview document
pub fn render_overview(analysis: &AnalysisResult) -> String {
    let stack = &analysis.stack;
    let mut md = String::new();

    md.push_str("# Repository Overview\n\n");

    md.push_str("## Tech Snapshot\n\n");
    let _ = writeln!(md, "**Languages:** {}", joined_or(&stack.languages, NOT_DETECTED));
    let _ = writeln!(md, "**Frameworks:** {}", joined_or(&stack.frameworks, NOT_DETECTED));
    let _ = writeln!(md, "**Package Managers:** {}", joined_or(&stack.managers, NOT_DETECTED));
    let _ = writeln!(md, "**Runtimes:** {}", joined_or(&stack.runtimes, NOT_DETECTED));

    md.push_str("\n## Entrypoints & Startup Scripts\n\n");
    push_list(
        &mut md,
        analysis.entrypoints.iter().map(|ep| format!("`{}`", ep)),
        "No entrypoints detected",
    );

    md.push_str("\n### NPM Scripts\n\n");
    push_list(
        &mut md,
        stack
            .npm_scripts
            .iter()
            .map(|(name, script)| format!("`{}`: {}", name, script.as_str().unwrap_or_default())),
        "No npm scripts found",
    );

    md.push_str("\n## Project Structure\n\n```\n");
    md.push_str(&analysis.tree);
    md.push_str("\n```\n");

    md.push_str("\n## HTTP Routes\n\n");
    push_list(
        &mut md,
        analysis
            .routes
            .iter()
            .map(|r| format!("**{}** `{}` ({}, `{}`)", r.method, r.path, r.framework, r.source)),
        "No routes detected",
    );

    md.push_str("\n## External Systems & Integrations\n\n");
    let externals: Vec<String> = stack
        .externals
        .iter()
        .map(|name| match sdk_description(name) {
            Some(description) => format!("{} ({})", name, description),
            None => name.clone(),
        })
        .collect();
    let _ = writeln!(md, "**Dependencies:** {}\n", joined_or(&externals, "None detected"));
    md.push_str("**Environment Variables & URLs:**\n\n");
    push_list(
        &mut md,
        analysis.systems.nodes.iter().map(|node| {
            match analysis.systems.kinds.get(node) {
                Some(info) => format!("{} ({})", node, info.description),
                None => node.clone(),
            }
        }),
        "None detected",
    );

    md.push_str("\n## Key Files & Roles\n\n");
    push_list(
        &mut md,
        analysis.roles.iter().map(|r| {
            if r.is_overflow() {
                format!("{} {}", r.path, r.role)
            } else {
                format!("`{}` - {}", r.path, r.role)
            }
        }),
        "No files scanned",
    );

    md.push_str("\n## High-Level Explainer\n\n");
    md.push_str(
        analysis
            .llm_explanation
            .as_deref()
            .unwrap_or("LLM explanation not available"),
    );
    md.push('\n');

    md
}

fn joined_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

fn push_list(md: &mut String, items: impl Iterator<Item = String>, empty: &str) {
    let mut any = false;
    for item in items {
        let _ = writeln!(md, "- {}", item);
        any = true;
    }
    if !any {
        md.push_str(empty);
        md.push('\n');
    }
}
