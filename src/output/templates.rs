// Template engine for the HTML viewer

use crate::error::Result;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Template engine wrapping Tera with the embedded viewer template
pub struct TemplateEngine {
    tera: Tera,
}

/// Text embedded in the viewer page
#[derive(Debug, Clone, Default)]
pub struct ViewerContent<'a> {
    pub title: &'a str,
    pub markdown: &'a str,
    pub structure: &'a str,
    pub routes: &'a str,
    pub systems: &'a str,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![(
            "index.html",
            include_str!("../../templates/index.html.tera"),
        )])?;

        tera.register_filter("script_json", script_json);

        Ok(Self { tera })
    }

    /// Render the single-page viewer
    pub fn render_index(&self, content: &ViewerContent<'_>) -> Result<String> {
        let mut context = Context::new();
        context.insert("title", content.title);
        context.insert("markdown", content.markdown);
        context.insert("structure_mmd", content.structure);
        context.insert("routes_mmd", content.routes);
        context.insert("systems_mmd", content.systems);

        Ok(self.tera.render("index.html", &context)?)
    }
}

/// Encode a string as a JavaScript literal safe inside a `<script>` block
fn script_json(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(to_script_literal(s)?))
}

pub fn to_script_literal(s: &str) -> tera::Result<String> {
    let json = serde_json::to_string(s).map_err(|e| tera::Error::msg(e.to_string()))?;
    Ok(json.replace("</", "<\\/"))
}
