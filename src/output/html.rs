// HTML viewer generator
//
// Writes index.html and its stylesheet. The page embeds the Markdown overview
// and Mermaid sources and renders them client-side.

use crate::error::Result;
use crate::output::templates::{TemplateEngine, ViewerContent};
use std::fs;
use std::path::PathBuf;

/// Stylesheet location relative to the output directory
pub const STYLESHEET: &str = "templates/style.css";

/// HTML viewer generator
pub struct HtmlGenerator {
    output_dir: PathBuf,
    template_engine: TemplateEngine,
}

impl HtmlGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.into(),
            template_engine: TemplateEngine::new()?,
        })
    }

    /// Write the page and stylesheet, returning the paths written
    pub fn generate(&self, content: &ViewerContent<'_>) -> Result<Vec<PathBuf>> {
        let html = self.template_engine.render_index(content)?;
        let index = self.output_dir.join("index.html");
        fs::write(&index, html)?;

        let css = self.copy_assets()?;

        Ok(vec![index, css])
    }

    /// Write the embedded stylesheet
    fn copy_assets(&self) -> Result<PathBuf> {
        let path = self.output_dir.join(STYLESHEET);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, include_str!("../../assets/style.css"))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_writes_page_and_css() {
        let dir = TempDir::new().unwrap();
        let generator = HtmlGenerator::new(dir.path()).unwrap();

        let written = generator
            .generate(&ViewerContent {
                title: "repo",
                markdown: "# Repository Overview",
                ..Default::default()
            })
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(dir.path().join("index.html").exists());
        let css = fs::read_to_string(dir.path().join("templates/style.css")).unwrap();
        assert!(css.contains(".tab-button"));
    }
}
