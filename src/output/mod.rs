// Output generation module
//
// Turns an `AnalysisResult` into the onboarding bundle on disk.

pub mod diagrams;
pub mod html;
pub mod markdown;
pub mod templates;

pub use diagrams::DiagramGenerator;
pub use html::HtmlGenerator;
pub use markdown::render_overview;
pub use templates::{TemplateEngine, ViewerContent};

use crate::analysis::AnalysisResult;
use crate::error::{Error, Result};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const REPORT_FILE: &str = "report.json";
pub const OVERVIEW_FILE: &str = "repo_overview.md";
pub const STRUCTURE_DIAGRAM: &str = "mermaid_structure.mmd";
pub const ROUTES_DIAGRAM: &str = "mermaid_routes.mmd";
pub const SYSTEMS_DIAGRAM: &str = "mermaid_systems.mmd";

/// Which parts of the bundle to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    All,
    Json,
    Markdown,
    Html,
}

impl OutputFormat {
    fn json(self) -> bool {
        matches!(self, OutputFormat::All | OutputFormat::Json)
    }

    /// Markdown overview and the Mermaid sources
    fn markdown(self) -> bool {
        matches!(self, OutputFormat::All | OutputFormat::Markdown)
    }

    fn html(self) -> bool {
        matches!(self, OutputFormat::All | OutputFormat::Html)
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(OutputFormat::All),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            other => Err(Error::other(format!("Unknown format: {}", other))),
        }
    }
}

/// Files written by one run
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        let names: Vec<String> = self
            .files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        format!("Generated {} files: {}", self.files.len(), names.join(", "))
    }
}

/// Writes the onboarding bundle into one directory
pub struct OutputWriter {
    output_dir: PathBuf,
    format: OutputFormat,
    title: String,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            title: "Repository Onboarding".to_string(),
        }
    }

    /// Title shown in the HTML viewer
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Write every file the format asks for
    pub fn write_all(&self, analysis: &AnalysisResult) -> Result<GenerationReport> {
        fs::create_dir_all(&self.output_dir)?;
        let mut report = GenerationReport::default();

        if self.format.json() {
            let json = serde_json::to_string_pretty(analysis)?;
            report.files.push(self.write(REPORT_FILE, &json)?);
        }

        let overview = render_overview(analysis);
        let diagrams = DiagramGenerator::new();
        let structure = diagrams.structure(analysis);
        let routes = diagrams.routes(analysis);
        let systems = diagrams.systems(analysis);

        if self.format.markdown() {
            report.files.push(self.write(OVERVIEW_FILE, &overview)?);
            report.files.push(self.write(STRUCTURE_DIAGRAM, &structure)?);
            report.files.push(self.write(ROUTES_DIAGRAM, &routes)?);
            report.files.push(self.write(SYSTEMS_DIAGRAM, &systems)?);
        }

        if self.format.html() {
            let generator = HtmlGenerator::new(&self.output_dir)?;
            let written = generator.generate(&ViewerContent {
                title: &self.title,
                markdown: &overview,
                structure: &structure,
                routes: &routes,
                systems: &systems,
            })?;
            report.files.extend(written);
        }

        tracing::info!("Wrote {} files to {}", report.files.len(), self.output_dir.display());
        Ok(report)
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.output_dir.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}
