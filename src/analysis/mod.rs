// Repository analysis pipeline
//
// Stages run in a fixed order; each reads only what earlier stages produced.

pub mod entrypoints;
pub mod explain;
pub mod filter;
pub mod roles;
pub mod routes;
pub mod source;
pub mod stack;
pub mod structure;
pub mod systems;

pub use entrypoints::{EntrypointFinder, EntrypointReport};
pub use explain::{ExplainContext, Explainer, LlmSettings};
pub use filter::IgnoreFilter;
pub use roles::{FileRole, RoleClassifier};
pub use routes::{Route, RouteExtractor};
pub use source::{LoadedSources, SkipReason, SourceText};
pub use stack::{Stack, StackDetector, StackReport};
pub use structure::{StructureReport, StructureWalker};
pub use systems::{ExternalSystemDetector, SystemInfo, SystemKind, Systems};

use crate::config::Config;
use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Component, Path};

/// Everything learned about one repository
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub stack: Stack,
    pub entrypoints: Vec<String>,
    pub routes: Vec<Route>,
    pub roles: Vec<FileRole>,
    pub systems: Systems,
    pub scanned_files: Vec<String>,
    pub tree: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_explanation: Option<String>,
    /// Per-file skips and stage warnings, kept out of the report
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Something the pipeline worked around
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    FileSkipped { path: String, reason: SkipReason },
    StageWarning { stage: &'static str, message: String },
}

/// Runs every detector over a repository
pub struct Analyzer {
    config: Config,
    filter: IgnoreFilter,
    stack: StackDetector,
    entrypoints: EntrypointFinder,
    roles: RoleClassifier,
    routes: RouteExtractor,
    systems: ExternalSystemDetector,
    verbose: bool,
}

impl Analyzer {
    /// Compile every detector for `config`
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            filter: IgnoreFilter::new(&config.ignore),
            stack: StackDetector::new(),
            entrypoints: EntrypointFinder::new()?,
            roles: RoleClassifier::new(),
            routes: RouteExtractor::new()?,
            systems: ExternalSystemDetector::new()?,
            config,
            verbose: false,
        })
    }

    /// Show a progress bar while reading files
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Analyze the repository at `root`
    pub fn analyze(&self, root: &Path) -> Result<AnalysisResult> {
        let root = root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(Error::PathNotFound(root));
        }

        let mut diagnostics = Vec::new();

        let mut filter = self.filter.clone();
        if let Some(rel) = output_within(&root, &self.config.output_path(&root)) {
            tracing::debug!("Excluding output directory {} from the scan", rel);
            filter.push(rel);
        }

        tracing::info!("Detecting technology stack");
        let stack_report = self.stack.detect(&root);
        warn_all(&mut diagnostics, "stack", &stack_report.warnings);
        let dependencies = stack_report.dependency_names();
        let mut stack = stack_report.stack;

        tracing::info!("Finding entrypoints");
        let found = self.entrypoints.find(&root, &filter);
        skip_all(&mut diagnostics, found.skipped);

        tracing::info!("Walking directory structure");
        let structure = StructureWalker::new(&root, &self.config, &filter).walk();
        warn_all(&mut diagnostics, "structure", &structure.warnings);
        tracing::info!("{} files eligible for scanning", structure.scanned_files.len());

        let progress = self.progress_bar(structure.scanned_files.len());
        let loaded = source::load_sources(&root, &structure.scanned_files, progress.as_ref());
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        skip_all(&mut diagnostics, loaded.skipped);

        tracing::info!("Classifying file roles");
        let roles = self.roles.classify_all(&structure.scanned_files);

        tracing::info!("Extracting routes");
        let supported = self.routes.supported_frameworks();
        let unknown: Vec<String> = self
            .config
            .routes_frameworks
            .iter()
            .filter(|name| !supported.contains(&name.as_str()))
            .map(|name| format!("Unknown route framework '{}'", name))
            .collect();
        for message in &unknown {
            tracing::warn!("{}", message);
        }
        warn_all(&mut diagnostics, "routes", &unknown);
        let routes = self
            .routes
            .extract(&loaded.files, &self.config.routes_frameworks);

        tracing::info!("Detecting external systems");
        stack.externals = systems::detect_sdks(&dependencies);
        let systems = self.systems.detect(&loaded.files);

        let llm_explanation = if self.config.llm_enabled {
            tracing::info!("Requesting LLM summary");
            self.explain(&stack, &found.entrypoints, &routes, &systems, &roles)
        } else {
            None
        };

        Ok(AnalysisResult {
            stack,
            entrypoints: found.entrypoints,
            routes,
            roles,
            systems,
            scanned_files: structure.scanned_files,
            tree: structure.tree,
            llm_explanation,
            diagnostics,
        })
    }

    fn explain(
        &self,
        stack: &Stack,
        entrypoints: &[String],
        routes: &[Route],
        systems: &Systems,
        roles: &[FileRole],
    ) -> Option<String> {
        let context = ExplainContext {
            stack,
            entrypoints,
            routes,
            systems,
            roles,
        };

        match Explainer::new(LlmSettings::from_config(&self.config)) {
            Ok(explainer) => explainer.explain(&context),
            Err(e) => {
                tracing::warn!("LLM summary unavailable: {}", e);
                None
            }
        }
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }
}

/// Repository-relative path of `output` when it lies strictly inside `root`
fn output_within(root: &Path, output: &Path) -> Option<String> {
    let output = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());
    let rel = output.strip_prefix(root).ok()?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    (!parts.is_empty()).then(|| parts.join("/"))
}

fn warn_all(diagnostics: &mut Vec<Diagnostic>, stage: &'static str, warnings: &[String]) {
    diagnostics.extend(warnings.iter().map(|message| Diagnostic::StageWarning {
        stage,
        message: message.clone(),
    }));
}

fn skip_all(diagnostics: &mut Vec<Diagnostic>, skipped: Vec<(String, SkipReason)>) {
    diagnostics.extend(
        skipped
            .into_iter()
            .map(|(path, reason)| Diagnostic::FileSkipped { path, reason }),
    );
}
