// Technology stack detection
//
// Looks at marker files in the repository root (package manifests, module
// files, build files) to infer languages, managers, runtimes and frameworks.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Detected technology stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub managers: Vec<String>,
    pub runtimes: Vec<String>,
    /// `scripts` section of `package.json` in manifest order, values as strings
    pub npm_scripts: Map<String, Value>,
    /// Known SDKs found among declared dependencies
    pub externals: Vec<String>,
}

/// Node.js dependency name to framework
const NODE_FRAMEWORKS: &[(&str, &str)] = &[
    ("express", "Express.js"),
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue.js"),
    ("svelte", "Svelte"),
    ("@nestjs/core", "NestJS"),
    ("fastify", "Fastify"),
    ("koa", "Koa.js"),
];

/// Python requirement name (lowercase) to framework
const PYTHON_FRAMEWORKS: &[(&str, &str)] = &[
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("django", "Django"),
];

/// Python markers in priority order with the manager each implies
const PYTHON_MARKERS: &[(&str, Option<&str>)] = &[
    ("requirements.txt", Some("pip")),
    ("pyproject.toml", Some("poetry")),
    ("Pipfile", Some("pipenv")),
    ("setup.py", None),
];

const JVM_MARKERS: &[(&str, &str)] = &[
    ("pom.xml", "Maven"),
    ("build.gradle", "Gradle"),
    ("build.gradle.kts", "Gradle"),
];

#[derive(Debug, Default, Deserialize)]
struct RawPackageJson {
    #[serde(default)]
    scripts: Map<String, Value>,
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Map<String, Value>,
}

/// The parts of `package.json` the detectors care about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub scripts: Map<String, Value>,
    /// Dependency then dev-dependency names in declaration order, merged
    pub dependencies: Vec<String>,
}

impl PackageManifest {
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawPackageJson = serde_json::from_str(contents)?;

        let scripts = raw
            .scripts
            .into_iter()
            .map(|(name, cmd)| {
                let cmd = match cmd {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, Value::String(cmd))
            })
            .collect();

        let mut dependencies: Vec<String> = raw.dependencies.into_iter().map(|(k, _)| k).collect();
        for (name, _) in raw.dev_dependencies {
            if !dependencies.contains(&name) {
                dependencies.push(name);
            }
        }

        Ok(Self {
            scripts,
            dependencies,
        })
    }
}

/// Requirement names from a `requirements.txt`, skipping comments and options
pub fn requirement_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(|line| {
            let end = line
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
                .unwrap_or(line.len());
            let name = &line[..end];
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Everything the stack stage learned, including inputs later stages reuse
#[derive(Debug, Default)]
pub struct StackReport {
    pub stack: Stack,
    /// Parsed `package.json`, when present and valid
    pub manifest: Option<PackageManifest>,
    /// Names from `requirements.txt`, when present
    pub requirements: Vec<String>,
    pub warnings: Vec<String>,
}

impl StackReport {
    /// All declared dependency names across manifests
    pub fn dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .manifest
            .as_ref()
            .map(|m| m.dependencies.clone())
            .unwrap_or_default();
        names.extend(self.requirements.iter().cloned());
        names
    }
}

/// Detects languages, managers, runtimes and frameworks from marker files
#[derive(Debug, Default)]
pub struct StackDetector;

impl StackDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, root: &Path) -> StackReport {
        let mut report = StackReport::default();

        self.detect_node(root, &mut report);
        self.detect_python(root, &mut report);

        if root.join("go.mod").exists() {
            push_marker(&mut report.stack, "Go", Some("go mod"), Some("Go"));
        }

        if root.join("Cargo.toml").exists() {
            push_marker(&mut report.stack, "Rust", Some("cargo"), Some("Rust"));
        }

        if let Some((_, manager)) = JVM_MARKERS.iter().find(|(file, _)| root.join(file).exists()) {
            push_marker(&mut report.stack, "Java/Kotlin", Some(*manager), None);
        }

        report
    }

    fn detect_node(&self, root: &Path, report: &mut StackReport) {
        let path = root.join("package.json");
        if !path.exists() {
            return;
        }

        push_marker(
            &mut report.stack,
            "JavaScript/TypeScript",
            Some("npm"),
            Some("Node.js"),
        );

        let parsed = std::fs::read_to_string(&path)
            .map_err(crate::error::Error::from)
            .and_then(|contents| PackageManifest::parse(&contents));

        match parsed {
            Ok(manifest) => {
                report.stack.npm_scripts = manifest.scripts.clone();
                report
                    .stack
                    .frameworks
                    .extend(match_frameworks(&manifest.dependencies, NODE_FRAMEWORKS, false));
                report.manifest = Some(manifest);
            }
            Err(e) => {
                let message = format!("Could not parse package.json: {}", e);
                tracing::warn!("{}", message);
                report.warnings.push(message);
            }
        }
    }

    fn detect_python(&self, root: &Path, report: &mut StackReport) {
        let Some((marker, manager)) = PYTHON_MARKERS
            .iter()
            .find(|(file, _)| root.join(file).exists())
        else {
            return;
        };

        push_marker(&mut report.stack, "Python", *manager, None);

        if *marker != "requirements.txt" {
            return;
        }

        match std::fs::read_to_string(root.join(marker)) {
            Ok(contents) => {
                report.requirements = requirement_names(&contents);
                report
                    .stack
                    .frameworks
                    .extend(match_frameworks(&report.requirements, PYTHON_FRAMEWORKS, true));
            }
            Err(e) => {
                let message = format!("Could not read requirements.txt: {}", e);
                tracing::warn!("{}", message);
                report.warnings.push(message);
            }
        }
    }
}

fn push_marker(stack: &mut Stack, language: &str, manager: Option<&str>, runtime: Option<&str>) {
    stack.languages.push(language.to_string());
    if let Some(manager) = manager {
        stack.managers.push(manager.to_string());
    }
    if let Some(runtime) = runtime {
        stack.runtimes.push(runtime.to_string());
    }
}

/// Exact-name lookup of each dependency in a framework table
fn match_frameworks(deps: &[String], table: &[(&str, &str)], fold_case: bool) -> Vec<String> {
    deps.iter()
        .filter_map(|dep| {
            let key = if fold_case {
                dep.to_lowercase()
            } else {
                dep.clone()
            };
            table
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, framework)| framework.to_string())
        })
        .collect()
}
