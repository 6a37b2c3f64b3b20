use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Per-repository override files, checked in this order
pub const REPO_CONFIG_FILES: [&str; 3] = [".onboarder.yml", ".onboarder.yaml", ".onboarder.toml"];

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Levels of the tree to list before the walker stops descending
    pub depth: usize,
    /// Sibling cap per directory in the rendered tree
    pub max_items_per_dir: usize,
    /// Substring or glob patterns excluded from every stage
    pub ignore: Vec<String>,
    pub structure_include: Vec<String>,
    pub structure_exclude: Vec<String>,
    /// Route frameworks the extractor applies
    pub routes_frameworks: Vec<String>,
    pub output_dir: PathBuf,
    pub pr_mode: String,
    pub llm_enabled: bool,
    pub llm_model: String,
    pub llm_provider: LlmProvider,
    pub llm_api_url: Option<String>,
}

/// Remote service used for the high-level explainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            depth: 3,
            max_items_per_dir: 10,
            ignore: [
                ".git",
                "node_modules",
                ".venv",
                "__pycache__",
                "dist",
                "build",
                "out",
                "target",
                "coverage",
                ".next",
                ".turbo",
                ".mypy_cache",
                ".pytest_cache",
                ".DS_Store",
                "*.pyc",
                "*.pyo",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            structure_include: vec!["**/*".to_string()],
            structure_exclude: vec![],
            routes_frameworks: ["express", "flask", "fastapi", "django", "nextjs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            output_dir: PathBuf::from("onboarding"),
            pr_mode: "auto".to_string(),
            llm_enabled: true,
            llm_model: "claude-3-haiku-20240307".to_string(),
            llm_provider: LlmProvider::default(),
            llm_api_url: None,
        }
    }
}

/// Every field an override source is allowed to set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Depth,
    MaxItemsPerDir,
    Ignore,
    StructureInclude,
    StructureExclude,
    RoutesFrameworks,
    OutputDir,
    PrMode,
    LlmEnabled,
    LlmModel,
    LlmProvider,
    LlmApiUrl,
}

impl ConfigField {
    pub const ALL: [ConfigField; 12] = [
        ConfigField::Depth,
        ConfigField::MaxItemsPerDir,
        ConfigField::Ignore,
        ConfigField::StructureInclude,
        ConfigField::StructureExclude,
        ConfigField::RoutesFrameworks,
        ConfigField::OutputDir,
        ConfigField::PrMode,
        ConfigField::LlmEnabled,
        ConfigField::LlmModel,
        ConfigField::LlmProvider,
        ConfigField::LlmApiUrl,
    ];

    /// Key used in override files
    pub fn key(self) -> &'static str {
        match self {
            ConfigField::Depth => "depth",
            ConfigField::MaxItemsPerDir => "max_items_per_dir",
            ConfigField::Ignore => "ignore",
            ConfigField::StructureInclude => "structure_include",
            ConfigField::StructureExclude => "structure_exclude",
            ConfigField::RoutesFrameworks => "routes_frameworks",
            ConfigField::OutputDir => "output_dir",
            ConfigField::PrMode => "pr_mode",
            ConfigField::LlmEnabled => "llm_enabled",
            ConfigField::LlmModel => "llm_model",
            ConfigField::LlmProvider => "llm_provider",
            ConfigField::LlmApiUrl => "llm_api_url",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

/// Outcome of merging an override mapping
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MergeReport {
    /// Fields that were assigned
    pub applied: Vec<ConfigField>,
    /// Keys that do not name a config field
    pub unknown: Vec<String>,
    /// Recognized keys whose value had the wrong shape
    pub rejected: Vec<(String, String)>,
}

impl Config {
    /// Read an override file into a key/value mapping.
    ///
    /// `.toml` files go through the TOML parser, everything else is read as YAML.
    /// An empty file yields an empty mapping.
    pub fn load_overrides(path: &Path) -> Result<Map<String, Value>> {
        let contents = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("toml"));

        let value = if is_toml {
            let table: toml::Table = toml::from_str(&contents)?;
            serde_json::to_value(table)?
        } else {
            let yaml: serde_yaml::Value = serde_yaml::from_str(&contents)?;
            serde_json::to_value(yaml)?
        };

        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(Error::config_validation(format!(
                "expected a mapping at the top level, found {}",
                value_kind(&other)
            ))),
        }
    }

    /// Apply overrides for known fields only.
    ///
    /// Unknown keys are left alone and reported back to the caller.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> MergeReport {
        let mut report = MergeReport::default();

        for (key, value) in overrides {
            let Some(field) = ConfigField::from_key(key) else {
                report.unknown.push(key.clone());
                continue;
            };

            match self.assign(field, value.clone()) {
                Ok(()) => report.applied.push(field),
                Err(e) => report.rejected.push((key.clone(), e.to_string())),
            }
        }

        report
    }

    fn assign(&mut self, field: ConfigField, value: Value) -> Result<()> {
        match field {
            ConfigField::Depth => self.depth = parse_field(value)?,
            ConfigField::MaxItemsPerDir => self.max_items_per_dir = parse_field(value)?,
            ConfigField::Ignore => self.ignore = parse_field(value)?,
            ConfigField::StructureInclude => self.structure_include = parse_field(value)?,
            ConfigField::StructureExclude => self.structure_exclude = parse_field(value)?,
            ConfigField::RoutesFrameworks => self.routes_frameworks = parse_field(value)?,
            ConfigField::OutputDir => self.output_dir = parse_field(value)?,
            ConfigField::PrMode => self.pr_mode = parse_field(value)?,
            ConfigField::LlmEnabled => self.llm_enabled = parse_field(value)?,
            ConfigField::LlmModel => self.llm_model = parse_field(value)?,
            ConfigField::LlmProvider => self.llm_provider = parse_field(value)?,
            ConfigField::LlmApiUrl => self.llm_api_url = parse_field(value)?,
        }
        Ok(())
    }

    /// Merge an override file into this config.
    ///
    /// A file that cannot be read or parsed, or that produces an invalid config,
    /// leaves `self` untouched and returns the error.
    pub fn merge_file(&mut self, path: &Path) -> Result<MergeReport> {
        let overrides = Self::load_overrides(path)?;
        let mut candidate = self.clone();
        let report = candidate.apply_overrides(&overrides);
        candidate.validate()?;
        *self = candidate;
        Ok(report)
    }

    /// Build the effective config for a repository.
    ///
    /// An explicit override file wins over the first `<repo>/.onboarder.*` found.
    /// Problems with either degrade to defaults with a warning.
    pub fn resolve(repo_root: &Path, explicit: Option<&Path>) -> Self {
        let mut config = Config::default();

        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match Self::find_repo_file(repo_root) {
                Some(p) => p,
                None => return config,
            },
        };

        if !path.is_file() {
            if explicit.is_some() {
                tracing::warn!("Config file {} not found, using defaults", path.display());
            }
            return config;
        }

        match config.merge_file(&path) {
            Ok(report) => {
                for key in &report.unknown {
                    tracing::debug!("Ignoring unknown config key '{}'", key);
                }
                for (key, reason) in &report.rejected {
                    tracing::warn!("Ignoring config key '{}': {}", key, reason);
                }
            }
            Err(e) => {
                tracing::warn!("Could not load config file {}: {}", path.display(), e);
            }
        }

        config
    }

    fn find_repo_file(repo_root: &Path) -> Option<PathBuf> {
        REPO_CONFIG_FILES
            .iter()
            .map(|name| repo_root.join(name))
            .find(|p| p.is_file())
    }

    /// Where output lands for `repo_root`: relative dirs go inside the repository
    pub fn output_path(&self, repo_root: &Path) -> PathBuf {
        if self.output_dir.is_absolute() {
            self.output_dir.clone()
        } else {
            repo_root.join(&self.output_dir)
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, output: Option<PathBuf>, no_llm: bool) {
        if let Some(out) = output {
            self.output_dir = out;
        }

        if no_llm {
            self.llm_enabled = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::config_validation("depth must be at least 1"));
        }

        if self.depth > 100 {
            return Err(Error::config_validation("depth cannot exceed 100"));
        }

        if self.max_items_per_dir == 0 {
            return Err(Error::config_validation("max_items_per_dir must be at least 1"));
        }

        Ok(())
    }
}

fn parse_field<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
