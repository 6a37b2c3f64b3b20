// External system detection
//
// Three independent passes: known SDKs among declared dependencies,
// environment variable references, and outbound URLs in file contents.

use crate::analysis::source::SourceText;
use crate::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Node id used for the aggregated environment variable entry
pub const ENV_NODE: &str = "Environment Variables";

/// Above this many variables only the count is reported
pub const ENV_LIST_THRESHOLD: usize = 12;

/// Variable names shown in the description before eliding
pub const ENV_PREVIEW: usize = 5;

/// A known SDK and the substrings its package names contain
#[derive(Debug, Clone, Copy)]
pub struct SdkSignature {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
    pub description: &'static str,
}

pub const SDK_SIGNATURES: &[SdkSignature] = &[
    SdkSignature { name: "Stripe", patterns: &["stripe", "stripe-"], description: "Payment processing" },
    SdkSignature { name: "Twilio", patterns: &["twilio"], description: "Communication platform" },
    SdkSignature { name: "Sentry", patterns: &["sentry", "@sentry/"], description: "Error monitoring" },
    SdkSignature { name: "Redis", patterns: &["redis", "ioredis"], description: "In-memory database" },
    SdkSignature { name: "MongoDB", patterns: &["mongodb", "mongoose"], description: "NoSQL database" },
    SdkSignature { name: "PostgreSQL", patterns: &["pg", "postgres", "postgresql"], description: "SQL database" },
    SdkSignature { name: "MySQL", patterns: &["mysql", "mysql2"], description: "SQL database" },
    SdkSignature { name: "Kafka", patterns: &["kafka", "kafkajs"], description: "Message streaming" },
    SdkSignature { name: "RabbitMQ", patterns: &["amqplib", "rabbitmq"], description: "Message broker" },
    SdkSignature { name: "AWS", patterns: &["aws-sdk", "@aws-sdk"], description: "Cloud services" },
    SdkSignature { name: "GCP", patterns: &["@google-cloud/", "google-cloud-"], description: "Google Cloud Platform" },
    SdkSignature { name: "Azure", patterns: &["@azure/", "azure-"], description: "Microsoft Azure" },
    SdkSignature { name: "OpenAI", patterns: &["openai", "@openai/"], description: "AI/ML services" },
    SdkSignature { name: "Anthropic", patterns: &["anthropic", "@anthropic/"], description: "AI/ML services" },
];

/// Look up the description of a known SDK
pub fn sdk_description(name: &str) -> Option<&'static str> {
    SDK_SIGNATURES
        .iter()
        .find(|sdk| sdk.name == name)
        .map(|sdk| sdk.description)
}

/// Kind tag of an external system node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemKind {
    Env,
    Url,
}

/// Kind and description of a node, serialized as `[kind, description]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "(SystemKind, String)")]
pub struct SystemInfo {
    pub kind: SystemKind,
    pub description: String,
}

impl From<SystemInfo> for (SystemKind, String) {
    fn from(info: SystemInfo) -> Self {
        (info.kind, info.description)
    }
}

/// Detected external systems
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Systems {
    /// Distinct node ids in report order
    pub nodes: Vec<String>,
    pub kinds: BTreeMap<String, SystemInfo>,
}

impl Systems {
    fn add(&mut self, id: impl Into<String>, kind: SystemKind, description: impl Into<String>) {
        let id = id.into();
        if !self.nodes.contains(&id) {
            self.nodes.push(id.clone());
        }
        self.kinds.insert(
            id,
            SystemInfo {
                kind,
                description: description.into(),
            },
        );
    }
}

/// SDK names found among dependency names, in table order, each once
pub fn detect_sdks(dependencies: &[String]) -> Vec<String> {
    let lowered: Vec<String> = dependencies.iter().map(|d| d.to_lowercase()).collect();

    SDK_SIGNATURES
        .iter()
        .filter(|sdk| {
            lowered
                .iter()
                .any(|dep| sdk.patterns.iter().any(|p| dep.contains(p)))
        })
        .map(|sdk| sdk.name.to_string())
        .collect()
}

/// Scans contents for environment variables and outbound URLs
#[derive(Debug, Clone)]
pub struct ExternalSystemDetector {
    env_pattern: Regex,
    url_pattern: Regex,
}

impl ExternalSystemDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            env_pattern: Regex::new(r#"process\.env\.(\w+)|os\.environ\.get\(["'](\w+)["']"#)?,
            url_pattern: Regex::new(r#"https?://[^\s"'<>]+"#)?,
        })
    }

    pub fn detect(&self, sources: &[SourceText]) -> Systems {
        let mut env_vars = BTreeSet::new();
        let mut domains = BTreeSet::new();

        for source in sources {
            env_vars.extend(self.env_vars(&source.content));
            domains.extend(self.domains(&source.content));
        }

        let mut systems = Systems::default();

        if !env_vars.is_empty() {
            systems.add(ENV_NODE, SystemKind::Env, describe_env(&env_vars));
        }

        for domain in domains {
            systems.add(domain, SystemKind::Url, "External API/Service");
        }

        systems
    }

    /// Variable names referenced through `process.env.X` or `os.environ.get("X")`
    pub fn env_vars(&self, content: &str) -> Vec<String> {
        self.env_pattern
            .captures_iter(content)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Domains of URLs in `content`, excluding loopback addresses
    pub fn domains(&self, content: &str) -> Vec<String> {
        self.url_pattern
            .find_iter(content)
            .map(|m| m.as_str())
            .filter(|url| !url.contains("localhost") && !url.contains("127.0.0.1"))
            .map(|url| domain_of(url).to_string())
            .filter(|domain| !domain.is_empty())
            .collect()
    }
}

fn describe_env(vars: &BTreeSet<String>) -> String {
    if vars.len() > ENV_LIST_THRESHOLD {
        return format!("{} variables", vars.len());
    }

    let preview: Vec<&str> = vars.iter().take(ENV_PREVIEW).map(String::as_str).collect();
    let ellipsis = if vars.len() > ENV_PREVIEW { "..." } else { "" };
    format!("Variables: {}{}", preview.join(", "), ellipsis)
}

/// Host part of an `http(s)://` URL
pub fn domain_of(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}
