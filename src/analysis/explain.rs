//! AI-generated repository summary.
//!
//! Sends a compact JSON digest of the analysis to the configured provider and
//! returns the text it writes back. Any failure is logged and turns into `None`;
//! the rest of the report never depends on this stage.

use crate::analysis::roles::FileRole;
use crate::analysis::routes::Route;
use crate::analysis::stack::Stack;
use crate::analysis::systems::Systems;
use crate::config::{Config, LlmProvider};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of file roles included in the prompt context
pub const CONTEXT_ROLES: usize = 20;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.2;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Provider settings taken from the config
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl LlmSettings {
    /// Settings from config, with the API key read from the provider's env var
    pub fn from_config(config: &Config) -> Self {
        let api_key = match config.llm_provider {
            LlmProvider::Anthropic => std::env::var("ANTHROPIC_API_KEY").ok(),
            LlmProvider::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
            LlmProvider::Ollama => None,
        };

        Self {
            provider: config.llm_provider,
            model: config.llm_model.clone(),
            api_url: config.llm_api_url.clone(),
            api_key,
        }
    }
}

/// Borrowed view of the parts of a result that go into the prompt
#[derive(Debug, Clone, Copy)]
pub struct ExplainContext<'a> {
    pub stack: &'a Stack,
    pub entrypoints: &'a [String],
    pub routes: &'a [Route],
    pub systems: &'a Systems,
    pub roles: &'a [FileRole],
}

impl ExplainContext<'_> {
    pub fn to_json(&self) -> serde_json::Value {
        let roles = &self.roles[..self.roles.len().min(CONTEXT_ROLES)];
        serde_json::json!({
            "tech_stack": self.stack,
            "entrypoints": self.entrypoints,
            "routes": self.routes,
            "external_systems": &self.systems.nodes,
            "file_roles": roles,
        })
    }
}

/// Build the summary prompt around the JSON context
pub fn build_prompt(context: &ExplainContext<'_>) -> String {
    let digest = serde_json::to_string_pretty(&context.to_json()).unwrap_or_default();

    format!(
        "You are helping a developer get up to speed on an unfamiliar repository.\n\
        Using only the analysis below, write a concise onboarding summary with these sections:\n\n\
        1. What this repository does\n\
        2. How to run it locally\n\
        3. Key moving parts\n\
        4. External systems it talks to\n\
        5. Good first tasks for a new contributor\n\n\
        Analysis:\n{}\n",
        digest
    )
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Client for the repository summary
pub struct Explainer {
    settings: LlmSettings,
    client: reqwest::blocking::Client,
}

impl Explainer {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::llm(format!("Could not build HTTP client: {}", e)))?;

        Ok(Self { settings, client })
    }

    /// Summary text, or `None` when the provider could not be reached or answered badly
    pub fn explain(&self, context: &ExplainContext<'_>) -> Option<String> {
        let prompt = build_prompt(context);

        match self.query(&prompt) {
            Ok(text) if !text.is_empty() => Some(text),
            Ok(_) => {
                tracing::warn!("LLM returned an empty summary");
                None
            }
            Err(e) => {
                tracing::warn!("LLM summary unavailable: {}", e);
                None
            }
        }
    }

    fn query(&self, prompt: &str) -> Result<String> {
        match self.settings.provider {
            LlmProvider::Anthropic => self.query_anthropic(prompt),
            LlmProvider::OpenAI => self.query_openai(prompt),
            LlmProvider::Ollama => self.query_ollama(prompt),
        }
    }

    fn query_anthropic(&self, prompt: &str) -> Result<String> {
        let url = self
            .settings
            .api_url
            .as_deref()
            .unwrap_or("https://api.anthropic.com");
        let endpoint = format!("{}/v1/messages", url.trim_end_matches('/'));

        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::llm("ANTHROPIC_API_KEY is not set"))?;

        let request = AnthropicRequest {
            model: &self.settings.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .map_err(|e| Error::llm(format!("Anthropic request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::llm(format!(
                "Anthropic returned status {}",
                response.status()
            )));
        }

        let result: AnthropicResponse = response
            .json()
            .map_err(|e| Error::llm(format!("Failed to parse Anthropic response: {}", e)))?;

        result
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| Error::llm("No content in Anthropic response"))
    }

    fn query_openai(&self, prompt: &str) -> Result<String> {
        let url = self
            .settings
            .api_url
            .as_deref()
            .unwrap_or("https://api.openai.com/v1");
        let endpoint = format!("{}/chat/completions", url.trim_end_matches('/'));

        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or_else(|| Error::llm("OPENAI_API_KEY is not set"))?;

        let request = OpenAIRequest {
            model: &self.settings.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .map_err(|e| Error::llm(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::llm(format!(
                "OpenAI returned status {}",
                response.status()
            )));
        }

        let result: OpenAIResponse = response
            .json()
            .map_err(|e| Error::llm(format!("Failed to parse OpenAI response: {}", e)))?;

        result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| Error::llm("No response from OpenAI"))
    }

    fn query_ollama(&self, prompt: &str) -> Result<String> {
        let url = self
            .settings
            .api_url
            .as_deref()
            .unwrap_or("http://localhost:11434");
        let endpoint = format!("{}/api/generate", url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.settings.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": TEMPERATURE }
        });

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .map_err(|e| Error::llm(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::llm(format!(
                "Ollama returned status {}",
                response.status()
            )));
        }

        let result: OllamaResponse = response
            .json()
            .map_err(|e| Error::llm(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(result.response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::systems::{SystemInfo, SystemKind};

    fn settings(provider: LlmProvider, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            provider,
            model: "test-model".to_string(),
            // Nothing listens on the discard port
            api_url: Some("http://127.0.0.1:9".to_string()),
            api_key: api_key.map(String::from),
        }
    }

    fn sample_parts() -> (Stack, Vec<String>, Vec<Route>, Systems, Vec<FileRole>) {
        let stack = Stack {
            languages: vec!["Python".to_string()],
            frameworks: vec!["Flask".to_string()],
            ..Stack::default()
        };
        let entrypoints = vec!["app.py".to_string()];
        let routes = vec![Route::new("flask", "GET", "/health", "app.py")];
        let mut systems = Systems::default();
        systems.nodes.push("api.stripe.com".to_string());
        systems.kinds.insert(
            "api.stripe.com".to_string(),
            SystemInfo {
                kind: SystemKind::Url,
                description: "External API/Service".to_string(),
            },
        );
        let roles = (0..30)
            .map(|i| FileRole::new(format!("mod{}.py", i), "Python Code"))
            .collect();
        (stack, entrypoints, routes, systems, roles)
    }

    #[test]
    fn test_context_json_shape() {
        let (stack, entrypoints, routes, systems, roles) = sample_parts();
        let context = ExplainContext {
            stack: &stack,
            entrypoints: &entrypoints,
            routes: &routes,
            systems: &systems,
            roles: &roles,
        };

        let json = context.to_json();
        assert_eq!(json["tech_stack"]["frameworks"][0], "Flask");
        assert_eq!(json["entrypoints"][0], "app.py");
        assert_eq!(json["routes"][0], serde_json::json!(["flask", "GET", "/health", "app.py"]));
        assert_eq!(json["external_systems"], serde_json::json!(systems.nodes));
        assert!(json["external_systems"].get("kinds").is_none());
        assert_eq!(json["file_roles"].as_array().unwrap().len(), CONTEXT_ROLES);
    }

    #[test]
    fn test_prompt_has_all_sections() {
        let (stack, entrypoints, routes, systems, roles) = sample_parts();
        let context = ExplainContext {
            stack: &stack,
            entrypoints: &entrypoints,
            routes: &routes,
            systems: &systems,
            roles: &roles,
        };

        let prompt = build_prompt(&context);
        assert!(prompt.contains("What this repository does"));
        assert!(prompt.contains("How to run it locally"));
        assert!(prompt.contains("Key moving parts"));
        assert!(prompt.contains("External systems"));
        assert!(prompt.contains("first tasks"));
        assert!(prompt.contains("/health"));
    }

    #[test]
    fn test_unreachable_provider_yields_none() {
        let (stack, entrypoints, routes, systems, roles) = sample_parts();
        let context = ExplainContext {
            stack: &stack,
            entrypoints: &entrypoints,
            routes: &routes,
            systems: &systems,
            roles: &roles,
        };

        let explainer = Explainer::new(settings(LlmProvider::Ollama, None)).unwrap();
        assert_eq!(explainer.explain(&context), None);
    }

    #[test]
    fn test_missing_key_yields_none() {
        let (stack, entrypoints, routes, systems, roles) = sample_parts();
        let context = ExplainContext {
            stack: &stack,
            entrypoints: &entrypoints,
            routes: &routes,
            systems: &systems,
            roles: &roles,
        };

        for provider in [LlmProvider::Anthropic, LlmProvider::OpenAI] {
            let explainer = Explainer::new(settings(provider, None)).unwrap();
            assert_eq!(explainer.explain(&context), None);
        }
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.llm_provider = LlmProvider::Ollama;
        config.llm_model = "llama3".to_string();
        config.llm_api_url = Some("http://ollama:11434".to_string());

        let settings = LlmSettings::from_config(&config);
        assert_eq!(settings.provider, LlmProvider::Ollama);
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.api_url.as_deref(), Some("http://ollama:11434"));
        assert_eq!(settings.api_key, None);
    }
}
