//! LLM completion clients and defensive parsing of their output.
//!
//! Every caller asks the model for a JSON object and then runs the raw text
//! through [`sanitize_json`] before deserializing, because models wrap JSON in
//! Markdown fences or drift from the requested format.

use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Completions can be slow; keep a generous ceiling
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("LLM returned no content")]
    EmptyResponse,
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::RequestFailed(e.to_string())
    }
}

/// A single prompt sent to a completion model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Text completion capability.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Provenance label for text produced by this model provider
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError>;
}

/// Build the completion client selected by the config
pub fn build_completer(config: &Config) -> Result<Arc<dyn Completer>, AgentError> {
    let api_key = config.llm_api_key()?;
    match config.agent.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiCompleter::new(api_key, &config.agent.model)?)),
        _ => Ok(Arc::new(OpenAiCompleter::new(api_key, &config.agent.model)?)),
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI chat-completions client.
pub struct OpenAiCompleter {
    http: Client,
    api_key: String,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AgentError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(OPENAI_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AgentError::EmptyResponse)
    }
}

/// Gemini client via rstructor.
pub struct GeminiCompleter {
    client: GeminiClient,
}

impl GeminiCompleter {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AgentError> {
        let client = GeminiClient::new(api_key)
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?
            .model(parse_gemini_model(model));
        Ok(Self { client })
    }
}

#[async_trait]
impl Completer for GeminiCompleter {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        // Gemini takes a single prompt; fold the system message in front
        let prompt = match &request.system {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };

        let result = self
            .client
            .generate_with_metadata(&prompt)
            .await
            .map_err(|e| AgentError::RequestFailed(e.to_string()))?;

        if result.text.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(result.text)
    }
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}

/// Instruction block demanding a JSON object matching `T`'s schema
pub fn schema_instruction<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());
    format!(
        "You MUST respond with a single valid JSON object matching this exact JSON schema:\n{}\n\n\
         Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object.",
        schema_json
    )
}

/// Strip Markdown code fences and validate the remaining text as JSON.
///
/// Returns `"{}"` when the text is empty or not valid JSON.
pub fn sanitize_json(text: &str) -> String {
    let cleaned = strip_markdown_json(text);
    if cleaned.is_empty() {
        return "{}".to_string();
    }

    match serde_json::from_str::<serde_json::Value>(&cleaned) {
        Ok(_) => cleaned,
        Err(e) => {
            warn!(error = %e, "model output is not valid JSON, substituting empty object");
            "{}".to_string()
        }
    }
}

/// Sanitize model output and deserialize it into `T`
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, AgentError> {
    let cleaned = sanitize_json(text);
    debug!(len = cleaned.len(), "parsing model output");
    serde_json::from_str(&cleaned).map_err(|e| AgentError::ParseError(format!("{}: {}", e, cleaned)))
}

/// Strip markdown code block wrappers from JSON response
fn strip_markdown_json(text: &str) -> String {
    let trimmed = text.trim();

    // Remove ```json ... ``` or ``` ... ```
    if let Some(rest) = trimmed.strip_prefix("```") {
        let without_prefix = rest.strip_prefix("json").unwrap_or(rest);
        let body = without_prefix.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        return body.trim().to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{PersonFindings, Preparation};

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(sanitize_json(raw), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "  ```\n{\"a\": 1}\n```  ";
        assert_eq!(sanitize_json(raw), "{\"a\": 1}");
    }

    #[test]
    fn passes_plain_json_through() {
        assert_eq!(sanitize_json("{\"a\": [1, 2]}"), "{\"a\": [1, 2]}");
    }

    #[test]
    fn invalid_json_becomes_empty_object() {
        assert_eq!(sanitize_json("Sure! Here is the summary: ..."), "{}");
        assert_eq!(sanitize_json("```json\n{broken\n```"), "{}");
        assert_eq!(sanitize_json(""), "{}");
    }

    #[test]
    fn parse_tolerates_garbage_as_defaults() {
        let prep: Preparation = parse_json_object("not json at all").unwrap();
        assert!(prep.summary.is_empty());
        assert!(prep.tips.is_empty());
    }

    #[test]
    fn parse_rejects_wrong_field_types() {
        let result: Result<PersonFindings, _> =
            parse_json_object(r#"{"jobTitle": "CTO", "recentNews": "none"}"#);
        assert!(matches!(result, Err(AgentError::ParseError(_))));
    }

    #[test]
    fn schema_instruction_names_fields() {
        let text = schema_instruction::<PersonFindings>();
        assert!(text.contains("jobTitle"));
        assert!(text.contains("linkedInProfile"));
        assert!(text.contains("recentNews"));
    }

    #[test]
    fn chat_request_omits_absent_max_tokens() {
        let body = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.3,
            max_tokens: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn chat_response_without_content_is_empty() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
