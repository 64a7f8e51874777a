/// LLM Client: the single point of entry for all text-generation calls.
///
/// No other module may call the OpenAI API directly. Callers depend on the
/// `ChatCompletion` trait so tests can swap in a canned backend.
///
/// Model: gpt-4-turbo-preview (hardcoded, not configurable)
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The model used for all description generation calls.
pub const MODEL: &str = "gpt-4-turbo-preview";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Text of the first choice, if the service returned any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// A backend able to answer a single user-role prompt.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the first completion's text, or `None` when the service produced none.
    async fn complete(&self, prompt: &str) -> Result<Option<String>, LlmError>;
}

/// Wraps the OpenAI chat completions API. Failures are returned once, never retried.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Makes a raw call to the chat completions endpoint, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = serde_json::from_str(&response.text().await?)?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(chat_response)
    }
}

#[async_trait]
impl ChatCompletion for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>, LlmError> {
        let response = self.call(prompt).await?;
        Ok(response.text().map(str::to_string))
    }
}

/// Pulls `error.message` out of an OpenAI error body, falling back to the raw body.
fn parse_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}
