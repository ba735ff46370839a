// OpenAI chat-completions client.
//
// Sends non-streaming requests with `response_format: json_object` and
// forwards the parsed result as `LlmEvent` variants over an mpsc channel
// for the app orchestrator to consume.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::Config;
use crate::guard;
use crate::protocol::LlmEvent;
use crate::wizard::report::ValidationReport;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Ceiling on suggestion options kept from a single response.
const MAX_OPTIONS: usize = 5;

/// Ceiling on the per-attempt backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Generic suggestions substituted when the model is unavailable.
pub fn fallback_suggestions() -> Vec<String> {
    vec![
        "Streamline daily tasks.".to_string(),
        "Enhance personal productivity.".to_string(),
        "Simplify complex workflows.".to_string(),
    ]
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API key not configured")]
    Disabled,

    #[error("rate limited by the API")]
    RateLimited,

    #[error("authentication failed; check the API key")]
    Authentication,

    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Only transport failures and server-side errors are worth retrying.
    fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAiClient
// ---------------------------------------------------------------------------

/// Low-level chat-completions client with timeout and retry handling.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        model: String,
        temperature: f32,
        timeout: Duration,
        max_retries: u32,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature,
            max_retries,
        }
    }

    /// Point the client at a different endpoint. Used by tests with a local
    /// mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one chat request and return the assistant message content.
    ///
    /// Retries transport and server-side failures up to `max_retries` times
    /// with exponential backoff (1s doubling, capped at 5s). Client-side
    /// failures (4xx) are never retried.
    pub async fn chat(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Disabled);
        }

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user_content }
            ],
            "temperature": clamp_temperature(self.temperature),
            "max_tokens": clamp_max_tokens(max_tokens),
            "response_format": { "type": "json_object" }
        });

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(&body).await {
                Ok(content) => return Ok(content),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(attempt, ?delay, %err, "request failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, body: &Value) -> Result<String, LlmError> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication,
                429 => LlmError::RateLimited,
                code => LlmError::Api {
                    status: code,
                    message: parse_error_message(&text)
                        .unwrap_or_else(|| "no error detail".to_string()),
                },
            });
        }

        debug!(status = status.as_u16(), "chat completion received");
        parse_content(&text)
            .ok_or_else(|| LlmError::MalformedResponse("no message content".to_string()))
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// High-level wrapper that is either an active client or disabled.
pub enum LlmClient {
    /// API key is configured and requests go out.
    Active(OpenAiClient),
    /// No API key; every request resolves to the fallback path.
    Disabled,
}

impl LlmClient {
    /// Build from the application config. Returns `Active` only when a
    /// non-empty API key is present in credentials.
    pub fn from_config(config: &Config) -> Self {
        match &config.credentials.openai_api_key {
            Some(key) if !key.is_empty() => LlmClient::Active(OpenAiClient::new(
                key.clone(),
                config.llm.model.clone(),
                config.llm.temperature,
                Duration::from_secs(config.llm.request_timeout_secs),
                config.llm.max_retries,
            )),
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    /// Request suggestion options and forward the outcome as one `LlmEvent`.
    ///
    /// The `generation` counter is threaded through so the receiving side can
    /// discard results from superseded requests.
    pub async fn request_suggestions(
        &self,
        question_id: u32,
        system: &str,
        user_content: &str,
        max_tokens: u32,
        max_chars: usize,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        let result = match self {
            LlmClient::Active(client) => client
                .chat(system, user_content, max_tokens)
                .await
                .and_then(|content| parse_options(&content, max_chars)),
            LlmClient::Disabled => Err(LlmError::Disabled),
        };

        let event = match result {
            Ok(options) => LlmEvent::Suggestions {
                question_id,
                options,
                generation,
            },
            Err(err) => LlmEvent::Failed {
                message: err.to_string(),
                generation,
            },
        };
        let _ = tx.send(event).await;
        Ok(())
    }

    /// Request the validation report and forward the outcome as one
    /// `LlmEvent`.
    pub async fn request_report(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
        max_chars: usize,
        tx: mpsc::Sender<LlmEvent>,
        generation: u64,
    ) -> anyhow::Result<()> {
        let result = match self {
            LlmClient::Active(client) => {
                match client.chat(system, user_content, max_tokens).await {
                    Ok(content) => ValidationReport::from_llm_json(&content, max_chars)
                        .map_err(|e| LlmError::MalformedResponse(e.to_string())),
                    Err(err) => Err(err),
                }
            }
            LlmClient::Disabled => Err(LlmError::Disabled),
        };

        let event = match result {
            Ok(report) => LlmEvent::Report {
                report: Box::new(report),
                generation,
            },
            Err(err) => LlmEvent::Failed {
                message: err.to_string(),
                generation,
            },
        };
        let _ = tx.send(event).await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parsing and clamping helpers
// ---------------------------------------------------------------------------

/// Extract `choices[0].message.content` from a chat-completions response.
pub(crate) fn parse_content(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// Extract `error.message` from an error response body.
pub(crate) fn parse_error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v.get("error")?
        .get("message")?
        .as_str()
        .map(|s| s.to_string())
}

/// Parse the `{"options": [...]}` payload a suggestion response carries.
/// Options are sanitized, empties dropped, and the list capped at five.
pub(crate) fn parse_options(content: &str, max_chars: usize) -> Result<Vec<String>, LlmError> {
    let v: Value = serde_json::from_str(content)
        .map_err(|e| LlmError::MalformedResponse(format!("options payload: {e}")))?;
    let raw = v
        .get("options")
        .and_then(|o| o.as_array())
        .ok_or_else(|| LlmError::MalformedResponse("missing options array".to_string()))?;

    let options: Vec<String> = raw
        .iter()
        .filter_map(|item| item.as_str())
        .map(|s| guard::sanitize(s, max_chars))
        .filter(|s| !s.is_empty())
        .take(MAX_OPTIONS)
        .collect();

    if options.is_empty() {
        return Err(LlmError::MalformedResponse(
            "options array is empty".to_string(),
        ));
    }
    Ok(options)
}

pub(crate) fn clamp_temperature(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

pub(crate) fn clamp_max_tokens(n: u32) -> u32 {
    n.clamp(1, 2000)
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = Duration::from_secs(1)
        .saturating_mul(2u32.saturating_pow(attempt));
    exp.min(MAX_BACKOFF)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
