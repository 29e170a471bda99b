//! LLM client: one model behind Mistral, any OpenAI-compatible server, or Ollama.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;
use tami_core::config::LlmConfig;
use tracing::{debug, info, warn};

use crate::chat::ChatDelegate;
use crate::error::LlmError;
use crate::types::{LlmRequest, LlmResponse};

/// Provider backend for chat completions.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    /// Ollama running locally.
    Ollama {
        /// Server root, e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// Mistral or any other `/v1/chat/completions` API.
    OpenAiCompatible {
        /// Server root, e.g. `https://api.mistral.ai`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No backend; every call fails and the pet apologises instead.
    None,
}

/// The chat client.
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_ms: u64,
    max_retries: u32,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match &self.provider {
            LlmProvider::Ollama { .. } => "ollama",
            LlmProvider::OpenAiCompatible { .. } => "openai-compatible",
            LlmProvider::None => "none",
        };
        f.debug_struct("LlmClient")
            .field("provider", &provider)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a new client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_tokens: 300,
            temperature: 0.7,
            timeout_ms: 15_000,
            max_retries,
        }
    }

    /// A client with no backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Build from config, reading the API key from `config.api_key_env`.
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown provider name.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::from_config_with_key(config, api_key)
    }

    /// Build from config with an explicit API key.
    ///
    /// A key-based provider without a key degrades to [`LlmProvider::None`].
    ///
    /// # Errors
    /// Returns `LlmError::ConfigError` for an unknown provider name.
    pub fn from_config_with_key(
        config: &LlmConfig,
        api_key: Option<String>,
    ) -> Result<Self, LlmError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let provider = match config.provider.to_ascii_lowercase().as_str() {
            "none" | "" => LlmProvider::None,
            "ollama" => LlmProvider::Ollama { base_url },
            "mistral" | "openai" | "openai-compatible" => {
                match api_key.filter(|k| !k.trim().is_empty()) {
                    Some(api_key) => LlmProvider::OpenAiCompatible { base_url, api_key },
                    None => {
                        warn!(
                            env = %config.api_key_env,
                            "No API key set, chat is disabled"
                        );
                        LlmProvider::None
                    }
                }
            }
            other => {
                return Err(LlmError::ConfigError(format!(
                    "unknown provider '{other}'"
                )));
            }
        };

        let client = Self {
            provider,
            http: Client::new(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_ms: config.request_timeout_ms,
            max_retries: config.max_retries,
        };
        info!(client = ?client, "LLM client configured");
        Ok(client)
    }

    /// Generate a response.
    ///
    /// # Errors
    /// Returns `Err` if no backend is configured or every attempt fails.
    pub async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        match &self.provider {
            LlmProvider::None => Err(LlmError::Unavailable("No LLM provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/generate");
                let body = json!({
                    "model": self.model,
                    "prompt": format!("{}\n\n{}", request.system, request.user),
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                self.send_with_retries(&url, None, &body, request.timeout_ms, |json| {
                    (json["response"].as_str(), json["eval_count"].as_u64())
                })
                .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = json!({
                    "model": self.model,
                    "messages": [
                        { "role": "system", "content": request.system },
                        { "role": "user", "content": request.user },
                    ],
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                self.send_with_retries(&url, Some(api_key), &body, request.timeout_ms, |json| {
                    (
                        json["choices"][0]["message"]["content"].as_str(),
                        json["usage"]["completion_tokens"].as_u64(),
                    )
                })
                .await
            }
        }
    }

    async fn send_with_retries(
        &self,
        url: &str,
        api_key: Option<&str>,
        body: &serde_json::Value,
        timeout_ms: u64,
        extract: impl Fn(&serde_json::Value) -> (Option<&str>, Option<u64>),
    ) -> Result<LlmResponse, LlmError> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!(attempt = attempt + 1, max = self.max_retries + 1, "Retrying LLM call");
            }

            let start = Instant::now();
            let mut builder = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(key) = api_key {
                builder = builder.bearer_auth(key);
            }
            let result = builder.send().await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) if resp.status().is_success() => {
                    let json: serde_json::Value = resp
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;
                    let (text, tokens) = extract(&json);
                    let Some(text) = text else {
                        return Err(LlmError::ParseError("response has no text".into()));
                    };
                    debug!(latency_ms, model = %self.model, "LLM call completed");
                    return Ok(LlmResponse {
                        text: text.trim().to_string(),
                        tokens_generated: tokens.and_then(|t| u32::try_from(t).ok()).unwrap_or(0),
                        latency_ms,
                        model: self.model.clone(),
                    });
                }
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status());
                    warn!(error = %last_error, "LLM API returned error");
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!(timeout_ms, "LLM request timed out");
                        last_error = format!("timed out after {timeout_ms}ms");
                    } else {
                        last_error = e.to_string();
                        warn!(error = %last_error, "LLM request failed");
                    }
                }
            }
        }

        if self.max_retries == 0 {
            return Err(LlmError::RequestFailed(last_error));
        }
        Err(LlmError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// The configured provider.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }
}

impl ChatDelegate for LlmClient {
    fn is_available(&self) -> bool {
        LlmClient::is_available(self)
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = LlmRequest::new(system, user)
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
            .with_timeout(self.timeout_ms);
        let response = self.generate(&request).await?;
        if response.text.is_empty() {
            return Err(LlmError::ParseError("empty completion".into()));
        }
        Ok(response.text)
    }
}
