//! Chat-model clients for report generation.
//!
//! - **[`OpenAIChat`]**: `POST {base_url}/chat/completions` on any
//!   OpenAI-compatible API (`OPENAI_API_KEY` bearer auth).
//! - **[`OllamaChat`]**: `POST {url}/api/chat` with `stream: false`.
//! - **[`DisabledChat`]**: always fails; for setups that only chart.
//!
//! One request per call, no streaming, no retry. The reply text is
//! returned verbatim. Only the connect phase is bounded here; the insight
//! generator bounds the whole call with `generation.timeout_secs`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use memetrend_core::chat::ChatModel;

use crate::config::GenerationConfig;
use crate::embedding::{DEFAULT_OLLAMA_URL, DEFAULT_OPENAI_BASE_URL};

pub struct DisabledChat;

#[async_trait]
impl ChatModel for DisabledChat {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Generation provider is disabled. Set [generation] provider in config.")
    }
}

pub struct OpenAIChat {
    client: reqwest::Client,
    model: String,
    temperature: f64,
    base_url: String,
    api_key: String,
}

impl OpenAIChat {
    /// Reads the API key from `OPENAI_API_KEY`.
    pub fn from_env(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }

    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        // total request time is bounded by the insight generator
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_openai_chat(&json)
    }
}

fn parse_openai_chat(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

pub struct OllamaChat {
    client: reqwest::Client,
    model: String,
    temperature: f64,
    url: String,
}

impl OllamaChat {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        // total request time is bounded by the insight generator
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            url: url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for OllamaChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "stream": false,
            "options": { "temperature": self.temperature },
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Ollama connection error (is Ollama running at {}?)", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        json.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
    }
}

/// Create the configured [`ChatModel`].
pub fn create_chat_model(config: &GenerationConfig) -> Result<Arc<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledChat)),
        "openai" => Ok(Arc::new(OpenAIChat::from_env(config)?)),
        "ollama" => Ok(Arc::new(OllamaChat::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}
