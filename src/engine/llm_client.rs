use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// The external text-completion boundary: one blocking call in, one
/// completion string out, no retries. A failed call aborts the turn that
/// issued it; nothing is mutated and the player may resubmit.
pub trait Oracle {
    fn complete(&self, prompt: &str) -> Result<String, OracleError>;
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion response contained no choices")]
    EmptyCompletion,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Blocking client for any OpenAI-compatible chat-completions endpoint
/// (LM Studio locally, hosted providers via `base_url` + key).
pub struct ChatCompletionClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(settings: &Settings) -> Result<Self, OracleError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn test_connection(&self) -> Result<String, OracleError> {
        let mut request = self.http.get(format!("{}/models", self.base_url));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp: serde_json::Value = request.send()?.error_for_status()?.json()?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl Oracle for ChatCompletionClient {
    fn complete(&self, prompt: &str) -> Result<String, OracleError> {
        let req = ChatCompletionRequest {
            model: &self.model,
            temperature: 0.7,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&req);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp: ChatCompletionResponse = request.send()?.error_for_status()?.json()?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OracleError::EmptyCompletion)
    }
}
