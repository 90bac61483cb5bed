//! Gemini `streamGenerateContent` client.
//!
//! The response is read as server-sent events: one JSON chunk per `data:` line,
//! each carrying the next slice of text.

use crate::config::AiConfig;
use crate::error::SendError;
use crate::stream::AiSender;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub struct GeminiSender {
    client: Client,
    url: String,
    api_key: String,
}

impl GeminiSender {
    /// Reads the API key from the environment variable named in `config`.
    pub fn new(config: &AiConfig) -> Result<Self, SendError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SendError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &AiConfig, api_key: String) -> Result<Self, SendError> {
        // No overall timeout: a response may stream for minutes.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            url: stream_url(&config.endpoint, &config.model),
            api_key,
        })
    }
}

impl AiSender for GeminiSender {
    fn stream(
        &self,
        input: &str,
        attachments: &[PathBuf],
        on_fragment: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<String, SendError> {
        let body = request_body(input, attachments)?;
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut full = String::new();
        for line in BufReader::new(response).lines() {
            let line = line.map_err(SendError::Read)?;
            match parse_sse_line(&line)? {
                SseLine::Text(text) => {
                    full.push_str(&text);
                    if on_fragment(&text).is_break() {
                        debug!("stream read stopped by caller");
                        break;
                    }
                }
                SseLine::Done => break,
                SseLine::Skip => {}
            }
        }
        Ok(full)
    }
}

fn stream_url(endpoint: &str, model: &str) -> String {
    format!(
        "{}/models/{model}:streamGenerateContent?alt=sse",
        endpoint.trim_end_matches('/')
    )
}

/// Builds the request JSON. Attachments that cannot be read are left out.
fn request_body(input: &str, attachments: &[PathBuf]) -> Result<Value, SendError> {
    let mut parts = Vec::new();
    for path in attachments {
        match fs::read(path) {
            Ok(bytes) => parts.push(json!({
                "inlineData": {
                    "mimeType": mime_type(path),
                    "data": STANDARD.encode(bytes),
                }
            })),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable attachment"),
        }
    }
    if !input.trim().is_empty() {
        parts.push(json!({ "text": input }));
    }
    if parts.is_empty() {
        return Err(SendError::EmptyRequest);
    }

    Ok(json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "thinkingConfig": { "thinkingBudget": 0 }
        }
    }))
}

fn mime_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Text(String),
    Done,
    Skip,
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

fn parse_sse_line(line: &str) -> Result<SseLine, SendError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }

    let chunk: Chunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(SendError::Provider(error.message));
    }
    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        Ok(SseLine::Skip)
    } else {
        Ok(SseLine::Text(text))
    }
}
