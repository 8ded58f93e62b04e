use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parrot_config::{GeminiConfig, PersonaConfig};
use serde::Deserialize;
use serde_json::json;

use crate::prompt::build_prompt;

const API_KEY_HEADER: &str = "X-goog-api-key";

/// Source of raw reply candidates.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Zero or more raw candidates replying to `input`.
    async fn generate(&self, input: &str) -> Result<Vec<String>>;
}

/// Gemini `generateContent` client returning every candidate of one call.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    config: GeminiConfig,
    persona: PersonaConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
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

impl GeminiGenerator {
    pub fn new(config: GeminiConfig, persona: PersonaConfig) -> Self {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: config.api_key.clone(),
            config,
            persona,
        }
    }

    fn request_body(&self, input: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(&self.persona, input) }],
            }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "topP": self.config.top_p,
                "maxOutputTokens": self.config.max_output_tokens,
                "candidateCount": self.config.candidate_count,
            },
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, input: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&self.request_body(input))
            .send()
            .await
            .with_context(|| format!("gemini request failed for model {}", self.config.model))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read gemini response body")?;
        if !status.is_success() {
            bail!("gemini request failed: status {status}, body {body}");
        }

        let candidates = extract_candidates(&body)?;
        tracing::debug!(count = candidates.len(), "gemini candidates");
        Ok(candidates)
    }
}

/// First text part of each candidate, trimmed, newline runs collapsed to a
/// space, empties dropped.
fn extract_candidates(body: &str) -> Result<Vec<String>> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).context("failed to parse gemini response JSON")?;
    Ok(parsed
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content?.parts.into_iter().next()?.text)
        .map(|text| collapse_newlines(text.trim()))
        .filter(|text| !text.is_empty())
        .collect())
}

fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch == '\n' {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out.trim().to_string()
}
