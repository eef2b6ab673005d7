use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::enrich::{ChapterEnricher, ChapterInput, Enrichment};
use crate::error::PipelineError;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "COURSEFORGE_OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "COURSEFORGE_OPENAI_MODEL";
pub const TIMEOUT_ENV: &str = "COURSEFORGE_OPENAI_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const TEMPERATURE: f32 = 0.3;

const ENRICH_INSTRUCTIONS: &str = "\
You are a course content structuring assistant. Given raw chapter text from a \
course document, restructure it into the fields below. Only use content from the \
provided text; do not invent new information.

Return a JSON object with these fields:
{
  \"description\": \"a concise 1-2 sentence chapter description\",
  \"overview\": [\"paragraph\", ...],
  \"instructions\": [\"step\", ...],
  \"prompt_text\": [\"prompt or question for the learner\", ...],
  \"key_learnings\": [\"takeaway\", ...]
}

If a field has no matching content, return an empty array.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Reads the credential and endpoint settings; a missing or blank
    /// `OPENAI_API_KEY` is an environment error.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(PipelineError::MissingCredential(API_KEY_ENV))?;

        let base_url = env_or(BASE_URL_ENV, DEFAULT_BASE_URL);
        let model = env_or(MODEL_ENV, DEFAULT_MODEL);
        let timeout_secs = match std::env::var(TIMEOUT_ENV) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{TIMEOUT_ENV} must be a number of seconds: {raw:?}"))?,
            _ => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

pub struct OpenAiEnricher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiEnricher {
    pub fn new(config: OpenAiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            endpoint: responses_endpoint(&config.base_url),
            api_key: config.api_key,
            model: config.model,
        })
    }
}

#[async_trait]
impl ChapterEnricher for OpenAiEnricher {
    async fn enrich(&self, chapter: &ChapterInput<'_>) -> anyhow::Result<Enrichment> {
        let input = format!(
            "Module: {}\nChapter: {}\n\n--- Chapter Content ---\n{}",
            chapter.module_title, chapter.chapter_title, chapter.body
        );

        let text = responses_json(
            &self.client,
            &self.endpoint,
            &self.api_key,
            &self.model,
            ENRICH_INSTRUCTIONS,
            &input,
            TEMPERATURE,
        )
        .await?;

        serde_json::from_str(&text).context("parse enrichment JSON")
    }
}

pub fn responses_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/responses")
}

/// Calls the Responses API in JSON-object mode and returns the raw output
/// text.
pub async fn responses_json(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    instructions: &str,
    input: &str,
    temperature: f32,
) -> anyhow::Result<String> {
    let mut body = serde_json::json!({
        "model": model,
        "instructions": instructions,
        "input": input,
        "text": { "format": { "type": "json_object" } },
        "store": false,
    });

    // GPT-5 models reject sampling params.
    if !model.starts_with("gpt-5")
        && let Some(obj) = body.as_object_mut()
    {
        obj.insert("temperature".to_owned(), serde_json::json!(temperature));
    }

    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    let raw = response.text().await.context("read OpenAI response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        anyhow::bail!("OpenAI API error ({status}): {message}");
    }

    let value: serde_json::Value = serde_json::from_str(&raw).context("parse OpenAI response")?;
    extract_output_text(&value).context("extract output text")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_output_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let output = value
        .get("output")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `output` array in response"))?;

    let text = output
        .iter()
        .filter(|item| item.get("type").and_then(|v| v.as_str()) == Some("message"))
        .filter_map(|item| item.get("content").and_then(|v| v.as_array()))
        .flatten()
        .filter(|part| part.get("type").and_then(|v| v.as_str()) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(|v| v.as_str()))
        .collect::<String>();

    if text.trim().is_empty() {
        anyhow::bail!("OpenAI output text is empty");
    }
    Ok(text)
}
