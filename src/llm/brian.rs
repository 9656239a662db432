//! HTTP client for the Brian agent API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::agent::IntentInput;
use crate::error::ExtractionError;
use crate::llm::{IntentExtractor, KnowledgeBase};

pub const DEFAULT_BASE_URL: &str = "https://api.brianknows.org";
pub const DEFAULT_KNOWLEDGE_BOX: &str = "public-knowledge-box";

const EXTRACTION_PATH: &str = "/api/v0/agent/parameters-extraction";
const KNOWLEDGE_PATH: &str = "/api/v0/agent/knowledge";
const API_KEY_HEADER: &str = "x-brian-api-key";
const ASK_PROMPT_SUFFIX: &str = "Please explain in no more than 5 lines.";

/// Extractor service configuration.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub knowledge_box: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    #[serde(default)]
    result: Option<ExtractionResult>,
}

#[derive(Debug, Deserialize)]
struct ExtractionResult {
    #[serde(default)]
    completion: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeResponse {
    #[serde(default)]
    result: Option<KnowledgeResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KnowledgeResult {
    #[serde(default)]
    answer: Option<String>,
}

pub struct BrianClient {
    http: reqwest::Client,
    config: ExtractorConfig,
}

impl BrianClient {
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ExtractionError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header(API_KEY_HEADER, self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::error!(%status, "Extractor rejected the API key");
            return Err(ExtractionError::AuthFailed);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "Extractor request failed: {}", truncate(&detail, 200));
            return Err(ExtractionError::RequestFailed {
                reason: format!("HTTP {status}"),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IntentExtractor for BrianClient {
    async fn extract(&self, prompt: &str) -> Result<IntentInput, ExtractionError> {
        let response: ExtractionResponse =
            self.post(EXTRACTION_PATH, json!({ "prompt": prompt })).await?;
        let completion = response
            .result
            .and_then(|r| r.completion.into_iter().next())
            .ok_or(ExtractionError::NoCompletion)?;
        Ok(completion_to_input(&completion))
    }
}

#[async_trait]
impl KnowledgeBase for BrianClient {
    async fn ask(&self, question: &str) -> Result<Option<String>, ExtractionError> {
        let prompt = format!("{} {}", question.trim(), ASK_PROMPT_SUFFIX);
        let response: KnowledgeResponse = self
            .post(
                KNOWLEDGE_PATH,
                json!({ "prompt": prompt, "kb": self.config.knowledge_box }),
            )
            .await?;
        let answer = response
            .result
            .and_then(|r| r.answer)
            .or(response.answer)
            .filter(|a| !a.trim().is_empty());
        Ok(answer)
    }
}

/// Read the extractor's loosely typed completion item into plain strings.
fn completion_to_input(item: &Value) -> IntentInput {
    let field = |key: &str| match item.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    IntentInput {
        action: field("action"),
        token1: field("token1"),
        token2: field("token2"),
        chain: field("chain"),
        address: field("address"),
        amount: field("amount"),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
