use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use super::ReportGenerator;

pub const REPORT_MODEL: &str = "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo";
pub const REPORT_MAX_TOKENS: u32 = 2048;
pub const REPORT_TEMPERATURE: f64 = 0.44;
pub const REPORT_REPETITION_PENALTY: f64 = 1.1;
pub const REPORT_TOP_P: f64 = 0.7;
pub const REPORT_TOP_K: u32 = 50;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Report endpoint returned status {0}")]
    Status(u16),
    #[error("Failed to decode report response: {0}")]
    Decode(String),
    #[error("No report API token configured")]
    MissingToken,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

// Sampling parameters are fixed by the endpoint contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub model: &'static str,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub repetition_penalty: f64,
    pub top_p: f64,
    pub top_k: u32,
}

impl ReportRequest {
    pub fn new(prompt: &str) -> Self {
        Self {
            model: REPORT_MODEL,
            max_tokens: REPORT_MAX_TOKENS,
            messages: vec![ChatMessage { role: "system".to_string(), content: prompt.to_string() }],
            temperature: REPORT_TEMPERATURE,
            repetition_penalty: REPORT_REPETITION_PENALTY,
            top_p: REPORT_TOP_P,
            top_k: REPORT_TOP_K,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    response: String,
}

pub struct HttpReportGenerator {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpReportGenerator {
    pub fn new(endpoint: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            token,
        }
    }
}

#[async_trait]
impl ReportGenerator for HttpReportGenerator {
    async fn generate_report(&self, prompt: &str) -> Result<String, ReportError> {
        let token = self.token.as_deref().ok_or(ReportError::MissingToken)?;

        info!("Sending AI report request to {}", self.endpoint);
        let resp = self
            .client
            .post(&self.endpoint)
            .header("accept", "application/json")
            .bearer_auth(token)
            .json(&ReportRequest::new(prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ReportError::Status(resp.status().as_u16()));
        }

        let text = resp.text().await?;
        let body: ReportResponse = serde_json::from_str(&text).map_err(|e| ReportError::Decode(e.to_string()))?;
        Ok(body.response)
    }
}
