use async_trait::async_trait;
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;

use super::PollSource;
use crate::models::PollRecord;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Poll lookup request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Poll lookup returned status {0}")]
    Status(u16),
    #[error("Failed to decode poll lookup response: {0}")]
    Decode(String),
    #[error("Poll lookup returned success: false - {message}")]
    Unsuccessful { message: String },
    #[error("Poll lookup response is not an array")]
    NotAnArray,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    response: Value,
}

pub fn parse_envelope(body: Value) -> Result<Vec<PollRecord>, FetchError> {
    let envelope: Envelope = serde_json::from_value(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if !envelope.success {
        return Err(FetchError::Unsuccessful {
            message: envelope.message.unwrap_or_else(|| "No error message provided".to_string()),
        });
    }

    match envelope.response {
        Value::Array(rows) => Ok(rows.iter().map(PollRecord::from_value).collect()),
        _ => Err(FetchError::NotAnArray),
    }
}

pub struct HttpPollSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPollSource {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl PollSource for HttpPollSource {
    async fn fetch_poll_data(&self) -> Result<Vec<PollRecord>, FetchError> {
        info!("Fetching poll data from: {}", self.endpoint);
        let resp = self.client.get(&self.endpoint).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            error!("Poll lookup failed with status {}", status);
            return Err(FetchError::Status(status));
        }

        let body: Value = resp.json().await?;
        let polls = parse_envelope(body)?;
        info!("Fetched {} poll(s)", polls.len());
        Ok(polls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_envelope_normalizes_rows() {
        let polls = parse_envelope(json!({
            "success": true,
            "response": [
                { "post_id": "1", "sponsor_id": "acme", "resp_option1": "60", "resp_option2": "40" },
                { "post_id": "2" }
            ]
        }))
        .unwrap();
        assert_eq!(polls.len(), 2);
        assert_eq!(polls[0].response_count1, 60);
        assert_eq!(polls[1].sponsor_id, "");
    }

    #[test]
    fn test_unsuccessful_envelope_is_a_failure() {
        let err = parse_envelope(json!({ "success": false, "message": "throttled" })).unwrap_err();
        assert!(matches!(err, FetchError::Unsuccessful { ref message } if message == "throttled"));

        let err = parse_envelope(json!({ "success": false })).unwrap_err();
        assert!(err.to_string().contains("No error message provided"));
    }

    #[test]
    fn test_non_array_response_is_a_failure() {
        let err = parse_envelope(json!({ "success": true, "response": { "post_id": "1" } })).unwrap_err();
        assert!(matches!(err, FetchError::NotAnArray));
        let err = parse_envelope(json!({ "success": true })).unwrap_err();
        assert!(matches!(err, FetchError::NotAnArray));
    }

    #[test]
    fn test_malformed_body_is_a_decode_failure() {
        let err = parse_envelope(json!(["not", "an", "envelope"])).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
