use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use mailsmart_types::api::{FeedbackRequest, PredictRequest, PredictResponse};

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("prediction API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("prediction API returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected prediction API response: {0}")]
    Decode(String),
}

/// HTTP client for the external spam/emotion prediction API.
///
/// Calls are made inline in the request that triggers them, once, without retry.
#[derive(Clone)]
pub struct ClassifierClient {
    http: Client,
    base_url: String,
}

impl ClassifierClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST {base}/predict
    pub async fn predict(&self, text: &str) -> Result<PredictResponse, ClassifierError> {
        let url = format!("{}/predict", self.base_url);
        debug!("Requesting prediction from {}", url);

        let resp = self
            .http
            .post(&url)
            .json(&PredictRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status,
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ClassifierError::Decode(e.to_string()))
    }

    /// POST {base}/feedback. Only the status code of the reply matters.
    pub async fn send_feedback(&self, feedback: &FeedbackRequest) -> Result<(), ClassifierError> {
        let url = format!("{}/feedback", self.base_url);
        debug!("Sending feedback for message {} to {}", feedback.message_id, url);

        let resp = self.http.post(&url).json(feedback).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ClassifierError::Status {
            status,
            message: error_message(&body),
        })
    }
}

/// Pull a human-readable error out of an API error body.
/// The prediction API answers errors as `{"detail": ...}`; some proxies use `{"message": ...}`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "detail"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}
