//! Vision API client implementation.

use std::time::Duration;

use reqwest::Client;

use super::types::{
    GenerationResult, GetResultData, GetResultRequest, PollOutcome, SubmitTaskData,
    SubmitTaskRequest, VisionEnvelope, VISION_OK,
};

/// Model key for the clothing extraction capability.
const EXTRACT_REQ_KEY: &str = "byteedit_v2.0";

/// Error type for vision operations.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vision API returned a non-success code.
    #[error("vision API error: code={code} - {message}")]
    Api {
        /// Response code from the envelope.
        code: i64,
        /// Message from the envelope.
        message: String,
    },

    /// A success envelope arrived without its payload.
    #[error("vision API response missing data")]
    MissingData,
}

/// Vision API client.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionClient {
    /// Create a new vision client.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Submit a generation task. Returns the task id to poll with.
    pub async fn submit_task(
        &self,
        image_url: &str,
        prompt: &str,
    ) -> Result<String, VisionError> {
        let url = format!(
            "{}?Action=CVSync2AsyncSubmitTask&Version=2022-08-31",
            self.base_url
        );
        let request = SubmitTaskRequest {
            req_key: EXTRACT_REQ_KEY.to_string(),
            image_urls: vec![image_url.to_string()],
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let envelope: VisionEnvelope<SubmitTaskData> = response.json().await?;
        let data = Self::unwrap_envelope(envelope)?;

        Ok(data.task_id)
    }

    /// Poll a task once.
    pub async fn get_result(&self, task_id: &str) -> Result<PollOutcome, VisionError> {
        let url = format!(
            "{}?Action=CVSync2AsyncGetResult&Version=2022-08-31",
            self.base_url
        );
        let request = GetResultRequest {
            req_key: EXTRACT_REQ_KEY.to_string(),
            task_id: task_id.to_string(),
            req_json: "{\"return_url\":true}".to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let envelope: VisionEnvelope<GetResultData> = response.json().await?;
        let data = Self::unwrap_envelope(envelope)?;

        match data.status.as_str() {
            "done" => {
                let result = data
                    .image_urls
                    .and_then(|urls| urls.into_iter().next())
                    .map(GenerationResult::Url)
                    .or_else(|| {
                        data.binary_data_base64
                            .and_then(|blobs| blobs.into_iter().next())
                            .map(GenerationResult::Inline)
                    })
                    .ok_or(VisionError::MissingData)?;
                Ok(PollOutcome::Done(result))
            }
            "not_found" | "expired" => Ok(PollOutcome::Gone),
            // in_queue, generating, or anything newly introduced: keep polling.
            _ => Ok(PollOutcome::InProgress),
        }
    }

    fn unwrap_envelope<T>(envelope: VisionEnvelope<T>) -> Result<T, VisionError> {
        if envelope.code != VISION_OK {
            return Err(VisionError::Api {
                code: envelope.code,
                message: envelope.message,
            });
        }
        envelope.data.ok_or(VisionError::MissingData)
    }
}
