//! Vision API wire types.

use serde::{Deserialize, Serialize};

/// Response code the vision API uses for success.
pub const VISION_OK: i64 = 10000;

/// Task submission request.
#[derive(Debug, Serialize)]
pub struct SubmitTaskRequest {
    /// Model/capability key.
    pub req_key: String,
    /// Source image URLs.
    pub image_urls: Vec<String>,
    /// Generation prompt.
    pub prompt: String,
}

/// Result poll request.
#[derive(Debug, Serialize)]
pub struct GetResultRequest {
    /// Model/capability key, must match the submit call.
    pub req_key: String,
    /// Task id returned at submission.
    pub task_id: String,
    /// Extra options, passed through as a JSON string.
    pub req_json: String,
}

/// Envelope every vision response arrives in.
#[derive(Debug, Deserialize)]
pub struct VisionEnvelope<T> {
    /// Response code; `VISION_OK` on success.
    pub code: i64,
    /// Human-readable status message.
    #[serde(default)]
    pub message: String,
    /// Payload, present on success.
    pub data: Option<T>,
}

/// Submit response payload.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskData {
    /// Id to poll results with.
    pub task_id: String,
}

/// Poll response payload.
#[derive(Debug, Deserialize)]
pub struct GetResultData {
    /// Task status: done, in_queue, generating, not_found, expired.
    pub status: String,
    /// Result image URLs, when the service stores output itself.
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    /// Inline base64 result payloads, when no URL is available.
    #[serde(default)]
    pub binary_data_base64: Option<Vec<String>>,
}

/// A finished generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// The service stored the output and returned a URL.
    Url(String),
    /// The output arrived inline as base64 image data.
    Inline(String),
}

/// Outcome of one result poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The task finished with a result.
    Done(GenerationResult),
    /// Still queued or generating; poll again.
    InProgress,
    /// The task is unknown or its result expired; it will never finish.
    Gone,
}
